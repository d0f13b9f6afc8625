mod scrape;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shopdb_core::Environment;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shopdb")]
#[command(about = "Import retail catalog listings into the shop database")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations.
    Migrate,
    /// List catalog categories products can be imported into.
    Categories,
    /// Preview or import products scraped from a retail listing.
    Scrape {
        #[command(subcommand)]
        command: ScrapeCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ScrapeCommands {
    /// Scrape listing pages and write candidates as JSON without saving them.
    Preview {
        /// Listing URL, optionally with filter query parameters.
        #[arg(long)]
        url: String,
        #[arg(long, default_value_t = 1)]
        from: u32,
        #[arg(long, default_value_t = 1)]
        to: u32,
        /// Target category id.
        #[arg(long)]
        category: i32,
        /// Write candidates here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Import a reviewed candidate file into a category.
    Import {
        #[arg(long)]
        category: i32,
        /// JSON array of candidates, or a saved preview report.
        #[arg(long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("shopdb: no command given; see --help");
        return Ok(());
    };

    let config = shopdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    let format = LogFormat::for_env(&config.env);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(format.ansi)
        .with_file(format.source_location)
        .with_line_number(format.source_location)
        .init();

    let pool_config = shopdb_db::PoolConfig::from_app_config(&config);
    let pool = shopdb_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Migrate => {
            let applied = shopdb_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Categories => scrape::run_list_categories(&pool).await?,
        Commands::Scrape { command } => {
            let cancel = cancel_on_ctrl_c();
            match command {
                ScrapeCommands::Preview {
                    url,
                    from,
                    to,
                    category,
                    out,
                } => {
                    let request = shopdb_scraper::PreviewRequest {
                        site_url: url,
                        page_from: from,
                        page_to: to,
                        category_id: category,
                    };
                    scrape::run_preview(&pool, &config, &request, out.as_deref(), &cancel)
                        .await?;
                }
                ScrapeCommands::Import { category, input } => {
                    scrape::run_import(&pool, &config, category, &input, &cancel).await?;
                }
            }
        }
    }

    Ok(())
}

/// Log output shape per deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LogFormat {
    ansi: bool,
    source_location: bool,
}

impl LogFormat {
    /// Colours only in development; file and line everywhere but production.
    fn for_env(env: &Environment) -> Self {
        match env {
            Environment::Development => Self {
                ansi: true,
                source_location: true,
            },
            Environment::Test => Self {
                ansi: false,
                source_location: true,
            },
            Environment::Production => Self {
                ansi: false,
                source_location: false,
            },
        }
    }
}

/// Returns a token that is cancelled on the first Ctrl-C.
///
/// In-flight requests finish; the run stops at its next checkpoint and
/// reports what it has so far.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("received ctrl-c, stopping after in-flight requests");
                child.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "failed to listen for ctrl-c"),
        }
    });
    token
}
