//! Handlers for the `categories` and `scrape` commands.
//!
//! Called from `main` after config and the database pool are established.
//! Per-item failures are logged by the pipeline and summarized here; only
//! precondition failures turn into a non-zero exit.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use shopdb_core::ScrapedCandidate;
use shopdb_scraper::{
    CatalogClient, PipelineOptions, PipelineOrchestrator, PreviewReport, PreviewRequest,
};
use tokio_util::sync::CancellationToken;

/// Accepted shapes for an import file: the bare candidate array written by
/// `scrape preview`, or a full preview report.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImportFile {
    Candidates(Vec<ScrapedCandidate>),
    Report(PreviewReport),
}

pub(crate) fn parse_candidate_file(text: &str) -> anyhow::Result<Vec<ScrapedCandidate>> {
    let file: ImportFile =
        serde_json::from_str(text).context("import file is not a candidate list")?;
    Ok(match file {
        ImportFile::Candidates(candidates) => candidates,
        ImportFile::Report(report) => report.candidates,
    })
}

fn build_client(config: &shopdb_core::AppConfig) -> anyhow::Result<CatalogClient> {
    CatalogClient::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
    )
    .map_err(|e| anyhow::anyhow!("failed to build catalog client: {e}"))
}

/// Prints every category as `id<TAB>name`.
pub(crate) async fn run_list_categories(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let categories = shopdb_db::list_categories(pool).await?;
    if categories.is_empty() {
        println!("no categories; create one before importing");
    }
    for category in categories {
        println!("{}\t{}", category.id, category.name);
    }
    Ok(())
}

/// Runs a preview and writes the candidates as pretty JSON.
///
/// # Errors
///
/// Returns an error if the page range or category is invalid, or the output
/// cannot be written. Fetch failures are logged and counted, not returned.
pub(crate) async fn run_preview(
    pool: &sqlx::PgPool,
    config: &shopdb_core::AppConfig,
    request: &PreviewRequest,
    out: Option<&Path>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let catalog = shopdb_db::PgCatalog::new(pool.clone());
    let pipeline =
        PipelineOrchestrator::new(&client, &catalog, PipelineOptions::from_app_config(config));

    let report = pipeline.preview_scrape(request, cancel).await?;

    for error in &report.errors {
        tracing::warn!(item = %error.item, message = %error.message, "preview item failed");
    }
    let degraded = report.candidates.iter().filter(|c| c.has_errors()).count();

    let json = serde_json::to_string_pretty(&report.candidates)?;
    match out {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "wrote {} candidates to {} ({} with extraction notes, {} fetch errors{})",
                report.candidates.len(),
                path.display(),
                degraded,
                report.errors.len(),
                if report.cancelled { ", cancelled" } else { "" }
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Imports a reviewed candidate file and prints the summary as JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the category
/// does not exist.
pub(crate) async fn run_import(
    pool: &sqlx::PgPool,
    config: &shopdb_core::AppConfig,
    category_id: i32,
    input: &Path,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;
    let candidates = parse_candidate_file(&text)?;

    let client = build_client(config)?;
    let catalog = shopdb_db::PgCatalog::new(pool.clone());
    let images = shopdb_db::DiskImageStore::from_app_config(config);
    let pipeline =
        PipelineOrchestrator::new(&client, &catalog, PipelineOptions::from_app_config(config));

    let summary = pipeline
        .import_candidates(&catalog, &images, category_id, &candidates, cancel)
        .await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
