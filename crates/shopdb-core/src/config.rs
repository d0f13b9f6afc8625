use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files; useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a pure
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("SHOPDB_ENV", "development"))?;
    let log_level = or_default("SHOPDB_LOG_LEVEL", "info");

    let uploads_dir = PathBuf::from(or_default("SHOPDB_UPLOADS_DIR", "./wwwroot/uploads"));
    let uploads_url_prefix = or_default("SHOPDB_UPLOADS_URL_PREFIX", "/uploads")
        .trim_end_matches('/')
        .to_string();

    let db_max_connections = parse_u32("SHOPDB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("SHOPDB_DB_MIN_CONNECTIONS", "1")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "SHOPDB_DB_MIN_CONNECTIONS",
            format!(
                "min connections ({db_min_connections}) exceeds max connections ({db_max_connections})"
            ),
        ));
    }
    let db_acquire_timeout_secs = parse_u64("SHOPDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let scraper_site_origin = or_default("SHOPDB_SCRAPER_SITE_ORIGIN", "https://catalog.onliner.by")
        .trim_end_matches('/')
        .to_string();
    if !scraper_site_origin.starts_with("http://") && !scraper_site_origin.starts_with("https://") {
        return Err(invalid(
            "SHOPDB_SCRAPER_SITE_ORIGIN",
            format!("\"{scraper_site_origin}\" is not an http(s) origin"),
        ));
    }

    let scraper_request_timeout_secs = parse_u64("SHOPDB_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default("SHOPDB_SCRAPER_USER_AGENT", "shopdb/0.1 (catalog-import)");
    let scraper_inter_request_delay_ms = parse_u64("SHOPDB_SCRAPER_INTER_REQUEST_DELAY_MS", "0")?;
    let scraper_max_retries = parse_u32("SHOPDB_SCRAPER_MAX_RETRIES", "0")?;
    let scraper_retry_backoff_base_secs = parse_u64("SHOPDB_SCRAPER_RETRY_BACKOFF_BASE_SECS", "2")?;

    let scraper_detail_concurrency = parse_usize("SHOPDB_SCRAPER_DETAIL_CONCURRENCY", "1")?;
    if scraper_detail_concurrency == 0 {
        return Err(invalid(
            "SHOPDB_SCRAPER_DETAIL_CONCURRENCY",
            "must be at least 1".to_string(),
        ));
    }
    let scraper_max_page_span = parse_u32("SHOPDB_SCRAPER_MAX_PAGE_SPAN", "50")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        uploads_dir,
        uploads_url_prefix,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scraper_site_origin,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_inter_request_delay_ms,
        scraper_max_retries,
        scraper_retry_backoff_base_secs,
        scraper_detail_concurrency,
        scraper_max_page_span,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SHOPDB_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
