use shopdb_core::StoreError;
use thiserror::Error;

/// Failure fetching one listing page, detail page, or image.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Precondition failures that abort a preview run outright.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid page range {from}..={to}: {reason}")]
    InvalidPageRange { from: u32, to: u32, reason: String },

    #[error("category {0} not found")]
    CategoryNotFound(i32),

    #[error("invalid listing URL: {0}")]
    InvalidListingUrl(#[source] ScraperError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Precondition failures that abort an import run outright.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("category {0} not found")]
    CategoryNotFound(i32),

    #[error(transparent)]
    Store(#[from] StoreError),
}
