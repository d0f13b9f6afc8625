pub mod client;
pub mod detail;
pub mod error;
pub mod import;
pub mod listing;
pub mod pipeline;
mod rate_limit;
pub mod selectors;

pub use client::{build_page_url, extract_site_origin, resolve_link, CatalogClient};
pub use detail::{parse_detail, DetailParse};
pub use error::{ImportError, PipelineError, ScraperError};
pub use import::{ImportOptions, Importer};
pub use listing::{normalize_price, parse_listing, ProductStub};
pub use pipeline::{
    PipelineOptions, PipelineOrchestrator, PipelineState, PreviewReport, PreviewRequest,
};
