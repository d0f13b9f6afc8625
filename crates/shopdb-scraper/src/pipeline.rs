//! Preview and commit orchestration over the fetcher, parsers, and importer.
//!
//! A preview walks a range of listing pages, fetches every product's detail
//! page, and returns the assembled candidates without persisting anything.
//! A commit hands a (possibly edited) candidate list to [`Importer`].
//!
//! Failures are absorbed per item: a page that cannot be fetched becomes one
//! entry in [`PreviewReport::errors`] and the run moves to the next page.
//! Only precondition failures (bad page range, unknown category) abort.

use std::collections::HashSet;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use shopdb_core::{
    AppConfig, CatalogStore, CategoryLookup, ImageStore, ImportSummary, ItemError,
    ScrapedCandidate,
};
use tokio::sync::Mutex;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::client::{build_page_url, extract_site_origin, CatalogClient};
use crate::detail::{parse_detail, DetailParse};
use crate::error::{ImportError, PipelineError, ScraperError};
use crate::import::{ImportOptions, Importer};
use crate::listing::{parse_listing, ProductStub};
use crate::rate_limit::retry_with_backoff;

/// What to preview: a listing URL, an inclusive 1-based page range, and the
/// category the candidates are destined for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub site_url: String,
    pub page_from: u32,
    pub page_to: u32,
    pub category_id: i32,
}

/// Result of a preview run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewReport {
    /// Candidates in page order, then card order within each page.
    pub candidates: Vec<ScrapedCandidate>,
    /// Page and detail fetch failures, keyed by the URL that failed.
    #[serde(default)]
    pub errors: Vec<ItemError>,
    /// Set when the run stopped early on request.
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub pages_fetched: u32,
    #[serde(default)]
    pub pages_failed: u32,
}

/// Tuning knobs for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Origin relative listing links are resolved against. `None` uses the
    /// origin of the listing URL being previewed.
    pub site_origin: Option<String>,
    /// Minimum gap between detail fetch starts on a page, at any
    /// concurrency.
    pub inter_request_delay: Duration,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    /// In-flight detail fetches per listing page; clamped to at least 1.
    pub detail_concurrency: usize,
    /// Largest number of pages one preview may span.
    pub max_page_span: u32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            site_origin: None,
            inter_request_delay: Duration::ZERO,
            max_retries: 0,
            retry_backoff_base_secs: 2,
            detail_concurrency: 1,
            max_page_span: 50,
        }
    }
}

impl PipelineOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            site_origin: Some(config.scraper_site_origin.clone()),
            inter_request_delay: Duration::from_millis(config.scraper_inter_request_delay_ms),
            max_retries: config.scraper_max_retries,
            retry_backoff_base_secs: config.scraper_retry_backoff_base_secs,
            detail_concurrency: config.scraper_detail_concurrency,
            max_page_span: config.scraper_max_page_span,
        }
    }
}

/// Stage a preview run is in. Transitions are logged at `debug`; none of
/// them is terminal on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Fetching { page: u32 },
    Parsing { page: u32 },
    FetchingDetail { url: String },
    ParsingDetail { url: String },
    Aggregating,
}

fn transition(state: &PipelineState) {
    tracing::debug!(?state, "pipeline state");
}

/// Per-stub result of the detail phase.
enum DetailOutcome {
    Candidate(Box<ScrapedCandidate>),
    Failed(ItemError),
    Cancelled,
}

/// Drives preview and commit runs.
///
/// Holds borrowed collaborators only; construct one per run or keep it
/// around, it carries no state between calls.
pub struct PipelineOrchestrator<'a> {
    client: &'a CatalogClient,
    categories: &'a dyn CategoryLookup,
    options: PipelineOptions,
}

impl<'a> PipelineOrchestrator<'a> {
    #[must_use]
    pub fn new(
        client: &'a CatalogClient,
        categories: &'a dyn CategoryLookup,
        options: PipelineOptions,
    ) -> Self {
        Self {
            client,
            categories,
            options,
        }
    }

    /// Scrapes pages `page_from..=page_to` of `site_url` into candidates.
    ///
    /// Nothing is persisted. Cancellation is honoured before each page and
    /// each detail fetch; whatever was gathered so far is returned with
    /// `cancelled` set.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::InvalidPageRange`] if `page_from < 1`,
    ///   `page_from > page_to`, or the range exceeds the configured span.
    /// - [`PipelineError::InvalidListingUrl`] if `site_url` is not an
    ///   absolute URL.
    /// - [`PipelineError::CategoryNotFound`] if the target category does
    ///   not exist.
    /// - [`PipelineError::Store`] if the category lookup itself fails.
    pub async fn preview_scrape(
        &self,
        request: &PreviewRequest,
        cancel: &CancellationToken,
    ) -> Result<PreviewReport, PipelineError> {
        self.validate_range(request)?;
        build_page_url(&request.site_url, request.page_from)
            .map_err(PipelineError::InvalidListingUrl)?;
        if self
            .categories
            .find_category(request.category_id)
            .await?
            .is_none()
        {
            return Err(PipelineError::CategoryNotFound(request.category_id));
        }

        let origin = self
            .options
            .site_origin
            .clone()
            .unwrap_or_else(|| extract_site_origin(&request.site_url));

        transition(&PipelineState::Idle);
        let mut report = PreviewReport::default();

        for page in request.page_from..=request.page_to {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            transition(&PipelineState::Fetching { page });
            let page_url = build_page_url(&request.site_url, page)
                .map_err(PipelineError::InvalidListingUrl)?;
            let markup = match self.fetch_with_retry(&page_url).await {
                Ok(markup) => markup,
                Err(e) => {
                    tracing::warn!(page, url = %page_url, error = %e, "listing page fetch failed");
                    report.errors.push(ItemError::new(page_url, e.to_string()));
                    report.pages_failed += 1;
                    continue;
                }
            };
            report.pages_fetched += 1;

            transition(&PipelineState::Parsing { page });
            let stubs = dedupe_stubs(parse_listing(&markup, &origin));
            tracing::debug!(page, stubs = stubs.len(), "listing page parsed");

            for outcome in self.scrape_details(stubs, request.category_id, cancel).await {
                match outcome {
                    DetailOutcome::Candidate(candidate) => report.candidates.push(*candidate),
                    DetailOutcome::Failed(error) => report.errors.push(error),
                    DetailOutcome::Cancelled => report.cancelled = true,
                }
            }
            if report.cancelled {
                break;
            }
        }

        transition(&PipelineState::Aggregating);
        tracing::info!(
            candidates = report.candidates.len(),
            errors = report.errors.len(),
            pages_fetched = report.pages_fetched,
            pages_failed = report.pages_failed,
            cancelled = report.cancelled,
            "preview finished"
        );
        Ok(report)
    }

    /// Imports `candidates` into `category_id`, downloading their images.
    ///
    /// # Errors
    ///
    /// See [`Importer::commit_import`].
    pub async fn import_candidates(
        &self,
        catalog: &dyn CatalogStore,
        images: &dyn ImageStore,
        category_id: i32,
        candidates: &[ScrapedCandidate],
        cancel: &CancellationToken,
    ) -> Result<ImportSummary, ImportError> {
        Importer::new(
            self.client,
            self.categories,
            catalog,
            images,
            ImportOptions::from(&self.options),
        )
        .commit_import(category_id, candidates, cancel)
        .await
    }

    fn validate_range(&self, request: &PreviewRequest) -> Result<(), PipelineError> {
        let invalid = |reason: String| PipelineError::InvalidPageRange {
            from: request.page_from,
            to: request.page_to,
            reason,
        };

        if request.page_from < 1 {
            return Err(invalid("pages are numbered from 1".to_owned()));
        }
        if request.page_from > request.page_to {
            return Err(invalid("first page is after last page".to_owned()));
        }
        let span = request.page_to - request.page_from + 1;
        if span > self.options.max_page_span {
            return Err(invalid(format!(
                "{span} pages requested, at most {} allowed",
                self.options.max_page_span
            )));
        }
        Ok(())
    }

    /// Fetches and parses detail pages for one listing page's stubs.
    ///
    /// Results come back in stub order regardless of concurrency. Fetch
    /// starts are paced through one shared interval, so consecutive requests
    /// are at least `inter_request_delay` apart even when several are in
    /// flight.
    async fn scrape_details(
        &self,
        stubs: Vec<ProductStub>,
        category_id: i32,
        cancel: &CancellationToken,
    ) -> Vec<DetailOutcome> {
        let pacer = detail_pacer(self.options.inter_request_delay);
        let pacer = pacer.as_ref();

        stream::iter(stubs)
            .map(|stub| async move {
                if let Some(pacer) = pacer {
                    pacer.lock().await.tick().await;
                }
                if cancel.is_cancelled() {
                    return DetailOutcome::Cancelled;
                }
                self.scrape_detail(stub, category_id).await
            })
            .buffered(self.options.detail_concurrency.max(1))
            .collect()
            .await
    }

    async fn scrape_detail(&self, stub: ProductStub, category_id: i32) -> DetailOutcome {
        transition(&PipelineState::FetchingDetail {
            url: stub.detail_url.clone(),
        });
        let markup = match self.fetch_with_retry(&stub.detail_url).await {
            Ok(markup) => markup,
            Err(e) => {
                tracing::warn!(url = %stub.detail_url, error = %e, "detail page fetch failed");
                return DetailOutcome::Failed(ItemError::new(stub.detail_url, e.to_string()));
            }
        };

        transition(&PipelineState::ParsingDetail {
            url: stub.detail_url.clone(),
        });
        let detail = parse_detail(&markup, &stub.detail_url, &stub.display_name);
        DetailOutcome::Candidate(Box::new(assemble_candidate(stub, detail, category_id)))
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<String, ScraperError> {
        retry_with_backoff(
            self.options.max_retries,
            self.options.retry_backoff_base_secs,
            || self.client.fetch_markup(url),
        )
        .await
    }
}

/// Shared start-of-fetch ticker; `None` when no delay is configured. The
/// first tick completes immediately.
fn detail_pacer(delay: Duration) -> Option<Mutex<Interval>> {
    if delay.is_zero() {
        return None;
    }
    let mut interval = tokio::time::interval(delay);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(Mutex::new(interval))
}

/// Drops repeated detail URLs within one page, keeping the first card.
fn dedupe_stubs(stubs: Vec<ProductStub>) -> Vec<ProductStub> {
    let mut seen = HashSet::new();
    let mut unique: Vec<ProductStub> = Vec::with_capacity(stubs.len());
    for stub in stubs {
        if seen.insert(stub.detail_url.clone()) {
            unique.push(stub);
        } else if let Some(first) = unique.iter_mut().find(|s| s.detail_url == stub.detail_url) {
            tracing::debug!(url = %stub.detail_url, "duplicate listing card dropped");
            first
                .notes
                .push("duplicate listing card for this product was dropped".to_owned());
        }
    }
    unique
}

/// Combines a listing stub and its parsed detail page into a candidate.
///
/// Name and price come from the stub; everything else from the detail page.
/// Notes from both are kept, stub notes first.
pub(crate) fn assemble_candidate(
    stub: ProductStub,
    detail: DetailParse,
    category_id: i32,
) -> ScrapedCandidate {
    let mut errors = stub.notes;
    errors.extend(detail.errors);

    ScrapedCandidate {
        name: stub.display_name,
        brand: detail.brand,
        price: stub.list_price,
        description: detail.description,
        specs: detail.specs,
        category_id,
        remote_image_urls: detail.image_urls,
        errors,
        source_url: Some(stub.detail_url),
        stock_quantity: 0,
    }
}
