//! Commit phase: duplicate check, image download, product insert.

use reqwest::Url;
use shopdb_core::{
    CatalogStore, CategoryLookup, ImageStore, ImportSummary, ItemError, NewImage,
    NewProduct, ScrapedCandidate,
};
use tokio_util::sync::CancellationToken;

use crate::client::CatalogClient;
use crate::error::ImportError;
use crate::pipeline::PipelineOptions;
use crate::rate_limit::retry_with_backoff;

/// Extensions kept when deriving a stored filename from an image URL.
const KNOWN_IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    /// Used when an image URL has no recognizable extension.
    pub default_extension: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_backoff_base_secs: 2,
            default_extension: "webp".to_owned(),
        }
    }
}

impl From<&PipelineOptions> for ImportOptions {
    fn from(options: &PipelineOptions) -> Self {
        Self {
            max_retries: options.max_retries,
            retry_backoff_base_secs: options.retry_backoff_base_secs,
            ..Self::default()
        }
    }
}

/// Writes reviewed candidates into the catalog.
///
/// Existing products are never updated: a candidate whose `(name, brand)`
/// already exists is skipped. Brand is the only disambiguator, so two
/// different products sharing a name and brand collapse into one.
pub struct Importer<'a> {
    client: &'a CatalogClient,
    categories: &'a dyn CategoryLookup,
    catalog: &'a dyn CatalogStore,
    images: &'a dyn ImageStore,
    options: ImportOptions,
}

impl<'a> Importer<'a> {
    #[must_use]
    pub fn new(
        client: &'a CatalogClient,
        categories: &'a dyn CategoryLookup,
        catalog: &'a dyn CatalogStore,
        images: &'a dyn ImageStore,
        options: ImportOptions,
    ) -> Self {
        Self {
            client,
            categories,
            catalog,
            images,
            options,
        }
    }

    /// Imports `candidates` in order into `category_id`.
    ///
    /// Each candidate's own `category_id` is ignored in favour of the
    /// argument. Per-candidate failures (lookup, download, insert) are
    /// collected in [`ImportSummary::per_item_errors`] and never stop the
    /// batch. Cancellation is checked between candidates.
    ///
    /// # Errors
    ///
    /// - [`ImportError::CategoryNotFound`] if `category_id` does not exist.
    /// - [`ImportError::Store`] if the category lookup fails.
    pub async fn commit_import(
        &self,
        category_id: i32,
        candidates: &[ScrapedCandidate],
        cancel: &CancellationToken,
    ) -> Result<ImportSummary, ImportError> {
        if self.categories.find_category(category_id).await?.is_none() {
            return Err(ImportError::CategoryNotFound(category_id));
        }

        let mut summary = ImportSummary::default();

        for candidate in candidates {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                tracing::info!("import cancelled; remaining candidates left untouched");
                break;
            }
            self.import_one(category_id, candidate, &mut summary).await;
        }

        tracing::info!(
            category_id,
            imported = summary.imported_count,
            skipped = summary.skipped_count,
            errors = summary.per_item_errors.len(),
            cancelled = summary.cancelled,
            "import finished"
        );
        Ok(summary)
    }

    async fn import_one(
        &self,
        category_id: i32,
        candidate: &ScrapedCandidate,
        summary: &mut ImportSummary,
    ) {
        let brand = candidate.effective_brand();

        match self
            .catalog
            .find_product_by_name_and_brand(&candidate.name, brand)
            .await
        {
            Ok(Some(existing_id)) => {
                tracing::debug!(
                    name = %candidate.name,
                    brand,
                    existing_id,
                    "product already in catalog; skipping"
                );
                summary.skipped_count += 1;
                return;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(name = %candidate.name, error = %e, "duplicate check failed");
                summary.per_item_errors.push(ItemError::new(
                    &candidate.name,
                    format!("duplicate check failed: {e}"),
                ));
                return;
            }
        }

        let images = self
            .store_images(candidate, &mut summary.per_item_errors)
            .await;

        let product = NewProduct {
            category_id,
            name: candidate.name.clone(),
            brand: brand.to_owned(),
            price: candidate.price,
            description: candidate.description.clone(),
            specs: candidate.specs.clone(),
            stock_quantity: candidate.stock_quantity,
            images,
        };

        match self.catalog.insert_product(&product).await {
            Ok(product_id) => {
                tracing::debug!(
                    product_id,
                    name = %product.name,
                    images = product.images.len(),
                    "product imported"
                );
                summary.imported_count += 1;
            }
            Err(e) => {
                tracing::warn!(name = %product.name, error = %e, "product insert failed");
                summary.per_item_errors.push(ItemError::new(
                    &product.name,
                    format!("insert failed: {e}"),
                ));
                self.discard_images(&product.images).await;
            }
        }
    }

    /// Downloads and stores each remote image in order.
    ///
    /// Positions count successful stores only, so they stay gap-free when
    /// some downloads fail.
    async fn store_images(
        &self,
        candidate: &ScrapedCandidate,
        errors: &mut Vec<ItemError>,
    ) -> Vec<NewImage> {
        let mut stored = Vec::new();

        for url in candidate
            .remote_image_urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
        {
            let bytes = match retry_with_backoff(
                self.options.max_retries,
                self.options.retry_backoff_base_secs,
                || self.client.fetch_bytes(url),
            )
            .await
            {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(url, error = %e, "image download failed");
                    errors.push(ItemError::new(url, format!("image download failed: {e}")));
                    continue;
                }
            };

            let extension = image_extension(url, &self.options.default_extension);
            match self.images.save_bytes(&bytes, &extension).await {
                Ok(stored_url) => {
                    let position = i32::try_from(stored.len()).unwrap_or(i32::MAX);
                    stored.push(NewImage {
                        url: stored_url,
                        alt_text: Some(candidate.name.clone()),
                        position,
                    });
                }
                Err(e) => {
                    tracing::warn!(url, error = %e, "image store failed");
                    errors.push(ItemError::new(url, format!("image store failed: {e}")));
                }
            }
        }

        stored
    }

    async fn discard_images(&self, images: &[NewImage]) {
        for image in images {
            if let Err(e) = self.images.discard(&image.url).await {
                tracing::warn!(url = %image.url, error = %e, "failed to discard stored image");
            }
        }
    }
}

/// Lowercased extension of the URL's last path segment when it is a known
/// image type, otherwise `default`.
pub(crate) fn image_extension(url: &str, default: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            let file = parsed.path_segments()?.next_back()?.to_owned();
            let (_, ext) = file.rsplit_once('.')?;
            let ext = ext.to_ascii_lowercase();
            KNOWN_IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
        })
        .unwrap_or_else(|| default.to_owned())
}
