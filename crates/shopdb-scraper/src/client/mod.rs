//! HTTP fetcher for retail listing pages, detail pages, and image assets.

mod origin;

use std::time::Duration;

use reqwest::Client;

use crate::error::ScraperError;

pub use origin::{build_page_url, extract_site_origin, resolve_link};
#[cfg(test)]
use origin::extract_domain;

/// Fetches raw markup and image bytes from the target site.
///
/// Every call is one fresh GET. Nothing is cached and nothing is retried
/// here; callers wrap calls in [`crate::rate_limit::retry_with_backoff`]
/// when their policy allows it. Non-2xx responses surface as typed errors.
pub struct CatalogClient {
    client: Client,
}

impl CatalogClient {
    /// Creates a `CatalogClient` with the configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches a listing or detail page and returns its body as text.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`]: HTTP 429.
    /// - [`ScraperError::NotFound`]: HTTP 404.
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx status.
    /// - [`ScraperError::Http`]: network, timeout, or TLS failure.
    pub async fn fetch_markup(&self, url: &str) -> Result<String, ScraperError> {
        let response = self
            .send(url, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .await?;
        Ok(response.text().await?)
    }

    /// Downloads a binary asset such as a product image.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch_markup`].
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ScraperError> {
        let response = self.send(url, "image/avif,image/webp,image/*,*/*;q=0.8").await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn send(&self, url: &str, accept: &str) -> Result<reqwest::Response, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, accept)
            .header(reqwest::header::ACCEPT_LANGUAGE, "ru-RU,ru;q=0.9,en;q=0.8")
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ScraperError::RateLimited {
                domain: origin::extract_domain(url),
                retry_after_secs,
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(response)
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
