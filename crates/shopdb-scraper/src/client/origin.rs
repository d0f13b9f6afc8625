//! URL helpers for listing pagination and link resolution.

use reqwest::Url;

use crate::error::ScraperError;

/// Extracts the scheme+host origin from a listing URL.
///
/// Given `"https://catalog.onliner.by/mobile?page=2"`, returns
/// `"https://catalog.onliner.by"`.
#[must_use]
pub fn extract_site_origin(site_url: &str) -> String {
    Url::parse(site_url).map_or_else(
        |e| {
            tracing::warn!(
                site_url,
                error = %e,
                "could not parse site URL; falling back to string split for origin extraction"
            );
            site_url
                .trim_end_matches('/')
                .splitn(4, '/')
                .take(3)
                .collect::<Vec<_>>()
                .join("/")
        },
        |u| u.origin().ascii_serialization(),
    )
}

/// Builds the URL of listing page `page` by appending a `page` query pair.
///
/// Existing query parameters (filters, sort order) are kept; a `page`
/// parameter already present in `base_url` is replaced.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] if `base_url` is not an absolute URL.
pub fn build_page_url(base_url: &str, page: u32) -> Result<String, ScraperError> {
    let mut url = Url::parse(base_url).map_err(|e| ScraperError::InvalidUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ScraperError::InvalidUrl {
            url: base_url.to_owned(),
            reason: "not a hierarchical http(s) URL".to_owned(),
        });
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("page", &page.to_string());
    Ok(url.to_string())
}

/// Resolves `href` against `base`. Absolute links are returned as-is.
///
/// Returns `None` for blank links or links that cannot be joined.
#[must_use]
pub fn resolve_link(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_owned());
    }
    Url::parse(base)
        .and_then(|b| b.join(href))
        .ok()
        .map(|u| u.to_string())
}

/// Extracts the hostname from a URL for use in error messages.
///
/// Falls back to the full URL string if parsing fails.
pub(super) fn extract_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}
