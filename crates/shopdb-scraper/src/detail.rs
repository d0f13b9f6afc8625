//! Detail-page parsing: brand, description, specification table, images.
//!
//! Nothing here fails. Every extraction step that falls back to a default
//! records a human-readable note in [`DetailParse::errors`] instead.

use std::collections::HashSet;

use percent_encoding::percent_decode_str;
use reqwest::Url;
use scraper::{ElementRef, Html};
use shopdb_core::{SpecTable, UNKNOWN_BRAND};

use crate::client::resolve_link;
use crate::listing::element_text;
use crate::selectors::{CAROUSEL_IMAGE_SEL, DESCRIPTION_LABEL, READ_MORE_SUFFIX, SPEC_ROW_SEL};

/// Everything extracted from one product detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailParse {
    pub brand: String,
    pub description: String,
    pub specs: SpecTable,
    pub image_urls: Vec<String>,
    pub errors: Vec<String>,
}

/// Parses a detail page fetched from `url`.
///
/// `fallback_name` is the listing-card name, used to guess a brand when the
/// URL does not carry one.
#[must_use]
pub fn parse_detail(markup: &str, url: &str, fallback_name: &str) -> DetailParse {
    let document = Html::parse_document(markup);
    let mut errors = Vec::new();

    let brand = extract_brand(url, fallback_name, &mut errors);

    let mut specs = extract_specs(&document);
    let description = take_description(&mut specs).unwrap_or_else(|| {
        errors.push("description row not found; description left empty".to_owned());
        String::new()
    });

    let image_urls = extract_image_urls(&document, url, &mut errors);
    if image_urls.is_empty() {
        errors.push("no carousel images found".to_owned());
    }

    DetailParse {
        brand,
        description,
        specs,
        image_urls,
        errors,
    }
}

/// Derives a brand from the product URL or, failing that, the product name.
///
/// 1. Second non-empty path segment of `url`, percent-decoded, first letter
///    uppercased (`/mobile/samsung/a55` → `Samsung`).
/// 2. First token of `name` longer than one character that starts with an
///    uppercase letter.
/// 3. [`UNKNOWN_BRAND`].
///
/// Pure: the same `(url, name)` always yields the same brand.
pub(crate) fn extract_brand(url: &str, name: &str, errors: &mut Vec<String>) -> String {
    if let Some(brand) = brand_from_url(url) {
        return brand;
    }

    if let Some(token) = name
        .split_whitespace()
        .find(|t| t.chars().count() > 1 && t.chars().next().is_some_and(char::is_uppercase))
    {
        errors.push(format!(
            "brand not present in URL path; guessed \"{token}\" from product name"
        ));
        return token.to_owned();
    }

    errors.push(format!("brand could not be determined; using \"{UNKNOWN_BRAND}\""));
    UNKNOWN_BRAND.to_owned()
}

fn brand_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .nth(1)?;
    let decoded = percent_decode_str(segment).decode_utf8_lossy();
    capitalize_first(&decoded)
}

fn capitalize_first(s: &str) -> Option<String> {
    let mut chars = s.chars();
    let first = chars.next()?;
    if first.is_whitespace() {
        return None;
    }
    Some(first.to_uppercase().chain(chars).collect())
}

/// Collects every two-column table row into an ordered table.
///
/// First cell is the key, second the value (empty when absent). Both are
/// trimmed only; inner whitespace and line breaks are kept. Rows with a
/// blank key are skipped. Repeated keys keep their first position and take
/// the last value.
fn extract_specs(document: &Html) -> SpecTable {
    let mut specs = SpecTable::new();
    for row in document.select(&SPEC_ROW_SEL) {
        let mut cells = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == "td");

        let Some(key_cell) = cells.next() else {
            continue;
        };
        let key = element_text(key_cell).trim().to_owned();
        if key.is_empty() {
            continue;
        }
        let value = cells
            .next()
            .map(|cell| element_text(cell).trim().to_owned())
            .unwrap_or_default();
        specs.insert(key, value);
    }
    specs
}

/// Removes the description row from `specs` and returns its text.
///
/// The row is the first key starting with [`DESCRIPTION_LABEL`]. Its value
/// holds the text; single-cell rows carry the text in the key itself. The
/// trailing "read more" link text is stripped either way.
fn take_description(specs: &mut SpecTable) -> Option<String> {
    let key = specs
        .find_key(|k| k.starts_with(DESCRIPTION_LABEL))?
        .to_owned();
    let value = specs.remove(&key).unwrap_or_default();

    let from_value = strip_read_more(&value);
    if from_value.is_empty() {
        Some(strip_read_more(&key))
    } else {
        Some(from_value)
    }
}

fn strip_read_more(text: &str) -> String {
    text.replace(READ_MORE_SUFFIX, "").trim().to_owned()
}

/// Collects carousel image sources in first-seen order without duplicates.
fn extract_image_urls(document: &Html, page_url: &str, errors: &mut Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for img in document.select(&CAROUSEL_IMAGE_SEL) {
        let src = ["src", "data-src"]
            .into_iter()
            .filter_map(|attr| img.value().attr(attr))
            .map(str::trim)
            .find(|s| !s.is_empty() && !s.starts_with("data:"));
        let Some(src) = src else {
            continue;
        };

        match resolve_link(page_url, src) {
            Some(absolute) => {
                if seen.insert(absolute.clone()) {
                    urls.push(absolute);
                }
            }
            None => errors.push(format!("could not resolve image URL \"{src}\"")),
        }
    }

    urls
}

#[cfg(test)]
#[path = "detail_test.rs"]
mod tests;
