//! Listing-page parsing: product cards to [`ProductStub`]s.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html};

use crate::client::resolve_link;
use crate::selectors::{CARD_LINK_SEL, CARD_NAME_SEL, CARD_PRICE_SEL, LISTING_CARD_SEL};

/// Currency markers stripped before numeric parsing, longest first so
/// `"руб."` is not half-eaten by `"р."`.
const CURRENCY_SUFFIXES: [&str; 4] = ["руб.", "р.", "BYN", "Br"];

/// Unsigned decimal with an optional fractional part, after cleanup.
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("valid regex"));

/// One product card from a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductStub {
    /// Absolute detail-page URL.
    pub detail_url: String,
    /// Card heading text; empty when the card has no name node.
    pub display_name: String,
    /// Offer price; `0` when missing or unparseable.
    pub list_price: Decimal,
    /// Non-fatal extraction notes for this card.
    pub notes: Vec<String>,
}

/// Extracts product stubs from one listing page, in card order.
///
/// Cards without a detail link are skipped silently. The result depends only
/// on `markup` and `origin`, so re-parsing the same page yields the same
/// stubs. A page with no recognizable cards yields an empty list.
///
/// Stubs are collected eagerly: the parsed document is not `Send` and must
/// not be held across the pipeline's await points.
#[must_use]
pub fn parse_listing(markup: &str, origin: &str) -> Vec<ProductStub> {
    let document = Html::parse_document(markup);
    document
        .select(&LISTING_CARD_SEL)
        .filter_map(|card| parse_card(card, origin))
        .collect()
}

fn parse_card(card: ElementRef<'_>, origin: &str) -> Option<ProductStub> {
    let href = card
        .select(&CARD_LINK_SEL)
        .next()
        .and_then(|a| a.value().attr("href"))?;
    let detail_url = resolve_link(origin, href)?;

    let mut notes = Vec::new();

    let display_name = card
        .select(&CARD_NAME_SEL)
        .next()
        .map(|a| element_text(a).trim().to_owned())
        .unwrap_or_default();
    if display_name.is_empty() {
        notes.push("product name missing on listing card".to_owned());
    }

    let list_price = match card.select(&CARD_PRICE_SEL).last() {
        Some(span) => {
            let raw = element_text(span);
            normalize_price(&raw).unwrap_or_else(|| {
                notes.push(format!(
                    "could not parse price \"{}\"; defaulting to 0",
                    raw.trim()
                ));
                Decimal::ZERO
            })
        }
        None => {
            notes.push("price missing on listing card; defaulting to 0".to_owned());
            Decimal::ZERO
        }
    };

    Some(ProductStub {
        detail_url,
        display_name,
        list_price,
        notes,
    })
}

/// Normalizes a display price such as `"1 234,56 р."` into a decimal.
///
/// Strips thousands separators (regular, non-breaking, and narrow
/// non-breaking spaces), currency suffixes, and converts a decimal comma to
/// a decimal point. Returns `None` when the remainder is not a non-negative
/// number.
#[must_use]
pub fn normalize_price(raw: &str) -> Option<Decimal> {
    let mut cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '\u{00A0}' | '\u{202F}' | '\u{2009}') && !c.is_whitespace())
        .collect();
    for suffix in CURRENCY_SUFFIXES {
        cleaned = cleaned.replace(suffix, "");
    }
    let cleaned = cleaned.replace(',', ".");
    if !PRICE_RE.is_match(&cleaned) {
        return None;
    }

    Decimal::from_str(&cleaned).ok()
}

/// Concatenated text of an element; entities are already decoded by the parser.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

#[cfg(test)]
#[path = "listing_test.rs"]
mod tests;
