//! Structural markers for the retail site's listing and detail markup.
//!
//! Matching is by class-attribute substring, not full schema, so extra
//! classes and wrapper elements do not break extraction. When the site's
//! layout changes, this is the only file that should need an update.

use std::sync::LazyLock;

use scraper::Selector;

/// One product card on a listing page.
pub const LISTING_CARD: &str = "div[class*='catalog-form__offers-item_primary']";

/// Link to the detail page inside a card.
pub const CARD_LINK: &str = "a[class*='catalog-form__preview']";

/// Product name link inside a card heading.
pub const CARD_NAME: &str = "h3[class*='catalog-form__description'] a";

/// Price spans inside a card. The last match is the offer price; earlier
/// spans hold per-unit prices and labels.
pub const CARD_PRICE: &str = "a[class*='catalog-form__link_huge-additional'] span";

/// Any table row on a detail page; specification tables carry no stable class.
pub const SPEC_ROW: &str = "tr";

/// Image inside a detail-page carousel slide.
pub const CAROUSEL_IMAGE: &str = "div[class*='swiper-wrapper'] div[class*='swiper-slide'] img";

/// Localized label the description row's first cell starts with.
pub const DESCRIPTION_LABEL: &str = "Описание";

/// "Read more" link text appended to truncated descriptions.
pub const READ_MORE_SUFFIX: &str = "Читать дальше";

fn compile(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

pub(crate) static LISTING_CARD_SEL: LazyLock<Selector> = LazyLock::new(|| compile(LISTING_CARD));
pub(crate) static CARD_LINK_SEL: LazyLock<Selector> = LazyLock::new(|| compile(CARD_LINK));
pub(crate) static CARD_NAME_SEL: LazyLock<Selector> = LazyLock::new(|| compile(CARD_NAME));
pub(crate) static CARD_PRICE_SEL: LazyLock<Selector> = LazyLock::new(|| compile(CARD_PRICE));
pub(crate) static SPEC_ROW_SEL: LazyLock<Selector> = LazyLock::new(|| compile(SPEC_ROW));
pub(crate) static CAROUSEL_IMAGE_SEL: LazyLock<Selector> =
    LazyLock::new(|| compile(CAROUSEL_IMAGE));
