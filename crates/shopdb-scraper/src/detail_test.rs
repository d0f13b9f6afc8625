use super::*;

const URL: &str = "https://catalog.onliner.by/mobile/samsung/a55";

fn spec_table(rows: &[(&str, Option<&str>)]) -> String {
    let body: String = rows
        .iter()
        .map(|(k, v)| match v {
            Some(v) => format!("<tr><td>{k}</td><td>{v}</td></tr>"),
            None => format!("<tr><td>{k}</td></tr>"),
        })
        .collect();
    format!(r#"<table class="product-specs__table"><tbody>{body}</tbody></table>"#)
}

fn carousel(images: &[&str]) -> String {
    let slides: String = images
        .iter()
        .map(|attrs| format!(r#"<div class="swiper-slide"><img {attrs}></div>"#))
        .collect();
    format!(r#"<div class="product-gallery"><div class="swiper-wrapper">{slides}</div></div>"#)
}

fn detail_page(table: &str, gallery: &str) -> String {
    format!("<html><body><h1>Samsung Galaxy A55</h1>{gallery}{table}</body></html>")
}

// -----------------------------------------------------------------------
// description + specs
// -----------------------------------------------------------------------

#[test]
fn description_row_is_extracted_and_removed_from_specs() {
    let html = detail_page(
        &spec_table(&[
            ("Цвет", Some("Чорны")),
            ("Описание товара", Some("text Читать дальше")),
        ]),
        &carousel(&[r#"src="/img/1.jpeg""#]),
    );

    let parsed = parse_detail(&html, URL, "Samsung Galaxy A55");

    assert_eq!(parsed.description, "text");
    assert_eq!(parsed.specs.len(), 1);
    assert_eq!(parsed.specs.get("Цвет"), Some("Чорны"));
    assert!(parsed.specs.keys().all(|k| !k.starts_with("Описание")));
}

#[test]
fn single_cell_description_row_uses_key_text() {
    let html = detail_page(
        &spec_table(&[
            ("Описание Смартфон с AMOLED-экраном Читать дальше", None),
            ("Диагональ", Some("6.6\"")),
        ]),
        "",
    );

    let parsed = parse_detail(&html, URL, "Samsung Galaxy A55");

    assert_eq!(parsed.description, "Описание Смартфон с AMOLED-экраном");
    assert_eq!(parsed.specs.keys().collect::<Vec<_>>(), vec!["Диагональ"]);
}

#[test]
fn missing_description_row_leaves_empty_description_with_note() {
    let html = detail_page(&spec_table(&[("Цвет", Some("Чорны"))]), "");
    let parsed = parse_detail(&html, URL, "Samsung Galaxy A55");
    assert_eq!(parsed.description, "");
    assert!(parsed.errors.iter().any(|e| e.contains("description")));
}

#[test]
fn specs_keep_document_order_and_trim_cells() {
    let html = detail_page(
        &spec_table(&[
            ("Экран", Some("  6.6\"\n   AMOLED  ")),
            ("Память", Some("8 ГБ")),
            ("Аккумулятор", Some("5000 мА·ч")),
        ]),
        "",
    );
    let parsed = parse_detail(&html, URL, "Samsung Galaxy A55");
    let pairs: Vec<_> = parsed.specs.iter().collect();
    assert_eq!(
        pairs,
        vec![
            ("Экран", "6.6\"\n   AMOLED"),
            ("Память", "8 ГБ"),
            ("Аккумулятор", "5000 мА·ч"),
        ]
    );
}

#[test]
fn keys_differing_in_inner_whitespace_stay_distinct() {
    let html = detail_page(
        &spec_table(&[
            ("Цвет  корпуса", Some("Чорны")),
            ("Цвет корпуса", Some("Белы")),
        ]),
        "",
    );
    let parsed = parse_detail(&html, URL, "Samsung Galaxy A55");
    let pairs: Vec<_> = parsed.specs.iter().collect();
    assert_eq!(
        pairs,
        vec![("Цвет  корпуса", "Чорны"), ("Цвет корпуса", "Белы")]
    );
}

#[test]
fn multi_paragraph_description_keeps_line_breaks() {
    let html = detail_page(
        &spec_table(&[("Описание", Some("Абзац один.\n\nАбзац два. Читать дальше"))]),
        "",
    );
    let parsed = parse_detail(&html, URL, "Samsung Galaxy A55");
    assert_eq!(parsed.description, "Абзац один.\n\nАбзац два.");
}

#[test]
fn repeated_spec_key_keeps_first_position_and_last_value() {
    let html = detail_page(
        &spec_table(&[
            ("Цвет", Some("Чорны")),
            ("Вес", Some("213 г")),
            ("Цвет", Some("Белы")),
        ]),
        "",
    );
    let parsed = parse_detail(&html, URL, "Samsung Galaxy A55");
    let pairs: Vec<_> = parsed.specs.iter().collect();
    assert_eq!(pairs, vec![("Цвет", "Белы"), ("Вес", "213 г")]);
}

#[test]
fn blank_keys_are_skipped_and_missing_values_are_empty() {
    let html = detail_page(
        &spec_table(&[("   ", Some("orphan")), ("NFC", None)]),
        "",
    );
    let parsed = parse_detail(&html, URL, "Samsung Galaxy A55");
    assert_eq!(parsed.specs.len(), 1);
    assert_eq!(parsed.specs.get("NFC"), Some(""));
}

// -----------------------------------------------------------------------
// images
// -----------------------------------------------------------------------

#[test]
fn carousel_images_are_absolute_ordered_and_unique() {
    let html = detail_page(
        "",
        &carousel(&[
            r#"src="https://imgproxy.onliner.by/a.jpeg""#,
            r#"src="/img/b.png""#,
            r#"src="https://imgproxy.onliner.by/a.jpeg""#,
        ]),
    );
    let parsed = parse_detail(&html, URL, "Samsung Galaxy A55");
    assert_eq!(
        parsed.image_urls,
        vec![
            "https://imgproxy.onliner.by/a.jpeg".to_owned(),
            "https://catalog.onliner.by/img/b.png".to_owned(),
        ]
    );
}

#[test]
fn lazy_loaded_image_falls_back_to_data_src() {
    let html = detail_page(
        "",
        &carousel(&[r#"src="" data-src="https://imgproxy.onliner.by/lazy.webp""#]),
    );
    let parsed = parse_detail(&html, URL, "Samsung Galaxy A55");
    assert_eq!(
        parsed.image_urls,
        vec!["https://imgproxy.onliner.by/lazy.webp".to_owned()]
    );
}

#[test]
fn images_outside_carousel_are_ignored() {
    let html = format!(
        r#"<html><body><img src="/logo.svg">{}</body></html>"#,
        carousel(&[r#"src="/img/1.jpeg""#])
    );
    let parsed = parse_detail(&html, URL, "Samsung Galaxy A55");
    assert_eq!(parsed.image_urls.len(), 1);
    assert!(parsed.image_urls[0].ends_with("/img/1.jpeg"));
}

#[test]
fn page_without_carousel_notes_missing_images() {
    let html = detail_page(&spec_table(&[("Описание", Some("x"))]), "");
    let parsed = parse_detail(&html, URL, "Samsung Galaxy A55");
    assert!(parsed.image_urls.is_empty());
    assert!(parsed.errors.iter().any(|e| e.contains("no carousel images")));
}

// -----------------------------------------------------------------------
// brand
// -----------------------------------------------------------------------

#[test]
fn brand_comes_from_second_path_segment() {
    let mut errors = Vec::new();
    assert_eq!(
        extract_brand("https://catalog.onliner.by/mobile/samsung/a55", "Galaxy A55", &mut errors),
        "Samsung"
    );
    assert!(errors.is_empty());
}

#[test]
fn brand_from_non_latin_path_segment_is_capitalized() {
    let mut errors = Vec::new();
    assert_eq!(
        extract_brand("https://catalog.onliner.by/fridge/атлант/xm4208", "", &mut errors),
        "Атлант"
    );
}

#[test]
fn brand_falls_back_to_first_capitalized_name_token() {
    let mut errors = Vec::new();
    assert_eq!(
        extract_brand("https://catalog.onliner.by/mobile", "смартфон X Xiaomi Redmi", &mut errors),
        "Xiaomi"
    );
    assert!(errors.iter().any(|e| e.contains("guessed")));
}

#[test]
fn brand_is_unknown_when_nothing_matches() {
    let mut errors = Vec::new();
    assert_eq!(
        extract_brand("https://catalog.onliner.by/", "a b c", &mut errors),
        UNKNOWN_BRAND
    );
    assert!(errors.iter().any(|e| e.contains("could not be determined")));
}

#[test]
fn brand_is_stable_for_same_inputs() {
    let mut a = Vec::new();
    let mut b = Vec::new();
    assert_eq!(
        extract_brand(URL, "Samsung Galaxy A55", &mut a),
        extract_brand(URL, "Samsung Galaxy A55", &mut b)
    );
}
