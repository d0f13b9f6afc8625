//! In-memory collaborators shared by the pipeline and import tests.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use shopdb_core::{
    CatalogStore, Category, CategoryLookup, ImageStore, NewProduct, StoreError,
};
use shopdb_scraper::CatalogClient;
use tokio_util::sync::CancellationToken;
use wiremock::{Request, Respond, ResponseTemplate};

pub fn test_client() -> CatalogClient {
    CatalogClient::new(5, "shopdb-test/0.1").expect("failed to build test CatalogClient")
}

/// Responds with `response` and cancels `token` while doing so, so the run
/// sees the cancellation right after this request completes.
pub struct CancelWhileResponding {
    pub token: CancellationToken,
    pub response: ResponseTemplate,
}

impl Respond for CancelWhileResponding {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.token.cancel();
        self.response.clone()
    }
}

pub struct FakeCategories {
    categories: Vec<Category>,
}

impl FakeCategories {
    pub fn with_ids(ids: &[i32]) -> Self {
        Self {
            categories: ids
                .iter()
                .map(|&id| Category {
                    id,
                    name: format!("Category {id}"),
                    description: String::new(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl CategoryLookup for FakeCategories {
    async fn find_category(&self, id: i32) -> Result<Option<Category>, StoreError> {
        Ok(self.categories.iter().find(|c| c.id == id).cloned())
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    pub products: Mutex<Vec<(i64, NewProduct)>>,
    /// Product names whose insert fails.
    pub reject_names: Vec<String>,
}

impl FakeCatalog {
    pub fn rejecting(names: &[&str]) -> Self {
        Self {
            products: Mutex::default(),
            reject_names: names.iter().map(|n| (*n).to_owned()).collect(),
        }
    }

    pub fn stored(&self) -> Vec<NewProduct> {
        self.products
            .lock()
            .unwrap()
            .iter()
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl CatalogStore for FakeCatalog {
    async fn find_product_by_name_and_brand(
        &self,
        name: &str,
        brand: &str,
    ) -> Result<Option<i64>, StoreError> {
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .find(|(_, p)| p.name == name && p.brand == brand)
            .map(|(id, _)| *id))
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<i64, StoreError> {
        if self.reject_names.contains(&product.name) {
            return Err(StoreError::Database(format!(
                "insert rejected for {}",
                product.name
            )));
        }
        let mut products = self.products.lock().unwrap();
        let id = i64::try_from(products.len()).unwrap() + 1;
        products.push((id, product.clone()));
        Ok(id)
    }
}

#[derive(Default)]
pub struct FakeImageStore {
    /// `(stored_url, byte_len)` in save order.
    pub saved: Mutex<Vec<(String, usize)>>,
    pub discarded: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageStore for FakeImageStore {
    async fn save_bytes(
        &self,
        bytes: &[u8],
        suggested_extension: &str,
    ) -> Result<String, StoreError> {
        let mut saved = self.saved.lock().unwrap();
        let url = format!("/uploads/img-{}.{suggested_extension}", saved.len());
        saved.push((url.clone(), bytes.len()));
        Ok(url)
    }

    async fn discard(&self, stored_url: &str) -> Result<(), StoreError> {
        self.discarded.lock().unwrap().push(stored_url.to_owned());
        Ok(())
    }
}

/// A listing page with one card per `(href, name, price)`.
pub fn listing_page(cards: &[(&str, &str, &str)]) -> String {
    let cards: String = cards
        .iter()
        .map(|(href, name, price)| {
            format!(
                r#"<div class="catalog-form__offers-item catalog-form__offers-item_primary">
                     <a class="catalog-form__preview" href="{href}"><img src="thumb.jpg"></a>
                     <h3 class="catalog-form__description"><a href="{href}">{name}</a></h3>
                     <a class="catalog-form__link catalog-form__link_huge-additional" href="{href}/prices">
                       <span>от</span><span>{price}</span>
                     </a>
                   </div>"#
            )
        })
        .collect();
    format!("<html><body><div class=\"catalog-form__offers\">{cards}</div></body></html>")
}

/// A detail page with the given spec rows and carousel image sources.
pub fn detail_page(rows: &[(&str, &str)], images: &[&str]) -> String {
    let rows: String = rows
        .iter()
        .map(|(k, v)| format!("<tr><td>{k}</td><td>{v}</td></tr>"))
        .collect();
    let slides: String = images
        .iter()
        .map(|src| format!(r#"<div class="swiper-slide"><img src="{src}"></div>"#))
        .collect();
    format!(
        r#"<html><body>
             <div class="swiper-container"><div class="swiper-wrapper">{slides}</div></div>
             <table><tbody>{rows}</tbody></table>
           </body></html>"#
    )
}
