//! Database operations for `categories`, `products`, and `images`, plus the
//! Postgres-backed implementation of the import collaborator traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use shopdb_core::{
    CatalogStore, Category, CategoryLookup, NewProduct, OwnerType, SpecTable, StoreError,
};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `categories` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i32,
    pub name: String,
    pub description: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            description: row.description,
        }
    }
}

/// A row from the `products` table.
///
/// `specs` is the raw JSONB column; decode with [`specs_from_json`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub category_id: i32,
    pub name: String,
    pub brand: String,
    pub price: Decimal,
    pub description: String,
    pub specs: Value,
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `images` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImageRow {
    pub id: i64,
    /// See [`OwnerType::as_db_value`].
    pub owner_type: i32,
    pub owner_id: i64,
    pub url: String,
    pub alt_text: Option<String>,
    pub position: i32,
}

// ---------------------------------------------------------------------------
// specs encoding
// ---------------------------------------------------------------------------

/// Encodes a spec table as a JSON array of `[key, value]` pairs.
///
/// JSONB normalizes object key order, so an object would lose the table's
/// document order on the way back out.
#[must_use]
pub fn specs_to_json(specs: &SpecTable) -> Value {
    Value::Array(
        specs
            .iter()
            .map(|(k, v)| Value::Array(vec![Value::from(k), Value::from(v)]))
            .collect(),
    )
}

/// Decodes a stored `specs` column.
///
/// Accepts the pair-array form written by [`specs_to_json`] and, for rows
/// written by other tools, a plain JSON object. Non-string values are kept
/// in their JSON text form; anything else yields an empty table.
#[must_use]
pub fn specs_from_json(value: &Value) -> SpecTable {
    fn text(v: &Value) -> String {
        match v {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    match value {
        Value::Array(pairs) => pairs
            .iter()
            .filter_map(|pair| match pair.as_array()?.as_slice() {
                [k, v] => Some((text(k), text(v))),
                _ => None,
            })
            .collect(),
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), text(v))).collect(),
        _ => SpecTable::new(),
    }
}

// ---------------------------------------------------------------------------
// categories operations
// ---------------------------------------------------------------------------

/// Returns all categories ordered by `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, description FROM categories ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns the category with `id`, if it exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_category(pool: &PgPool, id: i32) -> Result<Option<CategoryRow>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, description FROM categories WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

// ---------------------------------------------------------------------------
// products operations
// ---------------------------------------------------------------------------

/// Returns the id of a product with exactly this `name` and `brand`.
///
/// Matching is case-sensitive and ignores category.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_product_id(
    pool: &PgPool,
    name: &str,
    brand: &str,
) -> Result<Option<i64>, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM products WHERE name = $1 AND brand = $2 ORDER BY id LIMIT 1",
    )
    .bind(name)
    .bind(brand)
    .fetch_optional(pool)
    .await?;
    Ok(id)
}

/// Inserts a product and its image rows.
///
/// Everything runs inside one transaction; if any image row fails the
/// product row is rolled back too.
///
/// Returns the new product `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails.
pub async fn insert_product(pool: &PgPool, product: &NewProduct) -> Result<i64, DbError> {
    let mut tx = pool.begin().await?;

    let product_id: i64 = sqlx::query_scalar(
        "INSERT INTO products \
             (category_id, name, brand, price, description, specs, stock_quantity) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id",
    )
    .bind(product.category_id)
    .bind(&product.name)
    .bind(&product.brand)
    .bind(product.price)
    .bind(&product.description)
    .bind(Json(specs_to_json(&product.specs)))
    .bind(product.stock_quantity)
    .fetch_one(&mut *tx)
    .await?;

    for image in &product.images {
        sqlx::query(
            "INSERT INTO images (owner_type, owner_id, url, alt_text, position) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(OwnerType::Product.as_db_value())
        .bind(product_id)
        .bind(&image.url)
        .bind(&image.alt_text)
        .bind(image.position)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(product_id)
}

/// Returns the product with `id`, if it exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, category_id, name, brand, price, description, specs, stock_quantity, \
                created_at, updated_at \
         FROM products WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Returns a product's images ordered by `position`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_product_images(pool: &PgPool, product_id: i64) -> Result<Vec<ImageRow>, DbError> {
    let rows = sqlx::query_as::<_, ImageRow>(
        "SELECT id, owner_type, owner_id, url, alt_text, position \
         FROM images \
         WHERE owner_type = $1 AND owner_id = $2 \
         ORDER BY position",
    )
    .bind(OwnerType::Product.as_db_value())
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Trait implementations
// ---------------------------------------------------------------------------

/// Postgres-backed catalog used by the import pipeline.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryLookup for PgCatalog {
    async fn find_category(&self, id: i32) -> Result<Option<Category>, StoreError> {
        Ok(get_category(&self.pool, id).await?.map(Category::from))
    }
}

#[async_trait]
impl CatalogStore for PgCatalog {
    async fn find_product_by_name_and_brand(
        &self,
        name: &str,
        brand: &str,
    ) -> Result<Option<i64>, StoreError> {
        Ok(find_product_id(&self.pool, name, brand).await?)
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<i64, StoreError> {
        Ok(self::insert_product(&self.pool, product).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn specs_encode_as_ordered_pairs() {
        let specs: SpecTable = [("Цвет", "Чорны"), ("Вес", "213 г")].into_iter().collect();
        assert_eq!(
            specs_to_json(&specs),
            json!([["Цвет", "Чорны"], ["Вес", "213 г"]])
        );
    }

    #[test]
    fn specs_decode_preserves_pair_order() {
        let value = json!([["Я", "1"], ["А", "2"]]);
        let specs = specs_from_json(&value);
        assert_eq!(specs.keys().collect::<Vec<_>>(), vec!["Я", "А"]);
    }

    #[test]
    fn specs_decode_tolerates_objects_and_non_string_values() {
        let specs = specs_from_json(&json!({"NFC": true, "Вес": 213, "Цвет": null}));
        assert_eq!(specs.get("NFC"), Some("true"));
        assert_eq!(specs.get("Вес"), Some("213"));
        assert_eq!(specs.get("Цвет"), Some(""));
    }

    #[test]
    fn malformed_specs_decode_to_empty_table() {
        assert!(specs_from_json(&json!("oops")).is_empty());
        assert_eq!(specs_from_json(&json!([["only-key"], ["k", "v"]])).len(), 1);
    }
}
