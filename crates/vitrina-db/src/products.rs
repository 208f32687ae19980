//! Database operations for the `products` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.description, p.price, p.sale_price, p.image_url, \
     p.brand, p.external_link, p.category_id, c.name AS category_name, p.stock, p.created_at";

/// A row from the `products` table, with the category name joined in.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub brand: Option<String>,
    pub external_link: Option<String>,
    pub category_id: Option<i64>,
    /// `None` when the product is uncategorized.
    pub category_name: Option<String>,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new product row.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub brand: Option<String>,
    pub external_link: Option<String>,
    pub category_id: Option<i64>,
    pub stock: i32,
}

/// Sparse product update.
///
/// Outer `None` = "leave the column unchanged"; for nullable columns,
/// `Some(None)` = "explicitly clear" and `Some(Some(v))` = "set to value".
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<Decimal>,
    pub sale_price: Option<Option<Decimal>>,
    pub image_url: Option<Option<String>>,
    pub brand: Option<Option<String>>,
    pub external_link: Option<Option<String>>,
    pub category_id: Option<Option<i64>>,
    pub stock: Option<i32>,
}

/// Lists all products, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(pool: &PgPool) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} \
         FROM products p LEFT JOIN categories c ON c.id = p.category_id \
         ORDER BY p.created_at DESC, p.id DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches one product by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has that id, or
/// [`DbError::Sqlx`] on query failure.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} \
         FROM products p LEFT JOIN categories c ON c.id = p.category_id \
         WHERE p.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Looks up a product by exact name match.
///
/// Product names carry a unique constraint, so at most one row matches.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_product_by_name(
    pool: &PgPool,
    name: &str,
) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} \
         FROM products p LEFT JOIN categories c ON c.id = p.category_id \
         WHERE p.name = $1"
    ))
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a product and returns the new row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including the unique
/// violation when a product with the same name already exists.
pub async fn create_product(pool: &PgPool, product: &NewProduct) -> Result<ProductRow, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (name, description, price, sale_price, image_url, brand, external_link, \
              category_id, stock) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id",
    )
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.sale_price)
    .bind(&product.image_url)
    .bind(&product.brand)
    .bind(&product.external_link)
    .bind(product.category_id)
    .bind(product.stock)
    .fetch_one(pool)
    .await?;

    get_product(pool, id).await
}

/// Applies a sparse update to a product and returns the updated row.
///
/// Untouched fields keep their current values; `id` and `created_at` are
/// never written.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has that id, or
/// [`DbError::Sqlx`] on query failure.
pub async fn update_product(
    pool: &PgPool,
    id: i64,
    update: &ProductUpdate,
) -> Result<ProductRow, DbError> {
    let updated: Option<i64> = sqlx::query_scalar::<_, i64>(
        "UPDATE products SET \
             name          = COALESCE($2, name), \
             description   = CASE WHEN $3 THEN $4 ELSE description END, \
             price         = COALESCE($5, price), \
             sale_price    = CASE WHEN $6 THEN $7 ELSE sale_price END, \
             image_url     = CASE WHEN $8 THEN $9 ELSE image_url END, \
             brand         = CASE WHEN $10 THEN $11 ELSE brand END, \
             external_link = CASE WHEN $12 THEN $13 ELSE external_link END, \
             category_id   = CASE WHEN $14 THEN $15 ELSE category_id END, \
             stock         = COALESCE($16, stock) \
         WHERE id = $1 \
         RETURNING id",
    )
    .bind(id)
    .bind(&update.name)
    .bind(update.description.is_some())
    .bind(update.description.clone().flatten())
    .bind(update.price)
    .bind(update.sale_price.is_some())
    .bind(update.sale_price.flatten())
    .bind(update.image_url.is_some())
    .bind(update.image_url.clone().flatten())
    .bind(update.brand.is_some())
    .bind(update.brand.clone().flatten())
    .bind(update.external_link.is_some())
    .bind(update.external_link.clone().flatten())
    .bind(update.category_id.is_some())
    .bind(update.category_id.flatten())
    .bind(update.stock)
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(id) => get_product(pool, id).await,
        None => Err(DbError::NotFound),
    }
}

/// Deletes a product.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has that id, or
/// [`DbError::Sqlx`] on query failure.
pub async fn delete_product(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let affected = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    if affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_update_default_touches_nothing() {
        let update = ProductUpdate::default();
        assert!(update.name.is_none());
        assert!(update.sale_price.is_none());
        assert!(update.stock.is_none());
    }

    #[test]
    fn product_update_distinguishes_clear_from_absent() {
        let update = ProductUpdate {
            sale_price: Some(None),
            ..ProductUpdate::default()
        };
        // Some(None) clears the column; None leaves it alone.
        assert!(update.sale_price.is_some());
        assert!(update.sale_price.flatten().is_none());
    }
}
