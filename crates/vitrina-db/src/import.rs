//! The feed upsert pipeline: normalized entries → catalog rows.

use std::collections::HashMap;

use sqlx::PgPool;
use vitrina_core::{resolve_category, NormalizedEntry};

use crate::DbError;

/// Upserts normalized feed entries into the catalog, keyed by product name.
///
/// The category name→id map is loaded once at the start of the run and is
/// read-only afterwards; categories are never created here, and a resolved
/// name without a matching row degrades to a null `category_id`.
///
/// Entries are processed strictly sequentially inside a single transaction:
/// an existing product (exact name match) has its feed-sourced fields
/// overwritten in place (`id` and `created_at` untouched), a new one is
/// inserted. Returns the number of entries written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the transaction rolls
/// back and no entry from this run is persisted.
pub async fn import_entries(pool: &PgPool, entries: &[NormalizedEntry]) -> Result<usize, DbError> {
    let categories = crate::categories::list_categories(pool).await?;
    let category_ids: HashMap<String, i64> = categories
        .into_iter()
        .map(|c| (c.name.to_lowercase(), c.id))
        .collect();

    let mut tx = pool.begin().await?;
    let mut imported = 0usize;

    for entry in entries {
        let category = resolve_category(&entry.product_type);
        let category_id = category_ids
            .get(&category.as_str().to_lowercase())
            .copied();

        let description = (!entry.description.is_empty()).then_some(entry.description.as_str());

        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM products WHERE name = $1")
            .bind(&entry.name)
            .fetch_optional(&mut *tx)
            .await?;

        match existing {
            Some(product_id) => {
                sqlx::query(
                    "UPDATE products SET \
                         description   = $2, \
                         price         = $3, \
                         sale_price    = $4, \
                         image_url     = $5, \
                         brand         = $6, \
                         external_link = $7, \
                         category_id   = $8, \
                         stock         = $9 \
                     WHERE id = $1",
                )
                .bind(product_id)
                .bind(description)
                .bind(entry.price)
                .bind(entry.sale_price)
                .bind(&entry.image_url)
                .bind(&entry.brand)
                .bind(&entry.external_link)
                .bind(category_id)
                .bind(entry.stock)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query(
                    "INSERT INTO products \
                         (name, description, price, sale_price, image_url, brand, \
                          external_link, category_id, stock) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                )
                .bind(&entry.name)
                .bind(description)
                .bind(entry.price)
                .bind(entry.sale_price)
                .bind(&entry.image_url)
                .bind(&entry.brand)
                .bind(&entry.external_link)
                .bind(category_id)
                .bind(entry.stock)
                .execute(&mut *tx)
                .await?;
            }
        }

        imported += 1;
    }

    tx.commit().await?;
    tracing::info!(imported, "feed import committed");
    Ok(imported)
}
