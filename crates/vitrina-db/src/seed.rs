use sqlx::PgPool;
use vitrina_core::CANONICAL_CATEGORIES;

use crate::DbError;

/// Ensure the canonical categories exist, creating any that are missing.
///
/// Matching is case-insensitive via the unique index on `LOWER(name)`, and
/// the whole batch runs in one transaction. Safe to call repeatedly;
/// returns the number of categories actually created.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_categories(pool: &PgPool) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut created = 0usize;

    for category in CANONICAL_CATEGORIES {
        let affected = sqlx::query(
            "INSERT INTO categories (name) VALUES ($1) \
             ON CONFLICT (LOWER(name)) DO NOTHING",
        )
        .bind(category.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        created += usize::try_from(affected).unwrap_or(0);
    }

    tx.commit().await?;
    if created > 0 {
        tracing::info!(created, "seeded canonical categories");
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    #[test]
    fn seed_module_is_accessible() {
        // Verify the module compiles and DbError is visible from the seed module.
        // Canonical category names are tested in vitrina-core.
        let _ = std::mem::size_of::<crate::DbError>();
    }
}
