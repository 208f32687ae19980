//! Database operations for the `categories` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `categories` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Lists all categories ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, created_at FROM categories ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Inserts a category and returns the new row.
///
/// Names are unique case-insensitively; inserting a duplicate surfaces the
/// underlying constraint violation.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_category(pool: &PgPool, name: &str) -> Result<CategoryRow, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "INSERT INTO categories (name) VALUES ($1) RETURNING id, name, created_at",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Renames a category.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no category has that id, or
/// [`DbError::Sqlx`] on query failure.
pub async fn rename_category(pool: &PgPool, id: i64, name: &str) -> Result<CategoryRow, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "UPDATE categories SET name = $2 WHERE id = $1 RETURNING id, name, created_at",
    )
    .bind(id)
    .bind(name)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Deletes a category. Products referencing it keep a nulled `category_id`
/// via the `ON DELETE SET NULL` foreign key.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no category has that id, or
/// [`DbError::Sqlx`] on query failure.
pub async fn delete_category(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let affected = sqlx::query("DELETE FROM categories WHERE id = $1")
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
    fn category_row_has_expected_fields() {
        let row = CategoryRow {
            id: 1,
            name: "Special Offers".to_string(),
            created_at: Utc::now(),
        };
        assert_eq!(row.id, 1);
        assert_eq!(row.name, "Special Offers");
    }
}
