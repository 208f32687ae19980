//! Database operations for `orders` and `order_items`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// Statuses an order can move through.
pub const ORDER_STATUSES: [&str; 3] = ["Pending", "Shipped", "Delivered"];

const ORDER_COLUMNS: &str = "id, user_name, phone, address, city, county, email, \
     delivery_type, subtotal, total, status, created_at";

/// A row from the `orders` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub user_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub email: Option<String>,
    pub delivery_type: Option<String>,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// A row from `order_items`, with product display fields joined in.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    /// Unit price captured at checkout time.
    pub price: Decimal,
    pub product_name: String,
    pub product_image_url: Option<String>,
}

/// An order plus its line items.
#[derive(Debug, Clone)]
pub struct OrderWithItems {
    pub order: OrderRow,
    pub items: Vec<OrderItemRow>,
}

/// Checkout input.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub email: Option<String>,
    pub delivery_type: Option<String>,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: i32,
}

/// Creates an order: validates every product and its stock, captures unit
/// prices, inserts the order and its items, and decrements product stock.
///
/// The whole checkout runs in one transaction; any validation or statement
/// failure rolls back every write, so stock is never partially decremented.
/// Product rows are locked (`FOR UPDATE`) while the order is assembled, so
/// two concurrent checkouts cannot both spend the same stock.
///
/// # Errors
///
/// Returns [`DbError::MissingProduct`] when an item references an unknown
/// product, [`DbError::InsufficientStock`] when stock cannot cover an
/// item's quantity, or [`DbError::Sqlx`] on query failure.
pub async fn create_order(pool: &PgPool, order: &NewOrder) -> Result<OrderRow, DbError> {
    let mut tx = pool.begin().await?;

    let mut subtotal = Decimal::ZERO;
    let mut priced_items: Vec<(i64, i32, Decimal)> = Vec::with_capacity(order.items.len());

    for item in &order.items {
        let product: Option<(Decimal, i32)> =
            sqlx::query_as("SELECT price, stock FROM products WHERE id = $1 FOR UPDATE")
                .bind(item.product_id)
                .fetch_optional(&mut *tx)
                .await?;

        let (price, stock) = product.ok_or(DbError::MissingProduct {
            product_id: item.product_id,
        })?;
        if stock < item.quantity {
            return Err(DbError::InsufficientStock {
                product_id: item.product_id,
            });
        }

        subtotal += price * Decimal::from(item.quantity);
        priced_items.push((item.product_id, item.quantity, price));
    }

    // Shipping and taxes are settled outside the catalog.
    let total = subtotal;

    let order_row = sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO orders \
             (user_name, phone, address, city, county, email, delivery_type, \
              subtotal, total, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'Pending') \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(&order.user_name)
    .bind(&order.phone)
    .bind(&order.address)
    .bind(&order.city)
    .bind(&order.county)
    .bind(&order.email)
    .bind(&order.delivery_type)
    .bind(subtotal)
    .bind(total)
    .fetch_one(&mut *tx)
    .await?;

    for (product_id, quantity, price) in &priced_items {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, quantity, price) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(order_row.id)
        .bind(product_id)
        .bind(quantity)
        .bind(price)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE products SET stock = stock - $2 WHERE id = $1")
            .bind(product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    tracing::info!(order_id = order_row.id, items = priced_items.len(), "order created");
    Ok(order_row)
}

/// Lists orders, newest first, optionally filtered by status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_orders(pool: &PgPool, status: Option<&str>) -> Result<Vec<OrderRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE $1::text IS NULL OR status = $1 \
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(status)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches one order with its line items.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no order has that id, or
/// [`DbError::Sqlx`] on query failure.
pub async fn get_order_with_items(pool: &PgPool, id: i64) -> Result<OrderWithItems, DbError> {
    let order = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    let items = sqlx::query_as::<_, OrderItemRow>(
        "SELECT i.id, i.order_id, i.product_id, i.quantity, i.price, \
                p.name AS product_name, p.image_url AS product_image_url \
         FROM order_items i JOIN products p ON p.id = i.product_id \
         WHERE i.order_id = $1 \
         ORDER BY i.id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(OrderWithItems { order, items })
}

/// Sets an order's status. Callers validate the status against
/// [`ORDER_STATUSES`] before reaching the database.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no order has that id, or
/// [`DbError::Sqlx`] on query failure.
pub async fn update_order_status(
    pool: &PgPool,
    id: i64,
    status: &str,
) -> Result<OrderRow, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
    ))
    .bind(id)
    .bind(status)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}
