//! Order listing, checkout, and status handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vitrina_db::{NewOrder, NewOrderItem, OrderItemRow, OrderRow, ORDER_STATUSES};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct OrderItem {
    pub(super) id: i64,
    pub(super) user_name: String,
    pub(super) phone: Option<String>,
    pub(super) address: Option<String>,
    pub(super) city: Option<String>,
    pub(super) county: Option<String>,
    pub(super) email: Option<String>,
    pub(super) delivery_type: Option<String>,
    pub(super) subtotal: Decimal,
    pub(super) total: Decimal,
    pub(super) status: String,
    pub(super) created_at: DateTime<Utc>,
}

impl From<OrderRow> for OrderItem {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_name: row.user_name,
            phone: row.phone,
            address: row.address,
            city: row.city,
            county: row.county,
            email: row.email,
            delivery_type: row.delivery_type,
            subtotal: row.subtotal,
            total: row.total,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct OrderLineItem {
    pub(super) id: i64,
    pub(super) product_id: i64,
    pub(super) quantity: i32,
    pub(super) price: Decimal,
    pub(super) product_name: String,
    pub(super) product_image_url: Option<String>,
}

impl From<OrderItemRow> for OrderLineItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            quantity: row.quantity,
            price: row.price,
            product_name: row.product_name,
            product_image_url: row.product_image_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct OrderDetail {
    #[serde(flatten)]
    pub(super) order: OrderItem,
    pub(super) items: Vec<OrderLineItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OrderQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateOrderRequest {
    pub user_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub email: Option<String>,
    pub delivery_type: Option<String>,
    pub items: Vec<CreateOrderItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateOrderItem {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateOrderResponse {
    pub(super) id: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateStatusRequest {
    pub status: String,
}

fn validate_status(req_id: &str, value: &str) -> Result<(), ApiError> {
    if ORDER_STATUSES.contains(&value) {
        Ok(())
    } else {
        Err(ApiError::new(
            req_id,
            "validation_error",
            format!("status must be one of {ORDER_STATUSES:?}, got '{value}'"),
        ))
    }
}

/// GET /api/v1/orders — newest first, optionally filtered by status.
pub(super) async fn list_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<ApiResponse<Vec<OrderItem>>>, ApiError> {
    let rows = vitrina_db::list_orders(&state.pool, query.status.as_deref())
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(OrderItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/orders/:id — one order with its line items.
pub(super) async fn get_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderDetail>>, ApiError> {
    let detail = vitrina_db::get_order_with_items(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: OrderDetail {
            order: OrderItem::from(detail.order),
            items: detail.items.into_iter().map(OrderLineItem::from).collect(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/orders — customer checkout; open, no admin key needed.
pub(super) async fn create_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreateOrderResponse>>), ApiError> {
    let rid = &req_id.0;

    let user_name = body.user_name.trim().to_owned();
    if user_name.is_empty() {
        return Err(ApiError::new(rid, "validation_error", "user_name is required"));
    }
    if body.items.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "order must contain at least one item",
        ));
    }
    for item in &body.items {
        if item.quantity < 1 {
            return Err(ApiError::new(
                rid,
                "validation_error",
                format!("quantity for product {} must be at least 1", item.product_id),
            ));
        }
    }

    let order = vitrina_db::create_order(
        &state.pool,
        &NewOrder {
            user_name,
            phone: body.phone,
            address: body.address,
            city: body.city,
            county: body.county,
            email: body.email,
            delivery_type: body.delivery_type,
            items: body
                .items
                .iter()
                .map(|i| NewOrderItem {
                    product_id: i.product_id,
                    quantity: i.quantity,
                })
                .collect(),
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: CreateOrderResponse { id: order.id },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PUT /api/v1/orders/:id/status
pub(super) async fn update_order_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<OrderItem>>, ApiError> {
    let rid = &req_id.0;
    validate_status(rid, &body.status)?;

    let row = vitrina_db::update_order_status(&state.pool, id, &body.status)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: OrderItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}
