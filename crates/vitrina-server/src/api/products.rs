//! Product CRUD handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vitrina_db::{NewProduct, ProductRow, ProductUpdate};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    pub(super) id: i64,
    pub(super) name: String,
    pub(super) description: Option<String>,
    pub(super) price: Decimal,
    pub(super) sale_price: Option<Decimal>,
    pub(super) image_url: Option<String>,
    pub(super) brand: Option<String>,
    pub(super) external_link: Option<String>,
    pub(super) category_id: Option<i64>,
    pub(super) category_name: Option<String>,
    pub(super) stock: i32,
    pub(super) created_at: DateTime<Utc>,
}

impl From<ProductRow> for ProductItem {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            sale_price: row.sale_price,
            image_url: row.image_url,
            brand: row.brand,
            external_link: row.external_link,
            category_id: row.category_id,
            category_name: row.category_name,
            stock: row.stock,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub brand: Option<String>,
    pub external_link: Option<String>,
    pub category_id: Option<i64>,
    pub stock: Option<i32>,
}

/// Sparse update body; absent fields keep their current values.
#[derive(Debug, Deserialize)]
pub(super) struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub brand: Option<String>,
    pub external_link: Option<String>,
    pub category_id: Option<i64>,
    pub stock: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(super) struct Deleted {
    pub success: bool,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn validate_name(req_id: &str, value: &str) -> Result<String, ApiError> {
    let name = value.trim().to_owned();
    if name.is_empty() || name.len() > 200 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "name must be 1–200 characters",
        ));
    }
    Ok(name)
}

fn validate_non_negative(req_id: &str, field: &str, value: Decimal) -> Result<(), ApiError> {
    if value.is_sign_negative() {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("{field} must not be negative"),
        ));
    }
    Ok(())
}

fn validate_stock(req_id: &str, value: i32) -> Result<(), ApiError> {
    if value < 0 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "stock must not be negative",
        ));
    }
    Ok(())
}

/// Remap constraint violations on product writes: duplicate names are a
/// conflict, an unknown category id is a validation error.
fn map_product_write_error(req_id: &str, e: &vitrina_db::DbError) -> ApiError {
    if let vitrina_db::DbError::Sqlx(sqlx::Error::Database(db_err)) = e {
        match db_err.code().as_deref() {
            Some("23505") => {
                return ApiError::new(
                    req_id,
                    "conflict",
                    "a product with that name already exists",
                );
            }
            Some("23503") => {
                return ApiError::new(req_id, "validation_error", "unknown category_id");
            }
            _ => {}
        }
    }
    map_db_error(req_id.to_owned(), e)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/products — full catalog, newest first.
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<ProductItem>>>, ApiError> {
    let rows = vitrina_db::list_products(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ProductItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/products/:id
pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let row = vitrina_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ProductItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/products — create a product.
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductItem>>), ApiError> {
    let rid = &req_id.0;

    let name = validate_name(rid, &body.name)?;
    validate_non_negative(rid, "price", body.price)?;
    if let Some(sale_price) = body.sale_price {
        validate_non_negative(rid, "sale_price", sale_price)?;
    }
    let stock = body.stock.unwrap_or(0);
    validate_stock(rid, stock)?;

    let row = vitrina_db::create_product(
        &state.pool,
        &NewProduct {
            name,
            description: body.description,
            price: body.price,
            sale_price: body.sale_price,
            image_url: body.image_url,
            brand: body.brand,
            external_link: body.external_link,
            category_id: body.category_id,
            stock,
        },
    )
    .await
    .map_err(|e| map_product_write_error(rid, &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ProductItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PUT /api/v1/products/:id — sparse update.
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let rid = &req_id.0;

    let name = body.name.as_deref().map(|n| validate_name(rid, n)).transpose()?;
    if let Some(price) = body.price {
        validate_non_negative(rid, "price", price)?;
    }
    if let Some(sale_price) = body.sale_price {
        validate_non_negative(rid, "sale_price", sale_price)?;
    }
    if let Some(stock) = body.stock {
        validate_stock(rid, stock)?;
    }

    let row = vitrina_db::update_product(
        &state.pool,
        id,
        &ProductUpdate {
            name,
            description: body.description.map(Some),
            price: body.price,
            sale_price: body.sale_price.map(Some),
            image_url: body.image_url.map(Some),
            brand: body.brand.map(Some),
            external_link: body.external_link.map(Some),
            category_id: body.category_id.map(Some),
            stock: body.stock,
        },
    )
    .await
    .map_err(|e| map_product_write_error(rid, &e))?;

    Ok(Json(ApiResponse {
        data: ProductItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/products/:id
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Deleted>>, ApiError> {
    vitrina_db::delete_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: Deleted { success: true },
        meta: ResponseMeta::new(req_id.0),
    }))
}
