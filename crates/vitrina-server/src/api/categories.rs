//! Category CRUD and canonical-category sync handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vitrina_db::CategoryRow;

use crate::middleware::RequestId;

use super::{map_db_error, map_unique_violation, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct CategoryItem {
    pub(super) id: i64,
    pub(super) name: String,
    pub(super) created_at: DateTime<Utc>,
}

impl From<CategoryRow> for CategoryItem {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CategoryNameRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SyncResponse {
    pub(super) success: bool,
    pub(super) created: usize,
    pub(super) categories: Vec<CategoryItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct Deleted {
    pub success: bool,
}

fn validate_name(req_id: &str, value: &str) -> Result<String, ApiError> {
    let name = value.trim().to_owned();
    if name.is_empty() || name.len() > 100 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "name must be 1–100 characters",
        ));
    }
    Ok(name)
}

/// GET /api/v1/categories — all categories ordered by name.
pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CategoryItem>>>, ApiError> {
    let rows = vitrina_db::list_categories(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(CategoryItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/categories — create a category.
pub(super) async fn create_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CategoryNameRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryItem>>), ApiError> {
    let rid = &req_id.0;
    let name = validate_name(rid, &body.name)?;

    let row = vitrina_db::create_category(&state.pool, &name)
        .await
        .map_err(|e| map_unique_violation(rid, "category", &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: CategoryItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PUT /api/v1/categories/:id — rename.
pub(super) async fn rename_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<CategoryNameRequest>,
) -> Result<Json<ApiResponse<CategoryItem>>, ApiError> {
    let rid = &req_id.0;
    let name = validate_name(rid, &body.name)?;

    let row = vitrina_db::rename_category(&state.pool, id, &name)
        .await
        .map_err(|e| map_unique_violation(rid, "category", &e))?;

    Ok(Json(ApiResponse {
        data: CategoryItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/categories/:id — products keep a nulled category.
pub(super) async fn delete_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Deleted>>, ApiError> {
    vitrina_db::delete_category(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: Deleted { success: true },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/categories/sync — ensure the canonical categories exist.
pub(super) async fn sync_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<SyncResponse>>, ApiError> {
    let created = vitrina_db::seed_categories(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let rows = vitrina_db::list_categories(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: SyncResponse {
            success: true,
            created,
            categories: rows.into_iter().map(CategoryItem::from).collect(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
