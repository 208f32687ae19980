//! The feed import endpoint: raw XML in, upsert summary out.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    Extension, Json,
};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

const ACCEPTED_CONTENT_TYPES: [&str; 3] = ["application/xml", "text/xml", "text/plain"];

#[derive(Debug, Serialize)]
pub(super) struct ImportSummary {
    pub(super) success: bool,
    pub(super) imported: usize,
}

/// POST /api/v1/catalog/import
///
/// Accepts a raw feed document (body size capped by the route's
/// `DefaultBodyLimit`). Parsing and normalization happen before any catalog
/// access: malformed, empty, or entry-less input fails fast with a 400 and
/// never touches the database.
pub(super) async fn import_feed(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<ApiResponse<ImportSummary>>, ApiError> {
    let rid = &req_id.0;

    if let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    {
        let media_type = content_type.split(';').next().unwrap_or("").trim();
        if !ACCEPTED_CONTENT_TYPES.contains(&media_type) {
            return Err(ApiError::new(
                rid,
                "bad_request",
                format!("unsupported content type '{media_type}'; send XML or plain text"),
            ));
        }
    }

    if body.trim().is_empty() {
        return Err(ApiError::new(rid, "bad_request", "missing XML body"));
    }

    let entries = vitrina_feed::normalize_feed(&body).map_err(|e| {
        tracing::debug!(error = %e, "rejected feed payload");
        ApiError::new(rid, "bad_request", e.to_string())
    })?;

    let imported = vitrina_db::import_entries(&state.pool, &entries)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ImportSummary {
            success: true,
            imported,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
