mod categories;
mod import;
mod orders;
mod products;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, require_auth_for_writes, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub import_max_body_bytes: usize,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &vitrina_db::DbError) -> ApiError {
    match error {
        vitrina_db::DbError::NotFound => {
            ApiError::new(request_id, "not_found", "record not found")
        }
        vitrina_db::DbError::MissingProduct { .. }
        | vitrina_db::DbError::InsufficientStock { .. } => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        _ => {
            tracing::error!(error = %error, "database query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

/// Remap Postgres unique violations (code 23505) to a 409 conflict.
pub(super) fn map_unique_violation(
    request_id: &str,
    what: &str,
    e: &vitrina_db::DbError,
) -> ApiError {
    if let vitrina_db::DbError::Sqlx(sqlx::Error::Database(db_err)) = e {
        if db_err.code().as_deref() == Some("23505") {
            return ApiError::new(
                request_id,
                "conflict",
                format!("a {what} with that name already exists"),
            );
        }
    }
    map_db_error(request_id.to_owned(), e)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let import_body_limit = state.import_max_body_bytes;

    Router::new()
        .route("/api/v1/health", get(health))
        .route(
            "/api/v1/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/v1/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route(
            "/api/v1/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/v1/categories/{id}",
            put(categories::rename_category).delete(categories::delete_category),
        )
        .route("/api/v1/categories/sync", post(categories::sync_categories))
        .route(
            "/api/v1/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route("/api/v1/orders/{id}", get(orders::get_order))
        .route(
            "/api/v1/orders/{id}/status",
            put(orders::update_order_status),
        )
        .route(
            "/api/v1/catalog/import",
            post(import::import_feed).layer(DefaultBodyLimit::max(import_body_limit)),
        )
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_auth_for_writes,
                )),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match vitrina_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::products::ProductItem;
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    fn test_state(pool: sqlx::PgPool) -> AppState {
        AppState {
            pool,
            import_max_body_bytes: 10 * 1024 * 1024,
        }
    }

    fn test_app(pool: sqlx::PgPool) -> Router {
        let auth = crate::middleware::AuthState::from_env(true).expect("auth");
        build_app(test_state(pool), auth, default_rate_limit_state())
    }

    #[test]
    fn product_item_is_serializable() {
        // Proves the type compiles and serde works — no DB needed.
        let item = ProductItem {
            id: 1,
            name: "Trail Runner".to_string(),
            description: None,
            price: Decimal::new(5999, 2),
            sale_price: None,
            image_url: None,
            brand: Some("Vitrina".to_string()),
            external_link: None,
            category_id: Some(2),
            category_name: Some("Women".to_string()),
            stock: 10,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&item).expect("serialize");
        assert!(json.contains("\"name\":\"Trail Runner\""));
        assert!(json.contains("\"category_name\":\"Women\""));
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_not_found_maps_to_404() {
        let response = ApiError::new("req-1", "not_found", "missing").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn map_db_error_translates_order_validation_failures() {
        let err = vitrina_db::DbError::InsufficientStock { product_id: 7 };
        let api_err = map_db_error("req-1".to_string(), &err);
        assert_eq!(api_err.error.code, "validation_error");
        assert!(api_err.error.message.contains("7"));
    }

    #[test]
    fn map_db_error_hides_sqlx_details() {
        let err = vitrina_db::DbError::Sqlx(sqlx::Error::PoolTimedOut);
        let api_err = map_db_error("req-1".to_string(), &err);
        assert_eq!(api_err.error.code, "internal_error");
        assert_eq!(api_err.error.message, "database query failed");
    }

    // -------------------------------------------------------------------------
    // Route integration tests (with DB)
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn list_products_returns_seeded_product(pool: sqlx::PgPool) {
        sqlx::query(
            "INSERT INTO products (name, price, stock) VALUES ('Route Test Shoe', 42.00, 3)",
        )
        .execute(&pool)
        .await
        .expect("insert product");

        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/products")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["name"].as_str(), Some("Route Test Shoe"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn get_product_returns_404_for_unknown_id(pool: sqlx::PgPool) {
        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/products/9999")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_product_roundtrip(pool: sqlx::PgPool) {
        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/products")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"name": "Posted Shoe", "price": "19.99", "stock": 2}"#,
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        assert_eq!(json["data"]["name"].as_str(), Some("Posted Shoe"));
        assert_eq!(json["data"]["stock"].as_i64(), Some(2));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn sync_categories_creates_canonical_set(pool: sqlx::PgPool) {
        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/categories/sync")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        let names: Vec<&str> = json["data"]["categories"]
            .as_array()
            .expect("categories array")
            .iter()
            .filter_map(|c| c["name"].as_str())
            .collect();
        assert_eq!(names, ["Men", "Special Offers", "Unisex", "Women"]);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn import_feed_end_to_end(pool: sqlx::PgPool) {
        vitrina_db::seed_categories(&pool).await.expect("seed");

        let xml = r#"<feed><entry>
            <title>Women's Running Shoes</title>
            <price>59,99</price>
            <availability>in stock</availability>
            <product_type>women</product_type>
        </entry></feed>"#;

        let response = test_app(pool.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/catalog/import")
                    .header("content-type", "application/xml")
                    .body(Body::from(xml))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        assert_eq!(json["data"]["success"].as_bool(), Some(true));
        assert_eq!(json["data"]["imported"].as_i64(), Some(1));

        let product = vitrina_db::find_product_by_name(&pool, "Women's Running Shoes")
            .await
            .expect("lookup")
            .expect("product missing");
        assert_eq!(product.price, Decimal::new(5999, 2));
        assert_eq!(product.stock, 10);
        assert_eq!(product.category_name.as_deref(), Some("Women"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn import_feed_skips_entries_without_titles(pool: sqlx::PgPool) {
        let xml = r#"<feed>
            <entry><title>Named Shoe</title><price>10.00</price></entry>
            <entry><price>20.00</price></entry>
        </feed>"#;

        let response = test_app(pool.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/catalog/import")
                    .header("content-type", "application/xml")
                    .body(Body::from(xml))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        assert_eq!(json["data"]["imported"].as_i64(), Some(1));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count, 1, "the unnamed entry must not be written");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn import_feed_rejects_malformed_xml(pool: sqlx::PgPool) {
        let response = test_app(pool.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/catalog/import")
                    .header("content-type", "text/xml")
                    .body(Body::from("<feed><entry><title>Cut"))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count, 0, "malformed input must not reach the catalog");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn import_feed_rejects_empty_body(pool: sqlx::PgPool) {
        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/catalog/import")
                    .header("content-type", "application/xml")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn checkout_decrements_stock_over_http(pool: sqlx::PgPool) {
        let product_id: i64 = sqlx::query_scalar(
            "INSERT INTO products (name, price, stock) VALUES ('Checkout Shoe', 10.00, 5) \
             RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .expect("insert product");

        let body = format!(
            r#"{{"user_name": "Ana Pop", "items": [{{"product_id": {product_id}, "quantity": 2}}]}}"#
        );
        let response = test_app(pool.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/orders")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CREATED);

        let stock: i32 = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_one(&pool)
            .await
            .expect("stock");
        assert_eq!(stock, 3);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn order_status_rejects_unknown_status(pool: sqlx::PgPool) {
        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/v1/orders/1/status")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"status": "Lost"}"#))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
