//! Offline unit tests for vitrina-db pool configuration and row types.
//! These tests do not require a live database connection.

use rust_decimal::Decimal;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use vitrina_core::{AppConfig, Environment};
use vitrina_db::{NewOrder, NewOrderItem, NewProduct, PoolConfig, ProductRow};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 4000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        import_max_body_bytes: 10 * 1024 * 1024,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`ProductRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn product_row_has_expected_fields() {
    use chrono::Utc;

    let row = ProductRow {
        id: 1_i64,
        name: "Trail Runner".to_string(),
        description: Some("Lightweight".to_string()),
        price: Decimal::new(5999, 2),
        sale_price: None,
        image_url: None,
        brand: Some("Vitrina".to_string()),
        external_link: None,
        category_id: Some(2),
        category_name: Some("Women".to_string()),
        stock: 10_i32,
        created_at: Utc::now(),
    };

    assert_eq!(row.id, 1);
    assert_eq!(row.price, Decimal::new(5999, 2));
    assert_eq!(row.category_name.as_deref(), Some("Women"));
    assert!(row.sale_price.is_none());
}

#[test]
fn new_product_carries_import_shape() {
    let product = NewProduct {
        name: "Trail Runner".to_string(),
        description: None,
        price: Decimal::new(5999, 2),
        sale_price: Some(Decimal::new(4999, 2)),
        image_url: Some("https://cdn.example.com/run.jpg".to_string()),
        brand: None,
        external_link: None,
        category_id: None,
        stock: 10,
    };
    assert_eq!(product.stock, 10);
    assert!(product.category_id.is_none());
}

#[test]
fn new_order_holds_items() {
    let order = NewOrder {
        user_name: "Ana Pop".to_string(),
        phone: None,
        address: None,
        city: None,
        county: None,
        email: None,
        delivery_type: None,
        items: vec![NewOrderItem {
            product_id: 3,
            quantity: 2,
        }],
    };
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 2);
}
