//! Coercion of raw feed entries into typed [`NormalizedEntry`] records.

use std::str::FromStr;

use rust_decimal::Decimal;
use vitrina_core::NormalizedEntry;

use crate::error::FeedError;
use crate::parse::{parse_feed, RawEntry};

/// Stock assigned to an in-stock entry. Feeds report availability, never
/// unit counts.
pub const DEFAULT_IN_STOCK_QUANTITY: i32 = 10;

/// Normalizes one raw entry, or skips it.
///
/// Returns `None` when the entry's name (`title`, fallback `g_title`)
/// resolves to empty — the entry is dropped without error and without
/// counting toward the import total.
#[must_use]
pub fn normalize_entry(raw: &RawEntry) -> Option<NormalizedEntry> {
    let name = raw.first_of(&["title", "g_title"]).trim().to_string();
    if name.is_empty() {
        return None;
    }

    let sale_raw = raw.first_of(&["sale_price"]).trim();
    let sale_price = if sale_raw.is_empty() {
        None
    } else {
        Some(parse_price(sale_raw))
    };

    Some(NormalizedEntry {
        name,
        description: raw.first_of(&["description"]).trim().to_string(),
        price: parse_price(raw.first_of(&["price"])),
        sale_price,
        image_url: non_empty(raw.first_of(&["image_link", "g_image_link"])),
        brand: non_empty(raw.first_of(&["brand"])),
        external_link: non_empty(raw.first_of(&["link"])),
        product_type: raw
            .first_of(&["product_type", "g_product_type"])
            .trim()
            .to_string(),
        stock: parse_stock(raw.first_of(&["availability"])),
    })
}

/// Parses the full feed and normalizes every entry, dropping skipped ones.
///
/// # Errors
///
/// Propagates [`FeedError`] from [`parse_feed`]; normalization itself never
/// fails.
pub fn normalize_feed(xml: &str) -> Result<Vec<NormalizedEntry>, FeedError> {
    let raw = parse_feed(xml)?;
    let total = raw.len();
    let entries: Vec<NormalizedEntry> = raw.iter().filter_map(normalize_entry).collect();
    if entries.len() < total {
        tracing::debug!(
            skipped = total - entries.len(),
            total,
            "dropped feed entries with empty names"
        );
    }
    Ok(entries)
}

/// Tolerant price parse: keeps only digits, comma, and dot, normalizes the
/// comma decimal separator to a dot, then parses. Empty or unparseable
/// input yields zero, never an error.
#[must_use]
pub fn parse_price(raw: &str) -> Decimal {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(*c, ',' | '.'))
        .collect();
    let cleaned = cleaned.replace(',', ".");
    Decimal::from_str(&cleaned).unwrap_or(Decimal::ZERO)
}

/// Availability text → stock. Whitespace is normalized to underscores so
/// `"in stock"` and `"in_stock"` are equivalent spellings.
fn parse_stock(availability: &str) -> i32 {
    let normalized = availability.to_lowercase().replace(char::is_whitespace, "_");
    if normalized.contains("in_stock") {
        DEFAULT_IN_STOCK_QUANTITY
    } else {
        0
    }
}

/// Treat empty (or whitespace-only) strings as absent.
fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
