use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product record normalized from one feed entry, ready to be upserted
/// into the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedEntry {
    /// Product name; the upsert key against existing catalog rows.
    pub name: String,
    pub description: String,
    /// Regular price; parse failures in the feed degrade to zero.
    pub price: Decimal,
    /// Discounted price. `None` when the feed field was absent or empty,
    /// which is distinct from an explicit (or unparseable) zero.
    pub sale_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub brand: Option<String>,
    pub external_link: Option<String>,
    /// Free-text category hint from the feed. Input to
    /// [`crate::resolve_category`]; never persisted on the product row.
    pub product_type: String,
    /// Units on hand derived from feed availability; feeds only report
    /// in/out of stock, not counts.
    pub stock: i32,
}

impl NormalizedEntry {
    /// Returns `true` when the entry carries at least one unit of stock.
    #[must_use]
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    /// The price a buyer would pay: the sale price when present, the
    /// regular price otherwise.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.sale_price.unwrap_or(self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_entry(price: Decimal, sale_price: Option<Decimal>, stock: i32) -> NormalizedEntry {
        NormalizedEntry {
            name: "Trail Runner".to_string(),
            description: "Lightweight trail shoe".to_string(),
            price,
            sale_price,
            image_url: Some("https://cdn.example.com/trail.jpg".to_string()),
            brand: Some("Vitrina".to_string()),
            external_link: None,
            product_type: "Men > Shoes".to_string(),
            stock,
        }
    }

    #[test]
    fn is_in_stock_reflects_stock_count() {
        assert!(make_entry(Decimal::new(5999, 2), None, 10).is_in_stock());
        assert!(!make_entry(Decimal::new(5999, 2), None, 0).is_in_stock());
    }

    #[test]
    fn effective_price_prefers_sale_price() {
        let entry = make_entry(Decimal::new(5999, 2), Some(Decimal::new(4999, 2)), 10);
        assert_eq!(entry.effective_price(), Decimal::new(4999, 2));
    }

    #[test]
    fn effective_price_falls_back_to_regular_price() {
        let entry = make_entry(Decimal::new(5999, 2), None, 10);
        assert_eq!(entry.effective_price(), Decimal::new(5999, 2));
    }

    #[test]
    fn serde_roundtrip_entry() {
        let entry = make_entry(Decimal::new(1999, 2), Some(Decimal::ZERO), 0);
        let json = serde_json::to_string(&entry).expect("serialization failed");
        let decoded: NormalizedEntry = serde_json::from_str(&json).expect("deserialization failed");
        assert_eq!(decoded.name, entry.name);
        assert_eq!(decoded.price, entry.price);
        // An explicit zero sale price survives the roundtrip as Some(0).
        assert_eq!(decoded.sale_price, Some(Decimal::ZERO));
    }
}
