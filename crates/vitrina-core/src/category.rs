//! The fixed category taxonomy and free-text category resolution.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One of the four canonical catalog groupings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryName {
    Men,
    Women,
    Unisex,
    SpecialOffers,
}

/// All canonical categories, in seed order.
pub const CANONICAL_CATEGORIES: [CategoryName; 4] = [
    CategoryName::Men,
    CategoryName::Women,
    CategoryName::Unisex,
    CategoryName::SpecialOffers,
];

impl CategoryName {
    /// The display name as stored in the `categories` table.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryName::Men => "Men",
            CategoryName::Women => "Women",
            CategoryName::Unisex => "Unisex",
            CategoryName::SpecialOffers => "Special Offers",
        }
    }
}

impl std::fmt::Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// "women" contains "men" as a substring, so the Women pattern is checked
// first and the Men pattern is word-boundary anchored. The Romanian
// equivalents come from the feeds this storefront ingests.
static WOMEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(women|femei)\b").expect("valid literal pattern"));
static MEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(men|barbati|bărbați)\b").expect("valid literal pattern"));

/// Maps free-text product copy onto a [`CategoryName`].
///
/// Matching is ordered and case-insensitive: whole-word "women"/"femei"
/// first, then whole-word "men"/"barbati"/"bărbați", then the bare
/// substring "unisex". Anything else, including empty text, lands in
/// [`CategoryName::SpecialOffers`]. Total over all inputs; never fails.
#[must_use]
pub fn resolve_category(text: &str) -> CategoryName {
    let lower = text.to_lowercase();
    if WOMEN_PATTERN.is_match(&lower) {
        CategoryName::Women
    } else if MEN_PATTERN.is_match(&lower) {
        CategoryName::Men
    } else if lower.contains("unisex") {
        CategoryName::Unisex
    } else {
        CategoryName::SpecialOffers
    }
}
