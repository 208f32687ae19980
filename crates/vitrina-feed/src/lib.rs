//! Product feed ingestion: XML parsing and field normalization.
//!
//! [`parse_feed`] turns a raw feed document into [`RawEntry`] field maps;
//! [`normalize_entry`] coerces one raw entry into a typed
//! [`vitrina_core::NormalizedEntry`], or skips it. [`normalize_feed`]
//! composes the two.

mod error;
mod normalize;
mod parse;

pub use error::FeedError;
pub use normalize::{normalize_entry, normalize_feed, parse_price, DEFAULT_IN_STOCK_QUANTITY};
pub use parse::{parse_feed, RawEntry};
