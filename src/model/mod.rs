//! Inventory data model.

pub mod price;
pub mod types;

pub use price::{Price, PriceParseError};
pub use types::{Column, Record, RecordSet};
