//! Inventory row structs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use super::price::Price;

/// Categorical columns a user can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Category,
    Brand,
    Size,
    Colour,
}

impl Column {
    pub const ALL: [Column; 4] = [Column::Category, Column::Brand, Column::Size, Column::Colour];

    /// Column name as it appears in the store schema.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "Category",
            Self::Brand => "Brand",
            Self::Size => "Size",
            Self::Colour => "Colour",
        }
    }

    pub fn value<'a>(&self, record: &'a Record) -> &'a str {
        match self {
            Self::Category => &record.category,
            Self::Brand => &record.brand,
            Self::Size => &record.size,
            Self::Colour => &record.colour,
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the `Clothes` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    #[serde(rename = "ItemID")]
    pub item_id: i64,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Brand")]
    pub brand: String,
    #[serde(rename = "Size")]
    pub size: String,
    #[serde(rename = "Colour")]
    pub colour: String,
    #[serde(rename = "Price")]
    pub price: Price,
    #[serde(rename = "UnitsInStock")]
    pub units_in_stock: i64,
    #[serde(rename = "CreatedUtc")]
    pub created_utc: DateTime<Utc>,
}

/// Full snapshot of the table, in retrieval order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct values observed for `column`.
    pub fn distinct(&self, column: Column) -> BTreeSet<String> {
        self.records
            .iter()
            .map(|r| column.value(r).to_string())
            .collect()
    }

    /// `(min, max)` over `Price`, or `None` for an empty set.
    pub fn price_bounds(&self) -> Option<(Price, Price)> {
        let mut prices = self.records.iter().map(|r| r.price);
        let first = prices.next()?;
        Some(prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }
}

impl From<Vec<Record>> for RecordSet {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
