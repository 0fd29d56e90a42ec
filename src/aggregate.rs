//! Summary metrics and grouped aggregates over a filtered view.
//!
//! All functions recompute from scratch. Groups only exist for values
//! present in the view; nothing is zero-filled.
//!
//! An empty view has no mean price: `mean_price` is `None` (rendered `n/a`
//! in text and `null` in JSON) rather than `0.0` or NaN.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::filter::FilteredView;

/// Headline numbers for the current view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub count: usize,
    pub total_units: i64,
    pub mean_price: Option<f64>,
}

pub fn summary_metrics(view: &FilteredView<'_>) -> SummaryMetrics {
    let count = view.len();
    // Sums saturate so aggregation never panics on out-of-range records.
    let total_units = view
        .iter()
        .fold(0i64, |acc, r| acc.saturating_add(r.units_in_stock));
    let total_cents = view
        .iter()
        .fold(0i64, |acc, r| acc.saturating_add(r.price.cents()));
    SummaryMetrics {
        count,
        total_units,
        mean_price: mean_cents(total_cents, count),
    }
}

/// Mean of `Price` per distinct Category in the view.
pub fn mean_price_by_category(view: &FilteredView<'_>) -> BTreeMap<String, f64> {
    let mut groups: BTreeMap<String, (i64, usize)> = BTreeMap::new();
    for r in view.iter() {
        let entry = groups.entry(r.category.clone()).or_insert((0, 0));
        entry.0 = entry.0.saturating_add(r.price.cents());
        entry.1 += 1;
    }
    groups
        .into_iter()
        .filter_map(|(cat, (cents, n))| mean_cents(cents, n).map(|m| (cat, m)))
        .collect()
}

/// Sum of `UnitsInStock` per distinct Size in the view.
pub fn sum_units_by_size(view: &FilteredView<'_>) -> BTreeMap<String, i64> {
    let mut groups: BTreeMap<String, i64> = BTreeMap::new();
    for r in view.iter() {
        let units = groups.entry(r.size.clone()).or_insert(0);
        *units = units.saturating_add(r.units_in_stock);
    }
    groups
}

fn mean_cents(total_cents: i64, count: usize) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some(total_cents as f64 / count as f64 / 100.0)
    }
}

/// Display rank for garment sizes; unknown sizes sort after the known ones.
pub fn size_rank(size: &str) -> usize {
    const ORDER: [&str; 6] = ["XS", "S", "M", "L", "XL", "XXL"];
    ORDER
        .iter()
        .position(|s| *s == size)
        .unwrap_or(ORDER.len())
}

/// Compare sizes by garment order, falling back to alphabetical.
pub fn compare_sizes(a: &str, b: &str) -> Ordering {
    size_rank(a).cmp(&size_rank(b)).then_with(|| a.cmp(b))
}

/// Size aggregate as a display-ordered list.
pub fn ordered_by_size(by_size: &BTreeMap<String, i64>) -> Vec<(&str, i64)> {
    let mut rows: Vec<(&str, i64)> = by_size.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    rows.sort_by(|a, b| compare_sizes(a.0, b.0));
    rows
}
