//! Filter engine: which rows make it into the dashboard.
//!
//! A row is kept iff its Category, Brand, Size and Colour are each in the
//! selected set AND its Price lies in the inclusive price range. Membership
//! is exact string equality. The result keeps the order of the input.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{Column, Price, Record, RecordSet};

/// Inclusive price bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceRange {
    pub min: Price,
    pub max: Price,
}

impl PriceRange {
    pub fn new(min: Price, max: Price) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, price: Price) -> bool {
        self.min <= price && price <= self.max
    }
}

/// The five predicates applied to every row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
    pub categories: BTreeSet<String>,
    pub brands: BTreeSet<String>,
    pub sizes: BTreeSet<String>,
    pub colours: BTreeSet<String>,
    pub price: PriceRange,
}

impl FilterCriteria {
    /// Everything selected: every distinct value and the full price span.
    /// An empty record set yields empty selections and a zero range.
    pub fn defaults_for(records: &RecordSet) -> Self {
        let (min, max) = records.price_bounds().unwrap_or((Price::ZERO, Price::ZERO));
        Self {
            categories: records.distinct(Column::Category),
            brands: records.distinct(Column::Brand),
            sizes: records.distinct(Column::Size),
            colours: records.distinct(Column::Colour),
            price: PriceRange::new(min, max),
        }
    }

    /// Start from the defaults and apply whatever the user chose.
    pub fn from_selection(records: &RecordSet, selection: &Selection) -> Self {
        let mut criteria = Self::defaults_for(records);
        for column in Column::ALL {
            if let Some(values) = selection.get(column) {
                *criteria.set_mut(column) = values.iter().cloned().collect();
            }
        }
        if let Some(min) = selection.price_min {
            criteria.price.min = min;
        }
        if let Some(max) = selection.price_max {
            criteria.price.max = max;
        }
        criteria
    }

    pub fn set(&self, column: Column) -> &BTreeSet<String> {
        match column {
            Column::Category => &self.categories,
            Column::Brand => &self.brands,
            Column::Size => &self.sizes,
            Column::Colour => &self.colours,
        }
    }

    fn set_mut(&mut self, column: Column) -> &mut BTreeSet<String> {
        match column {
            Column::Category => &mut self.categories,
            Column::Brand => &mut self.brands,
            Column::Size => &mut self.sizes,
            Column::Colour => &mut self.colours,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        Column::ALL
            .iter()
            .all(|c| self.set(*c).contains(c.value(record)))
            && self.price.contains(record.price)
    }

    /// True when some selection set is empty, so nothing can match.
    pub fn excludes_everything(&self) -> bool {
        Column::ALL.iter().any(|c| self.set(*c).is_empty()) || self.price.min > self.price.max
    }
}

/// User choices as they arrive from the command line.
///
/// `None` keeps the default (all values); `Some(vec![])` selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub categories: Option<Vec<String>>,
    pub brands: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
    pub colours: Option<Vec<String>>,
    pub price_min: Option<Price>,
    pub price_max: Option<Price>,
}

impl Selection {
    pub fn get(&self, column: Column) -> Option<&Vec<String>> {
        match column {
            Column::Category => self.categories.as_ref(),
            Column::Brand => self.brands.as_ref(),
            Column::Size => self.sizes.as_ref(),
            Column::Colour => self.colours.as_ref(),
        }
    }
}

/// Rows that passed the filter, borrowed from the record set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView<'a> {
    rows: Vec<&'a Record>,
}

impl<'a> FilteredView<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Item ids in view order.
    pub fn ids(&self) -> Vec<i64> {
        self.rows.iter().map(|r| r.item_id).collect()
    }
}

impl<'a> FromIterator<&'a Record> for FilteredView<'a> {
    fn from_iter<I: IntoIterator<Item = &'a Record>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Apply `criteria` to every row, keeping input order.
pub fn compute_filtered_view<'a>(records: &'a RecordSet, criteria: &FilterCriteria) -> FilteredView<'a> {
    if criteria.excludes_everything() {
        return FilteredView::default();
    }
    records.iter().filter(|r| criteria.matches(r)).collect()
}

/// Choices offered to the user for each selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectorOptions {
    pub categories: BTreeSet<String>,
    pub brands: BTreeSet<String>,
    pub sizes: BTreeSet<String>,
    pub colours: BTreeSet<String>,
    pub price_min: Option<Price>,
    pub price_max: Option<Price>,
}

impl SelectorOptions {
    pub fn from_records(records: &RecordSet) -> Self {
        let bounds = records.price_bounds();
        Self {
            categories: records.distinct(Column::Category),
            brands: records.distinct(Column::Brand),
            sizes: records.distinct(Column::Size),
            colours: records.distinct(Column::Colour),
            price_min: bounds.map(|(lo, _)| lo),
            price_max: bounds.map(|(_, hi)| hi),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn rec(id: i64, cat: &str, brand: &str, size: &str, colour: &str, cents: i64) -> Record {
        Record {
            item_id: id,
            category: cat.into(),
            brand: brand.into(),
            size: size.into(),
            colour: colour.into(),
            price: Price::from_cents(cents),
            units_in_stock: 1,
            created_utc: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn sample() -> RecordSet {
        RecordSet::new(vec![
            rec(1, "Jeans", "Acme", "M", "Blue", 4500),
            rec(2, "Hoodie", "Contoso", "L", "Red", 4000),
            rec(3, "Jeans", "Contoso", "S", "Black", 5200),
            rec(4, "Dress", "Acme", "M", "Red", 6000),
        ])
    }

    #[test]
    fn defaults_keep_every_row() {
        let set = sample();
        let criteria = FilterCriteria::defaults_for(&set);
        assert_eq!(compute_filtered_view(&set, &criteria).ids(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn defaults_for_empty_set() {
        let criteria = FilterCriteria::defaults_for(&RecordSet::default());
        assert!(criteria.categories.is_empty());
        assert_eq!(criteria.price, PriceRange::new(Price::ZERO, Price::ZERO));
        assert!(compute_filtered_view(&RecordSet::default(), &criteria).is_empty());
    }

    #[test]
    fn predicates_are_anded() {
        let set = sample();
        let selection = Selection {
            brands: Some(vec!["Contoso".into()]),
            colours: Some(vec!["Red".into(), "Black".into()]),
            ..Default::default()
        };
        let criteria = FilterCriteria::from_selection(&set, &selection);
        assert_eq!(compute_filtered_view(&set, &criteria).ids(), vec![2, 3]);
    }

    #[test]
    fn price_range_is_inclusive_on_both_ends() {
        let set = sample();
        let selection = Selection {
            price_min: Some(Price::from_cents(4500)),
            price_max: Some(Price::from_cents(5200)),
            ..Default::default()
        };
        let criteria = FilterCriteria::from_selection(&set, &selection);
        assert_eq!(compute_filtered_view(&set, &criteria).ids(), vec![1, 3]);
    }

    #[test]
    fn empty_selection_excludes_everything() {
        let set = sample();
        let selection = Selection {
            sizes: Some(vec![]),
            ..Default::default()
        };
        let criteria = FilterCriteria::from_selection(&set, &selection);
        assert!(criteria.excludes_everything());
        assert!(compute_filtered_view(&set, &criteria).is_empty());
    }

    #[test]
    fn inverted_range_excludes_everything() {
        let set = sample();
        let selection = Selection {
            price_min: Some(Price::from_cents(9000)),
            price_max: Some(Price::from_cents(1000)),
            ..Default::default()
        };
        let criteria = FilterCriteria::from_selection(&set, &selection);
        assert!(compute_filtered_view(&set, &criteria).is_empty());
    }

    #[test]
    fn membership_is_exact() {
        let set = sample();
        let selection = Selection {
            categories: Some(vec!["jeans".into(), "Jeans ".into()]),
            ..Default::default()
        };
        let criteria = FilterCriteria::from_selection(&set, &selection);
        assert!(compute_filtered_view(&set, &criteria).is_empty());
    }

    #[test]
    fn unknown_values_are_allowed_but_match_nothing() {
        let set = sample();
        let selection = Selection {
            categories: Some(vec!["Jeans".into(), "Scarf".into()]),
            ..Default::default()
        };
        let criteria = FilterCriteria::from_selection(&set, &selection);
        assert_eq!(compute_filtered_view(&set, &criteria).ids(), vec![1, 3]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let set = sample();
        let criteria = FilterCriteria::from_selection(
            &set,
            &Selection {
                categories: Some(vec!["Jeans".into()]),
                ..Default::default()
            },
        );
        let a = compute_filtered_view(&set, &criteria);
        let b = compute_filtered_view(&set, &criteria);
        assert_eq!(a, b);
    }

    #[test]
    fn selector_options_list_distinct_values() {
        let options = SelectorOptions::from_records(&sample());
        assert_eq!(
            options.categories.iter().collect::<Vec<_>>(),
            vec!["Dress", "Hoodie", "Jeans"]
        );
        assert_eq!(options.price_min, Some(Price::from_cents(4000)));
        assert_eq!(options.price_max, Some(Price::from_cents(6000)));

        let empty = SelectorOptions::from_records(&RecordSet::default());
        assert_eq!(empty.price_min, None);
    }
}
