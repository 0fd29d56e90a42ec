//! Dashboard view model.
//!
//! [`Dashboard::build`] runs one linear pass: options → criteria → filtered
//! rows → metrics → grouped aggregates. Renderers only read the result.

use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::aggregate::{
    SummaryMetrics, mean_price_by_category, ordered_by_size, sum_units_by_size, summary_metrics,
};
use crate::filter::{FilterCriteria, FilteredView, SelectorOptions, compute_filtered_view};
use crate::model::RecordSet;

/// Everything the presentation layer needs for one render.
#[derive(Debug, Clone)]
pub struct Dashboard<'a> {
    pub total_rows: usize,
    pub options: SelectorOptions,
    pub criteria: FilterCriteria,
    pub view: FilteredView<'a>,
    pub metrics: SummaryMetrics,
    pub by_category: BTreeMap<String, f64>,
    pub by_size: BTreeMap<String, i64>,
}

impl<'a> Dashboard<'a> {
    pub fn build(records: &'a RecordSet, criteria: FilterCriteria) -> Self {
        let options = SelectorOptions::from_records(records);
        let view = compute_filtered_view(records, &criteria);
        let metrics = summary_metrics(&view);
        let by_category = mean_price_by_category(&view);
        let by_size = sum_units_by_size(&view);

        tracing::debug!(
            total = records.len(),
            kept = metrics.count,
            categories = by_category.len(),
            sizes = by_size.len(),
            "dashboard computed"
        );

        Self {
            total_rows: records.len(),
            options,
            criteria,
            view,
            metrics,
            by_category,
            by_size,
        }
    }

    /// Machine-readable form used by `--json`.
    pub fn to_json(&self, limit: Option<usize>) -> Value {
        let rows: Vec<_> = self
            .view
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .collect();
        let by_size: Vec<Value> = ordered_by_size(&self.by_size)
            .into_iter()
            .map(|(size, units)| json!({ "size": size, "units_in_stock": units }))
            .collect();
        json!({
            "total_rows": self.total_rows,
            "filters": self.criteria,
            "options": self.options,
            "metrics": self.metrics,
            "by_category": self.by_category,
            "by_size": by_size,
            "rows": rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Price, Record};
    use chrono::{TimeZone, Utc};

    fn set() -> RecordSet {
        let at = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
        RecordSet::new(vec![
            Record {
                item_id: 1,
                category: "Jeans".into(),
                brand: "Acme".into(),
                size: "M".into(),
                colour: "Blue".into(),
                price: Price::from_cents(4500),
                units_in_stock: 10,
                created_utc: at,
            },
            Record {
                item_id: 2,
                category: "Hoodie".into(),
                brand: "Contoso".into(),
                size: "L".into(),
                colour: "Red".into(),
                price: Price::from_cents(4000),
                units_in_stock: 20,
                created_utc: at,
            },
        ])
    }

    #[test]
    fn build_with_defaults_covers_all_rows() {
        let records = set();
        let dash = Dashboard::build(&records, FilterCriteria::defaults_for(&records));
        assert_eq!(dash.total_rows, 2);
        assert_eq!(dash.metrics.count, 2);
        assert_eq!(dash.metrics.total_units, 30);
        assert_eq!(dash.by_size.len(), 2);
    }

    #[test]
    fn json_shape() {
        let records = set();
        let dash = Dashboard::build(&records, FilterCriteria::defaults_for(&records));
        let json = dash.to_json(Some(1));
        assert_eq!(json["metrics"]["count"], 2);
        assert_eq!(json["rows"].as_array().unwrap().len(), 1);
        assert_eq!(json["by_size"][0]["size"], "M");
        assert_eq!(json["by_size"][1]["size"], "L");
        assert_eq!(json["by_category"]["Jeans"], 45.0);
        assert_eq!(json["filters"]["price"]["min"], 40.0);
        assert!(json["options"]["brands"].as_array().is_some());
    }
}
