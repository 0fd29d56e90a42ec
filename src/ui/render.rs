//! Plain-terminal rendering of a [`Dashboard`].
//!
//! Layout: title, three KPI tiles, the two bar charts, then the detail table.

use std::fmt::Write as _;

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use super::data::Dashboard;
use crate::aggregate::ordered_by_size;
use crate::filter::{FilterCriteria, SelectorOptions};
use crate::model::Column;

pub const TITLE: &str = "Clothes Inventory Dashboard";

/// Widest bar drawn in a chart, in cells.
const BAR_WIDTH: usize = 32;

const TABLE_HEADERS: [&str; 8] = [
    "ItemID",
    "Category",
    "Brand",
    "Size",
    "Colour",
    "Price",
    "UnitsInStock",
    "CreatedUtc",
];

/// `1234567` → `"1,234,567"`.
pub fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn pad(text: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(text);
    format!("{text}{}", " ".repeat(width.saturating_sub(w)))
}

fn pad_left(text: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(text);
    format!("{}{text}", " ".repeat(width.saturating_sub(w)))
}

/// Horizontal bar chart; `value_fmt` renders the trailing number.
fn bar_chart(
    out: &mut String,
    title: &str,
    rows: &[(&str, f64)],
    value_fmt: impl Fn(f64) -> String,
) {
    writeln!(out, "{}", title.bold()).ok();
    if rows.is_empty() {
        writeln!(out, "  {}", "(no data)".dimmed()).ok();
        return;
    }
    let label_width = rows
        .iter()
        .map(|(l, _)| UnicodeWidthStr::width(*l))
        .max()
        .unwrap_or(0);
    let max = rows.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    for (label, value) in rows {
        let cells = if max > 0.0 {
            ((value / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let bar = "█".repeat(cells.max(usize::from(*value > 0.0)));
        writeln!(
            out,
            "  {} {} {}",
            pad(label, label_width),
            pad(&bar, BAR_WIDTH).cyan(),
            value_fmt(*value)
        ).ok();
    }
}

/// Render the full dashboard. `limit` caps the detail table.
pub fn render_dashboard(dash: &Dashboard<'_>, limit: Option<usize>) -> String {
    let mut out = String::new();
    writeln!(out, "{}", TITLE.bold()).ok();
    writeln!(out, "{}", "=".repeat(TITLE.len())).ok();
    writeln!(out).ok();

    // KPI tiles
    let avg = dash
        .metrics
        .mean_price
        .map(|m| format!("{m:.2}"))
        .unwrap_or_else(|| "n/a".to_string());
    let tiles = [
        ("Items", thousands(dash.metrics.count as i64)),
        ("Units", thousands(dash.metrics.total_units)),
        ("Avg Price ($)", avg),
    ];
    let tile_width = 18;
    let labels: String = tiles.iter().map(|(l, _)| pad(l, tile_width)).collect();
    let values: String = tiles.iter().map(|(_, v)| pad(v, tile_width)).collect();
    writeln!(out, "  {}", labels.trim_end().dimmed()).ok();
    writeln!(out, "  {}", values.trim_end().bold()).ok();
    writeln!(out).ok();

    let by_category: Vec<(&str, f64)> = dash
        .by_category
        .iter()
        .map(|(k, v)| (k.as_str(), *v))
        .collect();
    bar_chart(&mut out, "Average Price by Category", &by_category, |v| {
        format!("{v:.2}")
    });
    writeln!(out).ok();

    let by_size: Vec<(&str, f64)> = ordered_by_size(&dash.by_size)
        .into_iter()
        .map(|(k, v)| (k, v as f64))
        .collect();
    bar_chart(&mut out, "Units in Stock by Size", &by_size, |v| {
        thousands(v as i64)
    });
    writeln!(out).ok();

    render_rows(&mut out, dash, limit);
    out
}

fn render_rows(out: &mut String, dash: &Dashboard<'_>, limit: Option<usize>) {
    let shown = limit.unwrap_or(usize::MAX).min(dash.view.len());
    let heading = if shown < dash.view.len() {
        format!("Detailed Rows (showing {shown} of {})", dash.view.len())
    } else {
        "Detailed Rows".to_string()
    };
    writeln!(out, "{}", heading.bold()).ok();

    if dash.view.is_empty() {
        writeln!(out, "  {}", "No rows match the current filters.".dimmed()).ok();
        return;
    }

    let cells: Vec<[String; 8]> = dash
        .view
        .iter()
        .take(shown)
        .map(|r| {
            [
                r.item_id.to_string(),
                r.category.clone(),
                r.brand.clone(),
                r.size.clone(),
                r.colour.clone(),
                r.price.to_string(),
                r.units_in_stock.to_string(),
                r.created_utc.format("%Y-%m-%d %H:%M:%S").to_string(),
            ]
        })
        .collect();

    let mut widths: [usize; 8] = TABLE_HEADERS.map(UnicodeWidthStr::width);
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(UnicodeWidthStr::width(cell.as_str()));
        }
    }

    // Numeric columns are right-aligned.
    let numeric = |idx: usize| matches!(idx, 0 | 5 | 6);
    let header: Vec<String> = TABLE_HEADERS
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if numeric(i) {
                pad_left(h, widths[i])
            } else {
                pad(h, widths[i])
            }
        })
        .collect();
    writeln!(out, "  {}", header.join("  ").trim_end().underline()).ok();
    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if numeric(i) {
                    pad_left(c, widths[i])
                } else {
                    pad(c, widths[i])
                }
            })
            .collect();
        writeln!(out, "  {}", line.join("  ").trim_end()).ok();
    }
}

/// Render the selector choices (`invdash options`).
pub fn render_options(options: &SelectorOptions) -> String {
    let mut out = String::new();
    writeln!(out, "{}", "Filters".bold()).ok();
    let sets = [
        (Column::Category, &options.categories),
        (Column::Brand, &options.brands),
        (Column::Size, &options.sizes),
        (Column::Colour, &options.colours),
    ];
    for (column, values) in sets {
        let mut values: Vec<&str> = values.iter().map(String::as_str).collect();
        if column == Column::Size {
            values.sort_by(|a, b| crate::aggregate::compare_sizes(a, b));
        }
        let listed = if values.is_empty() {
            "(none)".to_string()
        } else {
            values.join(", ")
        };
        writeln!(out, "  {:<10} {listed}", column.as_str()).ok();
    }
    let range = match (options.price_min, options.price_max) {
        (Some(lo), Some(hi)) => format!("{lo} – {hi}"),
        _ => "(none)".to_string(),
    };
    writeln!(out, "  {:<10} {range}", "Price ($)").ok();
    out
}

/// One-line description of active filters, for logs.
pub fn describe_criteria(criteria: &FilterCriteria) -> String {
    format!(
        "categories={} brands={} sizes={} colours={} price={}..={}",
        criteria.categories.len(),
        criteria.brands.len(),
        criteria.sizes.len(),
        criteria.colours.len(),
        criteria.price.min,
        criteria.price.max
    )
}
