use std::collections::HashMap;

use crate::data::model::{Dimension, NumericColumn, Table};

/// Five-number summary of one group, as drawn by a box plot.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub group: String,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    /// Values outside the whiskers.
    pub outliers: Vec<f64>,
}

/// Per product line distribution of `gross income`.
///
/// Groups come in first-seen order.  Quartiles use linear interpolation;
/// whiskers reach the most extreme values within 1.5 × IQR of the box.
/// Null values are skipped, and a group with no values is omitted.
pub fn box_summary(table: &Table) -> Vec<BoxStats> {
    grouped_box_summary(table, Dimension::ProductLine, NumericColumn::GrossIncome)
}

pub fn grouped_box_summary(table: &Table, by: Dimension, column: NumericColumn) -> Vec<BoxStats> {
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();
    for r in table.records() {
        let key = by.of(r);
        let idx = *slot.entry(key).or_insert_with(|| {
            groups.push((key.to_string(), Vec::new()));
            groups.len() - 1
        });
        if let Some(v) = r.value(column) {
            groups[idx].1.push(v);
        }
    }

    groups
        .into_iter()
        .filter_map(|(group, mut values)| {
            if values.is_empty() {
                return None;
            }
            values.sort_by(f64::total_cmp);
            let q1 = quantile(&values, 0.25);
            let median = quantile(&values, 0.5);
            let q3 = quantile(&values, 0.75);
            let fence = 1.5 * (q3 - q1);
            let (lo, hi) = (q1 - fence, q3 + fence);

            let inside = values.iter().copied().filter(|v| (lo..=hi).contains(v));
            let lower_whisker = inside.clone().fold(f64::INFINITY, f64::min);
            let upper_whisker = inside.fold(f64::NEG_INFINITY, f64::max);
            let outliers = values.iter().copied().filter(|v| !(lo..=hi).contains(v)).collect();

            Some(BoxStats {
                group,
                lower_whisker,
                q1,
                median,
                q3,
                upper_whisker,
                outliers,
            })
        })
        .collect()
}

/// Linear-interpolated quantile of sorted, non-empty `values`.
fn quantile(values: &[f64], q: f64) -> f64 {
    let pos = q * (values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    values[lo] + (values[hi] - values[lo]) * frac
}
