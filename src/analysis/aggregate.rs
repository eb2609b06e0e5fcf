use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::data::model::Table;

// ---------------------------------------------------------------------------
// Daily totals
// ---------------------------------------------------------------------------

/// Sum of `total` for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: f64,
}

/// Group by exact date and sum `total`, ascending by date.
///
/// Null totals contribute nothing; a date whose totals are all null still
/// appears with a sum of 0.
pub fn daily_totals(table: &Table) -> Vec<DailyTotal> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in table.records() {
        *by_date.entry(r.date).or_default() += r.total.unwrap_or(0.0);
    }
    by_date
        .into_iter()
        .map(|(date, total)| DailyTotal { date, total })
        .collect()
}

// ---------------------------------------------------------------------------
// Monthly summary
// ---------------------------------------------------------------------------

/// Per-month aggregate, labelled by the last day of the month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyAggregate {
    pub month_end: NaiveDate,
    pub total_sum: f64,
    /// `None` when the month has rows but none carries a rating.
    pub rating_mean: Option<f64>,
}

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

#[derive(Default)]
struct MonthAccumulator {
    total_sum: f64,
    rating_sum: f64,
    rating_count: usize,
}

/// Month-end resample: sum of `total` and mean of non-null `rating` per
/// calendar month, ascending.  Months without rows are omitted rather than
/// emitted as zero.
pub fn monthly_summary(table: &Table) -> Vec<MonthlyAggregate> {
    let mut by_month: BTreeMap<NaiveDate, MonthAccumulator> = BTreeMap::new();
    for r in table.records() {
        let acc = by_month.entry(month_end(r.date)).or_default();
        acc.total_sum += r.total.unwrap_or(0.0);
        if let Some(rating) = r.rating {
            acc.rating_sum += rating;
            acc.rating_count += 1;
        }
    }
    by_month
        .into_iter()
        .map(|(month_end, acc)| MonthlyAggregate {
            month_end,
            total_sum: acc.total_sum,
            rating_mean: (acc.rating_count > 0).then(|| acc.rating_sum / acc.rating_count as f64),
        })
        .collect()
}
