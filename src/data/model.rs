use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Column names of the source file
// ---------------------------------------------------------------------------

pub const COL_DATE: &str = "Date";
pub const COL_CITY: &str = "City";
pub const COL_PRODUCT_LINE: &str = "Product line";
pub const COL_UNIT_PRICE: &str = "Unit price";
pub const COL_QUANTITY: &str = "Quantity";
pub const COL_TOTAL: &str = "Total";
pub const COL_GROSS_INCOME: &str = "gross income";
pub const COL_RATING: &str = "Rating";

// ---------------------------------------------------------------------------
// NumericColumn – the numeric attributes of a record
// ---------------------------------------------------------------------------

/// One of the numeric attributes of a [`Record`].
///
/// Used wherever an aggregation is parameterised by column (correlation,
/// standardization, parallel coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericColumn {
    UnitPrice,
    Quantity,
    Total,
    GrossIncome,
    Rating,
}

impl NumericColumn {
    /// All numeric columns in source-file order.
    pub const ALL: [NumericColumn; 5] = [
        NumericColumn::UnitPrice,
        NumericColumn::Quantity,
        NumericColumn::Total,
        NumericColumn::GrossIncome,
        NumericColumn::Rating,
    ];

    /// Header name in the source file.
    pub fn label(self) -> &'static str {
        match self {
            NumericColumn::UnitPrice => COL_UNIT_PRICE,
            NumericColumn::Quantity => COL_QUANTITY,
            NumericColumn::Total => COL_TOTAL,
            NumericColumn::GrossIncome => COL_GROSS_INCOME,
            NumericColumn::Rating => COL_RATING,
        }
    }
}

impl fmt::Display for NumericColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Dimension – the categorical attributes of a record
// ---------------------------------------------------------------------------

/// The two categorical columns of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    City,
    ProductLine,
}

impl Dimension {
    pub fn label(self) -> &'static str {
        match self {
            Dimension::City => COL_CITY,
            Dimension::ProductLine => COL_PRODUCT_LINE,
        }
    }

    /// Distinct values of this dimension in `table`, first-seen order.
    pub fn values(self, table: &Table) -> &[String] {
        match self {
            Dimension::City => table.cities(),
            Dimension::ProductLine => table.product_lines(),
        }
    }

    pub fn of(self, record: &Record) -> &str {
        match self {
            Dimension::City => &record.city,
            Dimension::ProductLine => &record.product_line,
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the source file
// ---------------------------------------------------------------------------

/// A single sales transaction.
///
/// Numeric fields are `None` when the source cell was empty or malformed.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub city: String,
    pub product_line: String,
    pub unit_price: Option<f64>,
    pub quantity: Option<i64>,
    /// Expected to equal `unit_price * quantity`; not checked.
    pub total: Option<f64>,
    pub gross_income: Option<f64>,
    /// 0–10 by convention; not enforced.
    pub rating: Option<f64>,
}

impl Record {
    /// Read a numeric attribute as `f64`.
    pub fn value(&self, column: NumericColumn) -> Option<f64> {
        match column {
            NumericColumn::UnitPrice => self.unit_price,
            NumericColumn::Quantity => self.quantity.map(|q| q as f64),
            NumericColumn::Total => self.total,
            NumericColumn::GrossIncome => self.gross_income,
            NumericColumn::Rating => self.rating,
        }
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// An ordered sequence of records with pre-computed category indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    records: Vec<Record>,
    /// Distinct cities in first-seen order.
    cities: Vec<String>,
    /// Distinct product lines in first-seen order.
    product_lines: Vec<String>,
}

impl Table {
    /// Build category indices from the loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let cities = distinct_in_order(records.iter().map(|r| r.city.as_str()));
        let product_lines = distinct_in_order(records.iter().map(|r| r.product_line.as_str()));
        Table {
            records,
            cities,
            product_lines,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    pub fn product_lines(&self) -> &[String] {
        &self.product_lines
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of one numeric column, nulls included, in row order.
    pub fn column(&self, column: NumericColumn) -> Vec<Option<f64>> {
        self.records.iter().map(|r| r.value(column)).collect()
    }
}

fn distinct_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// A fully populated record; tweak fields with struct update syntax.
    pub fn record(date: NaiveDate, city: &str, line: &str, total: f64) -> Record {
        Record {
            date,
            city: city.to_string(),
            product_line: line.to_string(),
            unit_price: Some(total / 2.0),
            quantity: Some(2),
            total: Some(total),
            gross_income: Some(total * 0.05),
            rating: Some(7.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn categories_keep_first_seen_order() {
        let table = Table::from_records(vec![
            record(date(2024, 1, 1), "Yangon", "Health", 1.0),
            record(date(2024, 1, 1), "Mandalay", "Sports", 1.0),
            record(date(2024, 1, 2), "Yangon", "Food", 1.0),
            record(date(2024, 1, 3), "Naypyitaw", "Health", 1.0),
        ]);
        assert_eq!(table.cities(), ["Yangon", "Mandalay", "Naypyitaw"]);
        assert_eq!(table.product_lines(), ["Health", "Sports", "Food"]);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn quantity_reads_as_float() {
        let r = Record {
            quantity: Some(7),
            ..record(date(2024, 1, 1), "A", "X", 10.0)
        };
        assert_eq!(r.value(NumericColumn::Quantity), Some(7.0));
        let r = Record { quantity: None, ..r };
        assert_eq!(r.value(NumericColumn::Quantity), None);
    }
}
