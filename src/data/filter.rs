use std::collections::BTreeSet;

use super::model::{Dimension, Record, Table};

// ---------------------------------------------------------------------------
// Filter predicate: which categories are selected per dimension
// ---------------------------------------------------------------------------

/// Selected cities and product lines.
///
/// An empty set selects nothing: it is never read as "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub cities: BTreeSet<String>,
    pub product_lines: BTreeSet<String>,
}

impl FilterSelection {
    /// Every distinct value present in `table` selected (i.e., show everything).
    pub fn all(table: &Table) -> Self {
        FilterSelection {
            cities: table.cities().iter().cloned().collect(),
            product_lines: table.product_lines().iter().cloned().collect(),
        }
    }

    pub fn set(&self, dim: Dimension) -> &BTreeSet<String> {
        match dim {
            Dimension::City => &self.cities,
            Dimension::ProductLine => &self.product_lines,
        }
    }

    pub fn set_mut(&mut self, dim: Dimension) -> &mut BTreeSet<String> {
        match dim {
            Dimension::City => &mut self.cities,
            Dimension::ProductLine => &mut self.product_lines,
        }
    }

    /// Whether `record` passes both dimensions.
    pub fn matches(&self, record: &Record) -> bool {
        self.cities.contains(Dimension::City.of(record))
            && self.product_lines.contains(Dimension::ProductLine.of(record))
    }
}

/// Return the order-preserving sub-table of records whose city AND product
/// line are both selected.
pub fn filter(table: &Table, selection: &FilterSelection) -> Table {
    let records = table
        .records()
        .iter()
        .filter(|r| selection.matches(r))
        .cloned()
        .collect();
    Table::from_records(records)
}
