use std::collections::HashMap;

use crate::data::model::{Dimension, Table};

/// Integer codes for the distinct values of a categorical column.
///
/// Codes follow first-seen order in the table and run `0..len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCodes {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl CategoryCodes {
    /// Code assigned to `value`, if it occurs in the table.
    pub fn code(&self, value: &str) -> Option<usize> {
        self.index.get(value).copied()
    }

    /// `(value, code)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels.iter().enumerate().map(|(code, v)| (v.as_str(), code))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Map each distinct value of `column` to an integer code, in first-seen order.
pub fn categorical_codes(table: &Table, column: Dimension) -> CategoryCodes {
    let mut codes = CategoryCodes::default();
    for r in table.records() {
        let value = column.of(r);
        if !codes.index.contains_key(value) {
            codes.index.insert(value.to_string(), codes.labels.len());
            codes.labels.push(value.to_string());
        }
    }
    codes
}

/// Per-row code of `column`, aligned with `table.records()`.
pub fn row_codes(table: &Table, column: Dimension, codes: &CategoryCodes) -> Vec<usize> {
    table
        .records()
        .iter()
        .filter_map(|r| codes.code(column.of(r)))
        .collect()
}
