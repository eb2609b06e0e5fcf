use crate::data::model::{NumericColumn, Table};

/// Square Pearson correlation matrix with its column labels.
///
/// `values[i][j]` is the coefficient between `columns[i]` and `columns[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<NumericColumn>,
    pub values: Vec<Vec<f64>>,
}

/// The all-zero matrix of an empty table.
impl Default for CorrelationMatrix {
    fn default() -> Self {
        correlation_matrix(&Table::default())
    }
}

impl CorrelationMatrix {
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }
}

/// Pearson correlation between every pair of numeric columns.
///
/// Each pair uses only the rows where both values are present.  Any
/// coefficient that is undefined (fewer than two overlapping rows, or zero
/// variance on either side) is reported as 0, including diagonal entries of
/// constant columns.
pub fn correlation_matrix(table: &Table) -> CorrelationMatrix {
    let columns = NumericColumn::ALL.to_vec();
    let data: Vec<Vec<Option<f64>>> = columns.iter().map(|&c| table.column(c)).collect();
    let n = columns.len();

    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(&data[i], &data[j]).unwrap_or(0.0);
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    CorrelationMatrix { columns, values }
}

/// Pairwise-complete Pearson coefficient, `None` when undefined.
fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let (x0, y0) = pairs[0];
    if pairs.iter().all(|p| p.0 == x0) || pairs.iter().all(|p| p.1 == y0) {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for &(x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    Some((sxy / denom).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::{date, record};
    use crate::data::model::Record;

    fn sales(rows: &[(f64, i64, f64)]) -> Table {
        Table::from_records(
            rows.iter()
                .enumerate()
                .map(|(i, &(price, qty, rating))| Record {
                    unit_price: Some(price),
                    quantity: Some(qty),
                    total: Some(price * qty as f64),
                    gross_income: Some(price * qty as f64 * 0.05),
                    rating: Some(rating),
                    ..record(date(2024, 1, 1 + i as u32), "A", "X", 0.0)
                })
                .collect(),
        )
    }

    fn assert_well_formed(m: &CorrelationMatrix) {
        for i in 0..m.columns.len() {
            for j in 0..m.columns.len() {
                assert!(m.get(i, j).is_finite());
                assert_eq!(m.get(i, j), m.get(j, i));
            }
        }
    }

    #[test]
    fn symmetric_with_unit_diagonal() {
        let m = correlation_matrix(&sales(&[
            (10.0, 1, 7.0),
            (20.0, 3, 5.5),
            (15.0, 2, 9.0),
            (40.0, 7, 6.1),
        ]));
        assert_eq!(m.columns.len(), 5);
        assert_well_formed(&m);
        for i in 0..m.columns.len() {
            assert!((m.get(i, i) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn total_and_gross_income_are_perfectly_correlated() {
        let m = correlation_matrix(&sales(&[(10.0, 1, 7.0), (20.0, 3, 5.5), (15.0, 2, 9.0)]));
        let total = NumericColumn::ALL.iter().position(|c| *c == NumericColumn::Total).unwrap();
        let income = NumericColumn::ALL
            .iter()
            .position(|c| *c == NumericColumn::GrossIncome)
            .unwrap();
        assert!((m.get(total, income) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_column_reports_zero() {
        let m = correlation_matrix(&sales(&[(10.0, 1, 8.0), (20.0, 3, 8.0), (15.0, 2, 8.0)]));
        let rating = m.columns.len() - 1;
        for j in 0..m.columns.len() {
            assert_eq!(m.get(rating, j), 0.0);
        }
        assert_well_formed(&m);
    }

    #[test]
    fn nulls_use_pairwise_complete_rows() {
        let mut table = sales(&[(1.0, 1, 1.0), (2.0, 2, 2.0), (3.0, 3, 3.0), (4.0, 9, 4.0)]);
        let mut records = table.records().to_vec();
        records[3].rating = None;
        table = Table::from_records(records);
        let m = correlation_matrix(&table);
        // Without the last row, price and rating move in lockstep.
        assert!((m.get(0, 4) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_or_single_row_table_is_all_zero() {
        for table in [Table::default(), sales(&[(1.0, 1, 1.0)])] {
            let m = correlation_matrix(&table);
            assert!(m.values.iter().flatten().all(|&v| v == 0.0));
        }
    }
}
