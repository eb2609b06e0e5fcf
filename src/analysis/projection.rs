use nalgebra::{DMatrix, DVector};

use crate::data::model::{NumericColumn, Table};

/// Row-major numeric matrix: `rows[i][j]` is row `i`, feature `j`.
pub type FeatureMatrix = Vec<Vec<f64>>;

// ---------------------------------------------------------------------------
// Standardization
// ---------------------------------------------------------------------------

/// Columns used for the 2-D projection.
pub const PROJECTION_COLUMNS: [NumericColumn; 5] = [
    NumericColumn::UnitPrice,
    NumericColumn::Quantity,
    NumericColumn::Total,
    NumericColumn::GrossIncome,
    NumericColumn::Rating,
];

/// Z-score each named column over the rows of `table`.
///
/// Mean and population standard deviation (ddof = 0) are taken over the
/// non-null values of the given rows.  A null cell is replaced by the column
/// mean, so it standardizes to 0.  A column with zero variance (or no values
/// at all) yields 0 for every row instead of NaN.
pub fn standardize(table: &Table, columns: &[NumericColumn]) -> FeatureMatrix {
    let mut out = vec![vec![0.0; columns.len()]; table.len()];

    for (j, &column) in columns.iter().enumerate() {
        let values = table.column(column);
        let Some((mean, std)) = mean_and_std(&values) else {
            log::warn!("Column '{column}' has zero variance; standardized to 0");
            continue;
        };
        for (row, value) in out.iter_mut().zip(&values) {
            if let Some(v) = value {
                row[j] = (v - mean) / std;
            }
        }
    }
    out
}

/// Mean and population std of the non-null values, `None` if constant or empty.
fn mean_and_std(values: &[Option<f64>]) -> Option<(f64, f64)> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let first = *present.first()?;
    if present.iter().all(|&v| v == first) {
        return None;
    }
    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let var = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    (std > 0.0 && std.is_finite()).then_some((mean, std))
}

// ---------------------------------------------------------------------------
// Principal component projection
// ---------------------------------------------------------------------------

/// Rows projected onto the two principal axes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    /// `(pc1, pc2)` per input row, in input order.
    pub points: Vec<[f64; 2]>,
    /// Share of total variance captured by each axis.
    pub explained_variance_ratio: [f64; 2],
}

/// Project every row onto the two directions of maximum variance.
///
/// The sample covariance of the re-centred input is diagonalised with
/// nalgebra's symmetric eigen-decomposition.  Each axis is oriented so that
/// its largest-magnitude loading is positive; other implementations may
/// differ by a sign flip per axis.  Inputs with a single feature get a zero
/// second axis.
pub fn project_2d(matrix: &[Vec<f64>]) -> Projection {
    let n = matrix.len();
    let p = matrix.first().map_or(0, Vec::len);
    if n == 0 || p == 0 {
        return Projection {
            points: vec![[0.0, 0.0]; n],
            explained_variance_ratio: [0.0, 0.0],
        };
    }

    let data = DMatrix::from_fn(n, p, |i, j| matrix[i][j]);
    let means = data.row_mean();
    let centred = DMatrix::from_fn(n, p, |i, j| data[(i, j)] - means[j]);
    let denom = if n > 1 { (n - 1) as f64 } else { 1.0 };
    let covariance = centred.transpose() * &centred / denom;

    let eigen = covariance.symmetric_eigen();
    let eigenvalues = &eigen.eigenvalues;

    let mut order: Vec<usize> = (0..p).collect();
    order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));

    let axis = |rank: usize| match order.get(rank) {
        Some(&k) => oriented(eigen.eigenvectors.column(k).into_owned()),
        None => DVector::zeros(p),
    };
    let pc1 = &centred * axis(0);
    let pc2 = &centred * axis(1);
    let points = pc1.iter().zip(pc2.iter()).map(|(&a, &b)| [a, b]).collect();

    let trace: f64 = eigenvalues.iter().map(|l| l.max(0.0)).sum();
    let ratio = |rank: usize| match order.get(rank) {
        Some(&k) if trace > 0.0 => eigenvalues[k].max(0.0) / trace,
        _ => 0.0,
    };

    Projection {
        points,
        explained_variance_ratio: [ratio(0), ratio(1)],
    }
}

/// Flip `v` so its largest-magnitude component is positive.
fn oriented(mut v: DVector<f64>) -> DVector<f64> {
    let pivot = v
        .iter()
        .copied()
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .unwrap_or(0.0);
    if pivot < 0.0 {
        v.neg_mut();
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::{date, record};
    use crate::data::model::Record;

    const TOL: f64 = 1e-9;

    /// Compare two coordinate series allowing a global sign flip.
    fn same_up_to_sign(a: &[f64], b: &[f64]) -> bool {
        let direct = a.iter().zip(b).all(|(x, y)| (x - y).abs() < TOL);
        let flipped = a.iter().zip(b).all(|(x, y)| (x + y).abs() < TOL);
        direct || flipped
    }

    fn axis(p: &Projection, k: usize) -> Vec<f64> {
        p.points.iter().map(|pt| pt[k]).collect()
    }

    #[test]
    fn standardize_gives_zero_mean_unit_population_std() {
        let rows: Vec<Record> = [1.0, 2.0, 3.0, 4.0]
            .iter()
            .map(|&price| Record {
                unit_price: Some(price),
                ..record(date(2024, 1, 1), "A", "X", 1.0)
            })
            .collect();
        let z = standardize(&Table::from_records(rows), &[NumericColumn::UnitPrice]);
        let col: Vec<f64> = z.iter().map(|r| r[0]).collect();
        let mean = col.iter().sum::<f64>() / 4.0;
        let var = col.iter().map(|v| v * v).sum::<f64>() / 4.0;
        assert!(mean.abs() < TOL);
        assert!((var - 1.0).abs() < TOL);
        // ddof = 0: population std of 1..4 is sqrt(1.25).
        assert!((col[0] + 1.5 / 1.25f64.sqrt()).abs() < TOL);
    }

    #[test]
    fn zero_variance_and_null_cells_standardize_to_zero() {
        let rows = vec![
            Record {
                rating: Some(5.0),
                unit_price: Some(1.0),
                ..record(date(2024, 1, 1), "A", "X", 1.0)
            },
            Record {
                rating: Some(5.0),
                unit_price: None,
                ..record(date(2024, 1, 2), "A", "X", 1.0)
            },
            Record {
                rating: Some(5.0),
                unit_price: Some(3.0),
                ..record(date(2024, 1, 3), "A", "X", 1.0)
            },
        ];
        let z = standardize(
            &Table::from_records(rows),
            &[NumericColumn::Rating, NumericColumn::UnitPrice],
        );
        assert!(z.iter().all(|r| r[0] == 0.0));
        assert_eq!(z[1][1], 0.0);
        assert!((z[0][1] + 1.0).abs() < TOL);
        assert!((z[2][1] - 1.0).abs() < TOL);
        assert!(z.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn axes_follow_decreasing_variance() {
        // Orthogonal features with variances in ratio 9 : 4 : 1.
        let matrix = vec![
            vec![3.0, 0.0, 0.0],
            vec![-3.0, 0.0, 0.0],
            vec![0.0, 2.0, 0.0],
            vec![0.0, -2.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![0.0, 0.0, -1.0],
        ];
        let p = project_2d(&matrix);
        let first: Vec<f64> = matrix.iter().map(|r| r[0]).collect();
        let second: Vec<f64> = matrix.iter().map(|r| r[1]).collect();
        assert!(same_up_to_sign(&axis(&p, 0), &first));
        assert!(same_up_to_sign(&axis(&p, 1), &second));
        assert!((p.explained_variance_ratio[0] - 18.0 / 28.0).abs() < TOL);
        assert!((p.explained_variance_ratio[1] - 8.0 / 28.0).abs() < TOL);
    }

    #[test]
    fn collinear_features_collapse_onto_first_axis() {
        let matrix: FeatureMatrix = [-1.5, -0.5, 0.5, 1.5]
            .iter()
            .map(|&x| vec![x, x])
            .collect();
        let p = project_2d(&matrix);
        let expected: Vec<f64> = matrix.iter().map(|r| r[0] * 2f64.sqrt()).collect();
        assert!(same_up_to_sign(&axis(&p, 0), &expected));
        assert!(axis(&p, 1).iter().all(|v| v.abs() < TOL));
        assert!((p.explained_variance_ratio[0] - 1.0).abs() < TOL);
    }

    #[test]
    fn projected_axes_are_uncorrelated() {
        let rows: Vec<Record> = (0..12u32)
            .map(|i| {
                let price = 10.0 + (i * 7 % 11) as f64;
                let qty = 1 + (i * 3 % 5) as i64;
                Record {
                    unit_price: Some(price),
                    quantity: Some(qty),
                    total: Some(price * qty as f64),
                    gross_income: Some(price * qty as f64 * 0.05),
                    rating: Some(4.0 + (i % 6) as f64),
                    ..record(date(2024, 1, 1 + i), "A", "X", 0.0)
                }
            })
            .collect();
        let z = standardize(&Table::from_records(rows), &PROJECTION_COLUMNS);
        let p = project_2d(&z);
        let (a, b) = (axis(&p, 0), axis(&p, 1));
        let var_a: f64 = a.iter().map(|v| v * v).sum();
        let var_b: f64 = b.iter().map(|v| v * v).sum();
        assert!(var_a >= var_b);
        let cross: f64 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        assert!(cross.abs() < 1e-8);
        assert!(a.iter().sum::<f64>().abs() < 1e-8);
    }

    #[test]
    fn largest_loading_is_positive() {
        // Both features move against each other; the first dominates.
        let matrix: FeatureMatrix = [-2.0, -1.0, 1.0, 2.0]
            .iter()
            .map(|&x| vec![-2.0 * x, x])
            .collect();
        let p = project_2d(&matrix);
        // The pc1 loading is oriented to (2, -1) / sqrt(5).
        let expected: Vec<f64> = matrix.iter().map(|r| r[0] * 5f64.sqrt() / 2.0).collect();
        assert!(axis(&p, 0).iter().zip(&expected).all(|(x, y)| (x - y).abs() < TOL));
        assert!(p.points[0][0] > 0.0);
    }

    #[test]
    fn degenerate_inputs_do_not_panic() {
        assert!(project_2d(&[]).points.is_empty());
        let single = project_2d(&[vec![1.0, 2.0, 3.0]]);
        assert_eq!(single.points, [[0.0, 0.0]]);
        let one_feature = project_2d(&[vec![1.0], vec![-1.0]]);
        assert_eq!(one_feature.points.len(), 2);
        assert!(one_feature.points.iter().all(|pt| pt[1] == 0.0));
    }
}
