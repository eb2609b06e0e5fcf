use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analysis::aggregate::{daily_totals, monthly_summary, DailyTotal, MonthlyAggregate};
use crate::analysis::correlation::{correlation_matrix, CorrelationMatrix};
use crate::analysis::distribution::{box_summary, BoxStats};
use crate::analysis::encoding::{categorical_codes, row_codes, CategoryCodes};
use crate::analysis::projection::{project_2d, standardize, Projection, PROJECTION_COLUMNS};
use crate::color::ColorMap;
use crate::data::cache::DatasetCache;
use crate::data::error::DataLoadError;
use crate::data::filter::{filter, FilterSelection};
use crate::data::model::{Dimension, NumericColumn, Table};

/// Axes of the parallel-coordinates chart, left to right.
pub const PARALLEL_COLUMNS: [NumericColumn; 4] = [
    NumericColumn::UnitPrice,
    NumericColumn::Quantity,
    NumericColumn::GrossIncome,
    NumericColumn::Rating,
];

/// Axes of the 3-D scatter: x, y, z.
pub const SCATTER_3D_COLUMNS: [NumericColumn; 3] = [
    NumericColumn::UnitPrice,
    NumericColumn::Quantity,
    NumericColumn::GrossIncome,
];

// ---------------------------------------------------------------------------
// Filter events
// ---------------------------------------------------------------------------

/// A change to the filter selection coming from the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEvent {
    Toggle { dim: Dimension, value: String },
    SelectAll(Dimension),
    SelectNone(Dimension),
}

// ---------------------------------------------------------------------------
// Dashboard view: everything the charts consume for one filter state
// ---------------------------------------------------------------------------

/// A point of the 3-D scatter with its product line.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPoint3 {
    pub xyz: [f64; 3],
    pub product_line: String,
}

/// All derived outputs for the current filter state.
///
/// Rebuilt from scratch on every filter change and never persisted.
#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    pub filtered: Table,
    pub daily: Vec<DailyTotal>,
    pub monthly: Vec<MonthlyAggregate>,
    pub correlation: CorrelationMatrix,
    pub income_boxes: Vec<BoxStats>,
    /// City → code mapping and the per-row city code, for parallel coordinates.
    pub city_codes: CategoryCodes,
    pub row_city_codes: Vec<usize>,
    /// Raw values of [`PARALLEL_COLUMNS`], one vector per axis.
    pub parallel: Vec<Vec<Option<f64>>>,
    pub projection: Projection,
    /// Product line of each projected point.
    pub projection_labels: Vec<String>,
    /// Rows with all of [`SCATTER_3D_COLUMNS`] present.
    pub points_3d: Vec<LabeledPoint3>,
}

impl DashboardView {
    /// Run every aggregation over the filtered table, in sequence.
    pub fn compute(filtered: Table) -> Self {
        let city_codes = categorical_codes(&filtered, Dimension::City);
        let row_city_codes = row_codes(&filtered, Dimension::City, &city_codes);
        let parallel = PARALLEL_COLUMNS.iter().map(|&c| filtered.column(c)).collect();

        let standardized = standardize(&filtered, &PROJECTION_COLUMNS);
        let projection = project_2d(&standardized);
        let projection_labels = filtered
            .records()
            .iter()
            .map(|r| r.product_line.clone())
            .collect();

        let points_3d = filtered
            .records()
            .iter()
            .filter_map(|r| {
                let [x, y, z] = SCATTER_3D_COLUMNS.map(|c| r.value(c));
                Some(LabeledPoint3 {
                    xyz: [x?, y?, z?],
                    product_line: r.product_line.clone(),
                })
            })
            .collect();

        DashboardView {
            daily: daily_totals(&filtered),
            monthly: monthly_summary(&filtered),
            correlation: correlation_matrix(&filtered),
            income_boxes: box_summary(&filtered),
            city_codes,
            row_city_codes,
            parallel,
            projection,
            projection_labels,
            points_3d,
            filtered,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Orientation of the 3-D scatter, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub yaw: f64,
    pub pitch: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            yaw: 35.0,
            pitch: 25.0,
        }
    }
}

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded tables, keyed by path, for the lifetime of the process.
    pub cache: DatasetCache,

    /// Path of the active dataset.
    pub source: Option<PathBuf>,

    /// Active dataset (None until a file loads).
    pub dataset: Option<Arc<Table>>,

    /// Selected cities and product lines.
    pub selection: FilterSelection,

    /// Derived outputs for `selection`.
    pub view: DashboardView,

    /// Colours per product line, stable across filter changes.
    pub line_colors: Option<ColorMap>,

    /// Colours per city.
    pub city_colors: Option<ColorMap>,

    pub camera: Camera,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Load `path` through the cache and make it the active dataset.
    pub fn open(&mut self, path: &Path) -> Result<(), DataLoadError> {
        let loaded = self.cache.load(path);
        self.activate(path, loaded)
    }

    /// Re-read the active dataset from disk.
    pub fn reload(&mut self) -> Result<(), DataLoadError> {
        let Some(path) = self.source.clone() else {
            return Ok(());
        };
        let loaded = self.cache.reload(&path);
        self.activate(&path, loaded)
    }

    fn activate(
        &mut self,
        path: &Path,
        loaded: Result<Arc<Table>, DataLoadError>,
    ) -> Result<(), DataLoadError> {
        match loaded {
            Ok(table) => {
                self.source = Some(path.to_path_buf());
                self.set_dataset(table);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    /// Ingest a newly loaded dataset: select everything and recompute.
    pub fn set_dataset(&mut self, table: Arc<Table>) {
        self.selection = FilterSelection::all(&table);
        self.line_colors = Some(ColorMap::new(table.product_lines()));
        self.city_colors = Some(ColorMap::new(table.cities()));
        self.dataset = Some(table);
        self.status_message = None;
        self.recompute();
    }

    /// Apply one filter change and recompute the view.
    ///
    /// Returns whether the selection actually changed.
    pub fn apply(&mut self, event: FilterEvent) -> bool {
        let Some(table) = &self.dataset else {
            return false;
        };
        let before = self.selection.clone();
        match event {
            FilterEvent::Toggle { dim, value } => {
                let set = self.selection.set_mut(dim);
                if !set.remove(&value) {
                    set.insert(value);
                }
            }
            FilterEvent::SelectAll(dim) => {
                let all = dim.values(table).iter().cloned().collect();
                *self.selection.set_mut(dim) = all;
            }
            FilterEvent::SelectNone(dim) => self.selection.set_mut(dim).clear(),
        }
        let changed = self.selection != before;
        if changed {
            self.recompute();
        }
        changed
    }

    /// Rebuild `view` from the active dataset and selection.
    pub fn recompute(&mut self) {
        let filtered = match &self.dataset {
            Some(table) => filter(table, &self.selection),
            None => Table::default(),
        };
        log::debug!("Recomputing dashboard for {} rows", filtered.len());
        self.view = DashboardView::compute(filtered);
    }
}
