use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a source file into a [`Table`](super::model::Table).
///
/// Always fatal to the load: no partial table is produced.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a top-level JSON array of records")]
    NotAnArray,

    #[error("row {0}: expected a JSON object")]
    NotAnObject(usize),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("required column '{0}' is missing")]
    MissingColumn(&'static str),

    #[error("row {row}: '{value}' is not a date")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: column '{column}' is empty")]
    MissingCategory { row: usize, column: &'static str },
}
