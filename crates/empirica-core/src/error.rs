use std::path::PathBuf;

use thiserror::Error;

/// Core error type shared across empirica crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The input file does not exist.
    #[error("data file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// The input file exists but could not be parsed into a dataset.
    #[error("error loading data from {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A requested column is not part of the dataset.
    #[error("column not found: {0}")]
    ColumnNotFound(String),
    /// A requested column exists but does not hold numbers.
    #[error("column '{0}' is not numeric")]
    NotNumeric(String),
    /// The dataset violates its structural invariants.
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for results returned by empirica crates.
pub type Result<T> = std::result::Result<T, Error>;
