use std::path::PathBuf;

use thiserror::Error;

use crate::plots::PlotError;

/// Errors emitted while rendering tables and figures.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Plot(#[from] PlotError),
    #[error(transparent)]
    Core(#[from] empirica_core::Error),
}
