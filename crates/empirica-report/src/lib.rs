//! Publication output for empirica analyses.
//!
//! Tables are built as format-neutral [`TableDoc`]s and serialized to LaTeX
//! or Markdown; figures are drawn with `plotters` into PNG and SVG files.

pub mod errors;
pub mod latex;
pub mod markdown;
pub mod plots;
pub mod table;

use std::fs;
use std::path::Path;

use tracing::info;

pub use errors::ReportError;
pub use latex::{escape_latex, render_latex};
pub use markdown::{render_markdown, render_overview};
pub use plots::{
    Bin, Figure, FigureColumns, FigureFormat, PlotError, distributions, histogram_bins,
    outcome_by_treatment, render_figure, scatter_income_outcome, value_counts,
};
pub use table::{
    Cell, Precision, TableDoc, balance_doc, coefficient_doc, format_fixed,
    regression_comparison_doc, significance_stars, summary_doc,
};

/// Write rendered table text to `path`, creating parent directories and
/// replacing any previous file.
pub fn write_table(path: &Path, text: &str) -> Result<(), ReportError> {
    let write_error = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(path, text).map_err(write_error)?;
    info!(path = %path.display(), bytes = text.len(), "saved table");
    Ok(())
}
