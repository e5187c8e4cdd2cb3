//! Core contracts and helpers for empirica.
//!
//! This crate defines the typed in-memory [`Dataset`], the CSV loader and
//! writer, and the non-fatal dataset validator shared by the generator, the
//! statistics engines and the CLI.

pub mod dataset;
pub mod error;
pub mod io;
pub mod validation;

pub use dataset::{Column, ColumnData, ColumnKind, Dataset};
pub use error::{Error, Result};
pub use io::{load_csv, write_csv};
pub use validation::{IssueCode, ValidationIssue, ValidationReport, validate_dataset};
