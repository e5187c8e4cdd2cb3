//! Statistical engines for empirica datasets.
//!
//! Descriptive summaries, treatment/control balance tables, ordinary least
//! squares with t-based inference, derived analysis variables and a dataset
//! overview. All engines are pure functions over a [`Dataset`].
//!
//! [`Dataset`]: empirica_core::Dataset

pub mod balance;
mod describe;
pub mod derive;
pub mod distribution;
pub mod errors;
pub mod overview;
pub mod regression;
pub mod summary;

pub use balance::{BalanceRow, BalanceTable, balance_table};
pub use derive::{DeriveOptions, derive_variables};
pub use errors::StatsError;
pub use overview::{ColumnOverview, DatasetOverview, GroupOverview, dataset_overview};
pub use regression::{Coefficient, Formula, INTERCEPT, RegressionResult, ols, simple_fit};
pub use summary::{SummaryRow, SummaryTable, summary_statistics};

/// Round half away from zero to a fixed number of decimals.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}
