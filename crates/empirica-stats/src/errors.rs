use thiserror::Error;

/// Errors emitted by the statistics engines.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("column '{0}' has no observed values")]
    NoObservations(String),
    #[error(
        "group {group} of '{group_column}' has {size} observation(s) of '{variable}'; at least 1 is required"
    )]
    InsufficientGroupSize {
        group_column: String,
        group: i64,
        variable: String,
        size: usize,
    },
    #[error("singular design: {0}")]
    SingularDesign(String),
    #[error("invalid formula: {0}")]
    InvalidFormula(String),
    #[error("column '{0}' has duplicate quantile edges")]
    DegenerateQuantiles(String),
    #[error(transparent)]
    Core(#[from] empirica_core::Error),
}
