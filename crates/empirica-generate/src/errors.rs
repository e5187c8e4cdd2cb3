use thiserror::Error;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("invalid distribution parameters: {0}")]
    Distribution(String),
    #[error("core error: {0}")]
    Core(#[from] empirica_core::Error),
}
