//! Seeded synthetic data generation for empirica.
//!
//! The engine produces deterministic research datasets from an explicit seed:
//! identical options always yield bit-identical columns, independent of any
//! other generation performed in the same process.

pub mod engine;
pub mod errors;
pub mod model;

pub use engine::GenerationEngine;
pub use errors::GenerationError;
pub use model::{GenerateOptions, Variant};
