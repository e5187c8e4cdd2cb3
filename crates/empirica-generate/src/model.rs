use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Column layout and distributional rules of a synthetic dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Workshop sample: `education_years` and an outcome with a +8 effect.
    #[default]
    Sample,
    /// Fallback fake data: `education` levels, `satisfaction` and a +5 effect.
    Fake,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Sample => "sample",
            Variant::Fake => "fake",
        }
    }

    /// Injected additive effect of `treatment` on `outcome`.
    pub fn treatment_effect(&self) -> f64 {
        match self {
            Variant::Sample => 8.0,
            Variant::Fake => 5.0,
        }
    }

    /// Mean outcome of an untreated unit at the reference age.
    pub fn outcome_baseline(&self) -> f64 {
        match self {
            Variant::Sample => 100.0,
            Variant::Fake => 50.0,
        }
    }

    /// Column names in output order.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Variant::Sample => &[
                "id",
                "treatment",
                "age",
                "income",
                "education_years",
                "outcome",
            ],
            Variant::Fake => &[
                "id",
                "treatment",
                "age",
                "income",
                "education",
                "satisfaction",
                "outcome",
            ],
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "sample" => Ok(Variant::Sample),
            "fake" => Ok(Variant::Fake),
            other => Err(format!("unknown variant '{other}' (expected sample or fake)")),
        }
    }
}

/// Options for the generation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Number of rows to generate.
    pub rows: usize,
    /// Seed for every column stream.
    pub seed: u64,
    pub variant: Variant,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            rows: 500,
            seed: 42,
            variant: Variant::Sample,
        }
    }
}
