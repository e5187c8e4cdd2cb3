use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use empirica_generate::Variant;
use empirica_report::{FigureColumns, FigureFormat, Precision};

use super::atomic::write_bytes_atomic;
use super::{WorkspaceError, WorkspaceResult};

pub const DEFAULT_CONFIG_FILE: &str = "empirica.toml";

/// Contents of `empirica.toml`. Every field has a default, so partial files
/// and a missing file are both valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub paths: PathsConfig,
    pub generate: GenerateConfig,
    pub analysis: AnalysisSettings,
    pub tables: TablesConfig,
    pub figures: FiguresConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub raw_data: PathBuf,
    /// Where `process` saves fallback data when `raw_data` is absent.
    pub generated_data: PathBuf,
    pub processed_dir: PathBuf,
    pub tables_dir: PathBuf,
    pub figures_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_data: PathBuf::from("data/raw/sample_data.csv"),
            generated_data: PathBuf::from("data/raw/generated_fake_data.csv"),
            processed_dir: PathBuf::from("data/processed"),
            tables_dir: PathBuf::from("output/tables"),
            figures_dir: PathBuf::from("output/figures"),
            logs_dir: PathBuf::from("output/logs"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    pub rows: usize,
    pub seed: u64,
    pub variant: Variant,
    /// Row count of the fake dataset `process` falls back to.
    pub fallback_rows: usize,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            rows: 500,
            seed: 42,
            variant: Variant::Sample,
            fallback_rows: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub summary_columns: Vec<String>,
    pub balance_columns: Vec<String>,
    pub treatment_column: String,
    pub outcome_column: String,
    /// Extra predictors of the second regression model.
    pub controls: Vec<String>,
    pub age_column: String,
    pub income_column: String,
    pub education_column: String,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        let strings =
            |values: &[&str]| -> Vec<String> { values.iter().map(|v| v.to_string()).collect() };
        Self {
            summary_columns: strings(&["age", "income", "education_years", "outcome"]),
            balance_columns: strings(&["age", "income", "education_years"]),
            treatment_column: "treatment".to_string(),
            outcome_column: "outcome".to_string(),
            controls: strings(&["age", "income", "education_years"]),
            age_column: "age".to_string(),
            income_column: "income".to_string(),
            education_column: "education_years".to_string(),
        }
    }
}

impl AnalysisSettings {
    pub fn figure_columns(&self) -> FigureColumns {
        FigureColumns {
            group: self.treatment_column.clone(),
            outcome: self.outcome_column.clone(),
            age: self.age_column.clone(),
            income: self.income_column.clone(),
            education: self.education_column.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    pub summary_decimals: u32,
    pub balance_decimals: u32,
    pub regression_decimals: u32,
    /// Decimals of R-squared in the model comparison footer.
    pub fit_decimals: u32,
    pub coefficient_decimals: u32,
    /// Per-variable decimals in the model comparison, e.g. `income = 6`.
    pub overrides: BTreeMap<String, u32>,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            summary_decimals: 2,
            balance_decimals: 3,
            regression_decimals: 3,
            fit_decimals: 4,
            coefficient_decimals: 4,
            overrides: BTreeMap::from([("income".to_string(), 6)]),
        }
    }
}

impl TablesConfig {
    pub fn regression_precision(&self) -> Precision {
        Precision {
            default: self.regression_decimals,
            overrides: self.overrides.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiguresConfig {
    pub enabled: bool,
    pub formats: Vec<FigureFormat>,
    pub width: u32,
    pub height: u32,
}

impl Default for FiguresConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            formats: vec![FigureFormat::Png, FigureFormat::Svg],
            width: 1200,
            height: 800,
        }
    }
}

/// Read the config at `path`, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> WorkspaceResult<AnalysisConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config not found, using defaults");
        return Ok(AnalysisConfig::default());
    }
    let content = std::fs::read_to_string(path)?;
    let config: AnalysisConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Write `config` as pretty TOML. An existing file is only replaced with `overwrite`.
pub fn save_config(path: &Path, config: &AnalysisConfig, overwrite: bool) -> WorkspaceResult<()> {
    if path.exists() && !overwrite {
        return Err(WorkspaceError::Invalid(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    let encoded = toml::to_string_pretty(config)?;
    write_bytes_atomic(path, encoded.as_bytes())
}
