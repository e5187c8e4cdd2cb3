use serde::Serialize;
use tracing::{debug, warn};

use empirica_core::Dataset;

use crate::describe::{mean, sample_variance};
use crate::errors::StatsError;
use crate::round_to;

const CONTROL: i64 = 0;
const TREATMENT: i64 = 1;

/// Group comparison for one covariate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceRow {
    pub variable: String,
    pub control_mean: f64,
    pub treatment_mean: f64,
    /// `treatment_mean - control_mean`.
    pub difference: f64,
    /// Unpooled standard error of the difference; `None` when a group has a
    /// single observation and its variance is undefined.
    pub std_error: Option<f64>,
    pub n_control: usize,
    pub n_treatment: usize,
}

/// Balance rows for every requested covariate, in request order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceTable {
    pub group_column: String,
    pub rows: Vec<BalanceRow>,
}

impl BalanceTable {
    pub fn row(&self, variable: &str) -> Option<&BalanceRow> {
        self.rows.iter().find(|row| row.variable == variable)
    }

    /// Copy with means, difference and standard error rounded to `decimals` places.
    pub fn rounded(&self, decimals: u32) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| BalanceRow {
                variable: row.variable.clone(),
                control_mean: round_to(row.control_mean, decimals),
                treatment_mean: round_to(row.treatment_mean, decimals),
                difference: round_to(row.difference, decimals),
                std_error: row.std_error.map(|v| round_to(v, decimals)),
                n_control: row.n_control,
                n_treatment: row.n_treatment,
            })
            .collect();
        Self {
            group_column: self.group_column.clone(),
            rows,
        }
    }
}

/// Compare covariate means between the `0` and `1` groups of `group_column`.
///
/// Rows whose group label is missing or not exactly 0 or 1 are ignored, as
/// are missing covariate cells. A group without any observation of a
/// covariate fails with [`StatsError::InsufficientGroupSize`].
pub fn balance_table(
    dataset: &Dataset,
    group_column: &str,
    variables: &[String],
) -> Result<BalanceTable, StatsError> {
    let groups = dataset.numeric(group_column)?;

    let mut rows = Vec::with_capacity(variables.len());
    for variable in variables {
        let values = dataset.numeric(variable)?;
        let mut control = Vec::new();
        let mut treatment = Vec::new();
        for (group, value) in groups.iter().zip(&values) {
            let (Some(group), Some(value)) = (group, value) else {
                continue;
            };
            if *group == CONTROL as f64 {
                control.push(*value);
            } else if *group == TREATMENT as f64 {
                treatment.push(*value);
            }
        }

        let insufficient = |group: i64, size: usize| StatsError::InsufficientGroupSize {
            group_column: group_column.to_string(),
            group,
            variable: variable.clone(),
            size,
        };
        let control_mean = mean(&control).ok_or_else(|| insufficient(CONTROL, 0))?;
        let treatment_mean = mean(&treatment).ok_or_else(|| insufficient(TREATMENT, 0))?;

        let std_error = match (sample_variance(&control), sample_variance(&treatment)) {
            (Some(var_control), Some(var_treatment)) => Some(
                (var_control / control.len() as f64 + var_treatment / treatment.len() as f64)
                    .sqrt(),
            ),
            _ => {
                warn!(
                    variable = %variable,
                    n_control = control.len(),
                    n_treatment = treatment.len(),
                    "standard error undefined for a single-observation group"
                );
                None
            }
        };

        rows.push(BalanceRow {
            variable: variable.clone(),
            control_mean,
            treatment_mean,
            difference: treatment_mean - control_mean,
            std_error,
            n_control: control.len(),
            n_treatment: treatment.len(),
        });
    }

    debug!(group_column, variables = rows.len(), "balance table computed");
    Ok(BalanceTable {
        group_column: group_column.to_string(),
        rows,
    })
}
