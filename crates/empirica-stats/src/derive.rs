use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use empirica_core::{Column, ColumnData, Dataset};

use crate::describe::{observed, quantile_sorted, sorted};
use crate::errors::StatsError;

const AGE_EDGES: [f64; 5] = [0.0, 25.0, 35.0, 50.0, 100.0];
const AGE_LABELS: [&str; 4] = ["Young", "Adult", "Middle-aged", "Senior"];
const QUARTILE_LABELS: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

/// Source columns for the derived analysis variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeriveOptions {
    pub age_column: String,
    pub income_column: String,
}

impl Default for DeriveOptions {
    fn default() -> Self {
        Self {
            age_column: "age".to_string(),
            income_column: "income".to_string(),
        }
    }
}

/// Append `age_group`, `log_income` and `income_quartile` to a copy of the dataset.
///
/// Each derived column is added only when its source column is present. A
/// derived column that already exists is recomputed in place.
pub fn derive_variables(dataset: &Dataset, options: &DeriveOptions) -> Result<Dataset, StatsError> {
    let mut derived = dataset.clone();
    let mut added = Vec::new();

    if dataset.contains(&options.age_column) {
        let age = dataset.numeric(&options.age_column)?;
        let groups = age
            .iter()
            .map(|value| value.and_then(age_group).map(str::to_string))
            .collect();
        derived =
            derived.with_column_replaced(Column::new("age_group", ColumnData::Text(groups)))?;
        added.push("age_group");
    }

    if dataset.contains(&options.income_column) {
        let income = dataset.numeric(&options.income_column)?;
        let log_income: Vec<Option<f64>> = income
            .iter()
            .map(|value| value.filter(|v| *v > 0.0).map(f64::ln))
            .collect();
        let dropped = income.iter().flatten().filter(|v| **v <= 0.0).count();
        if dropped > 0 {
            warn!(
                column = %options.income_column,
                dropped,
                "non-positive values have no logarithm"
            );
        }
        derived = derived
            .with_column_replaced(Column::new("log_income", ColumnData::Float(log_income)))?;

        let quartiles = quartile_labels(&options.income_column, &income)?;
        derived = derived.with_column_replaced(Column::new(
            "income_quartile",
            ColumnData::Text(quartiles),
        ))?;
        added.push("log_income");
        added.push("income_quartile");
    }

    info!(added = added.len(), columns = ?added, "derived variables");
    Ok(derived)
}

/// Right-closed age bucket: (0, 25], (25, 35], (35, 50], (50, 100].
fn age_group(age: f64) -> Option<&'static str> {
    AGE_EDGES
        .windows(2)
        .position(|edge| age > edge[0] && age <= edge[1])
        .map(|idx| AGE_LABELS[idx])
}

/// Quartile labels from interpolated 25/50/75 % cut points.
fn quartile_labels(name: &str, values: &[Option<f64>]) -> Result<Vec<Option<String>>, StatsError> {
    let sorted = sorted(&observed(values));
    if sorted.is_empty() {
        return Err(StatsError::NoObservations(name.to_string()));
    }

    let edges = [0.0, 0.25, 0.5, 0.75, 1.0]
        .iter()
        .map(|q| quantile_sorted(&sorted, *q))
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| StatsError::NoObservations(name.to_string()))?;
    if edges.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(StatsError::DegenerateQuantiles(name.to_string()));
    }

    Ok(values
        .iter()
        .map(|value| {
            let value = (*value)?;
            if value == edges[0] {
                return Some(QUARTILE_LABELS[0].to_string());
            }
            edges
                .windows(2)
                .position(|edge| value > edge[0] && value <= edge[1])
                .map(|idx| QUARTILE_LABELS[idx].to_string())
        })
        .collect())
}
