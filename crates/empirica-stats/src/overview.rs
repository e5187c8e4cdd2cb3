use std::collections::BTreeMap;

use serde::Serialize;

use empirica_core::{ColumnKind, Dataset};

use crate::describe::{mean, observed};
use crate::errors::StatsError;
use crate::summary::{SummaryTable, summarize};

/// Shape and type of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnOverview {
    pub name: String,
    pub kind: ColumnKind,
    pub missing: usize,
}

/// Size of one group and its mean outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupOverview {
    pub value: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_outcome: Option<f64>,
}

/// Quick look at a dataset before analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOverview {
    pub rows: usize,
    pub columns: Vec<ColumnOverview>,
    /// Numeric columns with at least one observation.
    pub summary: SummaryTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome_column: Option<String>,
    /// Most frequent group first.
    pub groups: Vec<GroupOverview>,
}

impl DatasetOverview {
    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|column| column.missing).sum()
    }
}

/// Describe shape, column kinds, missing cells and group composition.
///
/// Group statistics are included only when `group_column` exists; mean
/// outcomes only when `outcome_column` is also present and numeric.
pub fn dataset_overview(
    dataset: &Dataset,
    group_column: &str,
    outcome_column: &str,
) -> Result<DatasetOverview, StatsError> {
    let columns = dataset
        .columns()
        .iter()
        .map(|column| ColumnOverview {
            name: column.name.clone(),
            kind: column.kind(),
            missing: column.data.missing_count(),
        })
        .collect();

    let mut summary = SummaryTable::default();
    for name in dataset.numeric_columns() {
        let values = observed(&dataset.numeric(name)?);
        if !values.is_empty() {
            summary.rows.push(summarize(name, &values)?);
        }
    }

    let mut groups = Vec::new();
    let has_groups = dataset.contains(group_column);
    let outcome = if has_groups && dataset.contains(outcome_column) {
        dataset.numeric(outcome_column).ok()
    } else {
        None
    };

    if has_groups {
        let column = dataset.column(group_column)?;
        let mut buckets: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for row in 0..dataset.row_count() {
            if let Some(value) = column.data.cell_text(row) {
                buckets.entry(value).or_default().push(row);
            }
        }

        groups = buckets
            .into_iter()
            .map(|(value, rows)| {
                let mean_outcome = outcome.as_ref().and_then(|outcome| {
                    let values: Vec<Option<f64>> = rows.iter().map(|&row| outcome[row]).collect();
                    mean(&observed(&values))
                });
                GroupOverview {
                    value,
                    count: rows.len(),
                    mean_outcome,
                }
            })
            .collect();
        groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    }

    Ok(DatasetOverview {
        rows: dataset.row_count(),
        columns,
        summary,
        group_column: has_groups.then(|| group_column.to_string()),
        outcome_column: outcome.is_some().then(|| outcome_column.to_string()),
        groups,
    })
}
