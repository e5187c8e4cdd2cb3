use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dataset::{ColumnData, Dataset};

/// Category of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    EmptyDataset,
    DuplicateRows,
    MissingValues,
    InfiniteValues,
}

/// Structured validation finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: IssueCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub message: String,
}

/// Findings of a dataset validation. An empty report means a clean dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(|issue| issue.message.clone()).collect()
    }

    fn push(&mut self, code: IssueCode, column: Option<&str>, message: String) {
        self.issues.push(ValidationIssue {
            code,
            column: column.map(str::to_string),
            message,
        });
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for issue in &self.issues {
            writeln!(f, "- {}", issue.message)?;
        }
        Ok(())
    }
}

/// Check a dataset for common data-quality problems.
///
/// This checks:
/// - an empty dataset
/// - exact duplicate rows
/// - missing values in numeric columns, NaN included
/// - infinite values in numeric columns
///
/// Findings are reported, never raised.
pub fn validate_dataset(dataset: &Dataset) -> ValidationReport {
    let mut report = ValidationReport::default();

    if dataset.is_empty() {
        report.push(IssueCode::EmptyDataset, None, "Dataset is empty".to_string());
    }

    let duplicates = count_duplicate_rows(dataset);
    if duplicates > 0 {
        report.push(
            IssueCode::DuplicateRows,
            None,
            format!("Found {duplicates} duplicated rows"),
        );
    }

    for column in dataset.columns() {
        if !column.kind().is_numeric() {
            continue;
        }

        if column.data.missing_count() > 0 {
            report.push(
                IssueCode::MissingValues,
                Some(&column.name),
                format!("Column '{}' has missing values", column.name),
            );
        }

        if let ColumnData::Float(values) = &column.data {
            if values.iter().flatten().any(|value| value.is_infinite()) {
                report.push(
                    IssueCode::InfiniteValues,
                    Some(&column.name),
                    format!("Column '{}' has infinite values", column.name),
                );
            }
        }
    }

    report
}

/// Rows identical to an earlier row; the first occurrence is not counted.
fn count_duplicate_rows(dataset: &Dataset) -> usize {
    if dataset.column_count() == 0 {
        return 0;
    }

    let mut seen = HashSet::with_capacity(dataset.row_count());
    (0..dataset.row_count())
        .filter(|&row| !seen.insert(dataset.row_key(row)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    #[test]
    fn clean_dataset_passes() {
        let dataset = Dataset::new(vec![
            Column::int("id", [1, 2]),
            Column::float("income", [1.0, 2.0]),
        ])
        .expect("dataset");
        let report = validate_dataset(&dataset);
        assert!(report.passed());
        assert!(report.messages().is_empty());
    }

    #[test]
    fn reports_every_issue_kind() {
        let dataset = Dataset::new(vec![
            Column::new("age", ColumnData::Int(vec![Some(30), Some(30), None])),
            Column::new(
                "income",
                ColumnData::Float(vec![Some(1.0), Some(1.0), Some(f64::INFINITY)]),
            ),
            Column::new(
                "label",
                ColumnData::Text(vec![Some("a".into()), Some("a".into()), None]),
            ),
        ])
        .expect("dataset");

        let report = validate_dataset(&dataset);
        assert!(!report.passed());
        assert_eq!(
            report.messages(),
            vec![
                "Found 1 duplicated rows".to_string(),
                "Column 'age' has missing values".to_string(),
                "Column 'income' has infinite values".to_string(),
            ]
        );
    }

    #[test]
    fn nan_is_reported_as_missing() {
        let dataset = Dataset::new(vec![Column::new(
            "x",
            ColumnData::Float(vec![Some(1.0), Some(f64::NAN)]),
        )])
        .expect("dataset");
        let report = validate_dataset(&dataset);
        assert!(!report.passed());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].code, IssueCode::MissingValues);
        assert_eq!(report.issues[0].column.as_deref(), Some("x"));
    }

    #[test]
    fn empty_dataset_is_reported() {
        let report = validate_dataset(&Dataset::default());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].code, IssueCode::EmptyDataset);
    }
}
