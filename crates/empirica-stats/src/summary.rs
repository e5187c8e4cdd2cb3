use serde::Serialize;
use tracing::debug;

use empirica_core::Dataset;

use crate::describe::{mean, observed, quantile_sorted, sample_variance, sorted};
use crate::errors::StatsError;
use crate::round_to;

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub column: String,
    /// Observed (non-missing) values.
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; `None` with fewer than two observations.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
}

/// One [`SummaryRow`] per selected column, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryTable {
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn row(&self, column: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|row| row.column == column)
    }

    /// Copy with every statistic rounded to `decimals` places.
    pub fn rounded(&self, decimals: u32) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| SummaryRow {
                column: row.column.clone(),
                count: row.count,
                mean: round_to(row.mean, decimals),
                median: round_to(row.median, decimals),
                std_dev: row.std_dev.map(|v| round_to(v, decimals)),
                min: round_to(row.min, decimals),
                max: round_to(row.max, decimals),
            })
            .collect();
        Self { rows }
    }
}

/// Summarize the selected columns, or every numeric column when `columns` is `None`.
///
/// Missing cells are skipped. Absent columns fail with `ColumnNotFound`, text
/// columns with `NotNumeric`, and columns without any observation with
/// [`StatsError::NoObservations`].
pub fn summary_statistics(
    dataset: &Dataset,
    columns: Option<&[String]>,
) -> Result<SummaryTable, StatsError> {
    let selected: Vec<String> = match columns {
        Some(columns) => columns.to_vec(),
        None => dataset
            .numeric_columns()
            .into_iter()
            .map(str::to_string)
            .collect(),
    };

    let mut rows = Vec::with_capacity(selected.len());
    for name in &selected {
        let values = observed(&dataset.numeric(name)?);
        rows.push(summarize(name, &values)?);
    }

    debug!(columns = rows.len(), "summary statistics computed");
    Ok(SummaryTable { rows })
}

pub(crate) fn summarize(name: &str, values: &[f64]) -> Result<SummaryRow, StatsError> {
    let sorted = sorted(values);
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return Err(StatsError::NoObservations(name.to_string()));
    };
    let mean = mean(&sorted).ok_or_else(|| StatsError::NoObservations(name.to_string()))?;
    let median =
        quantile_sorted(&sorted, 0.5).ok_or_else(|| StatsError::NoObservations(name.to_string()))?;

    Ok(SummaryRow {
        column: name.to_string(),
        count: sorted.len(),
        // Summation error can push the mean of a near-constant column past its extremes.
        mean: mean.max(min).min(max),
        median,
        std_dev: sample_variance(&sorted).map(f64::sqrt),
        min,
        max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use empirica_core::{Column, ColumnData, Error as CoreError};

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Column::int("age", [30, 40, 20, 50]),
            Column::new(
                "income",
                ColumnData::Float(vec![Some(1.0), None, Some(3.0), Some(8.0)]),
            ),
            Column::text("education", ["PhD", "PhD", "Master", "Bachelor"]),
        ])
        .expect("dataset")
    }

    #[test]
    fn summarizes_all_numeric_columns_by_default() {
        let table = summary_statistics(&dataset(), None).expect("summary");
        assert_eq!(table.rows.len(), 2);

        let age = table.row("age").expect("age row");
        assert_eq!(age.count, 4);
        assert_eq!(age.mean, 35.0);
        assert_eq!(age.median, 35.0);
        assert_eq!(age.min, 20.0);
        assert_eq!(age.max, 50.0);
        let std = age.std_dev.expect("std");
        assert!((std - 12.909944487358056).abs() < 1e-12);

        let income = table.row("income").expect("income row");
        assert_eq!(income.count, 3);
        assert_eq!(income.median, 3.0);
        assert_eq!(income.mean, 4.0);
    }

    #[test]
    fn rejects_absent_and_text_columns() {
        let missing = summary_statistics(&dataset(), Some(["height".to_string()].as_slice()));
        assert!(matches!(
            missing,
            Err(StatsError::Core(CoreError::ColumnNotFound(_)))
        ));

        let text = summary_statistics(&dataset(), Some(["education".to_string()].as_slice()));
        assert!(matches!(text, Err(StatsError::Core(CoreError::NotNumeric(_)))));
    }

    #[test]
    fn single_observation_has_no_spread() {
        let dataset = Dataset::new(vec![Column::float("x", [2.5])]).expect("dataset");
        let table = summary_statistics(&dataset, None).expect("summary");
        assert_eq!(table.rows[0].std_dev, None);
    }

    #[test]
    fn all_missing_column_has_no_observations() {
        let dataset =
            Dataset::new(vec![Column::new("x", ColumnData::Float(vec![None, None]))]).expect("dataset");
        assert!(matches!(
            summary_statistics(&dataset, None),
            Err(StatsError::NoObservations(_))
        ));
    }

    #[test]
    fn nan_cells_are_skipped() {
        let dataset = Dataset::new(vec![Column::new(
            "income",
            ColumnData::Float(vec![Some(10.5), Some(f64::NAN), Some(12.0)]),
        )])
        .expect("dataset");
        let table = summary_statistics(&dataset, None).expect("summary");
        let row = &table.rows[0];
        assert_eq!(row.count, 2);
        assert_eq!(row.mean, 11.25);
        assert_eq!(row.max, 12.0);
    }

    #[test]
    fn summarize_tolerates_non_finite_extremes() {
        let row = summarize("x", &[1.0, f64::INFINITY]).expect("summary");
        assert_eq!(row.max, f64::INFINITY);
        assert_eq!(row.min, 1.0);
    }

    #[test]
    fn ordering_invariants_hold_after_rounding() {
        let values = vec![0.1; 37];
        let dataset = Dataset::new(vec![
            Column::float("constant", values),
            Column::float("skewed", [1.0, 1.0, 1.0, 1000.0, 2.5, 3.333]),
        ])
        .expect("dataset");
        let table = summary_statistics(&dataset, None).expect("summary");
        for row in table.rows.iter().chain(table.rounded(2).rows.iter()) {
            assert!(row.min <= row.mean && row.mean <= row.max, "{row:?}");
            assert!(row.min <= row.median && row.median <= row.max, "{row:?}");
        }
    }
}
