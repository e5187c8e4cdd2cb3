use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Storage kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Int,
    Float,
    Text,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Int => "int",
            ColumnKind::Float => "float",
            ColumnKind::Text => "text",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Int | ColumnKind::Float)
    }
}

/// Typed column values. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int(values) => values.len(),
            ColumnData::Float(values) => values.len(),
            ColumnData::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Int(_) => ColumnKind::Int,
            ColumnData::Float(_) => ColumnKind::Float,
            ColumnData::Text(_) => ColumnKind::Text,
        }
    }

    pub fn missing_count(&self) -> usize {
        match self {
            ColumnData::Int(values) => values.iter().filter(|v| v.is_none()).count(),
            ColumnData::Float(values) => values
                .iter()
                .filter(|v| v.is_none_or(f64::is_nan))
                .count(),
            ColumnData::Text(values) => values.iter().filter(|v| v.is_none()).count(),
        }
    }

    /// Numeric view of the column, or `None` for text columns.
    ///
    /// NaN cells come back as missing.
    pub fn to_f64(&self) -> Option<Vec<Option<f64>>> {
        match self {
            ColumnData::Int(values) => Some(values.iter().map(|v| v.map(|v| v as f64)).collect()),
            ColumnData::Float(values) => Some(
                values
                    .iter()
                    .map(|v| v.filter(|v| !v.is_nan()))
                    .collect(),
            ),
            ColumnData::Text(_) => None,
        }
    }

    /// Text rendering of a single cell; `None` when the cell is missing.
    pub fn cell_text(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Int(values) => values.get(row).copied().flatten().map(|v| v.to_string()),
            ColumnData::Float(values) => values
                .get(row)
                .copied()
                .flatten()
                .map(|v| format!("{v:?}")),
            ColumnData::Text(values) => values.get(row).cloned().flatten(),
        }
    }

    fn cell_key(&self, row: usize) -> CellKey {
        match self {
            ColumnData::Int(values) => match values.get(row).copied().flatten() {
                Some(value) => CellKey::Int(value),
                None => CellKey::Missing,
            },
            ColumnData::Float(values) => match values.get(row).copied().flatten() {
                Some(value) if value == 0.0 => CellKey::Float(0.0_f64.to_bits()),
                Some(value) => CellKey::Float(value.to_bits()),
                None => CellKey::Missing,
            },
            ColumnData::Text(values) => match values.get(row).cloned().flatten() {
                Some(value) => CellKey::Text(value),
                None => CellKey::Missing,
            },
        }
    }
}

/// Hashable identity of a cell, used to compare whole rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellKey {
    Missing,
    Int(i64),
    Float(u64),
    Text(String),
}

/// Named column of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn int(name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self::new(name, ColumnData::Int(values.into_iter().map(Some).collect()))
    }

    pub fn float(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(
            name,
            ColumnData::Float(values.into_iter().map(Some).collect()),
        )
    }

    pub fn text<S: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            name,
            ColumnData::Text(values.into_iter().map(|v| Some(v.into())).collect()),
        )
    }

    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// In-memory table of named, equal-length typed columns.
///
/// Column order is preserved as given; names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Build a dataset, rejecting duplicate names and ragged columns.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut names = BTreeSet::new();
        for column in &columns {
            if !names.insert(column.name.as_str()) {
                return Err(Error::InvalidDataset(format!(
                    "duplicate column name: {}",
                    column.name
                )));
            }
        }

        let rows = columns.first().map(Column::len).unwrap_or(0);
        if let Some(column) = columns.iter().find(|column| column.len() != rows) {
            return Err(Error::InvalidDataset(format!(
                "column '{}' has {} rows, expected {}",
                column.name,
                column.len(),
                rows
            )));
        }

        Ok(Self { columns, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Numeric values of a column as `f64`, missing cells kept as `None`.
    pub fn numeric(&self, name: &str) -> Result<Vec<Option<f64>>> {
        self.column(name)?
            .data
            .to_f64()
            .ok_or_else(|| Error::NotNumeric(name.to_string()))
    }

    /// Names of the int and float columns, in dataset order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|column| column.kind().is_numeric())
            .map(|column| column.name.as_str())
            .collect()
    }

    /// Append a column; its length must match the row count.
    pub fn with_column(self, column: Column) -> Result<Self> {
        let mut columns = self.columns;
        if !columns.is_empty() && column.len() != self.rows {
            return Err(Error::InvalidDataset(format!(
                "column '{}' has {} rows, expected {}",
                column.name,
                column.len(),
                self.rows
            )));
        }
        columns.push(column);
        Self::new(columns)
    }

    /// Replace the column with the same name in place, or append it.
    pub fn with_column_replaced(self, column: Column) -> Result<Self> {
        let Some(position) = self.columns.iter().position(|c| c.name == column.name) else {
            return self.with_column(column);
        };
        let mut columns = self.columns;
        columns[position] = column;
        Self::new(columns)
    }

    /// Hashable identity of one row across all columns.
    pub fn row_key(&self, row: usize) -> Vec<CellKey> {
        self.columns
            .iter()
            .map(|column| column.data.cell_key(row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::int("id", [1, 2, 3]),
            Column::float("income", [10.5, 20.0, 30.25]),
            Column::text("education", ["PhD", "Master", "PhD"]),
        ])
        .expect("valid dataset")
    }

    #[test]
    fn rejects_ragged_columns() {
        let result = Dataset::new(vec![
            Column::int("id", [1, 2, 3]),
            Column::float("income", [1.0, 2.0]),
        ]);
        assert!(matches!(result, Err(Error::InvalidDataset(_))));
    }

    #[test]
    fn rejects_duplicate_names() {
        let result = Dataset::new(vec![Column::int("id", [1]), Column::int("id", [2])]);
        assert!(matches!(result, Err(Error::InvalidDataset(_))));
    }

    #[test]
    fn numeric_lookup_distinguishes_missing_and_text() {
        let dataset = sample();
        assert_eq!(
            dataset.numeric("id").expect("numeric id"),
            vec![Some(1.0), Some(2.0), Some(3.0)]
        );
        assert!(matches!(
            dataset.numeric("age"),
            Err(Error::ColumnNotFound(name)) if name == "age"
        ));
        assert!(matches!(
            dataset.numeric("education"),
            Err(Error::NotNumeric(name)) if name == "education"
        ));
        assert_eq!(dataset.numeric_columns(), vec!["id", "income"]);
    }

    #[test]
    fn with_column_checks_length() {
        let dataset = sample();
        let extended = dataset
            .clone()
            .with_column(Column::int("age", [30, 40, 50]))
            .expect("append column");
        assert_eq!(extended.column_count(), 4);
        assert!(dataset.with_column(Column::int("age", [30])).is_err());
    }

    #[test]
    fn with_column_replaced_keeps_position() {
        let dataset = sample()
            .with_column_replaced(Column::float("income", [1.0, 2.0, 3.0]))
            .expect("replace column");
        assert_eq!(dataset.column_names(), vec!["id", "income", "education"]);
        assert_eq!(
            dataset.numeric("income").expect("income"),
            vec![Some(1.0), Some(2.0), Some(3.0)]
        );

        let dataset = dataset
            .with_column_replaced(Column::int("age", [30, 40, 50]))
            .expect("append column");
        assert_eq!(dataset.column_count(), 4);
        assert!(
            dataset
                .with_column_replaced(Column::int("age", [30]))
                .is_err()
        );
    }

    #[test]
    fn nan_cells_count_as_missing() {
        let data = ColumnData::Float(vec![Some(1.0), Some(f64::NAN), None]);
        assert_eq!(data.missing_count(), 2);
        assert_eq!(data.to_f64(), Some(vec![Some(1.0), None, None]));
    }

    #[test]
    fn float_zero_signs_share_row_key() {
        let dataset = Dataset::new(vec![Column::float("x", [0.0, -0.0])]).expect("dataset");
        assert_eq!(dataset.row_key(0), dataset.row_key(1));
    }
}
