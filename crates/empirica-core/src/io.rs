use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::dataset::{Column, ColumnData, Dataset};
use crate::error::{Error, Result};

const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

/// Load a headered CSV file into a typed dataset.
///
/// Column kinds are inferred from the non-missing cells: integers first,
/// then floats (including `inf`), otherwise text. Any spelling of NaN in a
/// float column loads as a missing cell.
pub fn load_csv(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    let load_error = |source: Box<dyn std::error::Error + Send + Sync>| Error::Load {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|err| load_error(err.into()))?;

    let headers = reader
        .headers()
        .map_err(|err| load_error(err.into()))?
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();

    let mut seen = BTreeSet::new();
    for header in &headers {
        if !seen.insert(header.as_str()) {
            return Err(load_error(format!("duplicate header: {header}").into()));
        }
    }

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(|err| load_error(err.into()))?;
        for (idx, value) in record.iter().enumerate() {
            let value = if MISSING_TOKENS.contains(&value) {
                None
            } else {
                Some(value.to_string())
            };
            cells[idx].push(value);
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, infer_column(values)))
        .collect();
    let dataset = Dataset::new(columns).map_err(|err| load_error(err.into()))?;

    info!(
        path = %path.display(),
        rows = dataset.row_count(),
        columns = dataset.column_count(),
        "dataset loaded"
    );
    Ok(dataset)
}

fn infer_column(values: Vec<Option<String>>) -> ColumnData {
    let present = || values.iter().flatten();

    if present().all(|value| value.parse::<i64>().is_ok()) {
        return ColumnData::Int(
            values
                .iter()
                .map(|value| value.as_deref().and_then(|v| v.parse().ok()))
                .collect(),
        );
    }
    if present().all(|value| value.parse::<f64>().is_ok()) {
        return ColumnData::Float(
            values
                .iter()
                .map(|value| {
                    value
                        .as_deref()
                        .and_then(|v| v.parse::<f64>().ok())
                        .filter(|v| !v.is_nan())
                })
                .collect(),
        );
    }
    ColumnData::Text(values)
}

/// Write a dataset as CSV with its column order, creating parent directories.
///
/// Missing cells are written empty. Returns the number of bytes written.
pub fn write_csv(path: &Path, dataset: &Dataset) -> Result<u64> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let writer = BufWriter::new(File::create(path)?);
    let counting = CountingWriter::new(writer);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(counting);

    writer.write_record(dataset.column_names())?;

    for row in 0..dataset.row_count() {
        let record: Vec<String> = dataset
            .columns()
            .iter()
            .map(|column| column.data.cell_text(row).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }

    writer.flush()?;
    let counting = writer.into_inner().map_err(|err| err.into_error())?;
    let bytes = counting.bytes_written();

    info!(
        path = %path.display(),
        rows = dataset.row_count(),
        bytes,
        "dataset written"
    );
    Ok(bytes)
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ColumnKind;

    #[test]
    fn infers_int_then_float_then_text() {
        let ints = infer_column(vec![Some("1".into()), None, Some("-4".into())]);
        assert_eq!(ints, ColumnData::Int(vec![Some(1), None, Some(-4)]));

        let floats = infer_column(vec![Some("1".into()), Some("2.5".into()), Some("inf".into())]);
        assert_eq!(floats.kind(), ColumnKind::Float);
        assert_eq!(
            floats.to_f64().expect("numeric"),
            vec![Some(1.0), Some(2.5), Some(f64::INFINITY)]
        );

        let text = infer_column(vec![Some("PhD".into()), Some("12".into())]);
        assert_eq!(text.kind(), ColumnKind::Text);
    }

    #[test]
    fn nan_spellings_load_as_missing() {
        let dir = std::env::temp_dir().join(format!("empirica_io_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("nan.csv");
        std::fs::write(&path, "id,income\n1,10.5\n2,NAN\n3,-nan\n4,+NaN\n5,12.0\n")
            .expect("write csv");

        let dataset = load_csv(&path).expect("load");
        let income = dataset.column("income").expect("income");
        assert_eq!(income.kind(), ColumnKind::Float);
        assert_eq!(
            income.data,
            ColumnData::Float(vec![Some(10.5), None, None, None, Some(12.0)])
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn all_missing_column_is_numeric() {
        let column = infer_column(vec![None, None]);
        assert_eq!(column, ColumnData::Int(vec![None, None]));
    }
}
