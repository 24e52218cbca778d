//! Untyped CSV tables: reading source files, union-of-columns concatenation
//! and writing output artifacts.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Serialize, Serializer};

use crate::error::EtlError;
use crate::summary::SkipReason;

/// Column-named rows of nullable cells. Empty source cells are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Read a headed CSV file. Ragged rows fail the whole read.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, EtlError> {
        let mut reader = csv::ReaderBuilder::new().delimiter(b',').from_path(path)?;
        let columns: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(
                record
                    .iter()
                    .map(|cell| if cell.is_empty() { None } else { Some(cell.to_string()) })
                    .collect(),
            );
        }

        Ok(Self { columns, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Names from `required` that the table lacks, in the order given
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| self.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of `name`, appending an empty column when absent
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in self.rows.iter_mut() {
            row.push(None);
        }
        self.columns.len() - 1
    }

    /// Stack tables in order. Columns are the union in first-seen order; rows
    /// lacking a column get `None`. No deduplication.
    pub fn concat(tables: Vec<Table>) -> Table {
        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for table in &tables {
            for column in &table.columns {
                if !positions.contains_key(column) {
                    positions.insert(column.clone(), columns.len());
                    columns.push(column.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(tables.iter().map(Table::len).sum());
        for table in tables {
            let targets: Vec<usize> = table.columns.iter().map(|c| positions[c]).collect();
            for row in table.rows {
                let mut out = vec![None; columns.len()];
                for (cell, &target) in row.into_iter().zip(targets.iter()) {
                    out[target] = cell;
                }
                rows.push(out);
            }
        }

        Table { columns, rows }
    }

    /// Overwrite `path` with this table, header first
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), EtlError> {
        let mut writer = open_writer(path.as_ref())?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Overwrite `path` with `headers` followed by the serialized records.
/// The header row is written even when there are no records.
pub fn write_records<T: Serialize, P: AsRef<Path>>(
    path: P,
    headers: &[&str],
    records: &[T],
) -> Result<(), EtlError> {
    let mut writer = open_writer(path.as_ref())?;
    writer.write_record(headers)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Numeric cell: empty is `None`, anything unparsable or non-finite fails the file.
/// `row` is the 1-based data row used in the skip message.
pub fn parse_number(cell: Option<&str>, row: usize, column: &str) -> Result<Option<f64>, SkipReason> {
    let Some(raw) = cell.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(SkipReason::MalformedValue {
            row,
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Shortest round-trip text for floats, so whole numbers print without `.0`
pub fn serialize_f64<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

pub fn serialize_opt_f64<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.collect_str(v),
        None => serializer.serialize_none(),
    }
}

fn open_writer(path: &Path) -> Result<csv::Writer<fs::File>, EtlError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = fs::File::create(path)
        .map_err(|e| EtlError::Io(format!("{}: {}", path.display(), e)))?;
    Ok(csv::WriterBuilder::new().has_headers(false).from_writer(file))
}
