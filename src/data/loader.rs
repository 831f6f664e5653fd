use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::coerce::CoercionReport;
use super::model::{Table, Value};
use super::{campaign, streaming};

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

/// The two source tables of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Streaming,
    Campaigns,
}

impl Dataset {
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Streaming => "streaming",
            Dataset::Campaigns => "campaigns",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Load and schema-check the streaming table.
pub fn load_streaming(path: &Path) -> Result<Table> {
    let table = load_file(path, Dataset::Streaming.name())?;
    streaming::validate(&table).with_context(|| format!("loading {}", path.display()))?;
    log::info!(
        "Loaded {} streaming rows with columns {:?}",
        table.len(),
        table.columns()
    );
    Ok(table)
}

/// Load the campaign table and run the canonical cleaning.
pub fn load_campaigns(path: &Path) -> Result<(Table, CoercionReport)> {
    let raw = load_file(path, Dataset::Campaigns.name())?;
    let (table, report) =
        campaign::prepare(&raw).with_context(|| format!("loading {}", path.display()))?;
    log::info!(
        "Loaded {} campaign rows ({} dropped, {} non-numeric values)",
        table.len(),
        raw.len() - table.len(),
        report.total()
    );
    Ok((table, report))
}

// ---------------------------------------------------------------------------
// TableCache – one load per source file
// ---------------------------------------------------------------------------

/// Memoizes loaded tables per dataset and canonical path. Source files are
/// static for the session, so entries are never invalidated.
#[derive(Debug, Default)]
pub struct TableCache {
    tables: HashMap<(Dataset, PathBuf), Arc<Table>>,
}

impl TableCache {
    pub fn get_or_load(&mut self, dataset: Dataset, path: &Path) -> Result<Arc<Table>> {
        let key = (
            dataset,
            std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()),
        );
        if let Some(t) = self.tables.get(&key) {
            log::debug!("{dataset} table for {} served from cache", path.display());
            return Ok(Arc::clone(t));
        }
        let table = match dataset {
            Dataset::Streaming => load_streaming(path)?,
            Dataset::Campaigns => load_campaigns(path)?.0,
        };
        let table = Arc::new(table);
        self.tables.insert(key, Arc::clone(&table));
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one record per line
/// * `.json`    – `[{ "column": value, ... }, ...]`
/// * `.parquet` – flat scalar columns
pub fn load_file(path: &Path, name: &str) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" => load_csv(path, name),
        "json" => load_json(path, name),
        "parquet" | "pq" => load_parquet(path, name),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, then one row per record.
fn load_csv(path: &Path, name: &str) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening CSV {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(guess_value_type).collect());
    }

    Ok(Table::new(name, headers, rows)?)
}

fn guess_value_type(s: &str) -> Value {
    let s = s.trim();
    if s.is_empty() {
        return Value::Missing;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::from(f);
    }
    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }
    Value::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "region": "US", "genre": "Pop", "streams": 1200, ... },
///   ...
/// ]
/// ```
///
/// Columns follow first appearance; a key absent from a record is missing.
fn load_json(path: &Path, name: &str) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            columns
                .iter()
                .map(|c| obj.get(c).map_or(Value::Missing, json_to_value))
                .collect()
        })
        .collect();

    Ok(Table::new(name, columns, rows)?)
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::from(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Missing,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of flat scalar columns (strings, ints, floats, bools).
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, name: &str) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_value(col.as_ref(), row))
                    .collect(),
            );
        }
    }

    Ok(Table::new(name, columns, rows)?)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &dyn Array, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Missing;
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map_or(Value::Missing, |a| Value::String(a.value(row).to_string())),
        DataType::LargeUtf8 => Value::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map_or(Value::Missing, |a| Value::Integer(a.value(row) as i64)),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map_or(Value::Missing, |a| Value::Integer(a.value(row))),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map_or(Value::Missing, |a| Value::from(a.value(row) as f64)),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map_or(Value::Missing, |a| Value::from(a.value(row))),
        DataType::Boolean => col
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map_or(Value::Missing, |a| Value::Bool(a.value(row))),
        other => Value::String(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_cells_get_typed() {
        assert_eq!(guess_value_type("42"), Value::Integer(42));
        assert_eq!(guess_value_type("4.5"), Value::Float(4.5));
        assert_eq!(guess_value_type(""), Value::Missing);
        assert_eq!(guess_value_type("true"), Value::Bool(true));
        assert_eq!(guess_value_type("Pop"), Value::from("Pop"));
    }

    #[test]
    fn json_numbers_keep_integer_type() {
        let v: JsonValue = serde_json::json!(12);
        assert_eq!(json_to_value(&v), Value::Integer(12));
        assert_eq!(json_to_value(&JsonValue::Null), Value::Missing);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_file(Path::new("tables.xlsx"), "streaming").unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }
}
