use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::error::{PipelineError, PipelineResult};

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
/// Tables index distinct values in `BTreeSet`s, so `Value` must be `Ord`.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Absent or unparseable. Never equal to zero.
    Missing,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Missing => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Missing, Missing) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v:.2}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Missing => write!(f, "<missing>"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        if v.is_nan() {
            Value::Missing
        } else {
            Value::Float(v)
        }
    }
}

impl Value {
    /// Numeric view of the value; `None` for text, bools and missing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric reading of the value: `None` when it does not parse as a
    /// number. Infinities are kept; NaN and missing read as [`Value::Missing`].
    pub fn try_numeric(&self) -> Option<Value> {
        match self {
            Value::Float(v) => Some(Value::from(*v)),
            Value::Integer(i) => Some(Value::Float(*i as f64)),
            Value::Bool(b) => Some(Value::Float(if *b { 1.0 } else { 0.0 })),
            Value::String(s) => s.trim().parse::<f64>().ok().map(Value::from),
            Value::Missing => Some(Value::Missing),
        }
    }

    /// Lenient conversion to a float; anything that does not parse becomes
    /// [`Value::Missing`].
    pub fn to_numeric(&self) -> Value {
        self.try_numeric().unwrap_or(Value::Missing)
    }
}

// ---------------------------------------------------------------------------
// Table – ordered columns, typed rows
// ---------------------------------------------------------------------------

/// An immutable table: ordered column names, rows of [`Value`]s and, for every
/// column, the sorted set of distinct values observed.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Used in error messages ("streaming", "campaigns", ...).
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    unique_values: BTreeMap<String, BTreeSet<Value>>,
}

impl Table {
    /// Build a table and its distinct-value index. Every row must be as wide
    /// as the header.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> PipelineResult<Self> {
        if let Some((row, r)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(PipelineError::RowWidth {
                row,
                expected: columns.len(),
                found: r.len(),
            });
        }
        Ok(Self::from_parts(name.into(), columns, rows))
    }

    fn from_parts(name: String, columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let mut unique_values: BTreeMap<String, BTreeSet<Value>> = columns
            .iter()
            .map(|c| (c.clone(), BTreeSet::new()))
            .collect();

        for row in &rows {
            for (col, val) in columns.iter().zip(row) {
                if let Some(set) = unique_values.get_mut(col) {
                    set.insert(val.clone());
                }
            }
        }

        Table {
            name,
            columns,
            rows,
            unique_values,
        }
    }

    /// Same schema, different rows. Rows are assumed to come from a table with
    /// this schema.
    pub(crate) fn with_rows(&self, rows: Vec<Vec<Value>>) -> Table {
        Table::from_parts(self.name.clone(), self.columns.clone(), rows)
    }

    /// Return a copy with `column` set to `values`, appended when new.
    pub(crate) fn with_column(&self, column: &str, values: Vec<Value>) -> Table {
        debug_assert_eq!(values.len(), self.rows.len());
        let mut columns = self.columns.clone();
        let mut rows = self.rows.clone();
        match columns.iter().position(|c| c == column) {
            Some(idx) => {
                for (row, v) in rows.iter_mut().zip(values) {
                    row[idx] = v;
                }
            }
            None => {
                columns.push(column.to_string());
                for (row, v) in rows.iter_mut().zip(values) {
                    row.push(v);
                }
            }
        }
        Table::from_parts(self.name.clone(), columns, rows)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `column`, or a schema error naming this table.
    pub fn column_index(&self, column: &str) -> PipelineResult<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| PipelineError::Schema {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Fail on the first column of `required` that the table lacks.
    pub fn require_columns(&self, required: &[&str]) -> PipelineResult<()> {
        for col in required {
            self.column_index(col)?;
        }
        Ok(())
    }

    /// Iterate over one column.
    pub fn column_values(&self, column: &str) -> PipelineResult<impl Iterator<Item = &Value>> {
        let idx = self.column_index(column)?;
        Ok(self.rows.iter().map(move |r| &r[idx]))
    }

    /// Sorted distinct values of a column.
    pub fn distinct(&self, column: &str) -> Option<&BTreeSet<Value>> {
        self.unique_values.get(column)
    }

    /// Projection onto `columns`, in the given order.
    pub fn select(&self, columns: &[&str]) -> PipelineResult<Table> {
        let idx: Vec<usize> = columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<PipelineResult<_>>()?;
        let rows = self
            .rows
            .iter()
            .map(|r| idx.iter().map(|&i| r[i].clone()).collect())
            .collect();
        Ok(Table::from_parts(
            self.name.clone(),
            columns.iter().map(|c| c.to_string()).collect(),
            rows,
        ))
    }

    /// Cell lookup by row number and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).map(|r| &r[idx])
    }
}
