use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::error::{PipelineError, PipelineResult};
use super::model::{Table, Value};

// ---------------------------------------------------------------------------
// Reducers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Sum,
    Mean,
}

/// Running state for one reduced column of one group.
#[derive(Debug, Clone)]
struct Accumulator {
    /// Exact integer sum while every value seen is an integer.
    int_sum: Option<i64>,
    float_sum: f64,
    count: usize,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self {
            int_sum: Some(0),
            float_sum: 0.0,
            count: 0,
        }
    }
}

impl Accumulator {
    fn push(&mut self, column: &str, value: &Value) -> PipelineResult<()> {
        match value {
            Value::Integer(i) => {
                self.int_sum = self.int_sum.and_then(|s| s.checked_add(*i));
                self.float_sum += *i as f64;
            }
            Value::Float(f) => {
                self.int_sum = None;
                self.float_sum += f;
            }
            Value::Missing => return Ok(()),
            other => {
                return Err(PipelineError::NotNumeric {
                    column: column.to_string(),
                    value: other.to_string(),
                })
            }
        }
        self.count += 1;
        Ok(())
    }

    fn finish(&self, reducer: Reducer) -> Value {
        match reducer {
            Reducer::Sum => match self.int_sum {
                Some(i) => Value::Integer(i),
                None => Value::Float(self.float_sum),
            },
            Reducer::Mean if self.count == 0 => Value::Missing,
            Reducer::Mean => Value::Float(self.float_sum / self.count as f64),
        }
    }
}

// ---------------------------------------------------------------------------
// Grouped aggregation
// ---------------------------------------------------------------------------

/// Group `table` by `keys` and reduce `value_column`.
///
/// The result holds the key columns followed by the value column, one row per
/// key combination present in the input. Rows with a missing key are skipped;
/// missing values do not contribute. Row order is not part of the contract.
pub fn aggregate(
    table: &Table,
    keys: &[&str],
    value_column: &str,
    reducer: Reducer,
) -> PipelineResult<Table> {
    aggregate_many(table, keys, &[value_column], reducer)
}

/// [`aggregate`] over several value columns at once.
pub fn aggregate_many(
    table: &Table,
    keys: &[&str],
    value_columns: &[&str],
    reducer: Reducer,
) -> PipelineResult<Table> {
    let key_idx: Vec<usize> = keys
        .iter()
        .map(|k| table.column_index(k))
        .collect::<PipelineResult<_>>()?;
    let value_idx: Vec<usize> = value_columns
        .iter()
        .map(|c| table.column_index(c))
        .collect::<PipelineResult<_>>()?;

    let mut groups: BTreeMap<Vec<Value>, Vec<Accumulator>> = BTreeMap::new();
    for row in table.rows() {
        let key: Vec<Value> = key_idx.iter().map(|&i| row[i].clone()).collect();
        if key.iter().any(Value::is_missing) {
            continue;
        }
        let accs = groups
            .entry(key)
            .or_insert_with(|| vec![Accumulator::default(); value_idx.len()]);
        for ((acc, &i), col) in accs.iter_mut().zip(&value_idx).zip(value_columns) {
            acc.push(col, &row[i])?;
        }
    }

    let columns: Vec<String> = keys
        .iter()
        .chain(value_columns)
        .map(|c| c.to_string())
        .collect();
    let rows: Vec<Vec<Value>> = groups
        .into_iter()
        .map(|(mut key, accs)| {
            key.extend(accs.iter().map(|a| a.finish(reducer)));
            key
        })
        .collect();

    Table::new(table.name(), columns, rows)
}

/// The value of `key` with the largest summed `value_column`. Ties go to the
/// first key in sort order. An empty input is [`PipelineError::NoData`].
pub fn top_entity(table: &Table, key: &str, value_column: &str) -> PipelineResult<Value> {
    let grouped = aggregate(table, &[key], value_column, Reducer::Sum)?;
    let mut best: Option<(&Value, f64)> = None;
    for row in grouped.rows() {
        let Some(v) = row[1].as_f64() else {
            continue;
        };
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((&row[0], v));
        }
    }
    best.map(|(k, _)| k.clone())
        .ok_or_else(|| PipelineError::no_data(format!("top {key} by {value_column}")))
}

// ---------------------------------------------------------------------------
// Scalar reductions
// ---------------------------------------------------------------------------

/// Sum of a column; `0` for an empty table.
pub fn column_sum(table: &Table, column: &str) -> PipelineResult<Value> {
    let mut acc = Accumulator::default();
    for v in table.column_values(column)? {
        acc.push(column, v)?;
    }
    Ok(acc.finish(Reducer::Sum))
}

/// Mean of a column; [`PipelineError::NoData`] when it holds no numbers.
pub fn column_mean(table: &Table, column: &str) -> PipelineResult<f64> {
    let mut acc = Accumulator::default();
    for v in table.column_values(column)? {
        acc.push(column, v)?;
    }
    acc.finish(Reducer::Mean)
        .as_f64()
        .ok_or_else(|| PipelineError::no_data(format!("mean of {column}")))
}

/// `numerator / denominator`, or `0.0` when the denominator is zero or the
/// quotient is not finite.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let r = numerator / denominator;
    if r.is_finite() {
        r
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Ordering and reshaping
// ---------------------------------------------------------------------------

/// Numbers compare by magnitude regardless of integer/float storage.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a.cmp(b),
    }
}

/// Stable sort on one column. Missing values always go last.
pub fn sort_by(table: &Table, column: &str, descending: bool) -> PipelineResult<Table> {
    let idx = table.column_index(column)?;
    let mut rows = table.rows().to_vec();
    rows.sort_by(|a, b| match (a[idx].is_missing(), b[idx].is_missing()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = compare_values(&a[idx], &b[idx]);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
    });
    Ok(table.with_rows(rows))
}

/// First `n` rows.
pub fn head(table: &Table, n: usize) -> Table {
    table.with_rows(table.rows().iter().take(n).cloned().collect())
}

/// Wide to long: one output row per (value column, input row), holding the id,
/// the value column's name under `var_name` and its value under `value_name`.
pub fn melt(
    table: &Table,
    id_column: &str,
    value_columns: &[&str],
    var_name: &str,
    value_name: &str,
) -> PipelineResult<Table> {
    let id_idx = table.column_index(id_column)?;
    let mut rows = Vec::with_capacity(table.len() * value_columns.len());
    for col in value_columns {
        let idx = table.column_index(col)?;
        for row in table.rows() {
            rows.push(vec![
                row[id_idx].clone(),
                Value::from(*col),
                row[idx].clone(),
            ]);
        }
    }
    Table::new(
        table.name(),
        vec![id_column.into(), var_name.into(), value_name.into()],
        rows,
    )
}
