use std::collections::BTreeMap;

use super::error::PipelineResult;
use super::model::{Table, Value};

// ---------------------------------------------------------------------------
// Numeric coercion
// ---------------------------------------------------------------------------

/// Number of values per column that failed to parse during coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoercionReport {
    pub failures: BTreeMap<String, usize>,
}

impl CoercionReport {
    /// Total failures across all columns.
    pub fn total(&self) -> usize {
        self.failures.values().sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}

/// Convert every value of `columns` to a float. Values that do not parse
/// become [`Value::Missing`]; nothing is dropped here.
pub fn coerce_numeric(table: &Table, columns: &[&str]) -> PipelineResult<(Table, CoercionReport)> {
    let mut out = table.clone();
    let mut report = CoercionReport::default();

    for col in columns {
        let mut failed = 0usize;
        let values: Vec<Value> = out
            .column_values(col)?
            .map(|v| {
                v.try_numeric().unwrap_or_else(|| {
                    failed += 1;
                    Value::Missing
                })
            })
            .collect();

        if failed > 0 {
            log::warn!(
                "{}: {failed} value(s) in '{col}' are not numeric, treated as missing",
                table.name()
            );
        }
        report.failures.insert(col.to_string(), failed);
        out = out.with_column(col, values);
    }

    Ok((out, report))
}

// ---------------------------------------------------------------------------
// Missing-value drop
// ---------------------------------------------------------------------------

/// Remove every row holding [`Value::Missing`] in one of `required`.
///
/// Pass only the columns the downstream aggregation reads: any other column
/// would shrink the visible dataset for no reason.
pub fn drop_incomplete(table: &Table, required: &[&str]) -> PipelineResult<Table> {
    let idx: Vec<usize> = required
        .iter()
        .map(|c| table.column_index(c))
        .collect::<PipelineResult<_>>()?;

    let rows: Vec<Vec<Value>> = table
        .rows()
        .iter()
        .filter(|row| idx.iter().all(|&i| !row[i].is_missing()))
        .cloned()
        .collect();

    let dropped = table.len() - rows.len();
    if dropped > 0 {
        log::warn!(
            "{}: dropped {dropped} incomplete row(s) (required: {required:?})",
            table.name()
        );
    }
    Ok(table.with_rows(rows))
}

// ---------------------------------------------------------------------------
// Derived magnitude column
// ---------------------------------------------------------------------------

/// Append `target = |source| + offset`, a non-negative size for marks whose
/// source value may be negative. Missing stays missing.
pub fn with_magnitude(
    table: &Table,
    source: &str,
    target: &str,
    offset: f64,
) -> PipelineResult<Table> {
    let values: Vec<Value> = table
        .column_values(source)?
        .map(|v| match v.as_f64() {
            Some(n) => Value::Float(n.abs() + offset),
            None => Value::Missing,
        })
        .collect();
    Ok(table.with_column(target, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_column(name: &str, vals: Vec<Value>) -> Table {
        Table::new(
            "campaigns",
            vec![name.to_string()],
            vals.into_iter().map(|v| vec![v]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn valid_strings_coerce_like_direct_parsing() {
        let raw = ["1", "2.5", "-3", "1e3"];
        let t = one_column("x", raw.iter().map(|s| Value::from(*s)).collect());
        let (out, report) = coerce_numeric(&t, &["x"]).unwrap();
        let got: Vec<f64> = out.column_values("x").unwrap().filter_map(Value::as_f64).collect();
        let expected: Vec<f64> = raw.iter().map(|s| s.parse::<f64>().unwrap()).collect();
        assert_eq!(got, expected);
        assert!(report.is_clean());
    }

    #[test]
    fn one_invalid_entry_becomes_exactly_one_missing() {
        let t = one_column(
            "user_growth_pct",
            vec![
                Value::from("4.5"),
                Value::from("oops"),
                Value::from(12i64),
                Value::from(3.25),
            ],
        );
        let (out, report) = coerce_numeric(&t, &["user_growth_pct"]).unwrap();
        let vals: Vec<&Value> = out.column_values("user_growth_pct").unwrap().collect();
        assert_eq!(vals.iter().filter(|v| v.is_missing()).count(), 1);
        assert_eq!(vals.iter().filter(|v| v.as_f64().is_some()).count(), 3);
        assert_eq!(report.failures["user_growth_pct"], 1);
        // Coercion never drops rows.
        assert_eq!(out.len(), t.len());
    }

    #[test]
    fn drop_incomplete_only_looks_at_required_columns() {
        let t = Table::new(
            "campaigns",
            vec!["net_user_gain".into(), "users_before".into()],
            vec![
                vec![Value::Float(5.0), Value::Missing],
                vec![Value::Missing, Value::Float(10.0)],
                vec![Value::Float(-2.0), Value::Float(1.0)],
            ],
        )
        .unwrap();
        let out = drop_incomplete(&t, &["net_user_gain"]).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.column_values("net_user_gain").unwrap().all(|v| !v.is_missing()));
    }

    #[test]
    fn infinities_parse_and_are_not_failures() {
        let t = one_column(
            "x",
            vec![Value::from("inf"), Value::from("1e400"), Value::from("nan"), Value::from("abc")],
        );
        let (out, report) = coerce_numeric(&t, &["x"]).unwrap();
        let vals: Vec<&Value> = out.column_values("x").unwrap().collect();
        assert_eq!(vals[0], &Value::Float(f64::INFINITY));
        assert_eq!(vals[1], &Value::Float(f64::INFINITY));
        // "nan" parses, it just reads as missing.
        assert_eq!(vals[2], &Value::Missing);
        assert_eq!(vals[3], &Value::Missing);
        assert_eq!(report.failures["x"], 1);
    }

    #[test]
    fn magnitude_is_absolute_value_plus_offset() {
        let t = one_column("net_user_gain", vec![Value::from(-5i64), Value::from(20i64)]);
        let out = with_magnitude(&t, "net_user_gain", "abs_user_gain", 10.0).unwrap();
        let sizes: Vec<f64> = out
            .column_values("abs_user_gain")
            .unwrap()
            .filter_map(Value::as_f64)
            .collect();
        assert_eq!(sizes, vec![15.0, 30.0]);
    }
}
