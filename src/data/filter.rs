use std::collections::{BTreeMap, BTreeSet};

use super::error::PipelineResult;
use super::model::{Table, Value};

// ---------------------------------------------------------------------------
// Constraint set: which values are allowed per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of allowed values.
/// A column that is absent is unconstrained; an empty set allows nothing.
pub type Constraints = BTreeMap<String, BTreeSet<Value>>;

/// Initialise [`Constraints`] over `columns` with every observed value
/// allowed (i.e., show everything).
pub fn init_constraints(table: &Table, columns: &[&str]) -> Constraints {
    columns
        .iter()
        .filter_map(|col| {
            table
                .distinct(col)
                .map(|vals| (col.to_string(), vals.clone()))
        })
        .collect()
}

/// A single-column, single-value constraint (`column == value`).
pub fn only(column: &str, value: impl Into<Value>) -> Constraints {
    let mut c = Constraints::new();
    c.insert(column.to_string(), BTreeSet::from([value.into()]));
    c
}

/// Return indices of rows that pass all constraints.
///
/// A row passes a column constraint when:
/// * The allowed set is empty → nothing selected → fails
/// * The allowed set covers every value the column holds → passes
/// * The row's value for that column is in the allowed set → passes
pub fn filtered_indices(table: &Table, constraints: &Constraints) -> PipelineResult<Vec<usize>> {
    // Resolve column positions up front; an unknown column is a schema error.
    let mut active: Vec<(usize, &BTreeSet<Value>)> = Vec::with_capacity(constraints.len());
    let mut nothing_selected = false;
    for (col, allowed) in constraints {
        let idx = table.column_index(col)?;
        if allowed.is_empty() {
            nothing_selected = true;
            continue;
        }
        // Everything selected, no filtering needed
        if let Some(all_vals) = table.distinct(col) {
            if allowed.is_superset(all_vals) {
                continue;
            }
        }
        active.push((idx, allowed));
    }
    if nothing_selected {
        return Ok(Vec::new());
    }

    Ok(table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| active.iter().all(|(idx, allowed)| allowed.contains(&row[*idx])))
        .map(|(i, _)| i)
        .collect())
}

/// Keep the rows of `table` that satisfy every constraint. The source table is
/// left untouched.
pub fn filter(table: &Table, constraints: &Constraints) -> PipelineResult<Table> {
    let indices = filtered_indices(table, constraints)?;
    if indices.len() == table.len() {
        return Ok(table.clone());
    }
    let rows = indices.iter().map(|&i| table.rows()[i].clone()).collect();
    let out = table.with_rows(rows);
    log::debug!(
        "filter on {}: {} of {} rows kept",
        table.name(),
        out.len(),
        table.len()
    );
    Ok(out)
}
