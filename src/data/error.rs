use thiserror::Error;

// ---------------------------------------------------------------------------
// PipelineError – structural failures of the filter/aggregate pipeline
// ---------------------------------------------------------------------------

/// Errors raised by the pipeline.
///
/// Per-row problems (unparseable numbers, rows excluded by a filter) never end
/// up here; they degrade to [`Value::Missing`](super::model::Value::Missing) or
/// to an empty table.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// A column the caller relies on is not part of the table.
    #[error("{table}: missing required column '{column}'")]
    Schema { table: String, column: String },

    /// A scalar result was requested from an empty set of rows.
    #[error("no data for {0}")]
    NoData(String),

    /// Row width does not match the header.
    #[error("row {row}: expected {expected} values, found {found}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A reducer was applied to a column holding text.
    #[error("column '{column}' holds non-numeric value '{value}'")]
    NotNumeric { column: String, value: String },
}

impl PipelineError {
    pub fn no_data(what: impl Into<String>) -> Self {
        PipelineError::NoData(what.into())
    }

    /// True for the empty-selection case the UI renders as an empty state.
    pub fn is_no_data(&self) -> bool {
        matches!(self, PipelineError::NoData(_))
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
