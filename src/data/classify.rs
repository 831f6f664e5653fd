use std::fmt;

use super::error::{PipelineError, PipelineResult};
use super::model::{Table, Value};

pub const MARKET_SIGNAL_COLUMN: &str = "market_signal";

// ---------------------------------------------------------------------------
// Quantiles
// ---------------------------------------------------------------------------

/// The `q`-quantile of `values` (0.0 ≤ q ≤ 1.0), interpolating linearly
/// between the two closest ranks at position `q * (n - 1)`.
pub fn quantile(values: &[f64], q: f64) -> PipelineResult<f64> {
    if values.is_empty() {
        return Err(PipelineError::no_data(format!("quantile {q}")));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

// ---------------------------------------------------------------------------
// Market signal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MarketSignal {
    Low,
    Moderate,
    High,
}

impl fmt::Display for MarketSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketSignal::High => "High",
            MarketSignal::Moderate => "Moderate",
            MarketSignal::Low => "Low",
        };
        write!(f, "{s}")
    }
}

impl MarketSignal {
    /// Tooltip text, e.g. `"High Pop adoption market"`.
    pub fn label(&self, prefix: &str) -> String {
        format!("{self} {prefix} adoption market")
    }
}

/// Three-way split against the upper (q75) and lower (q40) thresholds.
/// A value equal to a threshold belongs to the higher bucket.
pub fn classify(value: f64, q75: f64, q40: f64) -> MarketSignal {
    if value >= q75 {
        MarketSignal::High
    } else if value >= q40 {
        MarketSignal::Moderate
    } else {
        MarketSignal::Low
    }
}

/// Thresholds computed once per grouping context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalThresholds {
    pub q75: f64,
    pub q40: f64,
}

impl SignalThresholds {
    pub fn from_values(values: &[f64]) -> PipelineResult<Self> {
        Ok(Self {
            q75: quantile(values, 0.75)?,
            q40: quantile(values, 0.40)?,
        })
    }

    /// Thresholds over the numeric values of one column; missing values are
    /// ignored.
    pub fn from_column(table: &Table, column: &str) -> PipelineResult<Self> {
        let values: Vec<f64> = table.column_values(column)?.filter_map(Value::as_f64).collect();
        Self::from_values(&values)
    }

    pub fn classify(&self, value: f64) -> MarketSignal {
        classify(value, self.q75, self.q40)
    }
}

/// Append a [`MARKET_SIGNAL_COLUMN`] labelling every row of `value_column`
/// against the table's own q75/q40.
pub fn with_market_signal(table: &Table, value_column: &str, prefix: &str) -> PipelineResult<Table> {
    let thresholds = SignalThresholds::from_column(table, value_column)?;
    let labels: Vec<Value> = table
        .column_values(value_column)?
        .map(|v| match v.as_f64() {
            Some(n) => Value::from(thresholds.classify(n).label(prefix)),
            None => Value::Missing,
        })
        .collect();
    Ok(table.with_column(MARKET_SIGNAL_COLUMN, labels))
}
