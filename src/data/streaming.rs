//! Streaming-activity table: schema and dashboard views.
//!
//! Every view takes the table already narrowed by the sidebar constraints and
//! returns a chart-ready [`Table`] or scalar.

use super::aggregate::{aggregate, column_sum, head, safe_ratio, sort_by, top_entity, Reducer};
use super::classify::with_market_signal;
use super::error::{PipelineError, PipelineResult};
use super::filter::{filter, only};
use super::model::{Table, Value};

pub const REGION: &str = "region";
pub const GENRE: &str = "genre";
pub const SUBSCRIPTION_TYPE: &str = "subscription_type";
pub const MONTH: &str = "month";
pub const ARTIST_NAME: &str = "artist_name";
pub const COUNTRY: &str = "country";
pub const STREAMS: &str = "streams";
pub const ACTIVE_LISTENERS: &str = "active_listeners";
pub const COMPLETION_RATE: &str = "completion_rate";

pub const COLUMNS: [&str; 9] = [
    REGION,
    GENRE,
    SUBSCRIPTION_TYPE,
    MONTH,
    ARTIST_NAME,
    COUNTRY,
    STREAMS,
    ACTIVE_LISTENERS,
    COMPLETION_RATE,
];

/// Sidebar filters, intersected.
pub const FILTER_COLUMNS: [&str; 4] = [REGION, GENRE, SUBSCRIPTION_TYPE, MONTH];

pub const PREMIUM: &str = "Premium";

/// Rows in the per-country drill-down.
pub const DRILLDOWN_LIMIT: usize = 5;

/// Schema check run at load time.
pub fn validate(table: &Table) -> PipelineResult<()> {
    table.require_columns(&COLUMNS)
}

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct StreamingKpis {
    pub total_streams: Value,
    pub active_listeners: Value,
    /// `NoData` when the filters exclude everything.
    pub top_artist: PipelineResult<Value>,
    /// Premium listeners as a percentage of all listeners, one decimal.
    pub premium_share_pct: f64,
}

pub fn kpis(table: &Table) -> PipelineResult<StreamingKpis> {
    let top_artist = match top_entity(table, ARTIST_NAME, STREAMS) {
        Err(e) if !e.is_no_data() => return Err(e),
        r => r,
    };
    Ok(StreamingKpis {
        total_streams: column_sum(table, STREAMS)?,
        active_listeners: column_sum(table, ACTIVE_LISTENERS)?,
        top_artist,
        premium_share_pct: premium_share_pct(table)?,
    })
}

/// Premium `active_listeners` over all `active_listeners`, in percent rounded
/// to one decimal. Zero when there are no listeners at all.
pub fn premium_share_pct(table: &Table) -> PipelineResult<f64> {
    let premium = filter(table, &only(SUBSCRIPTION_TYPE, PREMIUM))?;
    let num = column_sum(&premium, ACTIVE_LISTENERS)?.as_f64().unwrap_or(0.0);
    let den = column_sum(table, ACTIVE_LISTENERS)?.as_f64().unwrap_or(0.0);
    Ok(round1(safe_ratio(num, den) * 100.0))
}

pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// The `limit` artists with the most streams, highest first.
pub fn top_artists(table: &Table, limit: usize) -> PipelineResult<Table> {
    let grouped = aggregate(table, &[ARTIST_NAME], STREAMS, Reducer::Sum)?;
    Ok(head(&sort_by(&grouped, STREAMS, true)?, limit))
}

/// Streams per genre inside one region.
pub fn genre_for_region(table: &Table, region: &Value) -> PipelineResult<Table> {
    let scoped = filter(table, &only(REGION, region.clone()))?;
    aggregate(&scoped, &[GENRE], STREAMS, Reducer::Sum)
}

/// Streams per (region, genre), for the stacked region chart.
pub fn genre_by_region(table: &Table) -> PipelineResult<Table> {
    aggregate(table, &[REGION, GENRE], STREAMS, Reducer::Sum)
}

/// Streams per month for one subscription type, in month order.
pub fn monthly_trend(table: &Table, subscription: &Value) -> PipelineResult<Table> {
    let scoped = filter(table, &only(SUBSCRIPTION_TYPE, subscription.clone()))?;
    let grouped = aggregate(&scoped, &[MONTH], STREAMS, Reducer::Sum)?;
    sort_by(&grouped, MONTH, false)
}

/// Streams per subscription type.
pub fn subscription_split(table: &Table) -> PipelineResult<Table> {
    aggregate(table, &[SUBSCRIPTION_TYPE], STREAMS, Reducer::Sum)
}

/// [`subscription_split`] restricted to one genre.
pub fn subscription_split_for_genre(table: &Table, genre: &Value) -> PipelineResult<Table> {
    let scoped = filter(table, &only(GENRE, genre.clone()))?;
    subscription_split(&scoped)
}

/// Metric compared across subscription types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngagementMetric {
    #[default]
    Streams,
    CompletionRate,
}

impl EngagementMetric {
    pub const ALL: [EngagementMetric; 2] = [EngagementMetric::Streams, EngagementMetric::CompletionRate];

    pub fn column(&self) -> &'static str {
        match self {
            EngagementMetric::Streams => STREAMS,
            EngagementMetric::CompletionRate => COMPLETION_RATE,
        }
    }
}

/// Mean of `metric` per subscription type.
pub fn engagement(table: &Table, metric: EngagementMetric) -> PipelineResult<Table> {
    aggregate(table, &[SUBSCRIPTION_TYPE], metric.column(), Reducer::Mean)
}

/// Streams per (country, region) for one genre, each row tagged with its
/// adoption signal relative to the other countries.
pub fn genre_map(table: &Table, genre: &Value) -> PipelineResult<Table> {
    let scoped = filter(table, &only(GENRE, genre.clone()))?;
    let grouped = aggregate(&scoped, &[COUNTRY, REGION], STREAMS, Reducer::Sum)?;
    if grouped.is_empty() {
        return Err(PipelineError::no_data(format!("{genre} streams by country")));
    }
    with_market_signal(&grouped, STREAMS, &genre.to_string())
}

/// Top artists of a single country.
pub fn country_drilldown(table: &Table, country: &Value, limit: usize) -> PipelineResult<Table> {
    let scoped = filter(table, &only(COUNTRY, country.clone()))?;
    top_artists(&scoped, limit)
}
