//! Marketing-campaign table: schema, canonical cleaning and dashboard views.

use super::aggregate::{
    aggregate, aggregate_many, column_mean, column_sum, melt, sort_by, Reducer,
};
use super::coerce::{coerce_numeric, drop_incomplete, with_magnitude, CoercionReport};
use super::error::PipelineResult;
use super::model::{Table, Value};

pub const CAMPAIGN_NAME: &str = "campaign_name";
pub const TARGET_REGION: &str = "target_region";
pub const TARGET_GENRE: &str = "target_genre";
pub const MONTH: &str = "month";
pub const USERS_BEFORE: &str = "users_before";
pub const USERS_AFTER: &str = "users_after";
pub const NET_USER_GAIN: &str = "net_user_gain";
pub const USER_GROWTH_PCT: &str = "user_growth_pct";
pub const PREMIUM_GROWTH_PCT: &str = "premium_growth_pct";

/// Derived marker size, always positive.
pub const ABS_USER_GAIN: &str = "abs_user_gain";
pub const SIZE_OFFSET: f64 = 10.0;

pub const COLUMNS: [&str; 9] = [
    CAMPAIGN_NAME,
    TARGET_REGION,
    TARGET_GENRE,
    MONTH,
    USERS_BEFORE,
    USERS_AFTER,
    NET_USER_GAIN,
    USER_GROWTH_PCT,
    PREMIUM_GROWTH_PCT,
];

/// Columns that may arrive as text and are coerced on load.
pub const NUMERIC_COLUMNS: [&str; 5] = [
    USERS_BEFORE,
    USERS_AFTER,
    NET_USER_GAIN,
    USER_GROWTH_PCT,
    PREMIUM_GROWTH_PCT,
];

/// Columns the views aggregate; rows missing any of them are dropped.
pub const REQUIRED_NUMERIC: [&str; 3] = [USER_GROWTH_PCT, PREMIUM_GROWTH_PCT, NET_USER_GAIN];

pub const FILTER_COLUMNS: [&str; 3] = [CAMPAIGN_NAME, TARGET_REGION, MONTH];

pub const METRIC: &str = "Metric";
pub const GROWTH: &str = "Growth %";

pub fn validate(table: &Table) -> PipelineResult<()> {
    table.require_columns(&COLUMNS)
}

/// Canonical cleaning: schema check, numeric coercion, drop of rows missing a
/// required number, then the [`ABS_USER_GAIN`] size column.
pub fn prepare(raw: &Table) -> PipelineResult<(Table, CoercionReport)> {
    validate(raw)?;
    let (coerced, report) = coerce_numeric(raw, &NUMERIC_COLUMNS)?;
    let complete = drop_incomplete(&coerced, &REQUIRED_NUMERIC)?;
    let sized = with_magnitude(&complete, NET_USER_GAIN, ABS_USER_GAIN, SIZE_OFFSET)?;
    Ok((sized, report))
}

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignKpis {
    pub net_user_gain: Value,
    pub avg_user_growth_pct: PipelineResult<f64>,
    pub avg_premium_growth_pct: PipelineResult<f64>,
}

pub fn kpis(table: &Table) -> PipelineResult<CampaignKpis> {
    Ok(CampaignKpis {
        net_user_gain: column_sum(table, NET_USER_GAIN)?,
        avg_user_growth_pct: column_mean(table, USER_GROWTH_PCT),
        avg_premium_growth_pct: column_mean(table, PREMIUM_GROWTH_PCT),
    })
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    HighestFirst,
    LowestFirst,
}

impl SortOrder {
    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::HighestFirst => "Highest to Lowest",
            SortOrder::LowestFirst => "Lowest to Highest",
        }
    }
}

/// Net user gain per campaign in the requested order.
pub fn net_gain_by_campaign(table: &Table, order: SortOrder) -> PipelineResult<Table> {
    let grouped = aggregate(table, &[CAMPAIGN_NAME], NET_USER_GAIN, Reducer::Sum)?;
    sort_by(&grouped, NET_USER_GAIN, order == SortOrder::HighestFirst)
}

/// Mean user growth and mean premium growth per campaign.
pub fn growth_comparison(table: &Table) -> PipelineResult<Table> {
    aggregate_many(
        table,
        &[CAMPAIGN_NAME],
        &[USER_GROWTH_PCT, PREMIUM_GROWTH_PCT],
        Reducer::Mean,
    )
}

/// [`growth_comparison`] in long form (`campaign_name`, `Metric`, `Growth %`)
/// for a grouped bar chart.
pub fn growth_comparison_long(table: &Table) -> PipelineResult<Table> {
    melt(
        &growth_comparison(table)?,
        CAMPAIGN_NAME,
        &[USER_GROWTH_PCT, PREMIUM_GROWTH_PCT],
        METRIC,
        GROWTH,
    )
}

/// Campaigns whose mean user growth and mean premium growth both reach their
/// thresholds.
pub fn scale_candidates(
    table: &Table,
    user_threshold: f64,
    premium_threshold: f64,
) -> PipelineResult<Table> {
    let means = growth_comparison(table)?;
    let user_idx = means.column_index(USER_GROWTH_PCT)?;
    let premium_idx = means.column_index(PREMIUM_GROWTH_PCT)?;
    let meets = |v: &Value, threshold: f64| v.as_f64().is_some_and(|n| n >= threshold);
    let rows = means
        .rows()
        .iter()
        .filter(|r| meets(&r[user_idx], user_threshold) && meets(&r[premium_idx], premium_threshold))
        .cloned()
        .collect();
    Ok(means.with_rows(rows))
}

/// Net user gain per target genre.
pub fn gain_by_genre(table: &Table) -> PipelineResult<Table> {
    aggregate(table, &[TARGET_GENRE], NET_USER_GAIN, Reducer::Sum)
}

/// Campaigns ranked by mean premium growth, highest first.
pub fn premium_ranking(table: &Table) -> PipelineResult<Table> {
    let grouped = aggregate(table, &[CAMPAIGN_NAME], PREMIUM_GROWTH_PCT, Reducer::Mean)?;
    sort_by(&grouped, PREMIUM_GROWTH_PCT, true)
}

/// Net user gain per (month, campaign), in month order.
pub fn monthly_gain(table: &Table) -> PipelineResult<Table> {
    let grouped = aggregate(table, &[MONTH, CAMPAIGN_NAME], NET_USER_GAIN, Reducer::Sum)?;
    sort_by(&grouped, MONTH, false)
}

/// Per-row points for the growth/premium scatter, sized by [`ABS_USER_GAIN`].
pub fn premium_uplift(table: &Table) -> PipelineResult<Table> {
    table.select(&[CAMPAIGN_NAME, USER_GROWTH_PCT, PREMIUM_GROWTH_PCT, ABS_USER_GAIN])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::error::PipelineError;

    fn raw(rows: &[(&str, &str, &str, &str, &str, &str)]) -> Table {
        // campaign, genre, net gain, user growth, premium growth, month
        Table::new(
            "campaigns",
            COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|(name, genre, gain, ug, pg, month)| {
                    vec![
                        Value::from(*name),
                        Value::from("US"),
                        Value::from(*genre),
                        Value::from(*month),
                        Value::from("1000"),
                        Value::from("1000"),
                        Value::from(*gain),
                        Value::from(*ug),
                        Value::from(*pg),
                    ]
                })
                .collect(),
        )
        .unwrap()
    }

    fn sample() -> Table {
        let (t, _) = prepare(&raw(&[
            ("Spring", "Pop", "-5", "12.0", "6.0", "2024-03"),
            ("Spring", "Pop", "20", "8.0", "4.0", "2024-04"),
            ("Summer", "Rock", "40", "15.0", "2.0", "2024-06"),
            ("Autumn", "Jazz", "n/a", "5.0", "1.0", "2024-09"),
        ]))
        .unwrap();
        t
    }

    #[test]
    fn prepare_coerces_drops_and_sizes() {
        let (t, report) = prepare(&raw(&[
            ("Spring", "Pop", "-5", "12.0", "6.0", "2024-03"),
            ("Spring", "Pop", "20", "8.0", "4.0", "2024-04"),
            ("Autumn", "Jazz", "n/a", "5.0", "1.0", "2024-09"),
        ]))
        .unwrap();
        assert_eq!(report.failures[NET_USER_GAIN], 1);
        assert_eq!(t.len(), 2);
        let sizes: Vec<f64> = t
            .column_values(ABS_USER_GAIN)
            .unwrap()
            .filter_map(Value::as_f64)
            .collect();
        assert_eq!(sizes, vec![15.0, 30.0]);
    }

    #[test]
    fn prepare_rejects_missing_schema() {
        let t = Table::new("campaigns", vec![CAMPAIGN_NAME.into()], vec![]).unwrap();
        assert!(matches!(prepare(&t), Err(PipelineError::Schema { .. })));
    }

    #[test]
    fn kpis_sum_and_average() {
        let k = kpis(&sample()).unwrap();
        assert_eq!(k.net_user_gain, Value::Float(55.0));
        assert!((k.avg_user_growth_pct.unwrap() - 35.0 / 3.0).abs() < 1e-9);
        assert_eq!(k.avg_premium_growth_pct.unwrap(), 4.0);
    }

    #[test]
    fn kpis_on_empty_selection_report_no_data() {
        let t = sample().with_rows(Vec::new());
        let k = kpis(&t).unwrap();
        assert_eq!(k.net_user_gain, Value::Integer(0));
        assert!(k.avg_user_growth_pct.unwrap_err().is_no_data());
    }

    #[test]
    fn net_gain_sort_order() {
        let hi = net_gain_by_campaign(&sample(), SortOrder::HighestFirst).unwrap();
        assert_eq!(hi.get(0, CAMPAIGN_NAME), Some(&Value::from("Summer")));
        let lo = net_gain_by_campaign(&sample(), SortOrder::LowestFirst).unwrap();
        assert_eq!(lo.get(0, CAMPAIGN_NAME), Some(&Value::from("Spring")));
    }

    #[test]
    fn scale_candidates_meet_both_thresholds() {
        let out = scale_candidates(&sample(), 10.0, 5.0).unwrap();
        // Spring: 10.0 / 5.0 (inclusive), Summer: 15.0 / 2.0
        assert_eq!(out.len(), 1);
        assert_eq!(out.get(0, CAMPAIGN_NAME), Some(&Value::from("Spring")));
    }

    #[test]
    fn growth_comparison_long_has_two_rows_per_campaign() {
        let long = growth_comparison_long(&sample()).unwrap();
        assert_eq!(long.len(), 4);
        assert_eq!(long.columns()[1], METRIC);
        assert_eq!(long.columns()[2], GROWTH);
    }

    #[test]
    fn premium_ranking_is_descending() {
        let out = premium_ranking(&sample()).unwrap();
        assert_eq!(out.get(0, CAMPAIGN_NAME), Some(&Value::from("Spring")));
        assert_eq!(out.get(0, PREMIUM_GROWTH_PCT), Some(&Value::Float(5.0)));
    }

    #[test]
    fn uplift_points_are_never_negative_sized() {
        let out = premium_uplift(&sample()).unwrap();
        assert!(out
            .column_values(ABS_USER_GAIN)
            .unwrap()
            .all(|v| v.as_f64().is_some_and(|n| n >= SIZE_OFFSET)));
    }
}
