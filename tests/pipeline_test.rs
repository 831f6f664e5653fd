//! End-to-end checks of the filter-aggregate pipeline on small in-memory
//! tables.

use std::collections::BTreeSet;

use stream_insights::data::aggregate::{aggregate, column_sum, top_entity, Reducer};
use stream_insights::data::campaign::{self, SortOrder};
use stream_insights::data::classify::{classify, quantile, MarketSignal, MARKET_SIGNAL_COLUMN};
use stream_insights::data::error::PipelineError;
use stream_insights::data::filter::{filter, init_constraints, only, Constraints};
use stream_insights::data::model::{Table, Value};
use stream_insights::data::streaming;

mod common;

fn sample_streaming() -> Table {
    common::streaming_table(&[
        ("Europe", "Pop", "Free", "2024-01", "Nova", "France", 100, 40, 0.8),
        ("Europe", "Pop", "Premium", "2024-01", "Kairo", "Germany", 50, 10, 0.9),
        ("Europe", "Rock", "Premium", "2024-02", "Nova", "France", 120, 30, 0.7),
        ("North America", "Rock", "Free", "2024-02", "Dex", "Canada", 80, 20, 0.6),
        ("North America", "Pop", "Premium", "2024-03", "Dex", "United States", 30, 20, 0.5),
    ])
}

#[test]
fn filter_then_group_then_top_genre() -> anyhow::Result<()> {
    let df = common::streaming_table(&[
        ("US", "Pop", "Free", "2024-01", "Nova", "United States", 100, 10, 0.5),
        ("US", "Rock", "Free", "2024-01", "Dex", "United States", 50, 10, 0.5),
    ]);
    let us = filter(&df, &only(streaming::REGION, "US"))?;
    let by_genre = aggregate(&us, &[streaming::GENRE], streaming::STREAMS, Reducer::Sum)?;
    assert_eq!(
        by_genre.rows(),
        [
            vec![Value::from("Pop"), Value::Integer(100)],
            vec![Value::from("Rock"), Value::Integer(50)],
        ]
    );
    assert_eq!(
        top_entity(&us, streaming::GENRE, streaming::STREAMS)?,
        Value::from("Pop")
    );
    Ok(())
}

#[test]
fn pop_outsells_rock_in_europe() -> anyhow::Result<()> {
    let df = sample_streaming();
    let europe = filter(&df, &only(streaming::REGION, "Europe"))?;
    assert_eq!(europe.len(), 3);

    let by_genre = aggregate(&europe, &[streaming::GENRE], streaming::STREAMS, Reducer::Sum)?;
    assert_eq!(by_genre.len(), 2);
    let pop = by_genre
        .rows()
        .iter()
        .find(|r| r[0] == Value::from("Pop"))
        .map(|r| r[1].clone());
    assert_eq!(pop, Some(Value::Integer(150)));

    assert_eq!(
        top_entity(&europe, streaming::GENRE, streaming::STREAMS)?,
        Value::from("Pop")
    );
    Ok(())
}

#[test]
fn filtered_rows_satisfy_every_constraint() -> anyhow::Result<()> {
    let df = sample_streaming();
    let mut c = init_constraints(&df, &streaming::FILTER_COLUMNS);
    c.insert(
        streaming::SUBSCRIPTION_TYPE.to_string(),
        BTreeSet::from([Value::from("Premium")]),
    );
    c.insert(
        streaming::GENRE.to_string(),
        BTreeSet::from([Value::from("Pop")]),
    );

    let out = filter(&df, &c)?;
    assert_eq!(out.len(), 2);
    for row in out.rows() {
        assert!(df.rows().contains(row));
        assert_eq!(row[1], Value::from("Pop"));
        assert_eq!(row[2], Value::from("Premium"));
    }

    // Idempotent, and an empty constraint set is the identity.
    assert_eq!(filter(&out, &c)?, out);
    assert_eq!(filter(&df, &Constraints::new())?, df);
    Ok(())
}

#[test]
fn empty_selection_yields_no_data_downstream() -> anyhow::Result<()> {
    let df = sample_streaming();
    let mut c = init_constraints(&df, &streaming::FILTER_COLUMNS);
    c.insert(streaming::MONTH.to_string(), BTreeSet::new());
    let out = filter(&df, &c)?;
    assert!(out.is_empty());

    let kpis = streaming::kpis(&out)?;
    assert_eq!(kpis.total_streams, Value::Integer(0));
    assert_eq!(kpis.premium_share_pct, 0.0);
    assert!(matches!(kpis.top_artist, Err(PipelineError::NoData(_))));
    Ok(())
}

#[test]
fn aggregation_preserves_the_total() -> anyhow::Result<()> {
    let df = sample_streaming();
    let total = column_sum(&df, streaming::STREAMS)?;
    for keys in [
        &[streaming::REGION][..],
        &[streaming::GENRE, streaming::MONTH][..],
        &[streaming::ARTIST_NAME][..],
    ] {
        let grouped = aggregate(&df, keys, streaming::STREAMS, Reducer::Sum)?;
        assert_eq!(column_sum(&grouped, streaming::STREAMS)?, total);
    }
    Ok(())
}

#[test]
fn streaming_kpis_on_full_table() -> anyhow::Result<()> {
    let k = streaming::kpis(&sample_streaming())?;
    assert_eq!(k.total_streams, Value::Integer(380));
    assert_eq!(k.active_listeners, Value::Integer(120));
    // Nova: 100 + 120.
    assert_eq!(k.top_artist, Ok(Value::from("Nova")));
    // Premium listeners 60 of 120.
    assert_eq!(k.premium_share_pct, 50.0);
    Ok(())
}

#[test]
fn market_signal_boundaries() -> anyhow::Result<()> {
    let values = [10.0, 20.0, 30.0, 40.0];
    let q75 = quantile(&values, 0.75)?;
    let q40 = quantile(&values, 0.40)?;
    assert!((q75 - 32.5).abs() < 1e-9);
    assert!((q40 - 22.0).abs() < 1e-9);

    assert_eq!(classify(32.5, q75, q40), MarketSignal::High);
    assert_eq!(classify(22.0, q75, q40), MarketSignal::Moderate);
    assert_eq!(classify(21.9, q75, q40), MarketSignal::Low);
    Ok(())
}

#[test]
fn genre_map_labels_every_country() -> anyhow::Result<()> {
    let df = sample_streaming();
    let map = streaming::genre_map(&df, &Value::from("Pop"))?;
    assert_eq!(map.len(), 3);
    for label in map.column_values(MARKET_SIGNAL_COLUMN)? {
        let text = label.as_str().unwrap_or_default();
        assert!(text.ends_with(" Pop adoption market"), "{text}");
    }
    Ok(())
}

#[test]
fn campaign_preparation_and_views() -> anyhow::Result<()> {
    let raw = common::raw_campaign_table(&[
        ["Summer Beats", "Europe", "Pop", "2024-01", "1000", "1020", "20", "12.0", "6.0"],
        ["Summer Beats", "Europe", "Pop", "2024-02", "1020", "1015", "-5", "14.0", "8.0"],
        ["Rock On", "North America", "Rock", "2024-01", "500", "560", "60", "oops", "3.0"],
        ["Night Drive", "Europe", "Electronic", "2024-01", "800", "840", "40", "5.0", ""],
        ["Night Drive", "Europe", "Electronic", "2024-02", "840", "900", "60", "7.0", "4.0"],
    ]);

    let (df, report) = campaign::prepare(&raw)?;
    // "oops" is the only unparseable cell; the blank was already missing.
    assert_eq!(report.total(), 1);
    assert_eq!(report.failures.get(campaign::USER_GROWTH_PCT), Some(&1));
    assert_eq!(df.len(), 3);

    let sizes: Vec<Value> = df.column_values(campaign::ABS_USER_GAIN)?.cloned().collect();
    assert_eq!(
        sizes,
        vec![Value::Float(30.0), Value::Float(15.0), Value::Float(70.0)]
    );

    let ranked = campaign::net_gain_by_campaign(&df, SortOrder::HighestFirst)?;
    let names: Vec<String> = ranked
        .column_values(campaign::CAMPAIGN_NAME)?
        .map(Value::to_string)
        .collect();
    assert_eq!(names, ["Night Drive", "Summer Beats"]);

    let scale = campaign::scale_candidates(&df, 10.0, 5.0)?;
    assert_eq!(scale.len(), 1);
    assert_eq!(
        scale.get(0, campaign::CAMPAIGN_NAME),
        Some(&Value::from("Summer Beats"))
    );

    let k = campaign::kpis(&df)?;
    assert_eq!(k.net_user_gain.as_f64(), Some(75.0));
    assert!((k.avg_user_growth_pct? - 11.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn top_entity_of_nothing_is_no_data() {
    let empty = common::streaming_table(&[]);
    let err = top_entity(&empty, streaming::ARTIST_NAME, streaming::STREAMS).unwrap_err();
    assert!(err.is_no_data());
}
