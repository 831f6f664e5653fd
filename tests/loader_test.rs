use std::fs;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use stream_insights::data::loader::{load_campaigns, load_file, load_streaming, Dataset, TableCache};
use stream_insights::data::model::Value;
use stream_insights::data::{campaign, streaming};
use tempfile::TempDir;

const STREAMING_CSV: &str = "\
region,genre,subscription_type,month,artist_name,country,streams,active_listeners,completion_rate
Europe,Pop,Free,2024-01,Nova,France,100,40,0.8
Europe,Rock,Premium,2024-02,Kairo,Germany,120,30,0.7
";

const CAMPAIGNS_CSV: &str = "\
campaign_name,target_region,target_genre,month,users_before,users_after,net_user_gain,user_growth_pct,premium_growth_pct
Summer Beats,Europe,Pop,2024-01,1000,1020,20,12.0,6.0
Rock On,North America,Rock,2024-01,500,480,-20,n/a,3.0
Night Drive,Europe,Electronic,2024-01,800,840,40,5.0,
";

#[test]
fn streaming_csv_loads_with_typed_cells() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("spotify.csv");
    fs::write(&path, STREAMING_CSV)?;

    let table = load_streaming(&path)?;
    assert_eq!(table.len(), 2);
    assert_eq!(table.columns().len(), streaming::COLUMNS.len());
    assert_eq!(table.get(1, streaming::STREAMS), Some(&Value::Integer(120)));
    assert_eq!(
        table.distinct(streaming::REGION).map(|s| s.len()),
        Some(1)
    );
    Ok(())
}

#[test]
fn missing_column_is_a_schema_error() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("spotify.csv");
    fs::write(&path, "region,genre,streams\nEurope,Pop,10\n")?;

    let err = load_streaming(&path).unwrap_err();
    assert!(format!("{err:#}").contains("subscription_type"), "{err:#}");
    Ok(())
}

#[test]
fn campaigns_are_coerced_and_incomplete_rows_dropped() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("marketing_campaigns.csv");
    fs::write(&path, CAMPAIGNS_CSV)?;

    let (table, report) = load_campaigns(&path)?;
    assert_eq!(report.total(), 1);
    assert_eq!(table.len(), 1);
    assert_eq!(
        table.get(0, campaign::CAMPAIGN_NAME),
        Some(&Value::from("Summer Beats"))
    );
    assert_eq!(table.get(0, campaign::ABS_USER_GAIN), Some(&Value::Float(30.0)));
    Ok(())
}

#[test]
fn json_records_load() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("rows.json");
    fs::write(
        &path,
        r#"[{"region": "Europe", "streams": 10}, {"region": "Asia", "streams": null}]"#,
    )?;

    let table = load_file(&path, "streaming")?;
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(0, "streams"), Some(&Value::Integer(10)));
    assert_eq!(table.get(1, "streams"), Some(&Value::Missing));
    Ok(())
}

#[test]
fn cache_loads_each_file_once() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("spotify.csv");
    fs::write(&path, STREAMING_CSV)?;

    let mut cache = TableCache::default();
    let first = cache.get_or_load(Dataset::Streaming, &path)?;
    let second = cache.get_or_load(Dataset::Streaming, &path)?;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
    Ok(())
}

#[test]
fn parquet_loads_with_nulls() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("rows.parquet");

    let schema = Arc::new(Schema::new(vec![
        Field::new("region", DataType::Utf8, true),
        Field::new("streams", DataType::Int64, false),
        Field::new("rate", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(vec![Some("US"), None])) as ArrayRef,
            Arc::new(Int64Array::from(vec![5, 7])) as ArrayRef,
            Arc::new(Float64Array::from(vec![Some(0.5), None])) as ArrayRef,
        ],
    )?;
    let mut writer = ArrowWriter::try_new(fs::File::create(&path)?, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    let table = load_file(&path, "streaming")?;
    assert_eq!(table.columns(), ["region", "streams", "rate"]);
    assert_eq!(
        table.rows(),
        [
            vec![Value::from("US"), Value::Integer(5), Value::Float(0.5)],
            vec![Value::Missing, Value::Integer(7), Value::Missing],
        ]
    );
    Ok(())
}
