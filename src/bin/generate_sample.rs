use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const REGIONS: [(&str, &[&str]); 4] = [
    ("Europe", &["France", "Germany", "Sweden"]),
    ("North America", &["United States", "Canada"]),
    ("Latin America", &["Brazil", "Mexico"]),
    ("Asia", &["Japan", "India"]),
];
const GENRES: [&str; 5] = ["Pop", "Rock", "Hip-Hop", "Electronic", "Latin"];
const SUBSCRIPTIONS: [&str; 2] = ["Free", "Premium"];
const MONTHS: [&str; 6] = ["2024-01", "2024-02", "2024-03", "2024-04", "2024-05", "2024-06"];
const ARTISTS: [&str; 12] = [
    "Nova", "The Lanterns", "Kairo", "Mila Rae", "Echo Park", "Sol Y Luna", "Dex", "Aurora Lane",
    "Blue Static", "Tempo", "Rhea", "North Wire",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

// ---------------------------------------------------------------------------
// Streaming activity
// ---------------------------------------------------------------------------

struct StreamRow {
    region: &'static str,
    genre: &'static str,
    subscription: &'static str,
    month: &'static str,
    artist: &'static str,
    country: &'static str,
    streams: i64,
    listeners: i64,
    completion: f64,
}

fn streaming_rows(rng: &mut SimpleRng) -> Vec<StreamRow> {
    let mut rows = Vec::new();
    for &(region, countries) in &REGIONS {
        for &country in countries {
            for &month in &MONTHS {
                for &subscription in &SUBSCRIPTIONS {
                    let boost = if subscription == "Premium" { 1.6 } else { 1.0 };
                    for _ in 0..3 {
                        let streams = (rng.range(2_000.0, 60_000.0) * boost) as i64;
                        rows.push(StreamRow {
                            region,
                            genre: *rng.pick(&GENRES),
                            subscription,
                            month,
                            artist: *rng.pick(&ARTISTS),
                            country,
                            streams,
                            listeners: streams / rng.range(3.0, 9.0) as i64,
                            completion: (rng.range(0.45, 0.95) * 100.0).round() / 100.0,
                        });
                    }
                }
            }
        }
    }
    rows
}

fn write_streaming_csv(path: &Path, rows: &[StreamRow]) -> Result<()> {
    let mut w = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    w.write_record([
        "region",
        "genre",
        "subscription_type",
        "month",
        "artist_name",
        "country",
        "streams",
        "active_listeners",
        "completion_rate",
    ])?;
    for r in rows {
        w.write_record([
            r.region.to_string(),
            r.genre.to_string(),
            r.subscription.to_string(),
            r.month.to_string(),
            r.artist.to_string(),
            r.country.to_string(),
            r.streams.to_string(),
            r.listeners.to_string(),
            r.completion.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_streaming_parquet(path: &Path, rows: &[StreamRow]) -> Result<()> {
    let text = |f: fn(&StreamRow) -> &'static str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let schema = Arc::new(Schema::new(vec![
        Field::new("region", DataType::Utf8, false),
        Field::new("genre", DataType::Utf8, false),
        Field::new("subscription_type", DataType::Utf8, false),
        Field::new("month", DataType::Utf8, false),
        Field::new("artist_name", DataType::Utf8, false),
        Field::new("country", DataType::Utf8, false),
        Field::new("streams", DataType::Int64, false),
        Field::new("active_listeners", DataType::Int64, false),
        Field::new("completion_rate", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            text(|r| r.region),
            text(|r| r.genre),
            text(|r| r.subscription),
            text(|r| r.month),
            text(|r| r.artist),
            text(|r| r.country),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.streams))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.listeners))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.completion))),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Marketing campaigns
// ---------------------------------------------------------------------------

const CAMPAIGNS: [(&str, &str, &str); 6] = [
    ("Summer Beats", "Europe", "Pop"),
    ("Rock On Tour", "North America", "Rock"),
    ("Ritmo Latino", "Latin America", "Latin"),
    ("Night Drive", "Europe", "Electronic"),
    ("Street Verses", "North America", "Hip-Hop"),
    ("Tokyo Nights", "Asia", "Electronic"),
];

fn write_campaigns_csv(path: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let mut w = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    w.write_record([
        "campaign_name",
        "target_region",
        "target_genre",
        "month",
        "users_before",
        "users_after",
        "net_user_gain",
        "user_growth_pct",
        "premium_growth_pct",
    ])?;
    let mut n = 0;
    for (c, &(name, region, genre)) in CAMPAIGNS.iter().enumerate() {
        for (m, &month) in MONTHS.iter().enumerate() {
            let before = rng.range(20_000.0, 120_000.0) as i64;
            // Some campaigns lose users.
            let growth = rng.range(-6.0, 25.0);
            let after = before + (before as f64 * growth / 100.0) as i64;
            let premium = rng.range(-2.0, 18.0);

            // A few hand-typed cells the pipeline must coerce or drop.
            let premium_cell = match (c, m) {
                (1, 2) => "n/a".to_string(),
                (4, 5) => String::new(),
                _ => format!("{premium:.1}"),
            };
            let growth_cell = if (c, m) == (3, 1) {
                "twelve".to_string()
            } else {
                format!("{growth:.1}")
            };

            w.write_record([
                name.to_string(),
                region.to_string(),
                genre.to_string(),
                month.to_string(),
                before.to_string(),
                after.to_string(),
                (after - before).to_string(),
                growth_cell,
                premium_cell,
            ])?;
            n += 1;
        }
    }
    w.flush()?;
    Ok(n)
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let rows = streaming_rows(&mut rng);
    write_streaming_csv(Path::new("spotify.csv"), &rows)?;
    write_streaming_parquet(Path::new("spotify.parquet"), &rows)?;
    println!("Wrote {} streaming rows to spotify.csv and spotify.parquet", rows.len());

    let n = write_campaigns_csv(Path::new("marketing_campaigns.csv"), &mut rng)?;
    println!("Wrote {n} campaign rows to marketing_campaigns.csv");
    Ok(())
}
