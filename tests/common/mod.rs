use stream_insights::data::model::{Table, Value};
use stream_insights::data::{campaign, streaming};

pub fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|c| c.to_string()).collect()
}

/// (region, genre, subscription_type, month, artist_name, country, streams,
/// active_listeners, completion_rate)
pub type StreamRow<'a> = (&'a str, &'a str, &'a str, &'a str, &'a str, &'a str, i64, i64, f64);

pub fn streaming_table(rows: &[StreamRow]) -> Table {
    let rows = rows
        .iter()
        .map(|&(region, genre, sub, month, artist, country, streams, listeners, completion)| {
            vec![
                region.into(),
                genre.into(),
                sub.into(),
                month.into(),
                artist.into(),
                country.into(),
                streams.into(),
                listeners.into(),
                completion.into(),
            ]
        })
        .collect();
    Table::new("streaming", columns(&streaming::COLUMNS), rows).unwrap()
}

/// Raw campaign rows as they come off a CSV: numeric cells may be text.
pub fn raw_campaign_table(rows: &[[&str; 9]]) -> Table {
    let rows = rows
        .iter()
        .map(|r| {
            r.iter()
                .map(|cell| if cell.is_empty() { Value::Missing } else { Value::from(*cell) })
                .collect()
        })
        .collect();
    Table::new("campaigns", columns(&campaign::COLUMNS), rows).unwrap()
}
