//! Short (3-day) and long (27-day) Kp forecast parsing.

use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;
use tracing::warn;

use crate::{
    error::{FetchError, FetchResult},
    model::{ForecastHorizon, ForecastPoint, ForecastSeries},
    source::{parse_swpc_time, value_f64},
};

const SHORT_SOURCE: &str = "kp forecast";
const LONG_SOURCE: &str = "27-day outlook";

/// Parse `noaa-planetary-k-index-forecast.json`.
///
/// SWPC has served this product both as rows with a header row
/// (`["time_tag","kp","observed","noaa_scale"]`) and as an array of objects;
/// both are accepted. Every data row is kept, in source order.
pub fn parse_kp_forecast(body: &str) -> FetchResult<ForecastSeries> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::malformed(SHORT_SOURCE, e.to_string()))?;

    let Value::Array(rows) = value else {
        return Err(FetchError::malformed(SHORT_SOURCE, "expected a JSON array"));
    };

    let points = match rows.first() {
        None => Vec::new(),
        Some(Value::Array(_)) => parse_table_rows(&rows)?,
        Some(Value::Object(_)) => rows.iter().map(parse_object_row).collect::<FetchResult<_>>()?,
        Some(other) => {
            return Err(FetchError::malformed(SHORT_SOURCE, format!("unexpected row {other}")));
        }
    };

    Ok(ForecastSeries { horizon: ForecastHorizon::ThreeDay, points })
}

fn parse_table_rows(rows: &[Value]) -> FetchResult<Vec<ForecastPoint>> {
    let header: Vec<&str> = rows[0]
        .as_array()
        .map(|cols| cols.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let has_header = header.first() == Some(&"time_tag");
    let column = |name: &str, fallback: usize| {
        header.iter().position(|h| *h == name).filter(|_| has_header).unwrap_or(fallback)
    };
    let (time_col, kp_col, observed_col) = (column("time_tag", 0), column("kp", 1), column("observed", 2));

    rows.iter()
        .skip(usize::from(has_header))
        .map(|row| {
            let cols = row
                .as_array()
                .ok_or_else(|| FetchError::malformed(SHORT_SOURCE, format!("row is not an array: {row}")))?;
            let get = |idx: usize| cols.get(idx).unwrap_or(&Value::Null);
            build_point(get(time_col), get(kp_col), get(observed_col))
        })
        .collect()
}

fn parse_object_row(row: &Value) -> FetchResult<ForecastPoint> {
    let get = |key: &str| row.get(key).unwrap_or(&Value::Null);
    build_point(get("time_tag"), get("kp"), get("observed"))
}

fn build_point(time: &Value, kp: &Value, observed: &Value) -> FetchResult<ForecastPoint> {
    let time = time
        .as_str()
        .and_then(parse_swpc_time)
        .ok_or_else(|| FetchError::malformed(SHORT_SOURCE, format!("bad time_tag {time}")))?;
    let kp = value_f64(kp)
        .ok_or_else(|| FetchError::malformed(SHORT_SOURCE, format!("bad kp value {kp} at {time}")))?;

    Ok(ForecastPoint { time, kp, observed: observed.as_str().map(str::to_owned) })
}

/// Parse the `27-day-outlook.txt` table and keep the "Largest Kp Index" column.
///
/// Data lines look like `2025 Feb 24     175          12          4`; header
/// and comment lines (`:` / `#`) are ignored and unparsable data lines are
/// skipped with a warning.
pub fn parse_long_term_outlook(text: &str) -> FetchResult<ForecastSeries> {
    let mut points = Vec::new();

    for line in text.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 6 || !parts[0].chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let date = NaiveDate::parse_from_str(&parts[..3].join(" "), "%Y %b %d");
        let kp = parts[5].parse::<f64>();
        match (date, kp) {
            (Ok(date), Ok(kp)) => points.push(ForecastPoint {
                time: date.and_time(NaiveTime::MIN).and_utc(),
                kp,
                observed: Some("predicted".to_string()),
            }),
            _ => warn!(line, "skipping unparsable outlook row"),
        }
    }

    if points.is_empty() && !text.lines().any(|l| l.starts_with(":Product:")) {
        return Err(FetchError::malformed(LONG_SOURCE, "no outlook table found"));
    }

    Ok(ForecastSeries { horizon: ForecastHorizon::TwentySevenDay, points })
}
