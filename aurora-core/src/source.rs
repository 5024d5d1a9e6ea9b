//! Remote data sources.
//!
//! Each source is a trait so the dashboard can be driven by in-memory fakes;
//! the real implementations live in the submodules.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use std::fmt::Debug;

use crate::{
    error::FetchResult,
    model::{ForecastSeries, GeoLocation, KpReading, OvationGrid, SolarWind},
};

pub mod ipapi;
pub mod sdo;
pub mod swpc;

pub use ipapi::IpApiLocator;
pub use sdo::SdoImagery;
pub use swpc::SwpcClient;

/// NOAA SWPC style space-weather feeds.
#[async_trait]
pub trait SpaceWeatherSource: Send + Sync + Debug {
    async fn current_kp(&self) -> FetchResult<KpReading>;

    /// Upcoming 3-hourly Kp predictions.
    async fn short_term_forecast(&self) -> FetchResult<ForecastSeries>;

    /// Daily largest Kp from the 27-day outlook.
    async fn long_term_forecast(&self) -> FetchResult<ForecastSeries>;

    async fn ovation_grid(&self) -> FetchResult<OvationGrid>;

    async fn solar_wind(&self) -> FetchResult<SolarWind>;
}

/// Raw image bytes by URL.
#[async_trait]
pub trait ImageSource: Send + Sync + Debug {
    async fn fetch_image(&self, url: &str) -> FetchResult<Vec<u8>>;
}

#[async_trait]
pub trait GeoLocator: Send + Sync + Debug {
    async fn locate(&self) -> FetchResult<GeoLocation>;
}

/// Parse the timestamp flavours SWPC products use:
/// `2024-05-10T00:00:00`, `2024-05-10 00:00:00`, `2024-05-10 00:01:00.000`
/// and RFC 3339 with a `Z` suffix. All are UTC.
pub(crate) fn parse_swpc_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let normalized = raw.trim_end_matches('Z').replacen('T', " ", 1);
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
        .map(|ndt| ndt.and_utc())
}

/// SWPC mixes numbers and numeric strings in the same column.
pub(crate) fn value_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn parses_every_swpc_time_flavour() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 10, 6, 30, 0).unwrap();
        for raw in [
            "2024-05-10T06:30:00",
            "2024-05-10 06:30:00",
            "2024-05-10 06:30:00.000",
            "2024-05-10T06:30:00Z",
            "2024-05-10T06:30",
        ] {
            assert_eq!(parse_swpc_time(raw), Some(expected), "{raw}");
        }
        assert_eq!(parse_swpc_time("yesterday"), None);
    }

    #[test]
    fn value_f64_accepts_numbers_and_numeric_strings() {
        assert_eq!(value_f64(&json!(3.33)), Some(3.33));
        assert_eq!(value_f64(&json!("2.67")), Some(2.67));
        assert_eq!(value_f64(&json!(null)), None);
        assert_eq!(value_f64(&json!("n/a")), None);
    }
}
