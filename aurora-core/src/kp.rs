//! Current Kp index parsing and the interpretation helpers shown next to it.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{FetchError, FetchResult},
    model::KpReading,
    source::{parse_swpc_time, value_f64},
};

const SOURCE: &str = "kp index";

#[derive(Debug, Deserialize)]
struct KpRow {
    time_tag: String,
    #[serde(default)]
    kp_index: Value,
    #[serde(default)]
    estimated_kp: Value,
}

/// Parse the SWPC 1-minute planetary Kp feed and pick the newest reading not
/// later than `now`.
pub fn parse_kp_index(body: &str, now: DateTime<Utc>) -> FetchResult<KpReading> {
    let rows: Vec<KpRow> =
        serde_json::from_str(body).map_err(|e| FetchError::malformed(SOURCE, e.to_string()))?;

    if rows.is_empty() {
        return Err(FetchError::malformed(SOURCE, "empty array"));
    }

    let mut latest: Option<KpReading> = None;
    for row in &rows {
        let Some(time) = parse_swpc_time(&row.time_tag) else {
            tracing::warn!(time_tag = %row.time_tag, "skipping kp row with unreadable time");
            continue;
        };
        if time > now {
            continue;
        }
        let Some(kp) = value_f64(&row.estimated_kp).or_else(|| value_f64(&row.kp_index)) else {
            continue;
        };
        if latest.is_none_or(|l| time >= l.time) {
            latest = Some(KpReading { time, kp: kp.clamp(0.0, 9.0) });
        }
    }

    latest.ok_or_else(|| FetchError::malformed(SOURCE, "no row with a usable time and Kp value"))
}

/// Rough latitude band where the aurora may be seen for a given Kp.
pub fn visibility_zone(kp: f64) -> &'static str {
    match kp.clamp(0.0, 9.0) as u8 {
        0 => "Very High Latitudes (e.g. North Pole)",
        1 => "Arctic Circle (approx. 66 degrees)",
        2 => "Iceland, Tromso",
        3 => "Northern Scandinavia",
        4 => "Southern Norway, Scotland",
        5 => "UK, Germany, Canada border",
        6 => "Central Europe/North USA",
        7 => "France, New York",
        8 => "Spain, California",
        _ => "Mexico, North Africa",
    }
}

/// Coarser reach description used in summaries.
pub fn interpret_kp(kp: f64) -> &'static str {
    if kp < 3.0 {
        "Visible in High Arctic only"
    } else if kp < 5.0 {
        "Visible above 60°N"
    } else if kp < 7.0 {
        "Visible in Scandinavia, Canada, Alaska"
    } else if kp < 8.0 {
        "Visible in UK, Germany, USA"
    } else {
        "May be visible as far south as Northern Spain or Southern USA"
    }
}

/// Colour band used when charting Kp values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KpLevel {
    Green,
    Yellow,
    Orange,
    Red,
    DarkRed,
}

impl KpLevel {
    pub fn from_kp(kp: f64) -> Self {
        if kp < 3.0 {
            KpLevel::Green
        } else if kp < 4.0 {
            KpLevel::Yellow
        } else if kp < 6.0 {
            KpLevel::Orange
        } else if kp < 8.0 {
            KpLevel::Red
        } else {
            KpLevel::DarkRed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KpLevel::Green => "green",
            KpLevel::Yellow => "yellow",
            KpLevel::Orange => "orange",
            KpLevel::Red => "red",
            KpLevel::DarkRed => "darkred",
        }
    }
}

impl std::fmt::Display for KpLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_alert(kp: f64, threshold: f64) -> bool {
    kp >= threshold
}
