use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Most recent planetary Kp value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpReading {
    pub time: DateTime<Utc>,
    pub kp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForecastHorizon {
    /// 3-hourly predictions for the next three days.
    ThreeDay,
    /// Daily largest Kp from the 27-day outlook.
    TwentySevenDay,
}

impl ForecastHorizon {
    pub fn title(&self) -> &'static str {
        match self {
            ForecastHorizon::ThreeDay => "3-Day Kp Forecast",
            ForecastHorizon::TwentySevenDay => "27-Day Largest Kp Forecast",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub time: DateTime<Utc>,
    pub kp: f64,
    /// "observed", "estimated" or "predicted" for the 3-day product.
    pub observed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub horizon: ForecastHorizon,
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    /// Points strictly after `now`, source order kept.
    pub fn upcoming(&self, now: DateTime<Utc>) -> ForecastSeries {
        ForecastSeries {
            horizon: self.horizon,
            points: self.points.iter().filter(|p| p.time > now).cloned().collect(),
        }
    }

    pub fn max_kp(&self) -> Option<f64> {
        self.points.iter().map(|p| p.kp).max_by(f64::total_cmp)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlasmaReading {
    pub time: DateTime<Utc>,
    /// protons per cm³
    pub density: f64,
    /// km/s
    pub speed: f64,
    /// kelvin
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagReading {
    pub time: DateTime<Utc>,
    /// nT, GSM frame
    pub bz: f64,
    /// nT
    pub bt: f64,
}

/// One day of solar wind plasma and magnetometer readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolarWind {
    pub plasma: Vec<PlasmaReading>,
    pub mag: Vec<MagReading>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarWindSample {
    pub time: DateTime<Utc>,
    pub bz: f64,
    pub bt: f64,
    pub speed: f64,
    pub density: f64,
}

impl SolarWind {
    /// Join plasma and magnetometer readings that share a timestamp.
    ///
    /// Both feeds are minute-resolution and ascending, so a merge walk is enough.
    pub fn samples(&self) -> Vec<SolarWindSample> {
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);

        while i < self.plasma.len() && j < self.mag.len() {
            let (p, m) = (&self.plasma[i], &self.mag[j]);
            match p.time.cmp(&m.time) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    out.push(SolarWindSample {
                        time: p.time,
                        bz: m.bz,
                        bt: m.bt,
                        speed: p.speed,
                        density: p.density,
                    });
                    i += 1;
                    j += 1;
                }
            }
        }

        out
    }

    pub fn latest(&self) -> Option<SolarWindSample> {
        self.samples().pop()
    }
}

/// One cell of the Ovation aurora model output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuroraPoint {
    pub lon: f64,
    pub lat: f64,
    /// percent, 0..=100
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvationGrid {
    pub observation_time: Option<DateTime<Utc>>,
    pub forecast_time: Option<DateTime<Utc>>,
    pub points: Vec<AuroraPoint>,
}

/// A named place from the bundled location file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    #[serde(default)]
    pub webcam_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebcamEntry {
    pub location: Location,
    pub url: String,
    /// Sort key of the last ranking; lower is better. Zero before ranking.
    pub score: f64,
}

/// Approximate position of the caller from IP geolocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    pub fn label(&self) -> String {
        let parts: Vec<&str> = [&self.city, &self.region, &self.country]
            .into_iter()
            .filter_map(|s| s.as_deref())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.is_empty() {
            format!("{:.4}, {:.4}", self.latitude, self.longitude)
        } else {
            parts.join(", ")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SunImage {
    pub name: &'static str,
    pub url: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadedImage {
    pub name: String,
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, min, 0).unwrap()
    }

    #[test]
    fn samples_join_on_shared_timestamps() {
        let wind = SolarWind {
            plasma: vec![
                PlasmaReading { time: at(0), density: 4.0, speed: 400.0, temperature: None },
                PlasmaReading { time: at(1), density: 5.0, speed: 410.0, temperature: None },
                PlasmaReading { time: at(3), density: 6.0, speed: 420.0, temperature: None },
            ],
            mag: vec![
                MagReading { time: at(1), bz: -2.0, bt: 5.0 },
                MagReading { time: at(2), bz: -3.0, bt: 6.0 },
                MagReading { time: at(3), bz: 1.0, bt: 4.0 },
            ],
        };

        let samples = wind.samples();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].time, at(1));
        assert_eq!(samples[0].bz, -2.0);
        assert_eq!(samples[0].speed, 410.0);
        assert_eq!(wind.latest().unwrap().time, at(3));
    }

    #[test]
    fn upcoming_keeps_order_and_drops_past() {
        let series = ForecastSeries {
            horizon: ForecastHorizon::ThreeDay,
            points: vec![
                ForecastPoint { time: at(0), kp: 2.0, observed: None },
                ForecastPoint { time: at(30), kp: 4.0, observed: None },
                ForecastPoint { time: at(45), kp: 3.0, observed: None },
            ],
        };

        let upcoming = series.upcoming(at(0));
        assert_eq!(upcoming.len(), 2);
        assert_eq!(upcoming.points[0].kp, 4.0);
        assert_eq!(upcoming.points[1].kp, 3.0);
        assert_eq!(series.max_kp(), Some(4.0));
    }

    #[test]
    fn geolocation_label_falls_back_to_coordinates() {
        let geo = GeoLocation {
            city: None,
            region: Some(String::new()),
            country: None,
            latitude: 60.0,
            longitude: 10.5,
        };
        assert_eq!(geo.label(), "60.0000, 10.5000");
    }
}
