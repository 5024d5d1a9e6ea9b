//! Sun elevation and darkness checks.
//!
//! Uses the NOAA general solar position approximation, good to a fraction of
//! a degree, which is plenty for "can you see the aurora right now".

use chrono::{DateTime, Datelike, Timelike, Utc};
use std::f64::consts::PI;

/// Sun elevation below which we consider the sky dark (civil twilight).
pub const CIVIL_TWILIGHT_DEG: f64 = -6.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    /// radians
    pub declination: f64,
    /// minutes
    pub equation_of_time: f64,
    /// degrees, negative before solar noon
    pub hour_angle: f64,
    /// degrees above the horizon
    pub elevation: f64,
}

pub fn solar_position(latitude: f64, longitude: f64, at: DateTime<Utc>) -> SolarPosition {
    let hour = f64::from(at.hour());
    let minute = f64::from(at.minute());
    let second = f64::from(at.second());
    let days_in_year = if at.date_naive().leap_year() { 366.0 } else { 365.0 };

    // fractional year
    let g = 2.0 * PI / days_in_year * (f64::from(at.ordinal()) - 1.0 + (hour - 12.0) / 24.0);

    let equation_of_time = 229.18
        * (0.000075 + 0.001868 * g.cos()
            - 0.032077 * g.sin()
            - 0.014615 * (2.0 * g).cos()
            - 0.040849 * (2.0 * g).sin());

    let declination = 0.006918 - 0.399912 * g.cos() + 0.070257 * g.sin()
        - 0.006758 * (2.0 * g).cos()
        + 0.000907 * (2.0 * g).sin()
        - 0.002697 * (3.0 * g).cos()
        + 0.00148 * (3.0 * g).sin();

    let true_solar_minutes = hour * 60.0 + minute + second / 60.0 + equation_of_time + 4.0 * longitude;
    let hour_angle = true_solar_minutes / 4.0 - 180.0;

    let lat = latitude.to_radians();
    let cos_zenith = (lat.sin() * declination.sin()
        + lat.cos() * declination.cos() * hour_angle.to_radians().cos())
    .clamp(-1.0, 1.0);
    let elevation = 90.0 - cos_zenith.acos().to_degrees();

    SolarPosition { declination, equation_of_time, hour_angle, elevation }
}

pub fn solar_elevation(latitude: f64, longitude: f64, at: DateTime<Utc>) -> f64 {
    solar_position(latitude, longitude, at).elevation
}

/// True when the sun is below civil twilight at the given place and instant.
///
/// Polar day and polar night need no special casing: the elevation simply
/// never crosses the threshold.
pub fn is_dark(latitude: f64, longitude: f64, at: DateTime<Utc>) -> bool {
    solar_elevation(latitude, longitude, at) < CIVIL_TWILIGHT_DEG
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn equator_noon_and_midnight() {
        let noon = Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap();
        let midnight = Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap();

        assert!(solar_elevation(0.0, 0.0, noon) > 85.0);
        assert!(!is_dark(0.0, 0.0, noon));
        assert!(solar_elevation(0.0, 0.0, midnight) < -85.0);
        assert!(is_dark(0.0, 0.0, midnight));
    }

    #[test]
    fn svalbard_polar_night_is_dark_at_noon() {
        let noon = Utc.with_ymd_and_hms(2025, 12, 21, 11, 0, 0).unwrap();
        assert!(is_dark(78.2232, 15.6267, noon));
    }

    #[test]
    fn tromso_midnight_sun_is_bright_at_midnight() {
        let local_midnight = Utc.with_ymd_and_hms(2025, 6, 21, 22, 45, 0).unwrap();
        let elevation = solar_elevation(69.6496, 18.9560, local_midnight);
        assert!(elevation > 0.0, "elevation {elevation}");
        assert!(!is_dark(69.6496, 18.9560, local_midnight));
    }

    #[test]
    fn declination_tracks_seasons() {
        let june = solar_position(0.0, 0.0, Utc.with_ymd_and_hms(2025, 6, 21, 12, 0, 0).unwrap());
        let dec = solar_position(0.0, 0.0, Utc.with_ymd_and_hms(2025, 12, 21, 12, 0, 0).unwrap());
        assert!((june.declination.to_degrees() - 23.44).abs() < 0.5);
        assert!((dec.declination.to_degrees() + 23.44).abs() < 0.5);
    }
}
