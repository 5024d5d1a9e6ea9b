//! Live aurora webcams and the visibility ranking.

use chrono::{DateTime, Utc};

use crate::{
    daylight,
    error::FetchResult,
    location::{bundled_locations, haversine_km},
    model::{Location, WebcamEntry},
};

/// Score added for a camera in darkness (lower is better).
const DARK_BONUS: f64 = -10.0;
/// Score added for a camera in daylight.
const DAYLIGHT_PENALTY: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Best chance of seeing the aurora first.
    Visibility,
    Location,
    Country,
    Distance,
}

/// Every bundled location that has a webcam, unranked.
pub fn webcam_catalog() -> FetchResult<Vec<WebcamEntry>> {
    Ok(webcams_from_locations(bundled_locations()?))
}

pub fn webcams_from_locations(locations: &[Location]) -> Vec<WebcamEntry> {
    locations
        .iter()
        .filter_map(|loc| {
            let url = loc.webcam_url.clone()?;
            Some(WebcamEntry { location: loc.clone(), url, score: 0.0 })
        })
        .collect()
}

/// Latitude (either hemisphere) where the auroral oval roughly sits for `kp`.
pub fn auroral_boundary_latitude(kp: f64) -> f64 {
    90.0 - kp * 5.0
}

/// Score one camera; lower means a better chance of seeing the aurora.
///
/// Distance in degrees from the oval boundary, shifted by the darkness term.
pub fn visibility_score(latitude: f64, longitude: f64, kp: f64, at: DateTime<Utc>) -> f64 {
    let distance_from_boundary = (latitude.abs() - auroral_boundary_latitude(kp)).abs();
    let darkness = if daylight::is_dark(latitude, longitude, at) { DARK_BONUS } else { DAYLIGHT_PENALTY };
    distance_from_boundary + darkness
}

/// Sort by visibility score, ascending. Ties keep their input order.
pub fn rank_by_visibility(mut cams: Vec<WebcamEntry>, kp: f64, at: DateTime<Utc>) -> Vec<WebcamEntry> {
    for cam in &mut cams {
        cam.score = visibility_score(cam.location.latitude, cam.location.longitude, kp, at);
    }
    cams.sort_by(|a, b| a.score.total_cmp(&b.score));
    cams
}

pub fn sort_by_location(mut cams: Vec<WebcamEntry>) -> Vec<WebcamEntry> {
    cams.sort_by(|a, b| a.location.name.cmp(&b.location.name));
    cams
}

pub fn sort_by_country(mut cams: Vec<WebcamEntry>) -> Vec<WebcamEntry> {
    cams.sort_by(|a, b| {
        (&a.location.country, &a.location.name).cmp(&(&b.location.country, &b.location.name))
    });
    cams
}

/// Nearest first; `score` holds the distance in kilometres.
pub fn sort_by_distance(mut cams: Vec<WebcamEntry>, latitude: f64, longitude: f64) -> Vec<WebcamEntry> {
    for cam in &mut cams {
        cam.score = haversine_km(latitude, longitude, cam.location.latitude, cam.location.longitude);
    }
    cams.sort_by(|a, b| a.score.total_cmp(&b.score));
    cams
}

/// Pick a webcam by its 1-based position in `cams` or by location name (case-insensitive).
pub fn select_webcam<'a>(cams: &'a [WebcamEntry], selector: &str) -> Option<&'a WebcamEntry> {
    let selector = selector.trim();
    if let Ok(position) = selector.parse::<usize>() {
        return position.checked_sub(1).and_then(|i| cams.get(i));
    }
    cams.iter().find(|cam| cam.location.name.eq_ignore_ascii_case(selector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cam(name: &str, country: &str, lat: f64, lon: f64) -> WebcamEntry {
        WebcamEntry {
            location: Location {
                name: name.into(),
                country: country.into(),
                latitude: lat,
                longitude: lon,
                timezone: "UTC".into(),
                webcam_url: Some(format!("https://example.org/{name}")),
            },
            url: format!("https://example.org/{name}"),
            score: 0.0,
        }
    }

    fn winter_evening() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 22, 0, 0).unwrap()
    }

    #[test]
    fn ranking_is_deterministic() {
        let cams = webcam_catalog().expect("bundled catalog");
        let first = rank_by_visibility(cams.clone(), 4.0, winter_evening());
        let second = rank_by_visibility(cams, 4.0, winter_evening());

        let names = |v: &[WebcamEntry]| v.iter().map(|c| c.location.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&first), names(&second));
        assert!(first.windows(2).all(|w| w[0].score <= w[1].score));
    }

    #[test]
    fn dark_high_latitude_beats_daylit_one() {
        // 22:00 UTC in January: dark over Scandinavia, daytime over New Zealand.
        let cams = vec![
            cam("Queenstown", "New Zealand", -45.0311, 168.6625),
            cam("Tromsø", "Norway", 69.6496, 18.9560),
        ];
        let ranked = rank_by_visibility(cams, 5.0, winter_evening());
        assert_eq!(ranked[0].location.name, "Tromsø");
        // boundary 65°, Tromsø 4.65° poleward and dark
        assert!((ranked[0].score - (69.6496 - 65.0 - 10.0)).abs() < 1e-9);
        assert!((ranked[1].score - (65.0 - 45.0311 + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let cams = vec![cam("B", "X", 60.0, 0.0), cam("A", "X", 60.0, 0.0)];
        let ranked = rank_by_visibility(cams, 3.0, winter_evening());
        assert_eq!(ranked[0].location.name, "B");
    }

    #[test]
    fn alphabetical_and_country_sorts() {
        let cams = vec![
            cam("Tampere", "Finland", 61.4981, 23.76),
            cam("Abisko", "Sweden", 68.3518, 18.8294),
            cam("Kuusamo", "Finland", 65.9667, 29.1833),
        ];

        let by_name = sort_by_location(cams.clone());
        assert_eq!(by_name[0].location.name, "Abisko");

        let by_country = sort_by_country(cams);
        let order: Vec<_> = by_country.iter().map(|c| c.location.name.as_str()).collect();
        assert_eq!(order, ["Kuusamo", "Tampere", "Abisko"]);
    }

    #[test]
    fn distance_sort_from_tromso() {
        let cams = webcam_catalog().unwrap();
        let sorted = sort_by_distance(cams, 69.6496, 18.9560);
        assert_eq!(sorted[0].location.name, "Tromsø");
        assert_eq!(sorted[0].score, 0.0);
        assert!(sorted.last().unwrap().location.latitude < 0.0);
    }

    #[test]
    fn select_by_rank_or_name() {
        let cams = vec![cam("Abisko", "Sweden", 68.35, 18.83), cam("Tromsø", "Norway", 69.65, 18.96)];

        assert_eq!(select_webcam(&cams, "2").unwrap().location.name, "Tromsø");
        assert_eq!(select_webcam(&cams, " abisko ").unwrap().url, "https://example.org/Abisko");
        assert!(select_webcam(&cams, "0").is_none());
        assert!(select_webcam(&cams, "3").is_none());
        assert!(select_webcam(&cams, "Kiruna").is_none());
    }

    #[test]
    fn boundary_moves_equatorward_with_kp() {
        assert_eq!(auroral_boundary_latitude(0.0), 90.0);
        assert_eq!(auroral_boundary_latitude(9.0), 45.0);
    }
}
