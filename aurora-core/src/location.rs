//! Bundled static locations and great-circle helpers.

use serde::Deserialize;
use std::{path::PathBuf, sync::OnceLock};

use crate::{
    error::{FetchError, FetchResult},
    model::Location,
};

const BUNDLED_LOCATIONS: &str = include_str!("../data/locations.toml");
const BUNDLED_PATH: &str = "data/locations.toml";

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Deserialize)]
struct LocationFile {
    #[serde(rename = "location")]
    locations: Vec<Location>,
}

static BUNDLED: OnceLock<Vec<Location>> = OnceLock::new();

/// Locations compiled into the binary. Parsed on first use, then shared.
pub fn bundled_locations() -> FetchResult<&'static [Location]> {
    if let Some(locations) = BUNDLED.get() {
        return Ok(locations.as_slice());
    }
    let parsed = parse_locations(BUNDLED_LOCATIONS)?;
    Ok(BUNDLED.get_or_init(|| parsed).as_slice())
}

pub fn parse_locations(contents: &str) -> FetchResult<Vec<Location>> {
    let missing = |reason: String| FetchError::MissingAsset { path: PathBuf::from(BUNDLED_PATH), reason };

    let file: LocationFile = toml::from_str(contents).map_err(|e| missing(e.to_string()))?;
    for loc in &file.locations {
        if !(-90.0..=90.0).contains(&loc.latitude) || !(-180.0..=180.0).contains(&loc.longitude) {
            return Err(missing(format!("{} has coordinates out of range", loc.name)));
        }
    }
    Ok(file.locations)
}

pub fn find_location<'a>(locations: &'a [Location], name: &str) -> Option<&'a Location> {
    locations.iter().find(|loc| loc.name.eq_ignore_ascii_case(name))
}

/// Great-circle distance in kilometres (haversine).
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

pub fn is_northern_hemisphere(latitude: f64) -> bool {
    latitude >= 0.0
}
