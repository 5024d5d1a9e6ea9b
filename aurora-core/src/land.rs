//! Coarse land outlines bundled for the map base layer.

use geo::{Geometry, Polygon};
use geojson::GeoJson;
use std::{path::PathBuf, sync::OnceLock};

use crate::error::{FetchError, FetchResult};

const BUNDLED_LAND: &str = include_str!("../data/land.geojson");
const BUNDLED_PATH: &str = "data/land.geojson";

static BUNDLED: OnceLock<Vec<Polygon<f64>>> = OnceLock::new();

/// Land polygons compiled into the binary, in lon/lat degrees.
pub fn bundled_land() -> FetchResult<&'static [Polygon<f64>]> {
    if let Some(polygons) = BUNDLED.get() {
        return Ok(polygons.as_slice());
    }
    let parsed = parse_land(BUNDLED_LAND)?;
    Ok(BUNDLED.get_or_init(|| parsed).as_slice())
}

/// Polygons and multipolygons of a GeoJSON document; other geometries are ignored.
pub fn parse_land(contents: &str) -> FetchResult<Vec<Polygon<f64>>> {
    let missing = |reason: String| FetchError::MissingAsset { path: PathBuf::from(BUNDLED_PATH), reason };

    let document: GeoJson = contents.parse().map_err(|e: geojson::Error| missing(e.to_string()))?;
    let collection = geojson::quick_collection::<f64>(&document).map_err(|e| missing(e.to_string()))?;

    let polygons: Vec<Polygon<f64>> = collection
        .0
        .into_iter()
        .flat_map(|geometry| match geometry {
            Geometry::Polygon(polygon) => vec![polygon],
            Geometry::MultiPolygon(multi) => multi.0,
            _ => Vec::new(),
        })
        .collect();

    if polygons.is_empty() {
        return Err(missing("no land polygons".into()));
    }
    Ok(polygons)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_outlines_parse() {
        let land = bundled_land().expect("bundled land should parse");
        assert_eq!(land.len(), 16);
        assert!(land.iter().all(|p| p.exterior().0.len() >= 4));
    }

    #[test]
    fn multipolygons_are_flattened() {
        let doc = r#"{"type": "MultiPolygon", "coordinates": [
            [[[0, 0], [1, 0], [1, 1], [0, 0]]],
            [[[5, 5], [6, 5], [6, 6], [5, 5]]]
        ]}"#;
        assert_eq!(parse_land(doc).unwrap().len(), 2);
    }

    #[test]
    fn broken_or_empty_documents_are_missing_assets() {
        assert!(matches!(parse_land("{not json"), Err(FetchError::MissingAsset { .. })));
        let lines_only = r#"{"type": "LineString", "coordinates": [[0, 0], [1, 1]]}"#;
        assert!(matches!(parse_land(lines_only), Err(FetchError::MissingAsset { .. })));
    }
}
