//! Ovation aurora-probability map: parsing, projection and compositing.

use chrono::{DateTime, Utc};
use geo::Polygon;
use image::{ImageFormat, Rgb, RgbImage};
use serde::Deserialize;
use std::{f64::consts::PI, path::Path};
use tracing::{info, warn};

use crate::{
    error::{FetchError, FetchResult},
    land::bundled_land,
    model::{AuroraPoint, OvationGrid},
    source::parse_swpc_time,
};

const SOURCE: &str = "ovation aurora";

const OCEAN: Rgb<u8> = Rgb([25, 25, 112]);
const GRATICULE: Rgb<u8> = Rgb([72, 72, 150]);
const LAND: Rgb<u8> = Rgb([211, 211, 211]);
const COASTLINE: Rgb<u8> = Rgb([90, 90, 90]);

/// Minimum probability (percent) that gets drawn at all.
pub const MIN_PROBABILITY: f64 = 1.0;
/// Ovation output equatorward of this latitude is noise for our purposes.
pub const MIN_ABS_LATITUDE: f64 = 45.0;

#[derive(Debug, Deserialize)]
struct OvationPayload {
    #[serde(rename = "Observation Time")]
    observation_time: Option<String>,
    #[serde(rename = "Forecast Time")]
    forecast_time: Option<String>,
    coordinates: Vec<[f64; 3]>,
}

/// Parse `ovation_aurora_latest.json`; coordinates are `[lon, lat, probability]`.
pub fn parse_ovation(body: &str) -> FetchResult<OvationGrid> {
    let payload: OvationPayload =
        serde_json::from_str(body).map_err(|e| FetchError::malformed(SOURCE, e.to_string()))?;

    if payload.coordinates.is_empty() {
        return Err(FetchError::Unavailable("ovation model returned no coordinates".into()));
    }

    Ok(OvationGrid {
        observation_time: payload.observation_time.as_deref().and_then(parse_swpc_time),
        forecast_time: payload.forecast_time.as_deref().and_then(parse_swpc_time),
        points: payload
            .coordinates
            .into_iter()
            .map(|[lon, lat, probability]| AuroraPoint { lon, lat, probability })
            .collect(),
    })
}

/// Drop faint and low-latitude cells and move longitudes into [-180, 180].
pub fn normalize_points(points: &[AuroraPoint]) -> Vec<AuroraPoint> {
    points
        .iter()
        .filter(|p| p.probability >= MIN_PROBABILITY && p.lat.abs() >= MIN_ABS_LATITUDE)
        .map(|p| AuroraPoint { lon: if p.lon > 180.0 { p.lon - 360.0 } else { p.lon }, ..*p })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbabilityBand {
    /// 1 – 9 %
    Faint,
    /// 10 – 29 %
    Low,
    /// 30 – 49 %
    Moderate,
    /// 50 % and up
    High,
}

impl ProbabilityBand {
    pub fn from_probability(probability: f64) -> Option<Self> {
        if probability >= 50.0 {
            Some(Self::High)
        } else if probability >= 30.0 {
            Some(Self::Moderate)
        } else if probability >= 10.0 {
            Some(Self::Low)
        } else if probability >= MIN_PROBABILITY {
            Some(Self::Faint)
        } else {
            None
        }
    }

    pub fn color(&self) -> Rgb<u8> {
        match self {
            Self::High => Rgb([255, 0, 0]),
            Self::Moderate => Rgb([255, 165, 0]),
            Self::Low => Rgb([0, 128, 0]),
            Self::Faint => Rgb([105, 105, 105]),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "red: 50%+ chance of seeing aurora",
            Self::Moderate => "orange: 30% to 49%",
            Self::Low => "green: 10% to 29%",
            Self::Faint => "dark grey: 1% to 9%",
        }
    }
}

/// Miller cylindrical projection centred on the prime meridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MillerProjection {
    width: u32,
    height: u32,
}

impl MillerProjection {
    /// Projected y of the poles, in radians-equivalent units.
    const Y_MAX: f64 = 2.303_412_543_376_391;

    pub fn new(width: u32) -> Self {
        let aspect = (2.0 * Self::Y_MAX) / (2.0 * PI);
        let height = ((f64::from(width) * aspect).round() as u32).max(1);
        Self { width: width.max(2), height }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel position of a lon/lat pair, both in degrees.
    pub fn project(&self, lon: f64, lat: f64) -> (u32, u32) {
        let (px, py) = self.position(lon, lat);
        (px.round() as u32, py.round().clamp(0.0, f64::from(self.height - 1)) as u32)
    }

    /// Unrounded pixel coordinates, for polygon filling.
    fn position(&self, lon: f64, lat: f64) -> (f64, f64) {
        let lambda = lon.clamp(-180.0, 180.0).to_radians();
        let phi = lat.clamp(-90.0, 90.0).to_radians();
        let y = 1.25 * (PI / 4.0 + 0.4 * phi).tan().ln();

        let px = (lambda + PI) / (2.0 * PI) * f64::from(self.width - 1);
        let py = (Self::Y_MAX - y) / (2.0 * Self::Y_MAX) * f64::from(self.height - 1);
        (px, py)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub width: u32,
    /// Edge length of the square drawn per grid cell.
    pub point_size: u32,
    /// Opacity of the overlay, 0..=1.
    pub alpha: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { width: 1440, point_size: 3, alpha: 0.7 }
    }
}

/// A rendered map, keyed by the model run it was produced from.
#[derive(Debug, Clone)]
pub struct AuroraMapOverlay {
    pub observation_time: Option<DateTime<Utc>>,
    pub forecast_time: Option<DateTime<Utc>>,
    /// Number of grid cells drawn on top of the base map.
    pub plotted: usize,
    pub image: RgbImage,
}

impl AuroraMapOverlay {
    pub fn save(&self, path: &Path) -> FetchResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|source| FetchError::Io { path: parent.to_path_buf(), source })?;
        }
        self.image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|source| FetchError::Image { path: path.to_path_buf(), source })?;
        info!(path = %path.display(), plotted = self.plotted, "aurora map saved");
        Ok(())
    }
}

/// Ocean, light grey land with coastlines, and a 30° latitude / 60° longitude graticule.
pub fn base_map(options: &RenderOptions) -> RgbImage {
    let proj = MillerProjection::new(options.width);
    let mut img = RgbImage::from_pixel(proj.width(), proj.height(), OCEAN);

    match bundled_land() {
        Ok(land) => draw_land(&mut img, &proj, land),
        Err(err) => warn!(error = %err, "drawing map without land"),
    }

    for lat in (-60..=60).step_by(30) {
        let (_, y) = proj.project(0.0, f64::from(lat));
        for x in 0..proj.width() {
            img.put_pixel(x, y, GRATICULE);
        }
    }
    for lon in (-180..=180).step_by(60) {
        let (x, _) = proj.project(f64::from(lon), 0.0);
        for y in 0..proj.height() {
            img.put_pixel(x, y, GRATICULE);
        }
    }

    img
}

fn draw_land(img: &mut RgbImage, proj: &MillerProjection, land: &[Polygon<f64>]) {
    for polygon in land {
        let rings: Vec<Vec<(f64, f64)>> = std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .map(|ring| ring.coords().map(|c| proj.position(c.x, c.y)).collect())
            .collect();

        fill_rings(img, &rings, LAND);
        for ring in &rings {
            trace_ring(img, ring, COASTLINE);
        }
    }
}

/// Even-odd scanline fill over closed rings given in pixel coordinates.
fn fill_rings(img: &mut RgbImage, rings: &[Vec<(f64, f64)>], color: Rgb<u8>) {
    let (min_y, max_y) = rings
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
    if !min_y.is_finite() || max_y < 0.0 {
        return;
    }

    let first_row = min_y.ceil().max(0.0) as u32;
    let last_row = max_y.floor().min(f64::from(img.height() - 1)) as u32;
    let max_x = f64::from(img.width() - 1);
    let mut crossings: Vec<f64> = Vec::new();

    for row in first_row..=last_row {
        let y = f64::from(row);
        crossings.clear();
        for ring in rings {
            for edge in ring.windows(2) {
                let ((xa, ya), (xb, yb)) = (edge[0], edge[1]);
                if (ya <= y) != (yb <= y) {
                    crossings.push(xa + (y - ya) / (yb - ya) * (xb - xa));
                }
            }
        }
        crossings.sort_by(f64::total_cmp);

        for span in crossings.chunks_exact(2) {
            let end = span[1].floor().min(max_x);
            if end < 0.0 {
                continue;
            }
            for x in span[0].ceil().max(0.0) as u32..=end as u32 {
                img.put_pixel(x, row, color);
            }
        }
    }
}

fn trace_ring(img: &mut RgbImage, ring: &[(f64, f64)], color: Rgb<u8>) {
    for edge in ring.windows(2) {
        let ((xa, ya), (xb, yb)) = (edge[0], edge[1]);
        let steps = (xb - xa).abs().max((yb - ya).abs()).ceil().max(1.0) as u32;
        for step in 0..=steps {
            let t = f64::from(step) / f64::from(steps);
            let (x, y) = ((xa + (xb - xa) * t).round(), (ya + (yb - ya) * t).round());
            if x >= 0.0 && y >= 0.0 && x < f64::from(img.width()) && y < f64::from(img.height()) {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

pub fn render_overlay(grid: &OvationGrid, options: &RenderOptions) -> AuroraMapOverlay {
    let proj = MillerProjection::new(options.width);
    let mut image = base_map(options);
    let points = normalize_points(&grid.points);

    let mut plotted = 0;
    for point in &points {
        let Some(band) = ProbabilityBand::from_probability(point.probability) else {
            continue;
        };
        let (cx, cy) = proj.project(point.lon, point.lat);
        blend_square(&mut image, cx, cy, options.point_size, band.color(), options.alpha);
        plotted += 1;
    }

    AuroraMapOverlay {
        observation_time: grid.observation_time,
        forecast_time: grid.forecast_time,
        plotted,
        image,
    }
}

fn blend_square(img: &mut RgbImage, cx: u32, cy: u32, size: u32, color: Rgb<u8>, alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    let half = size / 2;
    let (x0, y0) = (cx.saturating_sub(half), cy.saturating_sub(half));
    let x1 = (x0 + size.max(1)).min(img.width());
    let y1 = (y0 + size.max(1)).min(img.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let px = img.get_pixel_mut(x, y);
            for c in 0..3 {
                let mixed = f32::from(color[c]) * alpha + f32::from(px[c]) * (1.0 - alpha);
                px[c] = mixed.round() as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(points: Vec<AuroraPoint>) -> OvationGrid {
        OvationGrid { observation_time: None, forecast_time: None, points }
    }

    fn small() -> RenderOptions {
        RenderOptions { width: 360, ..RenderOptions::default() }
    }

    #[test]
    fn parses_ovation_payload() {
        let body = r#"{
            "Observation Time": "2025-03-01T12:05:00Z",
            "Forecast Time": "2025-03-01T12:50:00Z",
            "Data Format": "[Longitude, Latitude, Aurora]",
            "coordinates": [[0, -90, 0], [350, 67, 42], [10, 70, 3]]
        }"#;
        let grid = parse_ovation(body).expect("payload should parse");
        assert_eq!(grid.points.len(), 3);
        assert_eq!(grid.points[1], AuroraPoint { lon: 350.0, lat: 67.0, probability: 42.0 });
        assert!(grid.forecast_time.unwrap() > grid.observation_time.unwrap());
    }

    #[test]
    fn malformed_and_empty_payloads() {
        assert!(matches!(parse_ovation("[]"), Err(FetchError::Malformed { .. })));
        assert!(matches!(
            parse_ovation(r#"{"coordinates": []}"#),
            Err(FetchError::Unavailable(_))
        ));
    }

    #[test]
    fn normalize_filters_and_wraps_longitudes() {
        let points = vec![
            AuroraPoint { lon: 350.0, lat: 67.0, probability: 42.0 },
            AuroraPoint { lon: 10.0, lat: 30.0, probability: 80.0 },
            AuroraPoint { lon: 20.0, lat: -70.0, probability: 0.5 },
            AuroraPoint { lon: 180.0, lat: -60.0, probability: 12.0 },
        ];
        let normalized = normalize_points(&points);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].lon, -10.0);
        assert_eq!(normalized[1].lon, 180.0);
    }

    #[test]
    fn bands_follow_legend() {
        assert_eq!(ProbabilityBand::from_probability(0.9), None);
        assert_eq!(ProbabilityBand::from_probability(1.0), Some(ProbabilityBand::Faint));
        assert_eq!(ProbabilityBand::from_probability(29.9), Some(ProbabilityBand::Low));
        assert_eq!(ProbabilityBand::from_probability(30.0), Some(ProbabilityBand::Moderate));
        assert_eq!(ProbabilityBand::from_probability(100.0), Some(ProbabilityBand::High));
    }

    #[test]
    fn projection_corners_and_equator() {
        let proj = MillerProjection::new(361);
        assert_eq!(proj.project(-180.0, 90.0), (0, 0));
        assert_eq!(proj.project(180.0, -90.0), (360, proj.height() - 1));
        let (x, y) = proj.project(0.0, 0.0);
        assert_eq!(x, 180);
        assert_eq!(y, (proj.height() - 1) / 2);
    }

    #[test]
    fn all_zero_grid_renders_baseline() {
        let zeros: Vec<AuroraPoint> = (0..360)
            .step_by(5)
            .flat_map(|lon| (-90..=90).step_by(5).map(move |lat| (lon, lat)))
            .map(|(lon, lat)| AuroraPoint { lon: f64::from(lon), lat: f64::from(lat), probability: 0.0 })
            .collect();

        let overlay = render_overlay(&grid(zeros), &small());
        assert_eq!(overlay.plotted, 0);
        assert_eq!(overlay.image, base_map(&small()));
    }

    #[test]
    fn base_map_has_land_and_ocean() {
        let proj = MillerProjection::new(small().width);
        let map = base_map(&small());

        let (x, y) = proj.project(-40.0, 72.0);
        assert_eq!(*map.get_pixel(x, y), LAND, "central Greenland");
        assert_ne!(*map.get_pixel(x, y), OCEAN);

        let (x, y) = proj.project(-25.0, -10.0);
        assert_eq!(*map.get_pixel(x, y), OCEAN, "south Atlantic");
    }

    #[test]
    fn fill_respects_ring_interior() {
        let mut img = RgbImage::from_pixel(10, 10, OCEAN);
        let square = vec![(2.0, 2.0), (7.0, 2.0), (7.0, 7.0), (2.0, 7.0), (2.0, 2.0)];
        fill_rings(&mut img, &[square], LAND);

        assert_eq!(*img.get_pixel(4, 4), LAND);
        assert_eq!(*img.get_pixel(0, 0), OCEAN);
        assert_eq!(*img.get_pixel(9, 4), OCEAN);
    }

    #[test]
    fn high_probability_cell_is_blended_red() {
        let overlay = render_overlay(
            &grid(vec![AuroraPoint { lon: 10.0, lat: 70.0, probability: 90.0 }]),
            &small(),
        );
        assert_eq!(overlay.plotted, 1);

        let (x, y) = MillerProjection::new(small().width).project(10.0, 70.0);
        let px = overlay.image.get_pixel(x, y);
        // 0.7 red over midnight blue
        assert_eq!(*px, Rgb([186, 8, 34]));
        assert_ne!(overlay.image, base_map(&small()));
    }
}
