//! Core library for the `aurora` tracker.
//!
//! This crate defines:
//! - Fetchers for NOAA SWPC, NASA SDO and IP geolocation feeds
//! - Parsers turning those payloads into shared domain models
//! - The aurora map renderer and the webcam visibility ranking
//! - Tab states for the dashboard front end
//!
//! It is used by `aurora-cli`, but can also be reused by other front ends.

pub mod config;
pub mod dashboard;
pub mod daylight;
pub mod error;
pub mod forecast;
pub mod http;
pub mod kp;
pub mod land;
pub mod location;
pub mod model;
pub mod overlay;
pub mod solar;
pub mod source;
pub mod webcams;

pub use config::{Config, Coordinates, Endpoints};
pub use dashboard::{Dashboard, DashboardSettings, Tab, TabState};
pub use error::{FetchError, FetchResult};
pub use model::{
    ForecastHorizon, ForecastPoint, ForecastSeries, GeoLocation, KpReading, Location, SolarWind,
    SolarWindSample, WebcamEntry,
};
pub use source::{GeoLocator, ImageSource, SpaceWeatherSource};
