//! Tab states and the refresh logic that drives them.
//!
//! Every tab moves `Idle -> Fetching -> Displayed | Error`. A failed refresh
//! of a tab that was already showing data keeps that data on screen and
//! records the error next to it (`Stale`). One tab failing never touches
//! another tab.

use chrono::Utc;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::{
    config::Config,
    error::{FetchError, FetchResult},
    http::HttpClient,
    kp,
    model::{DownloadedImage, ForecastSeries, KpReading, SolarWind, SunImage, WebcamEntry},
    overlay::{AuroraMapOverlay, RenderOptions, render_overlay},
    solar::{SUN_IMAGES, download_all},
    source::{ImageSource, SdoImagery, SpaceWeatherSource, SwpcClient},
    webcams::{rank_by_visibility, webcam_catalog},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Kp,
    Map,
    ShortForecast,
    LongForecast,
    SolarWind,
    SunImages,
    Webcams,
}

impl Tab {
    pub const fn all() -> &'static [Tab] {
        &[
            Tab::Kp,
            Tab::Map,
            Tab::ShortForecast,
            Tab::LongForecast,
            Tab::SolarWind,
            Tab::SunImages,
            Tab::Webcams,
        ]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Kp => "Kp Index",
            Tab::Map => "Aurora Map",
            Tab::ShortForecast => "3-Day Forecast",
            Tab::LongForecast => "27-Day Forecast",
            Tab::SolarWind => "Solar Wind",
            Tab::SunImages => "Sun Images",
            Tab::Webcams => "Webcams",
        }
    }

    /// Longer help shown on request, where a tab needs one.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            Tab::Map => Some(MAP_HELP),
            Tab::Webcams => Some(WEBCAM_HELP),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

const MAP_HELP: &str = "\
This map shows the probability of seeing the aurora based on NOAA's Ovation model.

To maximise your chances of seeing the aurora, find an area coloured red, orange
or green, and without cloud cover.

Colour legend:
  red:        50%+ chance of seeing aurora
  orange:     30% to 49%
  green:      10% to 29%
  dark grey:  1% to 9%";

const WEBCAM_HELP: &str = "\
Live webcam streams from places where the aurora may be visible.

The list is sorted so that webcams where the aurora is most likely visible right
now come first. The ranking considers the current Kp index, the latitude of the
camera relative to the auroral oval, and whether it is dark at the camera.";

/// Lifecycle of one tab's content.
#[derive(Debug, Clone, PartialEq)]
pub enum TabState<T> {
    Idle,
    Fetching {
        previous: Option<T>,
    },
    Displayed(T),
    /// Last refresh failed; still showing the earlier data.
    Stale {
        data: T,
        error: String,
    },
    /// Nothing to show: the "data unavailable" placeholder.
    Error(String),
}

impl<T> Default for TabState<T> {
    fn default() -> Self {
        TabState::Idle
    }
}

impl<T> TabState<T> {
    /// Enter `Fetching`, carrying whatever is on screen.
    pub fn begin(&mut self) {
        let previous = match std::mem::take(self) {
            TabState::Displayed(data) | TabState::Stale { data, .. } => Some(data),
            TabState::Fetching { previous } => previous,
            TabState::Idle | TabState::Error(_) => None,
        };
        *self = TabState::Fetching { previous };
    }

    /// Leave `Fetching` with the outcome of the refresh.
    pub fn finish(&mut self, result: FetchResult<T>) {
        let previous = match std::mem::take(self) {
            TabState::Fetching { previous } => previous,
            TabState::Displayed(data) | TabState::Stale { data, .. } => Some(data),
            TabState::Idle | TabState::Error(_) => None,
        };

        *self = match (result, previous) {
            (Ok(data), _) => TabState::Displayed(data),
            (Err(err), Some(data)) => TabState::Stale { data, error: err.to_string() },
            (Err(err), None) => TabState::Error(err.to_string()),
        };
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            TabState::Displayed(data) | TabState::Stale { data, .. } => Some(data),
            TabState::Fetching { previous } => previous.as_ref(),
            TabState::Idle | TabState::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TabState::Stale { error, .. } | TabState::Error(error) => Some(error.as_str()),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TabState::Idle => "idle",
            TabState::Fetching { .. } => "fetching",
            TabState::Displayed(_) => "displayed",
            TabState::Stale { .. } => "stale",
            TabState::Error(_) => "unavailable",
        }
    }
}

/// The rendered map and where it was written.
#[derive(Debug, Clone)]
pub struct MapView {
    pub overlay: AuroraMapOverlay,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub kp_alert_threshold: f64,
    pub image_dir: PathBuf,
    pub map_path: PathBuf,
    pub render: RenderOptions,
    pub sun_images: Vec<SunImage>,
}

impl DashboardSettings {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            kp_alert_threshold: config.kp_alert_threshold,
            image_dir: config.image_dir()?,
            map_path: config.map_path()?,
            render: RenderOptions::default(),
            sun_images: SUN_IMAGES.to_vec(),
        })
    }
}

#[derive(Debug)]
pub struct Dashboard {
    weather: Box<dyn SpaceWeatherSource>,
    images: Box<dyn ImageSource>,
    settings: DashboardSettings,

    pub kp: TabState<KpReading>,
    pub map: TabState<MapView>,
    pub short_forecast: TabState<ForecastSeries>,
    pub long_forecast: TabState<ForecastSeries>,
    pub solar_wind: TabState<SolarWind>,
    pub sun_images: TabState<Vec<DownloadedImage>>,
    pub webcams: TabState<Vec<WebcamEntry>>,
}

impl Dashboard {
    pub fn new(
        weather: Box<dyn SpaceWeatherSource>,
        images: Box<dyn ImageSource>,
        settings: DashboardSettings,
    ) -> Self {
        Self {
            weather,
            images,
            settings,
            kp: TabState::default(),
            map: TabState::default(),
            short_forecast: TabState::default(),
            long_forecast: TabState::default(),
            solar_wind: TabState::default(),
            sun_images: TabState::default(),
            webcams: TabState::default(),
        }
    }

    /// Dashboard wired to the real SWPC and SDO endpoints.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = HttpClient::new(config.http_timeout())?;
        Ok(Self::new(
            Box::new(SwpcClient::new(config.endpoints.clone(), http.clone())),
            Box::new(SdoImagery::new(http)),
            DashboardSettings::from_config(config)?,
        ))
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    /// Per-invocation overrides (output paths, channel selection, map width).
    pub fn settings_mut(&mut self) -> &mut DashboardSettings {
        &mut self.settings
    }

    /// Label and error (if any) of a tab, for status listings.
    pub fn status(&self, tab: Tab) -> (&'static str, Option<&str>) {
        match tab {
            Tab::Kp => (self.kp.label(), self.kp.error()),
            Tab::Map => (self.map.label(), self.map.error()),
            Tab::ShortForecast => (self.short_forecast.label(), self.short_forecast.error()),
            Tab::LongForecast => (self.long_forecast.label(), self.long_forecast.error()),
            Tab::SolarWind => (self.solar_wind.label(), self.solar_wind.error()),
            Tab::SunImages => (self.sun_images.label(), self.sun_images.error()),
            Tab::Webcams => (self.webcams.label(), self.webcams.error()),
        }
    }

    /// Whether the displayed Kp reaches the configured alert threshold.
    pub fn kp_alert(&self) -> bool {
        self.kp.data().is_some_and(|r| kp::is_alert(r.kp, self.settings.kp_alert_threshold))
    }

    pub async fn refresh(&mut self, tab: Tab) {
        match tab {
            Tab::Kp => self.refresh_kp().await,
            Tab::Map => self.refresh_map().await,
            Tab::ShortForecast => self.refresh_short_forecast().await,
            Tab::LongForecast => self.refresh_long_forecast().await,
            Tab::SolarWind => self.refresh_solar_wind().await,
            Tab::SunImages => self.refresh_sun_images().await,
            Tab::Webcams => self.refresh_webcams().await,
        }
    }

    /// Refresh every tab once, in display order.
    pub async fn refresh_all(&mut self) {
        for tab in Tab::all() {
            self.refresh(*tab).await;
        }
    }

    pub async fn refresh_kp(&mut self) {
        self.kp.begin();
        let result = self.weather.current_kp().await;
        log_outcome(Tab::Kp, &result);
        self.kp.finish(result);
    }

    pub async fn refresh_map(&mut self) {
        self.map.begin();
        let result = self.build_map().await;
        log_outcome(Tab::Map, &result);
        self.map.finish(result);
    }

    async fn build_map(&self) -> FetchResult<MapView> {
        let grid = self.weather.ovation_grid().await?;
        let overlay = render_overlay(&grid, &self.settings.render);
        overlay.save(&self.settings.map_path)?;
        Ok(MapView { overlay, path: self.settings.map_path.clone() })
    }

    pub async fn refresh_short_forecast(&mut self) {
        self.short_forecast.begin();
        let result = self.weather.short_term_forecast().await;
        log_outcome(Tab::ShortForecast, &result);
        self.short_forecast.finish(result);
    }

    pub async fn refresh_long_forecast(&mut self) {
        self.long_forecast.begin();
        let result = self.weather.long_term_forecast().await;
        log_outcome(Tab::LongForecast, &result);
        self.long_forecast.finish(result);
    }

    pub async fn refresh_solar_wind(&mut self) {
        self.solar_wind.begin();
        let result = self.weather.solar_wind().await;
        log_outcome(Tab::SolarWind, &result);
        self.solar_wind.finish(result);
    }

    pub async fn refresh_sun_images(&mut self) {
        self.sun_images.begin();
        let saved =
            download_all(self.images.as_ref(), &self.settings.sun_images, &self.settings.image_dir).await;
        let result = if saved.is_empty() {
            Err(FetchError::Unavailable("no sun image could be downloaded".into()))
        } else {
            Ok(saved)
        };
        log_outcome(Tab::SunImages, &result);
        self.sun_images.finish(result);
    }

    /// Rank webcams with the displayed Kp. The Kp index is fetched first only
    /// when its tab has never been refreshed; a failed Kp fetch is not retried.
    pub async fn refresh_webcams(&mut self) {
        if matches!(self.kp, TabState::Idle) {
            self.refresh_kp().await;
        }

        self.webcams.begin();
        let result = match self.kp.data() {
            Some(reading) => webcam_catalog().map(|cams| rank_by_visibility(cams, reading.kp, Utc::now())),
            None => Err(FetchError::Unavailable("webcam ranking needs the current Kp index".into())),
        };
        log_outcome(Tab::Webcams, &result);
        self.webcams.finish(result);
    }
}

fn log_outcome<T>(tab: Tab, result: &FetchResult<T>) {
    match result {
        Ok(_) => info!(tab = tab.title(), "refreshed"),
        Err(err) => warn!(tab = tab.title(), error = %err, "refresh failed"),
    }
}
