use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::{
    config::Endpoints,
    error::{FetchError, FetchResult},
    forecast::{parse_kp_forecast, parse_long_term_outlook},
    http::HttpClient,
    kp::parse_kp_index,
    model::{ForecastSeries, KpReading, OvationGrid, SolarWind},
    overlay::parse_ovation,
    solar::{parse_mag, parse_plasma},
};

use super::SpaceWeatherSource;

/// NOAA Space Weather Prediction Center products.
#[derive(Debug, Clone)]
pub struct SwpcClient {
    endpoints: Endpoints,
    http: HttpClient,
}

impl SwpcClient {
    pub fn new(endpoints: Endpoints, http: HttpClient) -> Self {
        Self { endpoints, http }
    }
}

#[async_trait]
impl SpaceWeatherSource for SwpcClient {
    async fn current_kp(&self) -> FetchResult<KpReading> {
        let body = self.http.get_text(&self.endpoints.kp_index).await?;
        parse_kp_index(&body, Utc::now())
    }

    async fn short_term_forecast(&self) -> FetchResult<ForecastSeries> {
        let body = self.http.get_text(&self.endpoints.kp_forecast).await?;
        let series = parse_kp_forecast(&body)?;
        let upcoming = series.upcoming(Utc::now());
        debug!(rows = series.len(), upcoming = upcoming.len(), "3-day forecast parsed");

        if upcoming.is_empty() {
            return Err(FetchError::Unavailable("no upcoming 3-day forecast points".into()));
        }
        Ok(upcoming)
    }

    async fn long_term_forecast(&self) -> FetchResult<ForecastSeries> {
        let text = self.http.get_text(&self.endpoints.long_term_outlook).await?;
        let series = parse_long_term_outlook(&text)?;

        if series.is_empty() {
            return Err(FetchError::Unavailable("27-day outlook has no rows".into()));
        }
        Ok(series)
    }

    async fn ovation_grid(&self) -> FetchResult<OvationGrid> {
        let body = self.http.get_text(&self.endpoints.ovation).await?;
        parse_ovation(&body)
    }

    async fn solar_wind(&self) -> FetchResult<SolarWind> {
        let plasma = parse_plasma(&self.http.get_text(&self.endpoints.plasma).await?)?;
        let mag = parse_mag(&self.http.get_text(&self.endpoints.mag).await?)?;

        if plasma.is_empty() || mag.is_empty() {
            return Err(FetchError::Unavailable(format!(
                "solar wind feed incomplete ({} plasma rows, {} magnetometer rows)",
                plasma.len(),
                mag.len()
            )));
        }
        Ok(SolarWind { plasma, mag })
    }
}
