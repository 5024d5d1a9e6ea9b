use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    error::{FetchError, FetchResult},
    http::HttpClient,
    model::GeoLocation,
};

use super::GeoLocator;

const SOURCE: &str = "ip geolocation";

/// IP geolocation via ip-api.com (free tier is plain HTTP only).
#[derive(Debug, Clone)]
pub struct IpApiLocator {
    url: String,
    http: HttpClient,
}

impl IpApiLocator {
    pub fn new(url: impl Into<String>, http: HttpClient) -> Self {
        Self { url: url.into(), http }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: Option<String>,
    message: Option<String>,
    city: Option<String>,
    region_name: Option<String>,
    country: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

pub fn parse_geolocation(body: &str) -> FetchResult<GeoLocation> {
    let parsed: IpApiResponse =
        serde_json::from_str(body).map_err(|e| FetchError::malformed(SOURCE, e.to_string()))?;

    if parsed.status.as_deref() == Some("fail") {
        return Err(FetchError::Unavailable(format!(
            "geolocation failed: {}",
            parsed.message.unwrap_or_else(|| "no reason given".into())
        )));
    }

    let (Some(latitude), Some(longitude)) = (parsed.lat, parsed.lon) else {
        return Err(FetchError::malformed(SOURCE, "response has no lat/lon"));
    };

    Ok(GeoLocation {
        city: parsed.city,
        region: parsed.region_name,
        country: parsed.country,
        latitude,
        longitude,
    })
}

#[async_trait]
impl GeoLocator for IpApiLocator {
    async fn locate(&self) -> FetchResult<GeoLocation> {
        let body = self.http.get_text(&self.url).await?;
        parse_geolocation(&body)
    }
}
