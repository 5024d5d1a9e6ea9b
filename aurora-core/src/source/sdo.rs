use async_trait::async_trait;

use crate::{error::FetchResult, http::HttpClient};

use super::ImageSource;

/// NASA Solar Dynamics Observatory "latest" imagery.
#[derive(Debug, Clone)]
pub struct SdoImagery {
    http: HttpClient,
}

impl SdoImagery {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ImageSource for SdoImagery {
    async fn fetch_image(&self, url: &str) -> FetchResult<Vec<u8>> {
        self.http.get_bytes(url).await
    }
}
