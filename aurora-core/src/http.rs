use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::error::{FetchError, FetchResult};

/// Thin wrapper over a shared `reqwest::Client`.
///
/// One attempt per call, no retry: a failed refresh is simply reported.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> FetchResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("aurora-tracker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| FetchError::Network { url: String::from("<client>"), source })?;

        Ok(Self { http })
    }

    pub async fn get_text(&self, url: &str) -> FetchResult<String> {
        let res = self.send(url).await?;
        res.text().await.map_err(|source| FetchError::Network { url: url.to_string(), source })
    }

    pub async fn get_bytes(&self, url: &str) -> FetchResult<Vec<u8>> {
        let res = self.send(url).await?;
        let bytes = res
            .bytes()
            .await
            .map_err(|source| FetchError::Network { url: url.to_string(), source })?;
        Ok(bytes.to_vec())
    }

    async fn send(&self, url: &str) -> FetchResult<reqwest::Response> {
        debug!(url, "GET");

        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Network { url: url.to_string(), source })?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
                body: truncate_body(&body),
            });
        }

        Ok(res)
    }
}

/// First 200 characters of an error body.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((end, _)) => format!("{}...", &body[..end]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_body_is_untouched() {
        assert_eq!(truncate_body("not found"), "not found");
    }

    #[test]
    fn long_body_is_cut_after_200_chars() {
        let body = "ø".repeat(250);
        let cut = truncate_body(&body);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 200 + 3);
    }

    #[test]
    fn exactly_200_chars_is_untouched() {
        let body = "ø".repeat(200);
        assert_eq!(truncate_body(&body), body);
    }
}
