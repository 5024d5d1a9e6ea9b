use std::path::PathBuf;

/// Failure of a single fetch, parse or render step.
///
/// Every variant is recoverable: the dashboard turns it into a tab state and
/// the process keeps running.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}: {body}")]
    Status { url: String, status: reqwest::StatusCode, body: String },

    #[error("malformed response from {source_name}: {reason}")]
    Malformed { source_name: &'static str, reason: String },

    #[error("data unavailable: {0}")]
    Unavailable(String),

    #[error("missing asset {path}: {reason}")]
    MissingAsset { path: PathBuf, reason: String },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl FetchError {
    pub(crate) fn malformed(source_name: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed { source_name, reason: reason.into() }
    }

    /// Whether the failure came from the network rather than the payload.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Status { .. })
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_message_names_source() {
        let err = FetchError::malformed("kp index", "empty array");
        assert_eq!(err.to_string(), "malformed response from kp index: empty array");
        assert!(!err.is_network());
    }

    #[test]
    fn unavailable_message() {
        let err = FetchError::Unavailable("no upcoming forecast points".into());
        assert!(err.to_string().starts_with("data unavailable"));
    }
}
