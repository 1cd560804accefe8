use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrideError {
    #[error("Invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse event record: {source}\n  record: {record}")]
    Parse {
        record: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StrideError {
    pub(crate) fn invalid_url(url: &str, reason: impl Into<String>) -> Self {
        StrideError::InvalidUrl {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}
