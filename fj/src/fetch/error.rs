//! Fetch error types

use thiserror::Error;

/// Errors that can occur while fetching a list of records
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Check if the request never produced a usable response
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Status { .. })
    }

    /// Check if the body did not match the expected shape
    pub fn is_decode(&self) -> bool {
        matches!(self, FetchError::Decode { .. })
    }
}
