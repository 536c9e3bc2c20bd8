use shared::error::{ApiError, ApiException};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid server url '{0}'")]
    InvalidUrl(String),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("server rejected request ({status}): {source}")]
    Api {
        status: u16,
        #[source]
        source: ApiException,
    },
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ProviderError {
    pub fn api(status: u16, error: ApiError) -> Self {
        Self::Api {
            status,
            source: error.into(),
        }
    }
}
