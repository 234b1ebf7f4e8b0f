//! Client side of the reproduction registry HTTP API

pub mod fake;
mod http;
mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpRegistry;
pub use types::{
    select_script, Artifact, DownloadedArtifact, ListResponse, ReproductionMetadata,
    REPRODUCTION_SCRIPT_CATEGORY, SCRIPT_PATH_PREFIX,
};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },
    #[error("Could not reach {url}: {message}")]
    Connection { url: String, message: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("Invalid registry URL: {0}")]
    InvalidUrl(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RegistryError::Timeout {
                url: url.to_string(),
            }
        } else if err.is_decode() {
            RegistryError::Decode {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            RegistryError::Connection {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// HTTP status, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            RegistryError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Read-only view of the registry
///
/// Every call goes to the source; implementations must not cache.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Base URL the registry is reached at (for reports)
    fn base_url(&self) -> &str;

    /// Ids of all known reproductions, in registry order
    async fn list_ids(&self) -> Result<Vec<String>, RegistryError>;

    async fn fetch_metadata(&self, id: &str) -> Result<ReproductionMetadata, RegistryError>;

    /// Download an artifact and report its size and digest. The body is
    /// discarded once inspected.
    async fn download_artifact(
        &self,
        id: &str,
        path: &str,
    ) -> Result<DownloadedArtifact, RegistryError>;
}
