//! Canned registry for tests
//!
//! Serves fixed metadata and artifact bodies from memory and records each
//! request, so tests can check which registry calls a run made.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use super::types::{DownloadedArtifact, ReproductionMetadata};
use super::{Registry, RegistryError};

/// A recorded registry request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    List,
    Metadata(String),
    Download { id: String, path: String },
}

#[derive(Debug, Clone)]
enum Canned<T> {
    Ok(T),
    Status(u16),
    Timeout,
}

#[derive(Debug, Default)]
struct Inner {
    ids: Vec<String>,
    metadata: HashMap<String, Canned<ReproductionMetadata>>,
    artifacts: HashMap<(String, String), Canned<Vec<u8>>>,
    calls: Vec<RegistryCall>,
}

#[derive(Debug, Clone)]
pub struct StaticRegistry {
    base_url: String,
    inner: Arc<Mutex<Inner>>,
}

impl Default for StaticRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self {
            base_url: "memory://registry".to_string(),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Ids returned by `list_ids`, in this order
    pub fn with_ids(self, ids: &[&str]) -> Self {
        self.inner.lock().ids = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_metadata(self, id: &str, metadata: ReproductionMetadata) -> Self {
        self.inner
            .lock()
            .metadata
            .insert(id.to_string(), Canned::Ok(metadata));
        self
    }

    /// Parse `json` as the metadata body for `id`
    pub fn with_metadata_json(self, id: &str, json: &str) -> Self {
        let metadata: ReproductionMetadata =
            serde_json::from_str(json).expect("fixture metadata is valid JSON");
        self.with_metadata(id, metadata)
    }

    pub fn with_metadata_status(self, id: &str, status: u16) -> Self {
        self.inner
            .lock()
            .metadata
            .insert(id.to_string(), Canned::Status(status));
        self
    }

    pub fn with_metadata_timeout(self, id: &str) -> Self {
        self.inner
            .lock()
            .metadata
            .insert(id.to_string(), Canned::Timeout);
        self
    }

    pub fn with_artifact(self, id: &str, path: &str, body: &[u8]) -> Self {
        self.inner.lock().artifacts.insert(
            (id.to_string(), path.to_string()),
            Canned::Ok(body.to_vec()),
        );
        self
    }

    pub fn with_artifact_status(self, id: &str, path: &str, status: u16) -> Self {
        self.inner
            .lock()
            .artifacts
            .insert((id.to_string(), path.to_string()), Canned::Status(status));
        self
    }

    pub fn calls(&self) -> Vec<RegistryCall> {
        self.inner.lock().calls.clone()
    }

    fn url(&self, tail: &str) -> String {
        format!("{}/{}", self.base_url, tail)
    }
}

#[async_trait]
impl Registry for StaticRegistry {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn list_ids(&self) -> Result<Vec<String>, RegistryError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RegistryCall::List);
        Ok(inner.ids.clone())
    }

    async fn fetch_metadata(&self, id: &str) -> Result<ReproductionMetadata, RegistryError> {
        let url = self.url(&format!("reproductions/{id}"));
        let mut inner = self.inner.lock();
        inner.calls.push(RegistryCall::Metadata(id.to_string()));
        match inner.metadata.get(id) {
            Some(Canned::Ok(metadata)) => Ok(metadata.clone()),
            Some(Canned::Status(status)) => Err(RegistryError::Status {
                url,
                status: *status,
            }),
            Some(Canned::Timeout) => Err(RegistryError::Timeout { url }),
            None => Err(RegistryError::Status { url, status: 404 }),
        }
    }

    async fn download_artifact(
        &self,
        id: &str,
        path: &str,
    ) -> Result<DownloadedArtifact, RegistryError> {
        let url = self.url(&format!("reproductions/{id}/artifacts/{path}"));
        let mut inner = self.inner.lock();
        inner.calls.push(RegistryCall::Download {
            id: id.to_string(),
            path: path.to_string(),
        });
        match inner.artifacts.get(&(id.to_string(), path.to_string())) {
            Some(Canned::Ok(body)) => Ok(DownloadedArtifact {
                path: path.to_string(),
                bytes: body.len() as u64,
                sha256: format!("{:x}", Sha256::digest(body)),
            }),
            Some(Canned::Status(status)) => Err(RegistryError::Status {
                url,
                status: *status,
            }),
            Some(Canned::Timeout) => Err(RegistryError::Timeout { url }),
            None => Err(RegistryError::Status { url, status: 404 }),
        }
    }
}
