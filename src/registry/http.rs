use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use sha2::{Digest, Sha256};

use super::types::{DownloadedArtifact, ListResponse, ReproductionMetadata};
use super::{Registry, RegistryError};

/// Registry reached over HTTP(S)
#[derive(Clone)]
pub struct HttpRegistry {
    base: Url,
    base_display: String,
    client: Client,
    request_timeout: Duration,
    download_timeout: Duration,
    buffer_dir: Option<PathBuf>,
}

impl HttpRegistry {
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        download_timeout: Duration,
    ) -> Result<Self, RegistryError> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|err| RegistryError::InvalidUrl(format!("{base_url}: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(RegistryError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            base_display: base.as_str().trim_end_matches('/').to_string(),
            base,
            client: Client::new(),
            request_timeout,
            download_timeout,
            buffer_dir: None,
        })
    }

    /// Buffer downloads under `dir` instead of the system temp dir
    pub fn with_buffer_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.buffer_dir = dir;
        self
    }

    /// Append path segments to the base URL, escaping each one
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, RegistryError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| RegistryError::InvalidUrl(self.base_display.clone()))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn artifact_url(&self, id: &str, path: &str) -> Result<Url, RegistryError> {
        let artifact_segments = path.split('/').filter(|s| !s.is_empty());
        self.endpoint(
            ["reproductions", id, "artifacts"]
                .into_iter()
                .chain(artifact_segments),
        )
    }

    async fn get_text(&self, url: Url) -> Result<String, RegistryError> {
        let url_str = url.to_string();
        tracing::debug!(url = %url_str, "Registry request");

        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|err| RegistryError::from_reqwest(&url_str, err))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RegistryError::Status {
                url: url_str,
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|err| RegistryError::from_reqwest(&url_str, err))
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    fn base_url(&self) -> &str {
        &self.base_display
    }

    async fn list_ids(&self) -> Result<Vec<String>, RegistryError> {
        let url = self.endpoint(["reproductions"])?;
        let url_str = url.to_string();
        let text = self.get_text(url).await?;
        let list: ListResponse =
            serde_json::from_str(&text).map_err(|err| RegistryError::Decode {
                url: url_str,
                message: err.to_string(),
            })?;
        Ok(list.into_ids())
    }

    async fn fetch_metadata(&self, id: &str) -> Result<ReproductionMetadata, RegistryError> {
        let url = self.endpoint(["reproductions", id])?;
        let url_str = url.to_string();
        let text = self.get_text(url).await?;
        serde_json::from_str(&text).map_err(|err| RegistryError::Decode {
            url: url_str,
            message: err.to_string(),
        })
    }

    async fn download_artifact(
        &self,
        id: &str,
        path: &str,
    ) -> Result<DownloadedArtifact, RegistryError> {
        let url = self.artifact_url(id, path)?;
        let url_str = url.to_string();

        // Scoped to this call; removed from disk when dropped on any return path
        let mut builder = tempfile::Builder::new();
        builder.prefix("pruva-artifact-");
        let mut buffer = match &self.buffer_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        tracing::debug!(url = %url_str, buffer = %buffer.path().display(), "Downloading artifact");
        let mut response = self
            .client
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(|err| RegistryError::from_reqwest(&url_str, err))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RegistryError::Status {
                url: url_str,
                status: status.as_u16(),
            });
        }

        let mut hasher = Sha256::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| RegistryError::from_reqwest(&url_str, err))?
        {
            buffer.write_all(&chunk)?;
            hasher.update(&chunk);
        }
        buffer.flush()?;

        let bytes = buffer.as_file().metadata()?.len();
        drop(buffer);

        Ok(DownloadedArtifact {
            path: path.to_string(),
            bytes,
            sha256: format!("{:x}", hasher.finalize()),
        })
    }
}
