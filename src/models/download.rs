//! Checkpoint download using hf-hub
//!
//! The registry client is reached through the [`RegistryClient`] trait so the
//! setup pipeline can be driven by the real Hugging Face Hub client or by a
//! local stand-in in tests.

use crate::config::RegistrySettings;
use async_trait::async_trait;
use hf_hub::Cache;
use hf_hub::api::tokio::{Api, ApiBuilder, ApiError};
use std::path::{Path, PathBuf};

/// Single-call contract the setup pipeline needs from a model registry
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Confirm the client is usable with `cache_dir` as its cache root,
    /// before anything touches the filesystem
    fn preflight(&self, _cache_dir: &Path) -> Result<(), String> {
        Ok(())
    }

    /// Fetch `filename` from repository `repo_id`, using `cache_dir` as the
    /// client's cache root
    ///
    /// Returns the local path of the fetched file. It may live anywhere in the
    /// client's own cache layout.
    async fn download(
        &self,
        repo_id: &str,
        filename: &str,
        cache_dir: &Path,
    ) -> Result<PathBuf, String>;
}

/// [`RegistryClient`] backed by the Hugging Face Hub
#[derive(Debug, Clone, Default)]
pub struct HfHubClient {
    settings: RegistrySettings,
    progress: bool,
}

impl HfHubClient {
    pub fn new(settings: RegistrySettings) -> Self {
        Self {
            settings,
            progress: true,
        }
    }

    /// Toggle the download progress bar drawn by hf-hub
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Without a home directory the hub cache (and its login token) is rooted
    /// at `cache_dir`; `ApiBuilder::new()` requires one.
    fn builder(&self, cache_dir: &Path, home_known: bool) -> ApiBuilder {
        let mut builder = if home_known {
            ApiBuilder::new().with_cache_dir(cache_dir.to_path_buf())
        } else {
            ApiBuilder::from_cache(Cache::new(cache_dir.to_path_buf()))
        }
        .with_progress(self.progress);
        if let Some(endpoint) = &self.settings.endpoint {
            builder = builder.with_endpoint(endpoint.clone());
        }
        if self.settings.token.is_some() {
            builder = builder.with_token(self.settings.token.clone());
        }
        builder
    }

    fn build_api(&self, cache_dir: &Path) -> Result<Api, ApiError> {
        let home_known = dirs::home_dir().is_some();
        if !home_known {
            tracing::debug!(cache_dir = ?cache_dir, "No home directory, using cache dir as hub cache");
        }
        self.builder(cache_dir, home_known).build()
    }
}

#[async_trait]
impl RegistryClient for HfHubClient {
    fn preflight(&self, cache_dir: &Path) -> Result<(), String> {
        if let Some(endpoint) = &self.settings.endpoint
            && !(endpoint.starts_with("https://") || endpoint.starts_with("http://"))
        {
            return Err(format!("endpoint must be an http(s) URL, got {}", endpoint));
        }

        self.build_api(cache_dir)
            .map(|_| ())
            .map_err(|e| format!("Failed to create HF API client: {}", e))
    }

    async fn download(
        &self,
        repo_id: &str,
        filename: &str,
        cache_dir: &Path,
    ) -> Result<PathBuf, String> {
        tracing::info!(model_id = %repo_id, file = %filename, cache_dir = ?cache_dir, "Starting checkpoint download via hf-hub");

        let api = self
            .build_api(cache_dir)
            .map_err(|e| format!("Failed to create HF API client: {}", e))?;

        let path = api
            .model(repo_id.to_string())
            .get(filename)
            .await
            .map_err(|e| format!("Failed to download {}: {}", filename, e))?;

        tracing::debug!(model_id = %repo_id, path = ?path, "Download finished");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preflight_default_settings() {
        let temp_dir = tempfile::tempdir().unwrap();
        let client = HfHubClient::default();
        assert!(client.preflight(temp_dir.path()).is_ok());
    }

    #[test]
    fn test_preflight_rejects_non_http_endpoint() {
        let client = HfHubClient::new(RegistrySettings {
            endpoint: Some("ftp://mirror.example".to_string()),
            token: None,
        });
        let err = client.preflight(Path::new("/tmp/w")).unwrap_err();
        assert!(err.contains("ftp://mirror.example"));
    }

    #[test]
    fn test_api_builder_with_cache_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let client = HfHubClient::default().with_progress(false);
        assert!(client.build_api(temp_dir.path()).is_ok());
    }

    #[test]
    fn test_builder_without_home_uses_cache_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let client = HfHubClient::new(RegistrySettings {
            endpoint: Some("https://hub.example".to_string()),
            token: Some("hf_test".to_string()),
        })
        .with_progress(false);
        assert!(client.builder(temp_dir.path(), false).build().is_ok());
        assert!(client.builder(temp_dir.path(), true).build().is_ok());
    }

    #[tokio::test]
    #[ignore = "requires network access and downloads the full TiRex checkpoint"]
    async fn test_download_checkpoint() {
        let temp_dir = tempfile::tempdir().unwrap();
        let client = HfHubClient::default().with_progress(false);
        let result = client
            .download("NX-AI/TiRex", "model.ckpt", temp_dir.path())
            .await;
        assert!(result.is_ok(), "Download failed: {:?}", result.err());
        let path = result.unwrap();
        assert!(path.starts_with(temp_dir.path()));
        assert!(path.exists());
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_download_unknown_repo_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let client = HfHubClient::default().with_progress(false);
        let result = client
            .download("nonexistent-org/nonexistent-model-12345", "model.ckpt", temp_dir.path())
            .await;
        assert!(result.is_err());
    }
}
