//! Artifact retrieval
//!
//! Supplies manifest and archive bytes to the resolver and extractor from an
//! HTTP(S) URL or a local path. Requests are made once; a failed download is
//! reported, never retried.

use crate::error::FetchError;
use crate::progress::Progress;
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Default timeout for HTTP requests (5 minutes, archives can be large)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("devpack/", env!("CARGO_PKG_VERSION"));

/// A place artifacts can be read from
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Read the full contents at `location`
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError>;
}

/// Downloads artifacts over HTTP(S)
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    show_progress: bool,
}

impl HttpFetcher {
    /// Create a fetcher with default settings
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a fetcher with custom timeout and User-Agent
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::network("HTTP client", e.to_string()))?;

        Ok(Self {
            client,
            show_progress: false,
        })
    }

    /// Show a download progress bar on stderr
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

#[async_trait]
impl ArtifactSource for HttpFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        debug!(url = location, "downloading");
        let mut response = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| FetchError::network(location, e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                location: location.to_string(),
                status: response.status().as_u16(),
            });
        }

        let mut progress = Progress::new(self.show_progress);
        let message = format!("Downloading {}", location);
        match response.content_length() {
            Some(total) => progress.start_bytes(total, &message),
            None => progress.spinner(&message),
        }

        let mut bytes = Vec::with_capacity(response.content_length().unwrap_or(0) as usize);
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::network(location, e.to_string()))?
        {
            progress.inc_by(chunk.len() as u64);
            bytes.extend_from_slice(&chunk);
        }
        progress.finish_and_clear();

        debug!(url = location, size = bytes.len(), "download finished");
        Ok(bytes)
    }
}

/// Reads artifacts from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

#[async_trait]
impl ArtifactSource for FileFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        let path = PathBuf::from(location);
        tokio::fs::read(&path)
            .await
            .map_err(|source| FetchError::Read { path, source })
    }
}

/// Returns true if `location` is an HTTP(S) URL rather than a path
pub fn is_url(location: &str) -> bool {
    location.starts_with("https://") || location.starts_with("http://")
}

/// Fetch `location` with the source matching its form
pub async fn fetch_location(location: &str, show_progress: bool) -> Result<Vec<u8>, FetchError> {
    if is_url(location) {
        HttpFetcher::new()?
            .with_progress(show_progress)
            .fetch(location)
            .await
    } else {
        FileFetcher.fetch(location).await
    }
}
