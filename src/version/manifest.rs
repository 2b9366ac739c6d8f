//! Versions manifest published for runtime toolchains
//!
//! The manifest is a JSON array of releases, each listing downloadable
//! files per architecture and platform:
//!
//! ```json
//! [{"version": "3.12.0", "stable": true, "release_url": "...",
//!   "files": [{"filename": "...", "arch": "x64", "platform": "linux",
//!              "platform_version": "22.04", "download_url": "..."}]}]
//! ```

use crate::error::ResolveError;
use crate::version::platform::Platform;
use crate::version::resolver::{resolve, CandidateVersion};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One downloadable file of a release
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestFile {
    pub filename: String,
    pub arch: String,
    pub platform: String,
    /// Distro release the file was built for; empty when distro-independent
    pub platform_version: String,
    pub download_url: String,
}

/// One release in the manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestEntry {
    pub version: String,
    pub stable: bool,
    pub release_url: String,
    pub files: Vec<ManifestFile>,
}

/// A parsed versions manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionManifest {
    pub entries: Vec<ManifestEntry>,
}

impl VersionManifest {
    /// Create a manifest from already-parsed entries
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    /// Parse manifest JSON bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ResolveError> {
        let entries: Vec<ManifestEntry> =
            serde_json::from_slice(bytes).map_err(|e| ResolveError::ManifestParse {
                message: e.to_string(),
            })?;
        Ok(Self { entries })
    }

    /// Read and parse a manifest file
    pub fn from_file(path: &Path) -> Result<Self, ResolveError> {
        let content = std::fs::read(path).map_err(|e| ResolveError::ManifestParse {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_slice(&content)
    }

    /// Releases as resolver candidates, carrying their file lists
    pub fn candidates(&self) -> Vec<CandidateVersion<&[ManifestFile]>> {
        self.entries
            .iter()
            .map(|entry| {
                CandidateVersion::with_download(
                    entry.version.clone(),
                    entry.stable,
                    entry.files.as_slice(),
                )
            })
            .collect()
    }

    /// Resolve a range expression to a published version string
    pub fn find_version(&self, range: &str, stable_only: bool) -> Result<String, ResolveError> {
        let candidates = self.candidates();
        let resolution = resolve(range, &candidates, stable_only)?;
        Ok(resolution.candidate.version.clone())
    }

    /// Find the entry for an exact published version
    pub fn find_entry(&self, version: &str) -> Result<&ManifestEntry, ResolveError> {
        self.entries
            .iter()
            .find(|entry| entry.version == version)
            .ok_or_else(|| ResolveError::EntryNotFound {
                version: version.to_string(),
            })
    }

    /// Find the download URL of a version for the given platform.
    ///
    /// Files pinned to a distro release only match when the platform's distro
    /// reports that release.
    pub fn find_download_url(
        &self,
        version: &str,
        platform: &Platform,
    ) -> Result<Option<&str>, ResolveError> {
        let entry = self.find_entry(version)?;
        let file = entry.files.iter().find(|file| {
            if file.arch != platform.arch || file.platform != platform.os {
                return false;
            }
            if file.platform_version.is_empty() {
                return true;
            }
            platform
                .distro
                .as_ref()
                .is_some_and(|distro| distro.matches_release(&file.platform_version))
        });

        match file {
            Some(file) => {
                debug!(version, url = %file.download_url, "selected download");
                Ok(Some(file.download_url.as_str()))
            }
            None => Ok(None),
        }
    }
}
