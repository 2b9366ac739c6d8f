//! Runtime configuration
//!
//! The build mode is detected once by the caller and passed along as a value.

use crate::error::ConfigError;
use crate::version::Platform;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Environment variable selecting the build mode
pub const BUILD_MODE_ENV_VAR: &str = "BP_DCNB_BUILD_MODE";

/// Marker file written into images built for dev containers
pub const BUILD_MODE_MARKER_PATH: &str = "/usr/local/etc/dev-container-features/dcnb-build-mode";

/// Whether an image is built for production or as a dev container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildMode {
    #[default]
    Production,
    Devcontainer,
}

impl BuildMode {
    /// Detect the build mode from an environment value and a marker file.
    ///
    /// A non-empty environment value wins, then the marker file contents;
    /// otherwise the mode is production.
    pub fn detect(env_value: Option<&str>, marker_path: &Path) -> Result<Self, ConfigError> {
        if let Some(value) = env_value.map(str::trim).filter(|v| !v.is_empty()) {
            debug!(value, "build mode from environment");
            return value.parse();
        }

        match std::fs::read_to_string(marker_path) {
            Ok(content) if !content.trim().is_empty() => {
                debug!(path = %marker_path.display(), "build mode from marker file");
                content.trim().parse()
            }
            _ => Ok(Self::default()),
        }
    }

    /// Detect the build mode from this process's environment
    pub fn from_environment() -> Result<Self, ConfigError> {
        let env_value = std::env::var(BUILD_MODE_ENV_VAR).ok();
        Self::detect(env_value.as_deref(), Path::new(BUILD_MODE_MARKER_PATH))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Production => "production",
            BuildMode::Devcontainer => "devcontainer",
        }
    }
}

impl FromStr for BuildMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(BuildMode::Production),
            "devcontainer" => Ok(BuildMode::Devcontainer),
            _ => Err(ConfigError::InvalidBuildMode {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settings handed to the operations that need them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub build_mode: BuildMode,
    pub platform: Platform,
}

impl Settings {
    pub fn new(build_mode: BuildMode, platform: Platform) -> Self {
        Self {
            build_mode,
            platform,
        }
    }

    /// Settings for the current process and host
    pub fn detect() -> Result<Self, ConfigError> {
        Ok(Self::new(BuildMode::from_environment()?, Platform::current()))
    }
}
