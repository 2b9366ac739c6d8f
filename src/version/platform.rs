//! Host platform description used to pick a download
//!
//! The platform is an explicit value handed to callers rather than a
//! process-wide cache, so tests can describe any host.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Location of the os-release file on Linux hosts
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Fields of `/etc/os-release`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinuxDistroInfo {
    pub name: String,
    pub pretty_name: String,
    pub version_id: String,
    pub version: String,
    pub id: String,
    pub id_like: String,
    pub home_url: String,
    pub support_url: String,
    pub bug_report_url: String,
}

impl LinuxDistroInfo {
    /// Parse os-release content (`KEY=value` lines, optionally quoted)
    pub fn parse(content: &str) -> Self {
        let mut values: HashMap<&str, String> = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                values.insert(key.trim(), unquote(value.trim()));
            }
        }

        let mut take = |key: &str| values.remove(key).unwrap_or_default();
        Self {
            name: take("NAME"),
            pretty_name: take("PRETTY_NAME"),
            version_id: take("VERSION_ID"),
            version: take("VERSION"),
            id: take("ID"),
            id_like: take("ID_LIKE"),
            home_url: take("HOME_URL"),
            support_url: take("SUPPORT_URL"),
            bug_report_url: take("BUG_REPORT_URL"),
        }
    }

    /// Read and parse an os-release file; `None` if it cannot be read
    pub fn from_path(path: &Path) -> Option<Self> {
        std::fs::read_to_string(path).ok().map(|c| Self::parse(&c))
    }

    /// Whether a manifest `platform_version` refers to this distro release
    pub fn matches_release(&self, platform_version: &str) -> bool {
        self.version == platform_version || self.version_id == platform_version
    }
}

fn unquote(value: &str) -> String {
    let stripped = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')));
    stripped.unwrap_or(value).to_string()
}

/// Architecture, OS and distro of the machine a runtime is acquired for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    /// Manifest architecture name (e.g. "x64", "arm64")
    pub arch: String,
    /// Manifest platform name (e.g. "linux", "darwin")
    pub os: String,
    /// Distro information when running on Linux
    pub distro: Option<LinuxDistroInfo>,
}

impl Platform {
    /// Describe an arbitrary platform
    pub fn new(arch: impl Into<String>, os: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            os: os.into(),
            distro: None,
        }
    }

    /// Attach distro information
    pub fn with_distro(mut self, distro: LinuxDistroInfo) -> Self {
        self.distro = Some(distro);
        self
    }

    /// Describe the running host
    pub fn current() -> Self {
        let platform = Self::new(
            manifest_arch(std::env::consts::ARCH),
            manifest_os(std::env::consts::OS),
        );
        match LinuxDistroInfo::from_path(Path::new(OS_RELEASE_PATH)) {
            Some(distro) => platform.with_distro(distro),
            None => platform,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)?;
        if let Some(distro) = &self.distro {
            if !distro.id.is_empty() || !distro.version_id.is_empty() {
                write!(f, " ({} {})", distro.id, distro.version_id)?;
            }
        }
        Ok(())
    }
}

/// Map a Rust architecture name to the name used in version manifests
pub fn manifest_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "x86",
        "arm" => "armv7l",
        other => other,
    }
}

/// Map a Rust OS name to the name used in version manifests
pub fn manifest_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UBUNTU: &str = r#"PRETTY_NAME="Ubuntu 22.04.3 LTS"
NAME="Ubuntu"
VERSION_ID="22.04"
VERSION="22.04.3 LTS (Jammy Jellyfish)"
ID=ubuntu
ID_LIKE=debian
# comment
HOME_URL="https://www.ubuntu.com/"
"#;

    #[test]
    fn test_parse_os_release() {
        let info = LinuxDistroInfo::parse(UBUNTU);
        assert_eq!(info.name, "Ubuntu");
        assert_eq!(info.pretty_name, "Ubuntu 22.04.3 LTS");
        assert_eq!(info.version_id, "22.04");
        assert_eq!(info.id, "ubuntu");
        assert_eq!(info.id_like, "debian");
        assert_eq!(info.home_url, "https://www.ubuntu.com/");
        assert_eq!(info.support_url, "");
    }

    #[test]
    fn test_matches_release() {
        let info = LinuxDistroInfo::parse(UBUNTU);
        assert!(info.matches_release("22.04"));
        assert!(info.matches_release("22.04.3 LTS (Jammy Jellyfish)"));
        assert!(!info.matches_release("20.04"));
    }

    #[test]
    fn test_from_missing_path() {
        assert!(LinuxDistroInfo::from_path(Path::new("/nonexistent/os-release")).is_none());
    }

    #[test]
    fn test_manifest_names() {
        assert_eq!(manifest_arch("x86_64"), "x64");
        assert_eq!(manifest_arch("aarch64"), "arm64");
        assert_eq!(manifest_arch("riscv64"), "riscv64");
        assert_eq!(manifest_os("linux"), "linux");
        assert_eq!(manifest_os("macos"), "darwin");
    }

    #[test]
    fn test_platform_builder() {
        let platform = Platform::new("x64", "linux").with_distro(LinuxDistroInfo::parse(UBUNTU));
        assert_eq!(platform.arch, "x64");
        assert_eq!(platform.distro.map(|d| d.id), Some("ubuntu".to_string()));
    }

    #[test]
    fn test_platform_display() {
        assert_eq!(Platform::new("arm64", "darwin").to_string(), "darwin/arm64");
        let platform = Platform::new("x64", "linux").with_distro(LinuxDistroInfo::parse(UBUNTU));
        assert_eq!(platform.to_string(), "linux/x64 (ubuntu 22.04)");
    }
}
