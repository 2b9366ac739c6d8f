//! Runtime version selection
//!
//! This module provides:
//! - Shorthand range parsing (`^`, `~`, hyphen ranges, wildcards, partials)
//! - Resolution of a range against candidate releases
//! - The versions manifest model used to locate downloads
//! - Host platform description for download selection

mod manifest;
mod platform;
mod range;
mod resolver;

pub use manifest::{ManifestEntry, ManifestFile, VersionManifest};
pub use platform::{manifest_arch, manifest_os, LinuxDistroInfo, Platform, OS_RELEASE_PATH};
pub use range::{expand, CanonicalRange, Comparator};
pub use resolver::{parse_tolerant, resolve, CandidateVersion, Resolution, LATEST};
