//! Range resolution against candidate releases
//!
//! Candidates are sorted ascending by semantic version and scanned from the
//! newest end; the first one satisfying the range wins.

use crate::error::ResolveError;
use crate::version::range::CanonicalRange;
use semver::{BuildMetadata, Version};
use tracing::debug;

/// The literal that selects the newest candidate without range parsing
pub const LATEST: &str = "latest";

/// A release offered by an external manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateVersion<D = ()> {
    /// Version string as published (e.g. "18.17.1", "v20.0.0")
    pub version: String,
    /// Whether the release is marked stable
    pub stable: bool,
    /// Opaque data the caller needs to download this release
    pub download: D,
}

impl CandidateVersion<()> {
    /// Create a candidate without a download descriptor
    pub fn new(version: impl Into<String>, stable: bool) -> Self {
        Self {
            version: version.into(),
            stable,
            download: (),
        }
    }
}

impl<D> CandidateVersion<D> {
    /// Create a candidate carrying a download descriptor
    pub fn with_download(version: impl Into<String>, stable: bool, download: D) -> Self {
        Self {
            version: version.into(),
            stable,
            download,
        }
    }
}

/// The candidate chosen for a range
#[derive(Debug, PartialEq, Eq)]
pub struct Resolution<'a, D> {
    /// Parsed semantic version of the chosen candidate
    pub version: Version,
    /// The chosen candidate itself
    pub candidate: &'a CandidateVersion<D>,
}

/// Parse a published version string tolerantly.
///
/// Accepts a leading `v` and pads a missing minor or patch with zero.
/// Build metadata is dropped so it never influences ordering.
pub fn parse_tolerant(version: &str) -> Option<Version> {
    let trimmed = version.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);

    let (core, suffix) = match trimmed.find(['-', '+']) {
        Some(idx) => trimmed.split_at(idx),
        None => (trimmed, ""),
    };
    let normalized = match core.split('.').count() {
        1 => format!("{}.0.0{}", core, suffix),
        2 => format!("{}.0{}", core, suffix),
        _ => trimmed.to_string(),
    };

    let mut parsed = Version::parse(&normalized).ok()?;
    parsed.build = BuildMetadata::EMPTY;
    Some(parsed)
}

/// Resolve a range expression to the newest matching candidate.
///
/// `latest` skips range parsing and selects the highest candidate. With
/// `stable_only`, unstable candidates are ignored before anything else.
pub fn resolve<'a, D>(
    expression: &str,
    candidates: &'a [CandidateVersion<D>],
    stable_only: bool,
) -> Result<Resolution<'a, D>, ResolveError> {
    let expression = expression.trim();

    // Parse the range up front so malformed input fails even with no candidates
    let range = if expression == LATEST {
        None
    } else {
        let range = CanonicalRange::parse(expression)?;
        debug!(expression, canonical = %range, "parsed version range");
        Some(range)
    };

    let mut sorted = Vec::with_capacity(candidates.len());
    for candidate in candidates.iter().filter(|c| c.stable || !stable_only) {
        let version =
            parse_tolerant(&candidate.version).ok_or_else(|| ResolveError::InvalidCandidate {
                version: candidate.version.clone(),
            })?;
        sorted.push((version, candidate));
    }
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let considered = sorted.len();
    let chosen = match range {
        None => sorted.pop(),
        Some(range) => sorted
            .into_iter()
            .rev()
            .find(|(version, _)| range.matches(version)),
    };

    match chosen {
        Some((version, candidate)) => {
            debug!(expression, version = %version, "resolved version");
            Ok(Resolution { version, candidate })
        }
        None => Err(ResolveError::no_match(expression, considered)),
    }
}
