//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ResolveError: Version range parsing and candidate matching
//! - MergeError: Configuration document parsing and merging
//! - ArchiveError: Archive extraction and file copying
//! - FetchError: Retrieving raw bytes from a URL or local path
//! - ConfigError: Invalid runtime configuration

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Version resolution errors
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Configuration merge errors
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// Archive extraction errors
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Artifact fetch errors
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to version range resolution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The range expression could not be parsed
    #[error("malformed version range '{expression}': {message}")]
    MalformedExpression { expression: String, message: String },

    /// No candidate satisfied the range
    #[error("no version matches '{expression}' ({candidates} candidates considered)")]
    NoMatch {
        expression: String,
        candidates: usize,
    },

    /// A candidate version string is not a semantic version
    #[error("invalid candidate version '{version}'")]
    InvalidCandidate { version: String },

    /// No manifest entry carries the requested version
    #[error("no manifest entry for version '{version}'")]
    EntryNotFound { version: String },

    /// The release has no file for the requested platform
    #[error("no download of version '{version}' for {platform}")]
    NoDownload { version: String, platform: String },

    /// The version manifest could not be decoded
    #[error("failed to parse version manifest: {message}")]
    ManifestParse { message: String },
}

/// Errors related to configuration document merging
#[derive(Error, Debug)]
pub enum MergeError {
    /// Values of different kinds met under strict merging
    #[error("cannot merge '{path}': existing value is {existing}, incoming value is {incoming}")]
    TypeConflict {
        path: String,
        existing: &'static str,
        incoming: &'static str,
    },

    /// Lifecycle hook in a form other than a command string
    #[error("lifecycle hook '{key}' must be a command string to be chained, found {found}")]
    UnsupportedHookForm { key: String, found: &'static str },

    /// JSON (after comment stripping) failed to parse
    #[error("failed to parse JSON in {path}: {message}")]
    JsonParse { path: PathBuf, message: String },

    /// The document root is not an object
    #[error("document {path} must contain a JSON object at the top level")]
    NotAnObject { path: PathBuf },

    /// Failed to read a document from disk
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to archive extraction and copying
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The compressed stream or tar structure is unreadable
    #[error("invalid archive: {message}")]
    Format { message: String },

    /// Writing an entry to disk failed
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to fetching artifacts
#[derive(Error, Debug)]
pub enum FetchError {
    /// Request could not be sent or completed
    #[error("failed to fetch {location}: {message}")]
    Network { location: String, message: String },

    /// Server answered with a non-success status
    #[error("got status code {status} for {location}")]
    Status { location: String, status: u16 },

    /// Local file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Unknown build mode
    #[error("invalid build mode '{value}': expected 'production' or 'devcontainer'")]
    InvalidBuildMode { value: String },
}

impl ResolveError {
    /// Creates a new MalformedExpression error
    pub fn malformed(expression: impl Into<String>, message: impl Into<String>) -> Self {
        ResolveError::MalformedExpression {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Creates a new NoMatch error
    pub fn no_match(expression: impl Into<String>, candidates: usize) -> Self {
        ResolveError::NoMatch {
            expression: expression.into(),
            candidates,
        }
    }
}

impl MergeError {
    /// Creates a new TypeConflict error
    pub fn type_conflict(path: impl Into<String>, existing: &'static str, incoming: &'static str) -> Self {
        MergeError::TypeConflict {
            path: path.into(),
            existing,
            incoming,
        }
    }

    /// Creates a new JsonParse error
    pub fn json_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        MergeError::JsonParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new Read error
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MergeError::Read {
            path: path.into(),
            source,
        }
    }
}

impl ArchiveError {
    /// Creates a new Format error
    pub fn format(message: impl Into<String>) -> Self {
        ArchiveError::Format {
            message: message.into(),
        }
    }

    /// Creates a new Io error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchiveError::Io {
            path: path.into(),
            source,
        }
    }
}

impl FetchError {
    /// Creates a new Network error
    pub fn network(location: impl Into<String>, message: impl Into<String>) -> Self {
        FetchError::Network {
            location: location.into(),
            message: message.into(),
        }
    }
}
