//! Command implementations behind the CLI
//!
//! Each command returns the text to print so the binary only handles output
//! and exit codes.

use crate::archive::{ExtractSummary, Extractor};
use crate::cli::{ExtractArgs, MergeArgs, ResolveArgs};
use crate::config::Settings;
use crate::devcontainer::{self, ConfigDocument, DevContainer, MergeMode};
use crate::error::{AppError, MergeError, ResolveError};
use crate::fetch::fetch_location;
use crate::progress::Progress;
use crate::version::{LinuxDistroInfo, Platform, VersionManifest};
use std::io;
use std::path::Path;
use tracing::info;

/// Resolve a range against a manifest; prints the version and optionally its URL
pub async fn resolve(args: &ResolveArgs, show_progress: bool) -> Result<String, AppError> {
    let bytes = fetch_location(&args.manifest, show_progress).await?;
    let manifest = VersionManifest::from_slice(&bytes)?;
    let version = manifest.find_version(&args.range, !args.include_unstable)?;
    info!(range = %args.range, version = %version, "resolved version");

    if !args.download_url {
        return Ok(version);
    }

    let platform = platform_for(args, Platform::current());
    let url = manifest
        .find_download_url(&version, &platform)?
        .ok_or_else(|| ResolveError::NoDownload {
            version: version.clone(),
            platform: platform.to_string(),
        })?;
    Ok(format!("{}\n{}", version, url))
}

/// Apply the CLI platform overrides on top of the detected host
pub fn platform_for(args: &ResolveArgs, host: Platform) -> Platform {
    let distro = match &args.distro_version {
        Some(version) => Some(LinuxDistroInfo {
            version_id: version.clone(),
            ..Default::default()
        }),
        None => host.distro,
    };

    Platform {
        arch: args.arch.clone().unwrap_or(host.arch),
        os: args.os.clone().unwrap_or(host.os),
        distro,
    }
}

/// Merge documents in order and render the result as JSON
pub fn merge(args: &MergeArgs) -> Result<String, AppError> {
    let mode = if args.strict {
        MergeMode::Strict
    } else {
        MergeMode::Lenient
    };

    let documents = args
        .files
        .iter()
        .map(|path| load_document(path))
        .collect::<Result<Vec<_>, _>>()?;

    let mut merged = DevContainer {
        properties: devcontainer::merge(&documents, mode)?,
        path: None,
    };
    if args.run_args {
        merged.convert_unsupported_properties_to_run_args();
    }
    Ok(merged.to_json_pretty())
}

/// A file is read as a document; a directory contributes its devcontainer.json
fn load_document(path: &Path) -> Result<ConfigDocument, MergeError> {
    if !path.is_dir() {
        return DevContainer::from_path(path).map(|document| document.properties);
    }

    DevContainer::load(path)?
        .map(|document| document.properties)
        .ok_or_else(|| {
            MergeError::read(
                path,
                io::Error::new(io::ErrorKind::NotFound, "no devcontainer.json found"),
            )
        })
}

/// Fetch and extract an archive
pub async fn extract(args: &ExtractArgs, show_progress: bool) -> Result<ExtractSummary, AppError> {
    let bytes = fetch_location(&args.archive, show_progress).await?;

    let mut progress = Progress::new(show_progress);
    progress.spinner(&format!("Extracting into {}", args.destination.display()));
    let result = Extractor::new(&args.destination)
        .with_strip_components(args.strip)
        .extract_from(bytes.as_slice());
    progress.finish_and_clear();

    let summary = result?;
    info!(
        destination = %args.destination.display(),
        extracted = summary.extracted,
        skipped = summary.skipped,
        "extracted archive"
    );
    Ok(summary)
}

/// Describe detected settings
pub fn describe(settings: &Settings) -> String {
    format!(
        "build mode: {}\nplatform: {}",
        settings.build_mode, settings.platform
    )
}
