//! CLI argument parsing module for devpack

use crate::logging::LoggingConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Runtime version resolution, devcontainer.json merging and safe archive extraction
#[derive(Parser, Debug, Clone)]
#[command(
    name = "devpack",
    version,
    about = "Runtime version resolution, devcontainer.json merging and safe archive extraction"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable quiet mode - errors only, no progress bars
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit log events as JSON
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Resolve a version range against a versions manifest
    Resolve(ResolveArgs),
    /// Merge JSON-with-comments documents left to right
    Merge(MergeArgs),
    /// Extract a tar.gz archive into a directory
    Extract(ExtractArgs),
    /// Show the detected build mode and platform
    Info,
}

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Version range (e.g. "^18", "~3.11", "1.2 - 1.4", "latest")
    pub range: String,

    /// Versions manifest path or URL
    #[arg(short, long)]
    pub manifest: String,

    /// Consider releases not marked stable
    #[arg(long)]
    pub include_unstable: bool,

    /// Also print the download URL for this platform
    #[arg(long)]
    pub download_url: bool,

    /// Manifest architecture name (default: this machine)
    #[arg(long)]
    pub arch: Option<String>,

    /// Manifest platform name (default: this machine)
    #[arg(long)]
    pub os: Option<String>,

    /// Distro release to match against `platform_version` (default: /etc/os-release)
    #[arg(long)]
    pub distro_version: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct MergeArgs {
    /// Documents to merge, in order; a directory means its devcontainer.json
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Fail when values of different kinds meet
    #[arg(long)]
    pub strict: bool,

    /// Fold privileged, init, capAdd and securityOpt into runArgs
    #[arg(long)]
    pub run_args: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Archive path or URL (gzip-compressed tar)
    pub archive: String,

    /// Destination directory
    pub destination: PathBuf,

    /// Leading path components to drop from each entry
    #[arg(long, visible_alias = "strip-components", default_value_t = 0)]
    pub strip: usize,
}

impl CliArgs {
    /// Logging configuration selected by the global flags
    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::from_verbosity(self.verbose, self.quiet).with_json(self.log_json)
    }

    /// Whether progress bars should be drawn
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}
