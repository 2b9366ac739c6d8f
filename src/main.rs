//! devpack - runtime acquisition helpers for dev container builds
//!
//! Subcommands:
//! - resolve: pick a runtime version from a versions manifest
//! - merge: combine devcontainer.json fragments
//! - extract: unpack a tar.gz archive safely

use clap::Parser;
use colored::Colorize;
use devpack::cli::{CliArgs, Command};
use devpack::commands;
use devpack::config::Settings;
use devpack::logging;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    logging::init(args.logging_config());

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<()> {
    let show_progress = args.show_progress();

    match &args.command {
        Command::Resolve(resolve) => {
            let output = commands::resolve(resolve, show_progress).await?;
            println!("{}", output);
        }
        Command::Merge(merge) => {
            let output = commands::merge(merge)?;
            println!("{}", output);
        }
        Command::Extract(extract) => {
            let summary = commands::extract(extract, show_progress).await?;
            if !args.quiet {
                let skipped = format!("{} skipped", summary.skipped);
                eprintln!(
                    "Extracted {} entries into {} ({})",
                    summary.extracted,
                    extract.destination.display(),
                    if summary.skipped > 0 {
                        skipped.yellow()
                    } else {
                        skipped.normal()
                    }
                );
            }
        }
        Command::Info => {
            let settings = Settings::detect()?;
            println!("{}", commands::describe(&settings));
        }
    }

    Ok(())
}
