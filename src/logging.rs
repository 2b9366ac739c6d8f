//! Structured logging setup
//!
//! Installs a `tracing` subscriber writing to stderr, so stdout stays reserved
//! for command output. `RUST_LOG` overrides the configured level.

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Minimum level for this crate's events
    pub level: Level,
    /// Emit one JSON object per event
    pub use_json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            use_json: false,
        }
    }
}

impl LoggingConfig {
    /// Level chosen from the CLI verbosity flags
    pub fn from_verbosity(verbose: bool, quiet: bool) -> Self {
        let level = if quiet {
            Level::ERROR
        } else if verbose {
            Level::DEBUG
        } else {
            Level::WARN
        };
        Self {
            level,
            ..Default::default()
        }
    }

    pub fn with_json(mut self, use_json: bool) -> Self {
        self.use_json = use_json;
        self
    }

    /// Filter used when `RUST_LOG` is unset
    pub fn default_directives(&self) -> String {
        format!("warn,devpack={}", self.level)
    }
}

/// Install the global subscriber; later calls are ignored
pub fn init(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.default_directives()));

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .init();
        }
    });
}
