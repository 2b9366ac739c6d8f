//! Terminal progress for downloads and extraction
//!
//! A disabled reporter keeps a hidden bar, so callers never branch on quiet mode.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const SPINNER_TICK: Duration = Duration::from_millis(80);
const BYTES_TICK: Duration = Duration::from_millis(100);

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.cyan} {msg}")
        .expect("static spinner template")
}

fn bytes_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} {bytes_per_sec} ({eta})")
        .expect("static byte template")
        .progress_chars("=> ")
}

/// Reports one step at a time on stderr
pub struct Progress {
    enabled: bool,
    bar: ProgressBar,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            bar: ProgressBar::hidden(),
        }
    }

    /// Spinner for a step of unknown length
    pub fn spinner(&mut self, message: &str) {
        self.show(ProgressBar::new_spinner().with_style(spinner_style()), message, SPINNER_TICK);
    }

    /// Byte counter for a transfer of `total` bytes
    pub fn start_bytes(&mut self, total: u64, message: &str) {
        self.show(ProgressBar::new(total).with_style(bytes_style()), message, BYTES_TICK);
    }

    pub fn inc_by(&self, delta: u64) {
        self.bar.inc(delta);
    }

    pub fn finish_and_clear(&mut self) {
        self.bar.finish_and_clear();
        self.bar = ProgressBar::hidden();
    }

    fn show(&mut self, bar: ProgressBar, message: &str, tick: Duration) {
        if !self.enabled {
            return;
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(tick);
        self.bar = bar;
    }
}
