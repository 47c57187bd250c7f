//! Progress bar for transfer operations
//!
//! Renders the byte-level transfer progress the engine reports through
//! its observer callback. In quiet, JSON, or no-progress mode the bar is
//! suppressed and updates are dropped.

use super::OutputConfig;

/// Progress bar wrapper around indicatif
#[derive(Debug)]
pub struct ProgressBar {
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    /// Create a new progress bar with the given total size in bytes
    pub fn new(config: OutputConfig, total: u64) -> Self {
        let bar = if config.quiet || config.json || config.no_progress {
            None
        } else {
            let bar = indicatif::ProgressBar::new(total);
            bar.set_style(
                indicatif::ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {bytes_per_sec} ({eta})",
                    )
                    .expect("valid template")
                    .progress_chars("#>-"),
            );
            Some(bar)
        };

        Self { bar }
    }

    /// Update the confirmed byte position
    pub fn set_position(&self, pos: u64) {
        if let Some(bar) = &self.bar {
            bar.set_position(pos);
        }
    }

    /// Finish and clear the progress bar
    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    /// Check if progress bar is visible
    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }
}
