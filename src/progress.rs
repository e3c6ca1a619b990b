//! Byte-count progress reporting for transfers
//!
//! The transfer engine only calls `update`/`finish`; rendering never feeds
//! back into transfer semantics. `--quiet` swaps in the no-op sink.

use indicatif::{ProgressBar, ProgressStyle};

pub trait Progress {
    fn update(&self, bytes: u64, total: u64);
    fn finish(&self);
}

/// Selected by `--quiet`; zero overhead in the chunk loop.
pub struct NullProgress;

impl Progress for NullProgress {
    fn update(&self, _bytes: u64, _total: u64) {}
    fn finish(&self) {}
}

/// Indicatif bar in the original's `[###---] bytes (%)` shape. The total is
/// only known once the preamble arrives, so the length is set on first update.
pub struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:50}] {bytes}/{total_bytes} ({percent}%)")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#-"),
        );
        Self { bar }
    }
}

impl Default for ProgressBarSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for ProgressBarSink {
    fn update(&self, bytes: u64, total: u64) {
        if total == 0 {
            // Zero-length payload: pin the bar at 100% instead of dividing by zero
            self.bar.set_length(1);
            self.bar.set_position(1);
            return;
        }
        if self.bar.length() != Some(total) {
            self.bar.set_length(total);
        }
        self.bar.set_position(bytes.min(total));
    }

    fn finish(&self) {
        self.bar.finish();
    }
}
