//! Progress reporting to the log

use std::sync::atomic::{AtomicUsize, Ordering};

use log::info;
use phototrack_core::ProgressSink;

/// Logs matching progress at each ten-percent step.
///
/// The pipeline samples on a short interval, so raw reports are far too
/// chatty for a log pane; only decade crossings are emitted.
#[derive(Debug, Default)]
pub struct LogProgress {
    last_percent: AtomicUsize,
}

impl ProgressSink for LogProgress {
    fn progress(&self, fraction: f64) {
        let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as usize;
        let previous = self.last_percent.fetch_max(percent, Ordering::SeqCst);

        if percent / 10 > previous / 10 {
            info!("photo matching [{percent}%] complete");
        }
    }
}
