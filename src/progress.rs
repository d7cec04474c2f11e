//! Progress reporting for restore downloads.

use tracing::debug;

/// Progress of one restore download.
#[derive(Debug, Clone)]
pub struct TransferProgress {
    /// Bytes received so far
    pub done: u64,
    /// Expected bytes, as estimated from the restore selection
    pub total: u64,
    /// Label of the download (usually the first restored path)
    pub name: String,
}

impl TransferProgress {
    pub fn new(done: u64, total: u64, name: impl Into<String>) -> Self {
        Self {
            done,
            total,
            name: name.into(),
        }
    }

    /// Progress as a percentage capped at 100.
    ///
    /// The total is an estimate (zipped results are smaller or larger than the
    /// sum of file sizes), so `done` may overshoot it.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        ((self.done as f64 / self.total as f64) * 100.0).min(100.0)
    }

    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }
}

/// Callback invoked after every received chunk.
///
/// Returning `false` stops the download.
pub type ProgressCallback = Box<dyn FnMut(&TransferProgress) -> bool + Send>;

/// Callback that reports progress as `tracing` events and never cancels.
pub fn log_progress() -> ProgressCallback {
    Box::new(|progress: &TransferProgress| {
        debug!(
            name = %progress.name,
            done = progress.done,
            total = progress.total,
            "restore progress {:.1}%",
            progress.percent()
        );
        true
    })
}
