//! # Progress Tracker
//!
//! Conta i file processati e inoltra al `ProgressReporter` una frazione
//! strettamente crescente che termina esattamente a 1.0.
//! Viene usato da un solo consumer (il collector del batch), quindi niente lock.

use crate::progress::{FileEvent, ProgressReporter, ProgressUpdate};
use tracing::debug;

pub struct ProgressTracker<'r, R: ProgressReporter + ?Sized> {
    total: usize,
    processed: usize,
    reporter: &'r mut R,
}

impl<'r, R: ProgressReporter + ?Sized> ProgressTracker<'r, R> {
    pub fn new(total: usize, reporter: &'r mut R) -> Self {
        Self {
            total,
            processed: 0,
            reporter,
        }
    }

    /// Record one more processed file and notify the reporter
    pub fn record(&mut self, event: FileEvent) {
        if self.processed >= self.total {
            debug!("Ignoring progress event past the end of the batch");
            return;
        }

        self.processed += 1;
        let update = ProgressUpdate {
            processed: self.processed,
            total: self.total,
            fraction: self.processed as f64 / self.total as f64,
            event,
        };
        self.reporter.report(&update);
    }

    pub fn processed(&self) -> usize {
        self.processed
    }
}
