//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress reporting e le statistiche di compressione.
//!
//! ## Responsabilità:
//! - `ProgressReporter`: punto di estensione per i front end (barra, JSON, test)
//! - Progress bar visual con `indicatif` per feedback real-time
//! - Statistiche aggregate del batch (file compressi, saltati, KB risparmiati)
//! - Tabella finale prima/dopo e riepilogo dei file saltati
//!
//! ## Progress tracking:
//! - Un `ProgressUpdate` per ogni file (compresso o saltato)
//! - `fraction = processed / total`, strettamente crescente, termina a 1.0
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [========================================] 3/3 (100%) ✅ photo.png: 62.50% saved
//! ```
//!
//! ## Esempio:
//! ```rust,ignore
//! let mut progress = ProgressManager::new(files.len() as u64);
//! let outcome = orchestrator.run_batch(&files, &mut progress).await?;
//! progress.finish(&CompressionStats::from_outcome(&outcome).format_summary());
//! println!("{}", results_table(&outcome));
//! ```

use crate::file_manager::FileManager;
use crate::job::{BatchOutcome, CompressionResult, SkipNotice};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Write as _;
use std::time::Duration;

/// What happened to the file that triggered a progress update
#[derive(Debug, Clone)]
pub enum FileEvent {
    Compressed(CompressionResult),
    Skipped(SkipNotice),
}

/// Emitted once per processed file
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub processed: usize,
    pub total: usize,
    /// `processed / total`
    pub fraction: f64,
    pub event: FileEvent,
}

impl ProgressUpdate {
    /// One-line status for the file in this update
    pub fn status_line(&self) -> String {
        match &self.event {
            FileEvent::Compressed(result) => {
                format!("✅ {}: {:.2}% saved", result.file_name, result.percent_saved)
            }
            FileEvent::Skipped(notice) => format!("⏩ {}", notice),
        }
    }
}

/// Receives progress updates during a batch
pub trait ProgressReporter {
    fn report(&mut self, update: &ProgressUpdate);
}

impl<F: FnMut(&ProgressUpdate)> ProgressReporter for F {
    fn report(&mut self, update: &ProgressUpdate) {
        self(update)
    }
}

/// Manages the terminal progress bar
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Stop drawing, leaving the bar where it is
    pub fn abandon(&self, message: &str) {
        self.bar.abandon_with_message(message.to_string());
    }
}

impl ProgressReporter for ProgressManager {
    fn report(&mut self, update: &ProgressUpdate) {
        self.bar.set_position(update.processed as u64);
        self.bar.set_message(update.status_line());
    }
}

/// Aggregate statistics of a batch
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CompressionStats {
    pub files_processed: usize,
    pub files_compressed: usize,
    pub files_skipped: usize,
    pub total_before_kb: u64,
    pub total_after_kb: u64,
}

impl CompressionStats {
    pub fn from_outcome(outcome: &BatchOutcome) -> Self {
        Self {
            files_processed: outcome.processed(),
            files_compressed: outcome.results.len(),
            files_skipped: outcome.skipped.len(),
            total_before_kb: outcome.total_before_kb(),
            total_after_kb: outcome.total_after_kb(),
        }
    }

    pub fn saved_kb(&self) -> i64 {
        self.total_before_kb as i64 - self.total_after_kb as i64
    }

    pub fn overall_percent_saved(&self) -> f64 {
        FileManager::percent_saved(self.total_before_kb, self.total_after_kb).unwrap_or(0.0)
    }

    pub fn format_summary(&self) -> String {
        let saved = if self.saved_kb() >= 0 {
            FileManager::format_size(self.saved_kb() as u64 * 1024)
        } else {
            format!("-{}", FileManager::format_size(self.saved_kb().unsigned_abs() * 1024))
        };
        format!(
            "Processed: {} files | Compressed: {} | Skipped: {} | Total saved: {} ({:.2}%)",
            self.files_processed,
            self.files_compressed,
            self.files_skipped,
            saved,
            self.overall_percent_saved()
        )
    }
}

/// Before/after table followed by the skipped files and their reasons
pub fn results_table(outcome: &BatchOutcome) -> String {
    let mut out = String::new();

    if outcome.results.is_empty() {
        out.push_str("No files were compressed.\n");
    } else {
        let name_width = outcome
            .results
            .iter()
            .map(|r| r.file_name.chars().count())
            .max()
            .unwrap_or(0)
            .max("File Name".len());

        let _ = writeln!(
            out,
            "{:<width$}  {:>16}  {:>15}  {:>9}",
            "File Name",
            "Before Size (KB)",
            "After Size (KB)",
            "Saved (%)",
            width = name_width
        );
        for result in &outcome.results {
            let _ = writeln!(
                out,
                "{:<width$}  {:>16}  {:>15}  {:>9.2}",
                result.file_name,
                result.size_before_kb,
                result.size_after_kb,
                result.percent_saved,
                width = name_width
            );
        }
    }

    if !outcome.skipped.is_empty() {
        let _ = writeln!(out, "\nSkipped files ({}):", outcome.skipped.len());
        for notice in &outcome.skipped {
            let _ = writeln!(out, "  - {}", notice);
        }
    }

    if outcome.cancelled {
        out.push_str("\nBatch cancelled before all files were processed.\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkipReason;
    use crate::job::MediaKind;
    use std::path::{Path, PathBuf};

    fn result(name: &str, before: u64, after: u64) -> CompressionResult {
        CompressionResult {
            file_name: name.to_string(),
            media_kind: MediaKind::Image,
            size_before_kb: before,
            size_after_kb: after,
            percent_saved: FileManager::percent_saved(before, after).unwrap(),
            output_path: PathBuf::from(format!("out/{}", name)),
        }
    }

    fn sample_outcome() -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        outcome.record_result(result("photo.png", 2048, 512));
        outcome.record_result(result("clip.mp4", 10240, 5120));
        outcome.record_skip(SkipNotice::new(Path::new("doc.txt"), SkipReason::UnsupportedFormat));
        outcome
    }

    #[test]
    fn test_stats_from_outcome() {
        let stats = CompressionStats::from_outcome(&sample_outcome());
        assert_eq!(stats.files_processed, 3);
        assert_eq!(stats.files_compressed, 2);
        assert_eq!(stats.files_skipped, 1);
        assert_eq!(stats.total_before_kb, 12288);
        assert_eq!(stats.total_after_kb, 5632);
        assert_eq!(stats.saved_kb(), 6656);
        assert!(stats.format_summary().contains("Compressed: 2"));
        assert!(stats.format_summary().contains("54.17%"));
    }

    #[test]
    fn test_results_table() {
        let table = results_table(&sample_outcome());
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with("File Name"));
        assert!(lines[1].starts_with("photo.png"));
        assert!(lines[1].trim_end().ends_with("75.00"));
        assert!(lines[2].starts_with("clip.mp4"));
        assert!(table.contains("Skipped files (1):"));
        assert!(table.contains("doc.txt: unsupported format"));
    }

    #[test]
    fn test_closure_reporter() {
        let mut seen = Vec::new();
        {
            let mut reporter = |u: &ProgressUpdate| seen.push(u.fraction);
            let update = ProgressUpdate {
                processed: 1,
                total: 2,
                fraction: 0.5,
                event: FileEvent::Compressed(result("a.png", 10, 5)),
            };
            reporter.report(&update);
            assert_eq!(update.status_line(), "✅ a.png: 50.00% saved");
        }
        assert_eq!(seen, vec![0.5]);
    }
}
