//! # Job & Outcome Data Model
//!
//! Strutture dati che attraversano un batch di compressione:
//! - `CompressionJob`: Un file accettato, immutabile, creato alla sottomissione
//! - `CompressionResult`: Dimensioni prima/dopo e percentuale risparmiata
//! - `SkipNotice`: File saltato con la relativa motivazione
//! - `BatchOutcome`: Risultati ordinati + output prodotti, vive solo per un batch

use crate::config::Resolution;
use crate::error::SkipReason;
use crate::file_manager::FileManager;
use crate::resize::ResizePolicy;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of media, decided from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Extension of the compressed output
    pub fn output_extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Compressor parameters captured when the job is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobParameters {
    Image {
        quality: u8,
        resize: ResizePolicy,
    },
    Video {
        crf: u8,
        resolution: Option<Resolution>,
        bitrate: Option<String>,
    },
}

/// One file accepted for compression
#[derive(Debug, Clone)]
pub struct CompressionJob {
    source_path: PathBuf,
    target_path: PathBuf,
    media_kind: MediaKind,
    parameters: JobParameters,
    size_before_kb: u64,
}

impl CompressionJob {
    pub fn new(
        source_path: PathBuf,
        target_path: PathBuf,
        parameters: JobParameters,
        size_before_kb: u64,
    ) -> Self {
        let media_kind = match parameters {
            JobParameters::Image { .. } => MediaKind::Image,
            JobParameters::Video { .. } => MediaKind::Video,
        };
        Self {
            source_path,
            target_path,
            media_kind,
            parameters,
            size_before_kb,
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn media_kind(&self) -> MediaKind {
        self.media_kind
    }

    pub fn parameters(&self) -> &JobParameters {
        &self.parameters
    }

    pub fn size_before_kb(&self) -> u64 {
        self.size_before_kb
    }

    /// Base name of the source, used in reports
    pub fn file_name(&self) -> String {
        FileManager::file_name(&self.source_path)
    }
}

/// Before/after statistics of a successful job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionResult {
    pub file_name: String,
    pub media_kind: MediaKind,
    pub size_before_kb: u64,
    pub size_after_kb: u64,
    pub percent_saved: f64,
    pub output_path: PathBuf,
}

impl CompressionResult {
    /// Build a result; `size_before_kb` must be non-zero (zero-size sources are skipped earlier)
    pub fn new(job: &CompressionJob, size_after_kb: u64) -> Self {
        debug_assert!(job.size_before_kb() > 0, "zero-size sources never become jobs");
        Self {
            file_name: job.file_name(),
            media_kind: job.media_kind(),
            size_before_kb: job.size_before_kb(),
            size_after_kb,
            percent_saved: FileManager::percent_saved(job.size_before_kb(), size_after_kb).unwrap_or(0.0),
            output_path: job.target_path().to_path_buf(),
        }
    }
}

/// A file that contributed no result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkipNotice {
    pub file_name: String,
    pub source_path: PathBuf,
    pub reason: SkipReason,
}

impl SkipNotice {
    pub fn new(source_path: &Path, reason: SkipReason) -> Self {
        Self {
            file_name: FileManager::file_name(source_path),
            source_path: source_path.to_path_buf(),
            reason,
        }
    }
}

impl fmt::Display for SkipNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file_name, self.reason)
    }
}

/// Everything a batch produced, in submission order
#[derive(Debug, Default, Clone, Serialize)]
pub struct BatchOutcome {
    pub results: Vec<CompressionResult>,
    pub skipped: Vec<SkipNotice>,
    /// Output files of `results`, same order
    pub outputs: Vec<PathBuf>,
    /// The run was stopped before every file was processed
    pub cancelled: bool,
}

impl BatchOutcome {
    pub fn record_result(&mut self, result: CompressionResult) {
        self.outputs.push(result.output_path.clone());
        self.results.push(result);
    }

    pub fn record_skip(&mut self, notice: SkipNotice) {
        self.skipped.push(notice);
    }

    /// Number of files accounted for (results + skips)
    pub fn processed(&self) -> usize {
        self.results.len() + self.skipped.len()
    }

    pub fn total_before_kb(&self) -> u64 {
        self.results.iter().map(|r| r.size_before_kb).sum()
    }

    pub fn total_after_kb(&self) -> u64 {
        self.results.iter().map(|r| r.size_after_kb).sum()
    }
}
