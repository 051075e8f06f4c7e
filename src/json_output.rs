//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per i front end esterni
//! (dashboard web o pannello desktop) che pilotano il compressore come processo figlio.
//!
//! ## Responsabilità:
//! - Emette un messaggio JSON per riga su stdout
//! - Riutilizza `CompressionResult` e `SkipNotice` senza duplicarne i campi
//! - Implementa `ProgressReporter` per ricevere gli eventi dal batch
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio batch con configurazione effettiva
//! - `file_complete`: File compresso (prima/dopo/percentuale)
//! - `file_skipped`: File saltato con motivazione
//! - `progress`: Frazione completata dopo ogni file
//! - `complete`: Fine batch con statistiche e path dell'archivio
//! - `error`: Errore fatale

use crate::config::Config;
use crate::error::SkipReason;
use crate::job::MediaKind;
use crate::progress::{CompressionStats, FileEvent, ProgressReporter, ProgressUpdate};
use crate::resize::ResizePolicy;
use serde::Serialize;
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Inizio del batch
    Start { total_files: usize, config: JsonConfig },

    /// File compresso con successo
    FileComplete {
        file_name: String,
        media_kind: MediaKind,
        size_before_kb: u64,
        size_after_kb: u64,
        percent_saved: f64,
        output_path: PathBuf,
    },

    /// File saltato
    FileSkipped {
        file_name: String,
        source_path: PathBuf,
        reason: SkipReason,
    },

    /// Progresso corrente
    Progress { processed: usize, total: usize, fraction: f64 },

    /// Batch completato (o cancellato)
    Complete {
        files_processed: usize,
        files_compressed: usize,
        files_skipped: usize,
        total_before_kb: u64,
        total_after_kb: u64,
        percent_saved: f64,
        archive: Option<PathBuf>,
        cancelled: bool,
        duration_seconds: f64,
    },

    /// Errore fatale
    Error { message: String, details: Option<String> },
}

/// Configurazione riportata nel messaggio `start`
#[derive(Debug, Serialize)]
pub struct JsonConfig {
    pub quality: u8,
    pub resize: ResizePolicy,
    pub video_crf: u8,
    pub video_resolution: Option<String>,
    pub video_bitrate: Option<String>,
    pub output_dir: PathBuf,
    pub workers: usize,
}

impl From<&Config> for JsonConfig {
    fn from(config: &Config) -> Self {
        Self {
            quality: config.quality,
            resize: config.resize,
            video_crf: config.video_crf,
            video_resolution: config.video_resolution.map(|r| r.to_string()),
            video_bitrate: config.video_bitrate.clone(),
            output_dir: config.output_dir.clone(),
            workers: config.workers,
        }
    }
}

impl JsonMessage {
    /// Serializza il messaggio in una singola riga
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"failed to serialize message","details":"{}"}}"#, e)
        })
    }

    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        println!("{}", self.to_line());
    }

    pub fn start(total_files: usize, config: &Config) -> Self {
        Self::Start {
            total_files,
            config: JsonConfig::from(config),
        }
    }

    pub fn complete(stats: &CompressionStats, archive: Option<PathBuf>, cancelled: bool, duration_seconds: f64) -> Self {
        Self::Complete {
            files_processed: stats.files_processed,
            files_compressed: stats.files_compressed,
            files_skipped: stats.files_skipped,
            total_before_kb: stats.total_before_kb,
            total_after_kb: stats.total_after_kb,
            percent_saved: stats.overall_percent_saved(),
            archive,
            cancelled,
            duration_seconds,
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }

    /// Messaggi generati da un singolo aggiornamento di progresso
    pub fn from_update(update: &ProgressUpdate) -> [Self; 2] {
        let file_message = match &update.event {
            FileEvent::Compressed(result) => Self::FileComplete {
                file_name: result.file_name.clone(),
                media_kind: result.media_kind,
                size_before_kb: result.size_before_kb,
                size_after_kb: result.size_after_kb,
                percent_saved: result.percent_saved,
                output_path: result.output_path.clone(),
            },
            FileEvent::Skipped(notice) => Self::FileSkipped {
                file_name: notice.file_name.clone(),
                source_path: notice.source_path.clone(),
                reason: notice.reason.clone(),
            },
        };

        [
            file_message,
            Self::Progress {
                processed: update.processed,
                total: update.total,
                fraction: update.fraction,
            },
        ]
    }
}

/// Reporter che emette eventi JSON su stdout
#[derive(Debug, Default)]
pub struct JsonReporter;

impl ProgressReporter for JsonReporter {
    fn report(&mut self, update: &ProgressUpdate) {
        for message in JsonMessage::from_update(update) {
            message.emit();
        }
    }
}
