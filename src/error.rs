//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `CompressError` enum per categorizzare tutti gli errori possibili
//! - Definisce `SkipReason` per i file saltati durante un batch
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `UnsupportedFormat`: Estensione non supportata (skip del file)
//! - `CompressorFailure`: Il compressore ha fallito (skip del file)
//! - `ZeroByteSource`: Dimensione sorgente 0 KB (skip del file)
//! - `ExternalToolUnavailable`: ffmpeg non trovato (fatale, prima del batch)
//! - `InvalidConfig`: Configurazione non valida (fatale, prima del batch)
//! - `Io` / `Image` / `Archive`: Errori delle librerie sottostanti
//!
//! ## Propagazione:
//! - Gli errori per singolo file vengono convertiti in `SkipReason` e il batch continua
//! - Gli errori di configurazione e dei tool esterni interrompono il batch prima di iniziare
//!
//! ## Esempio:
//! ```rust,ignore
//! if config.quality < 10 {
//!     return Err(CompressError::InvalidConfig("quality must be between 10 and 100".into()));
//! }
//! ```

use serde::Serialize;
use std::fmt;

/// Custom error types for batch compression
#[derive(thiserror::Error, Debug)]
pub enum CompressError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Compressor failure: {0}")]
    CompressorFailure(String),

    #[error("Source file is empty (0 KB): {0}")]
    ZeroByteSource(String),

    #[error("External tool unavailable: {0}")]
    ExternalToolUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl CompressError {
    /// Downgrade any error raised while compressing a single file to a skip reason
    pub fn into_skip_reason(self) -> SkipReason {
        match self {
            CompressError::UnsupportedFormat(_) => SkipReason::UnsupportedFormat,
            CompressError::ZeroByteSource(_) => SkipReason::ZeroByteSource,
            CompressError::CompressorFailure(detail) => SkipReason::CompressorFailure(detail),
            other => SkipReason::CompressorFailure(other.to_string()),
        }
    }
}

/// Why a file contributed no result to the batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    UnsupportedFormat,
    ZeroByteSource,
    /// Source metadata could not be read (missing file, permissions)
    Unreadable(String),
    CompressorFailure(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedFormat => write!(f, "unsupported format"),
            SkipReason::ZeroByteSource => write!(f, "empty source (0 KB)"),
            SkipReason::Unreadable(detail) => write!(f, "unreadable: {}", detail),
            SkipReason::CompressorFailure(detail) => write!(f, "compression failed: {}", detail),
        }
    }
}
