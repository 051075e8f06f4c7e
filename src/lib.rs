//! # Media Compressor Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia unica per la CLI e per i front end esterni (modalità JSON)
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom e motivazioni di skip
//! - `job`: Job, risultati e outcome di un batch
//! - `file_manager`: Classificazione media, dimensioni in KB, espansione directory
//! - `resize`: Policy di resize delle immagini
//! - `tool_resolver`: Discovery di ffmpeg (config, env, bundle, PATH)
//! - `image_processor`: Compressione immagini in JPEG
//! - `video_processor`: Compressione video con ffmpeg/libx264
//! - `archive`: Zip degli output di un batch
//! - `orchestrator`: Esecuzione del batch (ordine, progress, cancellazione)
//! - `progress`: Progress bar, statistiche e tabella dei risultati
//! - `json_output`: Messaggi JSON per front end esterni
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use media_compressor::{BatchOrchestrator, Config};
//!
//! let mut orchestrator = BatchOrchestrator::new(Config::default());
//! let outcome = orchestrator.run_batch(&files, &mut |update: &ProgressUpdate| {
//!     println!("{:.0}%", update.fraction * 100.0);
//! }).await?;
//! let zip_bytes = media_compressor::archive::create_archive(&outcome.outputs)?;
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod image_processor;
pub mod job;
pub mod json_output;
pub mod orchestrator;
pub mod progress;
pub mod resize;
pub mod tool_resolver;
pub mod video_processor;

pub use config::{Config, Resolution};
pub use error::{CompressError, SkipReason};
pub use image_processor::{ImageCompressor, ImageProcessor};
pub use job::{BatchOutcome, CompressionJob, CompressionResult, JobParameters, MediaKind, SkipNotice};
pub use orchestrator::{create_cancellation_channel, BatchOrchestrator};
pub use progress::{ProgressReporter, ProgressUpdate};
pub use resize::ResizePolicy;
pub use video_processor::{VideoCompressor, VideoProcessor};
