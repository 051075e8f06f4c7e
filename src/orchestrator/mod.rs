//! # Orchestrator Module
//!
//! Modulo che separa le responsabilità del batch in sottomoduli:
//! - `batch_orchestrator`: Orchestratore principale (`run_batch`)
//! - `task_compressor`: Preparazione ed esecuzione dei singoli job
//! - `progress_tracker`: Frazione di avanzamento monotona verso il reporter
//! - `path_resolver`: Nomi di output univoci all'interno di un batch

pub mod batch_orchestrator;
pub mod path_resolver;
pub mod progress_tracker;
pub mod task_compressor;

pub use batch_orchestrator::{create_cancellation_channel, BatchOrchestrator};
pub use path_resolver::PathResolver;
pub use progress_tracker::ProgressTracker;
pub use task_compressor::TaskCompressor;
