//! # Media Compressor - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing` (su stderr)
//! - Merge tra file di configurazione e flag CLI
//! - Avvio del batch, Ctrl-C come cancellazione, archivio zip finale
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (file/directory, quality, resize, crf, workers, etc.)
//! 2. Configura il logging (`RUST_LOG`, altrimenti INFO o DEBUG con `--verbose`)
//! 3. Carica la configurazione salvata e applica i flag
//! 4. Espande le directory nella lista dei media supportati
//! 5. Esegue il batch con progress bar o eventi JSON
//! 6. Stampa la tabella dei risultati e scrive l'archivio se richiesto
//!
//! ## Esempio di utilizzo:
//! ```bash
//! media-compressor photos/ clip.mp4 --quality 60 --scale 50 --archive out.zip
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use media_compressor::archive::write_archive;
use media_compressor::file_manager::FileManager;
use media_compressor::json_output::{JsonMessage, JsonReporter};
use media_compressor::progress::{results_table, CompressionStats, ProgressManager};
use media_compressor::{create_cancellation_channel, BatchOrchestrator, Config, ResizePolicy, Resolution};

#[derive(Parser, Debug)]
#[command(name = "media-compressor")]
#[command(about = "Compress images to JPEG and videos to H.264, with a size report and optional zip")]
struct Args {
    /// Files or directories to compress
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// JPEG quality (10-100)
    #[arg(short, long)]
    quality: Option<u8>,

    /// Resize images to exactly WIDTHxHEIGHT
    #[arg(long, value_name = "WxH", conflicts_with = "scale")]
    resize: Option<Resolution>,

    /// Scale images by a percentage of their size
    #[arg(long, value_name = "PERCENT")]
    scale: Option<u32>,

    /// Force video resolution (e.g. 1280x720)
    #[arg(long, value_name = "WxH")]
    resolution: Option<Resolution>,

    /// Target video bitrate (e.g. 1000k)
    #[arg(short, long)]
    bitrate: Option<String>,

    /// Video CRF value (0-51, lower = better quality)
    #[arg(short, long)]
    crf: Option<u8>,

    /// Output directory for compressed files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Prefix added to compressed file names
    #[arg(long)]
    prefix: Option<String>,

    /// Bundle all outputs into this zip file
    #[arg(short, long)]
    archive: Option<PathBuf>,

    /// Path to the ffmpeg binary
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Number of files compressed concurrently
    #[arg(short, long)]
    workers: Option<usize>,

    /// Per-file timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Configuration file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save the effective configuration to this file
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Emit JSON events on stdout
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = match (args.verbose, args.json) {
        (true, _) => "debug",
        (false, true) => "warn",
        (false, false) => "info",
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let json = args.json;
    let result = run(args).await;
    if let Err(ref e) = result {
        if json {
            JsonMessage::error(e.to_string(), e.chain().nth(1).map(|cause| cause.to_string())).emit();
        }
    }
    result
}

async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();
    let json = args.json;

    let config_path = match args.config {
        Some(ref path) => {
            if !path.exists() {
                return Err(anyhow::anyhow!("Config file does not exist: {}", path.display()));
            }
            Some(path.clone())
        }
        None => Config::default_path(),
    };
    let base = match config_path {
        Some(ref path) => Config::from_file(path)
            .await
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    let config = apply_overrides(base, &args);

    if let Some(ref path) = args.save_config {
        config.validate()?;
        config.save_to_file(path).await?;
        info!("Configuration saved to {}", path.display());
    }

    let files = FileManager::expand_inputs(&args.inputs);
    if json {
        JsonMessage::start(files.len(), &config).emit();
    }

    let (stop_sender, stop_receiver) = create_cancellation_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling batch");
            let _ = stop_sender.send(());
        }
    });

    let mut orchestrator = BatchOrchestrator::new(config.clone()).with_cancellation(stop_receiver);
    let outcome = if json {
        orchestrator.run_batch(&files, &mut JsonReporter).await?
    } else {
        let mut progress = ProgressManager::new(files.len() as u64);
        match orchestrator.run_batch(&files, &mut progress).await {
            Ok(outcome) => {
                let stats = CompressionStats::from_outcome(&outcome);
                progress.finish(&stats.format_summary());
                outcome
            }
            Err(e) => {
                progress.abandon("Batch aborted");
                return Err(e.into());
            }
        }
    };

    let archive = match config.archive_path {
        Some(ref dest) if !outcome.outputs.is_empty() => {
            write_archive(&outcome.outputs, dest)
                .await
                .with_context(|| format!("Failed to write archive {}", dest.display()))?;
            Some(dest.clone())
        }
        Some(ref dest) => {
            warn!("No compressed files, archive {} not written", dest.display());
            None
        }
        None => None,
    };

    let stats = CompressionStats::from_outcome(&outcome);
    if json {
        JsonMessage::complete(&stats, archive, outcome.cancelled, start_time.elapsed().as_secs_f64()).emit();
    } else {
        println!("\n{}", results_table(&outcome));
        println!("{}", stats.format_summary());
        if let Some(path) = archive {
            println!("Archive: {}", path.display());
        }
    }

    Ok(())
}

/// CLI flags win over values loaded from the config file
fn apply_overrides(mut config: Config, args: &Args) -> Config {
    if let Some(quality) = args.quality {
        config.quality = quality;
    }
    if let Some(size) = args.resize {
        config.resize = ResizePolicy::Exact {
            width: size.width,
            height: size.height,
        };
    }
    if let Some(percent) = args.scale {
        config.resize = ResizePolicy::Scale { percent };
    }
    if let Some(resolution) = args.resolution {
        config.video_resolution = Some(resolution);
    }
    if let Some(ref bitrate) = args.bitrate {
        config.video_bitrate = Some(bitrate.clone());
    }
    if let Some(crf) = args.crf {
        config.video_crf = crf;
    }
    if let Some(ref dir) = args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(ref prefix) = args.prefix {
        config.output_prefix = prefix.clone();
    }
    if let Some(ref archive) = args.archive {
        config.archive_path = Some(archive.clone());
    }
    if let Some(ref ffmpeg) = args.ffmpeg {
        config.ffmpeg_path = Some(ffmpeg.clone());
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(timeout) = args.timeout {
        config.job_timeout_secs = Some(timeout);
    }
    config
}
