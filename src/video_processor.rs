//! # Video Processing Module
//!
//! Questo modulo gestisce la compressione video tramite un processo `ffmpeg` esterno.
//!
//! ## Responsabilità:
//! - Risoluzione del binario ffmpeg (vedi `tool_resolver`), validata una sola volta
//! - Ricodifica con codec fisso `libx264` e CRF configurabile
//! - Risoluzione di output forzata (`-vf scale=W:H`) opzionale
//! - Bitrate video target (`-b:v`) opzionale
//! - Scrittura su file temporaneo nella directory di output, persistito solo a successo
//!
//! ## Controllo qualità (CRF):
//! - 0-17: Visualmente lossless (file grandi)
//! - 18-23: Alta qualità (23 = default)
//! - 24-28: Buona qualità, file più piccoli
//! - 29+: Qualità accettabile/bassa
//!
//! ## Gestione errori:
//! - ffmpeg mancante o non eseguibile: `ExternalToolUnavailable` (fatale, prima del batch)
//! - ffmpeg termina con errore: `CompressorFailure` con le ultime righe di stderr
//! - Job abbandonato (timeout/cancellazione): il processo viene terminato (`kill_on_drop`)
//!
//! ## Esempio:
//! ```rust,ignore
//! let processor = VideoProcessor::new(config.ffmpeg_path.clone());
//! processor.ensure_available().await?;
//! processor.compress_video(&job).await?;
//! ```

use crate::config::Resolution;
use crate::error::CompressError;
use crate::job::{CompressionJob, JobParameters};
use crate::tool_resolver::ToolPathResolver;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Fixed video codec
pub const VIDEO_CODEC: &str = "libx264";

const PROBE_TIMEOUT: Duration = Duration::from_secs(15);
const STDERR_TAIL_LINES: usize = 5;

/// Seam for the video compressor
pub trait VideoCompressor: Send + Sync {
    /// Verify the external transcoder can be used. Called once before a batch starts.
    fn ensure_available(&self) -> impl Future<Output = Result<(), CompressError>> + Send;

    /// Compress `job.source_path()` into `job.target_path()`.
    ///
    /// On error no file is left at the target path.
    fn compress_video(&self, job: &CompressionJob) -> impl Future<Output = Result<(), CompressError>> + Send;
}

/// Handles video compression through ffmpeg
pub struct VideoProcessor {
    explicit_path: Option<PathBuf>,
    resolver: ToolPathResolver,
    ffmpeg: OnceCell<PathBuf>,
}

impl VideoProcessor {
    /// `ffmpeg_path` is authoritative when set; otherwise the binary is discovered
    pub fn new(ffmpeg_path: Option<PathBuf>) -> Self {
        Self::with_resolver(ffmpeg_path, ToolPathResolver::new())
    }

    pub fn with_resolver(ffmpeg_path: Option<PathBuf>, resolver: ToolPathResolver) -> Self {
        Self {
            explicit_path: ffmpeg_path,
            resolver,
            ffmpeg: OnceCell::new(),
        }
    }

    /// The validated ffmpeg path, resolving and probing it on first use
    pub async fn ffmpeg_path(&self) -> Result<&Path, CompressError> {
        let path = self
            .ffmpeg
            .get_or_try_init(|| async {
                let path = self.resolver.resolve_ffmpeg(self.explicit_path.as_deref())?;
                Self::probe(&path).await?;
                info!("Using ffmpeg: {}", path.display());
                Ok::<_, CompressError>(path)
            })
            .await?;
        Ok(path.as_path())
    }

    /// Run `ffmpeg -version` to make sure the binary actually executes
    async fn probe(path: &Path) -> Result<(), CompressError> {
        let unavailable =
            |detail: String| CompressError::ExternalToolUnavailable(format!("{}: {}", path.display(), detail));

        let output = tokio::time::timeout(
            PROBE_TIMEOUT,
            Command::new(path)
                .arg("-version")
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| unavailable("timed out running -version".to_string()))?
        .map_err(|e| unavailable(format!("failed to execute: {}", e)))?;

        if !output.status.success() {
            return Err(unavailable(format!("-version exited with {}", output.status)));
        }

        let banner = String::from_utf8_lossy(&output.stdout);
        debug!("ffmpeg probe: {}", banner.lines().next().unwrap_or_default());
        Ok(())
    }

    /// Build the ffmpeg command line for one job
    pub fn build_args(
        input: &Path,
        output: &Path,
        crf: u8,
        resolution: Option<&Resolution>,
        bitrate: Option<&str>,
    ) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-nostdin".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            input.to_string_lossy().into_owned(),
            "-vcodec".into(),
            VIDEO_CODEC.into(),
            "-crf".into(),
            crf.to_string(),
        ];

        if let Some(resolution) = resolution {
            args.push("-vf".into());
            args.push(resolution.scale_filter());
        }

        if let Some(bitrate) = bitrate {
            args.push("-b:v".into());
            args.push(bitrate.to_string());
        }

        args.push(output.to_string_lossy().into_owned());
        args
    }
}

impl VideoCompressor for VideoProcessor {
    async fn ensure_available(&self) -> Result<(), CompressError> {
        self.ffmpeg_path().await.map(|_| ())
    }

    async fn compress_video(&self, job: &CompressionJob) -> Result<(), CompressError> {
        let (crf, resolution, bitrate) = match job.parameters() {
            JobParameters::Video {
                crf,
                resolution,
                bitrate,
            } => (*crf, resolution.as_ref(), bitrate.as_deref()),
            JobParameters::Image { .. } => {
                return Err(CompressError::CompressorFailure(format!(
                    "{} is not a video job",
                    job.file_name()
                )))
            }
        };

        let ffmpeg = self.ffmpeg_path().await?;

        let target = job.target_path();
        let output_dir = target.parent().unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(output_dir).await?;

        // ffmpeg picks the container from the extension, so keep the target's
        let suffix = target
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_else(|| ".mp4".to_string());
        let temp = tempfile::Builder::new()
            .prefix(".compressing-")
            .suffix(&suffix)
            .tempfile_in(output_dir)?;

        let args = Self::build_args(job.source_path(), temp.path(), crf, resolution, bitrate);
        debug!("Running {} {}", ffmpeg.display(), args.join(" "));

        let start_time = std::time::Instant::now();
        let output = Command::new(ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| CompressError::CompressorFailure(format!("failed to execute ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join(" | ");
            return Err(CompressError::CompressorFailure(format!(
                "ffmpeg exited with {}: {}",
                output.status, tail
            )));
        }

        temp.persist(target).map_err(|e| CompressError::Io(e.error))?;

        debug!(
            "Video compression of {} completed in {:.1}s",
            job.file_name(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(())
    }
}
