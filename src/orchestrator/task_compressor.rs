//! # Task Compressor
//!
//! Gestisce la compressione di un singolo file:
//! - `prepare_job`: classificazione, dimensione sorgente e costruzione del `CompressionJob`
//! - `TaskCompressor::compress`: dispatch al compressore giusto con timeout opzionale
//!
//! Ogni errore di un singolo file diventa uno `SkipNotice`: il batch non si interrompe mai
//! per colpa di un file.

use crate::config::Config;
use crate::error::{CompressError, SkipReason};
use crate::file_manager::FileManager;
use crate::image_processor::ImageCompressor;
use crate::job::{CompressionJob, CompressionResult, JobParameters, MediaKind, SkipNotice};
use crate::orchestrator::path_resolver::PathResolver;
use crate::video_processor::VideoCompressor;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Turn a submitted path into a job, or into the reason it is skipped
pub async fn prepare_job(
    source: &Path,
    config: &Config,
    paths: &mut PathResolver,
) -> Result<CompressionJob, SkipNotice> {
    let skip = |reason: SkipReason| {
        warn!("Skipping {}: {}", source.display(), reason);
        SkipNotice::new(source, reason)
    };

    let kind = FileManager::media_kind(source).ok_or_else(|| skip(SkipReason::UnsupportedFormat))?;

    let size_before_kb = FileManager::file_size_kb(source)
        .await
        .map_err(|e| skip(SkipReason::Unreadable(e.to_string())))?;
    if size_before_kb == 0 {
        return Err(skip(SkipReason::ZeroByteSource));
    }

    let parameters = match kind {
        MediaKind::Image => JobParameters::Image {
            quality: config.quality,
            resize: config.resize,
        },
        MediaKind::Video => JobParameters::Video {
            crf: config.video_crf,
            resolution: config.video_resolution,
            bitrate: config.video_bitrate.clone(),
        },
    };

    let target = paths.output_path(source, kind);
    debug!("Planned {} job: {} -> {}", kind, source.display(), target.display());
    Ok(CompressionJob::new(source.to_path_buf(), target, parameters, size_before_kb))
}

/// Runs single jobs against the configured compressors
pub struct TaskCompressor<'a, I, V> {
    image: &'a I,
    video: &'a V,
    timeout: Option<Duration>,
}

impl<'a, I: ImageCompressor, V: VideoCompressor> TaskCompressor<'a, I, V> {
    pub fn new(image: &'a I, video: &'a V, timeout: Option<Duration>) -> Self {
        Self { image, video, timeout }
    }

    /// Compress one job. Failures and timeouts come back as a `CompressorFailure` skip.
    ///
    /// Only the output this job persisted is ever removed; a failed or timed out
    /// compressor leaves the target path untouched.
    pub async fn compress(&self, job: CompressionJob) -> Result<CompressionResult, SkipNotice> {
        let start = Instant::now();

        let outcome = match self.compress_output(&job).await {
            Ok(()) => self.measure_output(&job).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(size_after_kb) => {
                let result = CompressionResult::new(&job, size_after_kb);
                debug!(
                    "{}: {} KB -> {} KB ({:.2}% saved) in {:.2}s",
                    result.file_name,
                    result.size_before_kb,
                    result.size_after_kb,
                    result.percent_saved,
                    start.elapsed().as_secs_f64()
                );
                Ok(result)
            }
            Err(e) => {
                let reason = e.into_skip_reason();
                warn!("Skipping {}: {}", job.source_path().display(), reason);
                Err(SkipNotice::new(job.source_path(), reason))
            }
        }
    }

    /// Dispatch to the right compressor under the per-job timeout.
    ///
    /// Compressors persist their output as the last step before returning, so an
    /// expired timeout never leaves a persisted file behind.
    async fn compress_output(&self, job: &CompressionJob) -> Result<(), CompressError> {
        let dispatch = async {
            match job.media_kind() {
                MediaKind::Image => self.image.compress_image(job).await,
                MediaKind::Video => self.video.compress_video(job).await,
            }
        };

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, dispatch).await.unwrap_or_else(|_| {
                Err(CompressError::CompressorFailure(format!(
                    "timed out after {}s",
                    limit.as_secs()
                )))
            }),
            None => dispatch.await,
        }
    }

    /// Size of the persisted output in KB; an unreadable output is removed
    async fn measure_output(&self, job: &CompressionJob) -> Result<u64, CompressError> {
        match FileManager::file_size_kb(job.target_path()).await {
            Ok(size) => Ok(size),
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(job.target_path()).await {
                    debug!("Could not remove {}: {}", job.target_path().display(), remove_err);
                }
                Err(CompressError::CompressorFailure(format!("output not readable: {}", e)))
            }
        }
    }
}
