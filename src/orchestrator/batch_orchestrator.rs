//! # Batch Orchestrator
//!
//! Orchestratore principale: valida la configurazione, verifica ffmpeg,
//! prepara i job nell'ordine di sottomissione e li esegue con concorrenza limitata.
//!
//! ## Garanzie
//! - Controlli fatali (file vuoti, config, ffmpeg) prima di toccare qualsiasi file
//! - Risultati, skip e progress sempre nell'ordine di sottomissione, anche con `workers > 1`
//! - Un file che fallisce non interrompe mai il batch
//! - La cancellazione conserva i risultati già completati
//!
//! ## Esempio
//! ```rust,ignore
//! let (stop_sender, stop_receiver) = create_cancellation_channel();
//! let mut orchestrator = BatchOrchestrator::new(config).with_cancellation(stop_receiver);
//! let outcome = orchestrator.run_batch(&files, &mut progress).await?;
//! ```

use crate::config::Config;
use crate::error::CompressError;
use crate::image_processor::{ImageCompressor, ImageProcessor};
use crate::job::BatchOutcome;
use crate::orchestrator::path_resolver::PathResolver;
use crate::orchestrator::progress_tracker::ProgressTracker;
use crate::orchestrator::task_compressor::{prepare_job, TaskCompressor};
use crate::progress::{CompressionStats, FileEvent, ProgressReporter};
use crate::video_processor::{VideoCompressor, VideoProcessor};
use futures::StreamExt;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Create the stop channel used to cancel a running batch
pub fn create_cancellation_channel() -> (broadcast::Sender<()>, broadcast::Receiver<()>) {
    broadcast::channel(1)
}

/// Runs batches of compression jobs
pub struct BatchOrchestrator<I = ImageProcessor, V = VideoProcessor> {
    config: Config,
    image: I,
    video: V,
    stop_receiver: Option<broadcast::Receiver<()>>,
}

impl BatchOrchestrator<ImageProcessor, VideoProcessor> {
    /// Orchestrator backed by the `image` crate and ffmpeg
    pub fn new(config: Config) -> Self {
        let video = VideoProcessor::new(config.ffmpeg_path.clone());
        Self::with_compressors(config, ImageProcessor::new(), video)
    }
}

impl<I: ImageCompressor, V: VideoCompressor> BatchOrchestrator<I, V> {
    pub fn with_compressors(config: Config, image: I, video: V) -> Self {
        Self {
            config,
            image,
            video,
            stop_receiver: None,
        }
    }

    /// Attach a stop channel; a message on it cancels the running batch
    pub fn with_cancellation(mut self, stop_receiver: broadcast::Receiver<()>) -> Self {
        self.stop_receiver = Some(stop_receiver);
        self
    }

    /// Compress `files` in order, reporting progress after every file.
    ///
    /// Only fatal conditions (no files, invalid config, missing ffmpeg, output
    /// directory not creatable) return an error; per-file problems end up in
    /// `BatchOutcome::skipped`.
    pub async fn run_batch<R: ProgressReporter + ?Sized>(
        &mut self,
        files: &[PathBuf],
        reporter: &mut R,
    ) -> Result<BatchOutcome, CompressError> {
        let start_time = std::time::Instant::now();
        let Self {
            config,
            image,
            video,
            stop_receiver,
        } = self;

        if files.is_empty() {
            return Err(CompressError::InvalidConfig("no input files were given".to_string()));
        }
        config.validate()?;
        if let Err(e) = video.ensure_available().await {
            error!("Video compressor unavailable: {}", e);
            return Err(e);
        }
        tokio::fs::create_dir_all(&config.output_dir).await?;

        log_configuration(config, files.len());

        // Jobs are planned sequentially so output names follow submission order
        let mut paths = PathResolver::new(&config.output_dir, &config.output_prefix, files);
        let mut planned = Vec::with_capacity(files.len());
        for file in files {
            planned.push(prepare_job(file, config, &mut paths).await);
        }

        let task = TaskCompressor::new(&*image, &*video, config.job_timeout());
        let task = &task;
        let stream = futures::stream::iter(planned)
            .map(move |entry| async move {
                match entry {
                    Ok(job) => task.compress(job).await,
                    Err(notice) => Err(notice),
                }
            })
            .buffered(config.workers);
        let mut stream = std::pin::pin!(stream);

        let mut tracker = ProgressTracker::new(files.len(), reporter);
        let mut outcome = BatchOutcome::default();

        loop {
            let next = tokio::select! {
                biased;
                _ = wait_for_stop(stop_receiver) => {
                    warn!(
                        "Batch cancelled after {}/{} files",
                        tracker.processed(),
                        files.len()
                    );
                    outcome.cancelled = true;
                    break;
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(result)) => {
                    outcome.record_result(result.clone());
                    tracker.record(FileEvent::Compressed(result));
                }
                Some(Err(notice)) => {
                    outcome.record_skip(notice.clone());
                    tracker.record(FileEvent::Skipped(notice));
                }
                None => break,
            }
        }

        let stats = CompressionStats::from_outcome(&outcome);
        info!(
            "{} in {:.2}s",
            stats.format_summary(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(outcome)
    }
}

/// Resolves when a stop message arrives; never resolves without a live channel
async fn wait_for_stop(stop_receiver: &mut Option<broadcast::Receiver<()>>) {
    loop {
        let closed = match stop_receiver.as_mut() {
            Some(receiver) => matches!(
                receiver.recv().await,
                Err(broadcast::error::RecvError::Closed)
            ),
            None => return std::future::pending().await,
        };

        if !closed {
            return;
        }
        debug!("Stop channel closed, cancellation disabled");
        *stop_receiver = None;
    }
}

fn log_configuration(config: &Config, total: usize) {
    info!("Starting batch of {} files", total);
    info!("Output directory: {}", config.output_dir.display());
    info!(
        "Images: JPEG quality {} (resize: {})",
        config.quality,
        config.resize.describe()
    );

    let mut video = format!("Video: libx264 CRF {}", config.video_crf);
    if let Some(resolution) = config.video_resolution {
        video.push_str(&format!(", resolution {}", resolution));
    }
    if let Some(ref bitrate) = config.video_bitrate {
        video.push_str(&format!(", bitrate {}", bitrate));
    }
    info!("{}", video);

    if config.workers > 1 {
        info!("Workers: {}", config.workers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::CompressionJob;
    use crate::progress::ProgressUpdate;
    use tempfile::TempDir;

    struct CopyImage;

    impl ImageCompressor for CopyImage {
        async fn compress_image(&self, job: &CompressionJob) -> Result<(), CompressError> {
            tokio::fs::copy(job.source_path(), job.target_path()).await?;
            Ok(())
        }
    }

    struct NoVideo {
        available: bool,
    }

    impl VideoCompressor for NoVideo {
        async fn ensure_available(&self) -> Result<(), CompressError> {
            if self.available {
                Ok(())
            } else {
                Err(CompressError::ExternalToolUnavailable("ffmpeg not found".to_string()))
            }
        }

        async fn compress_video(&self, _job: &CompressionJob) -> Result<(), CompressError> {
            Err(CompressError::CompressorFailure("no video support".to_string()))
        }
    }

    fn config_in(dir: &TempDir) -> Config {
        Config {
            output_dir: dir.path().join("out"),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_entry_checks() {
        let dir = TempDir::new().unwrap();
        let mut ignore = |_: &ProgressUpdate| {};

        let mut orchestrator =
            BatchOrchestrator::with_compressors(config_in(&dir), CopyImage, NoVideo { available: true });
        let err = orchestrator.run_batch(&[], &mut ignore).await.unwrap_err();
        assert!(matches!(err, CompressError::InvalidConfig(_)));

        let bad = Config {
            quality: 5,
            ..config_in(&dir)
        };
        let mut orchestrator = BatchOrchestrator::with_compressors(bad, CopyImage, NoVideo { available: true });
        let err = orchestrator
            .run_batch(&[dir.path().join("a.jpg")], &mut ignore)
            .await
            .unwrap_err();
        assert!(matches!(err, CompressError::InvalidConfig(_)));

        let mut orchestrator =
            BatchOrchestrator::with_compressors(config_in(&dir), CopyImage, NoVideo { available: false });
        let err = orchestrator
            .run_batch(&[dir.path().join("a.jpg")], &mut ignore)
            .await
            .unwrap_err();
        assert!(matches!(err, CompressError::ExternalToolUnavailable(_)));

        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_video_failure_is_skipped() {
        let dir = TempDir::new().unwrap();
        let photo = dir.path().join("photo.jpg");
        let clip = dir.path().join("clip.avi");
        std::fs::write(&photo, vec![7u8; 2048]).unwrap();
        std::fs::write(&clip, vec![7u8; 4096]).unwrap();

        let mut fractions = Vec::new();
        let mut reporter = |u: &ProgressUpdate| fractions.push(u.fraction);
        let mut orchestrator =
            BatchOrchestrator::with_compressors(config_in(&dir), CopyImage, NoVideo { available: true });
        let outcome = orchestrator
            .run_batch(&[photo, clip], &mut reporter)
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].file_name, "photo.jpg");
        assert_eq!(outcome.results[0].percent_saved, 0.0);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].file_name, "clip.avi");
        assert_eq!(outcome.outputs, vec![dir.path().join("out").join("compressed_photo.jpg")]);
        assert!(!outcome.cancelled);
        assert_eq!(fractions, vec![0.5, 1.0]);
    }

    #[tokio::test]
    async fn test_stop_before_start_cancels() {
        let dir = TempDir::new().unwrap();
        let photo = dir.path().join("photo.jpg");
        std::fs::write(&photo, vec![7u8; 2048]).unwrap();

        let (stop_sender, stop_receiver) = create_cancellation_channel();
        let mut orchestrator =
            BatchOrchestrator::with_compressors(config_in(&dir), CopyImage, NoVideo { available: true })
                .with_cancellation(stop_receiver);
        stop_sender.send(()).unwrap();

        let mut ignore = |_: &ProgressUpdate| {};
        let outcome = orchestrator.run_batch(&[photo], &mut ignore).await.unwrap();
        assert!(outcome.cancelled);
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_sender_does_not_cancel() {
        let dir = TempDir::new().unwrap();
        let photo = dir.path().join("photo.jpg");
        std::fs::write(&photo, vec![7u8; 2048]).unwrap();

        let (stop_sender, stop_receiver) = create_cancellation_channel();
        drop(stop_sender);
        let mut orchestrator =
            BatchOrchestrator::with_compressors(config_in(&dir), CopyImage, NoVideo { available: true })
                .with_cancellation(stop_receiver);

        let mut ignore = |_: &ProgressUpdate| {};
        let outcome = orchestrator.run_batch(&[photo], &mut ignore).await.unwrap();
        assert!(!outcome.cancelled);
        assert_eq!(outcome.results.len(), 1);
    }
}
