//! # Image Processing Module
//!
//! Questo modulo gestisce la compressione delle immagini tramite la crate `image`.
//!
//! ## Pipeline di compressione
//!
//! 1. **Decodifica**: Formato rilevato dai magic bytes (non solo dall'estensione)
//! 2. **Resize**: Applica la `ResizePolicy` configurata (Lanczos3)
//! 3. **Colorspace**: Conversione forzata a RGB (alpha e palette vengono appiattiti)
//! 4. **Encoding**: JPEG con la qualità richiesta, nessun metadata copiato
//! 5. **Scrittura atomica**: File temporaneo nella directory di output, rinominato solo a successo
//!
//! ## Concorrenza
//!
//! - Decodifica ed encoding sono CPU-bound: girano nel blocking pool di tokio
//! - Se il job viene abbandonato (timeout/cancellazione) il file temporaneo viene rimosso
//!
//! ## Formati Supportati
//!
//! | Formato | Input | Output |
//! |---------|-------|--------|
//! | JPEG    | ✅    | ✅     |
//! | PNG     | ✅    | ❌ (ricodificato in JPEG) |
//!
//! ## Esempio
//!
//! ```rust,ignore
//! let processor = ImageProcessor::new();
//! processor.compress_image(&job).await?;
//! ```

use crate::error::CompressError;
use crate::job::{CompressionJob, JobParameters};
use crate::resize::ResizePolicy;
use image::codecs::jpeg::JpegEncoder;
use image::io::Reader as ImageReader;
use image::ColorType;
use std::future::Future;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Seam for the image compressor so the orchestrator can be driven by any implementation
pub trait ImageCompressor: Send + Sync {
    /// Compress `job.source_path()` into `job.target_path()`.
    ///
    /// On error no file is left at the target path.
    fn compress_image(&self, job: &CompressionJob) -> impl Future<Output = Result<(), CompressError>> + Send;
}

/// Image compressor backed by the `image` crate
#[derive(Debug, Clone, Default)]
pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Decode `input`, apply `resize`, flatten to RGB and write a JPEG to `writer`.
    ///
    /// Returns the encoded dimensions.
    pub fn encode_jpeg<W: Write>(
        input: &Path,
        quality: u8,
        resize: ResizePolicy,
        mut writer: W,
    ) -> Result<(u32, u32), CompressError> {
        let img = ImageReader::open(input)?.with_guessed_format()?.decode()?;

        let img = match resize.target_dimensions(img.width(), img.height()) {
            Some((width, height)) => {
                debug!(
                    "Resizing {} from {}x{} to {}x{}",
                    input.display(),
                    img.width(),
                    img.height(),
                    width,
                    height
                );
                img.resize_exact(width, height, ResizePolicy::FILTER)
            }
            None => img,
        };

        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();

        JpegEncoder::new_with_quality(&mut writer, quality).encode(rgb.as_raw(), width, height, ColorType::Rgb8)?;
        writer.flush()?;

        Ok((width, height))
    }
}

impl ImageCompressor for ImageProcessor {
    async fn compress_image(&self, job: &CompressionJob) -> Result<(), CompressError> {
        let (quality, resize) = match job.parameters() {
            JobParameters::Image { quality, resize } => (*quality, *resize),
            JobParameters::Video { .. } => {
                return Err(CompressError::CompressorFailure(format!(
                    "{} is not an image job",
                    job.file_name()
                )))
            }
        };

        let target = job.target_path();
        let output_dir = target.parent().unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(output_dir).await?;

        // dropped (and deleted) unless persisted below
        let temp = tempfile::Builder::new()
            .prefix(".compressing-")
            .suffix(".jpg")
            .tempfile_in(output_dir)?;
        let file = temp.reopen()?;

        let source = job.source_path().to_path_buf();
        let (width, height) = tokio::task::spawn_blocking(move || {
            Self::encode_jpeg(&source, quality, resize, BufWriter::new(file))
        })
        .await
        .map_err(|e| CompressError::CompressorFailure(format!("image worker failed: {}", e)))??;

        temp.persist(target).map_err(|e| CompressError::Io(e.error))?;

        debug!(
            "Encoded {} -> {} ({}x{}, quality {})",
            job.source_path().display(),
            target.display(),
            width,
            height,
            quality
        );
        Ok(())
    }
}
