//! # Image Resize Policy Module
//!
//! Questo modulo definisce la policy di ridimensionamento applicata alle immagini
//! prima della ricodifica JPEG.
//!
//! ## Modalità disponibili:
//! - **Off**: Nessun resize, dimensioni originali
//! - **Exact**: Forza dimensioni esatte `width x height` (aspect ratio non preservato)
//! - **Scale**: Scala entrambi i lati di una percentuale (es. 50 = metà risoluzione)
//!
//! ## Filtro:
//! - Lanczos3 per il miglior risultato in downscaling
//!
//! ## Esempio:
//! ```rust,ignore
//! let policy = ResizePolicy::Scale { percent: 50 };
//! assert_eq!(policy.target_dimensions(4000, 3000), Some((2000, 1500)));
//! ```

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

/// How images are resized before encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResizePolicy {
    /// Keep original dimensions
    #[default]
    Off,
    /// Force exact output dimensions
    Exact { width: u32, height: u32 },
    /// Scale both sides by a percentage of the original
    Scale { percent: u32 },
}

impl ResizePolicy {
    /// Filter used for every resize
    pub const FILTER: FilterType = FilterType::Lanczos3;

    /// Compute the output dimensions for an image of `width x height`.
    ///
    /// Returns `None` when no resize is needed.
    pub fn target_dimensions(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        let target = match *self {
            ResizePolicy::Off => return None,
            ResizePolicy::Exact { width, height } => (width, height),
            ResizePolicy::Scale { percent } => {
                let scale = |side: u32| ((side as u64 * percent as u64) / 100).max(1) as u32;
                (scale(width), scale(height))
            }
        };

        if target == (width, height) {
            None
        } else {
            Some(target)
        }
    }

    /// Validate the policy parameters
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            ResizePolicy::Off => Ok(()),
            ResizePolicy::Exact { width, height } => {
                if width == 0 || height == 0 {
                    Err(format!("resize dimensions must be positive, got {}x{}", width, height))
                } else {
                    Ok(())
                }
            }
            ResizePolicy::Scale { percent } => {
                if percent == 0 || percent > 100 {
                    Err(format!("resize percent must be between 1 and 100, got {}", percent))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Short description for logging
    pub fn describe(&self) -> String {
        match *self {
            ResizePolicy::Off => "off".to_string(),
            ResizePolicy::Exact { width, height } => format!("exact {}x{}", width, height),
            ResizePolicy::Scale { percent } => format!("scale {}%", percent),
        }
    }
}
