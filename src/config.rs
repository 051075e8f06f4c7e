//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di compressione
//! - Fornisce validazione dei parametri prima di toccare qualsiasi file
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `quality`: Qualità JPEG (10-100, default: 75)
//! - `resize`: Policy di resize immagini (default: off)
//! - `video_crf`: CRF video (0-51, default: 23, più basso = migliore qualità)
//! - `video_resolution`: Risoluzione video forzata, es. "1280x720" (opzionale)
//! - `video_bitrate`: Bitrate video target, es. "1000k" (opzionale)
//! - `output_dir`: Directory di output (default: "compressed")
//! - `output_prefix`: Prefisso dei file compressi (default: "compressed_")
//! - `archive_path`: Zip da creare a fine batch (opzionale)
//! - `ffmpeg_path`: Path esplicito di ffmpeg (opzionale, altrimenti discovery)
//! - `workers`: Job concorrenti (default: 1 = sequenziale)
//! - `job_timeout_secs`: Timeout per singolo file (default: 900)
//!
//! ## Validazione:
//! - Errori restituiti come `CompressError::InvalidConfig`
//! - Nessun file viene toccato se la validazione fallisce
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     quality: 60,
//!     video_crf: 28,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::error::CompressError;
use crate::resize::ResizePolicy;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const MIN_QUALITY: u8 = 10;
pub const MAX_QUALITY: u8 = 100;
pub const MAX_CRF: u8 = 51;

/// Forced output resolution for videos, written as `WIDTHxHEIGHT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Argument for ffmpeg's `scale` filter
    pub fn scale_filter(&self) -> String {
        format!("scale={}:{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(|c: char| c == 'x' || c == 'X')
            .ok_or_else(|| format!("resolution must look like 1280x720, got '{}'", s))?;
        let width: u32 = w.parse().map_err(|_| format!("invalid resolution width '{}'", w))?;
        let height: u32 = h.parse().map_err(|_| format!("invalid resolution height '{}'", h))?;
        if width == 0 || height == 0 {
            return Err(format!("resolution must be positive, got '{}'", s));
        }
        Ok(Self { width, height })
    }
}

impl TryFrom<String> for Resolution {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Configuration for a compression batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JPEG quality (10-100)
    pub quality: u8,
    /// Resize policy for images
    pub resize: ResizePolicy,
    /// Video CRF value (0-51, lower = better quality)
    pub video_crf: u8,
    /// Forced video resolution
    pub video_resolution: Option<Resolution>,
    /// Target video bitrate, e.g. "1000k"
    pub video_bitrate: Option<String>,
    /// Directory receiving compressed files
    pub output_dir: PathBuf,
    /// Prefix prepended to every output file name
    pub output_prefix: String,
    /// Write a zip of all outputs here when the batch ends
    pub archive_path: Option<PathBuf>,
    /// Explicit ffmpeg binary; discovered when unset
    pub ffmpeg_path: Option<PathBuf>,
    /// Number of files compressed concurrently
    pub workers: usize,
    /// Per-file timeout in seconds (None = no timeout)
    pub job_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quality: 75,
            resize: ResizePolicy::Off,
            video_crf: 23,
            video_resolution: None,
            video_bitrate: None,
            output_dir: PathBuf::from("compressed"),
            output_prefix: "compressed_".to_string(),
            archive_path: None,
            ffmpeg_path: None,
            workers: 1,
            job_timeout_secs: Some(900),
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), CompressError> {
        let invalid = |msg: String| Err(CompressError::InvalidConfig(msg));

        if !(MIN_QUALITY..=MAX_QUALITY).contains(&self.quality) {
            return invalid(format!(
                "quality must be between {} and {}, got {}",
                MIN_QUALITY, MAX_QUALITY, self.quality
            ));
        }

        if self.video_crf > MAX_CRF {
            return invalid(format!("video CRF must be between 0 and {}, got {}", MAX_CRF, self.video_crf));
        }

        self.resize.validate().map_err(CompressError::InvalidConfig)?;

        if let Some(ref bitrate) = self.video_bitrate {
            if !is_valid_bitrate(bitrate) {
                return invalid(format!("video bitrate must look like 1000k or 2M, got '{}'", bitrate));
            }
        }

        if self.workers == 0 {
            return invalid("number of workers must be greater than 0".to_string());
        }

        if self.job_timeout_secs == Some(0) {
            return invalid("job timeout must be greater than 0 seconds".to_string());
        }

        if self.output_dir.as_os_str().is_empty() {
            return invalid("output directory must not be empty".to_string());
        }
        if self.output_dir.exists() && !self.output_dir.is_dir() {
            return invalid(format!("output path is not a directory: {}", self.output_dir.display()));
        }

        if self.output_prefix.contains(&['/', '\\'][..]) {
            return invalid(format!("output prefix must not contain path separators: '{}'", self.output_prefix));
        }

        Ok(())
    }

    /// Per-file timeout as a `Duration`
    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }

    /// Default config location (`<config dir>/media-compressor/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("media-compressor").join("config.json"))
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

/// Bitrate accepted by ffmpeg `-b:v`: digits with an optional k/K/m/M suffix
fn is_valid_bitrate(value: &str) -> bool {
    let digits = value.trim_end_matches(&['k', 'K', 'm', 'M'][..]);
    let suffix_len = value.len() - digits.len();
    !digits.is_empty() && suffix_len <= 1 && digits.chars().all(|c| c.is_ascii_digit()) && digits != "0"
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.quality = 9;
        assert!(matches!(config.validate(), Err(CompressError::InvalidConfig(_))));

        config.quality = 101;
        assert!(config.validate().is_err());

        config.quality = 10;
        assert!(config.validate().is_ok());

        config.video_crf = 52;
        assert!(config.validate().is_err());

        config.video_crf = 23;
        config.workers = 0;
        assert!(config.validate().is_err());

        config.workers = 2;
        config.job_timeout_secs = Some(0);
        assert!(config.validate().is_err());

        config.job_timeout_secs = None;
        config.resize = ResizePolicy::Exact { width: 0, height: 600 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.quality, 75);
        assert_eq!(config.video_crf, 23);
        assert_eq!(config.resize, ResizePolicy::Off);
        assert_eq!(config.output_prefix, "compressed_");
        assert_eq!(config.workers, 1);
        assert_eq!(config.job_timeout(), Some(Duration::from_secs(900)));
    }

    #[test]
    fn test_output_dir_must_be_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not_a_dir");
        std::fs::write(&file, b"x").unwrap();

        let config = Config {
            output_dir: file,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bitrate_format() {
        for ok in ["1000k", "2M", "800000", "1500K"] {
            assert!(is_valid_bitrate(ok), "{} should be accepted", ok);
        }
        for bad in ["", "k", "fast", "10kk", "1.5M", "0"] {
            assert!(!is_valid_bitrate(bad), "{} should be rejected", bad);
        }

        let config = Config {
            video_bitrate: Some("lots".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolution_parsing() {
        let res: Resolution = "1280x720".parse().unwrap();
        assert_eq!(res, Resolution { width: 1280, height: 720 });
        assert_eq!(res.scale_filter(), "scale=1280:720");
        assert_eq!(res.to_string(), "1280x720");

        assert!("1280".parse::<Resolution>().is_err());
        assert!("0x720".parse::<Resolution>().is_err());
        assert!("widexhigh".parse::<Resolution>().is_err());
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let original_config = Config {
            quality: 60,
            resize: ResizePolicy::Scale { percent: 50 },
            video_crf: 28,
            video_resolution: Some(Resolution { width: 640, height: 480 }),
            video_bitrate: Some("800k".to_string()),
            workers: 3,
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.quality, 60);
        assert_eq!(loaded_config.resize, ResizePolicy::Scale { percent: 50 });
        assert_eq!(loaded_config.video_crf, 28);
        assert_eq!(loaded_config.video_resolution, Some(Resolution { width: 640, height: 480 }));
        assert_eq!(loaded_config.video_bitrate.as_deref(), Some("800k"));
        assert_eq!(loaded_config.workers, 3);
    }

    #[tokio::test]
    async fn test_missing_file_yields_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_file(&temp_dir.path().join("absent.json")).await.unwrap();
        assert_eq!(config.quality, 75);
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{ "quality": 40, "video_resolution": "1920x1080" }"#).unwrap();

        let config = Config::from_file(&path).await.unwrap();
        assert_eq!(config.quality, 40);
        assert_eq!(config.video_resolution, Some(Resolution { width: 1920, height: 1080 }));
        assert_eq!(config.video_crf, 23);
    }

    #[tokio::test]
    async fn test_invalid_file_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{ "quality": 5 }"#).unwrap();
        assert!(Config::from_file(&path).await.is_err());
    }
}
