//! # File Management Module
//!
//! Questo modulo gestisce le operazioni sui file e la classificazione dei media.
//!
//! ## Responsabilità:
//! - Classificazione file per estensione (immagine vs video), case-insensitive
//! - Dimensione file in KB (floor di bytes / 1024)
//! - Calcolo percentuale risparmiata arrotondata a 2 decimali
//! - Espansione degli input: le directory diventano la lista dei media contenuti
//! - Formattazione human-readable delle dimensioni
//!
//! ## Formati supportati:
//! - **Immagini**: JPG, JPEG, PNG
//! - **Video**: MP4, AVI
//!
//! ## Esempio:
//! ```rust,ignore
//! let files = FileManager::expand_inputs(&[PathBuf::from("/path/to/media")]);
//! for file in files {
//!     match FileManager::media_kind(&file) {
//!         Some(MediaKind::Image) => { /* compress image */ }
//!         Some(MediaKind::Video) => { /* compress video */ }
//!         None => { /* skip */ }
//!     }
//! }
//! ```

use crate::job::MediaKind;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi"];

/// Manages file classification and size bookkeeping
pub struct FileManager;

impl FileManager {
    /// Size of a file in whole kilobytes (rounded down)
    pub async fn file_size_kb(path: &Path) -> Result<u64> {
        let metadata = fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(anyhow::anyhow!("not a regular file: {}", path.display()));
        }
        Ok(metadata.len() / 1024)
    }

    /// Classify a file by extension
    pub fn media_kind(path: &Path) -> Option<MediaKind> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    /// Check if a file format is supported
    pub fn is_supported_format(path: &Path) -> bool {
        Self::media_kind(path).is_some()
    }

    /// Expand CLI inputs: files are kept as given (supported or not), directories
    /// are walked recursively and contribute their supported media in sorted order.
    pub fn expand_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for input in inputs {
            if input.is_dir() {
                let mut found: Vec<PathBuf> = WalkDir::new(input)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                    .map(|e| e.into_path())
                    .filter(|p| Self::is_supported_format(p))
                    .collect();
                found.sort();
                files.extend(found);
            } else {
                files.push(input.clone());
            }
        }

        files
    }

    /// Base name of a path as a display string
    pub fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Percentage saved, rounded to 2 decimals. `None` when `before` is zero.
    pub fn percent_saved(before: u64, after: u64) -> Option<f64> {
        if before == 0 {
            return None;
        }
        let raw = (before as f64 - after as f64) / before as f64 * 100.0;
        Some((raw * 100.0).round() / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_media_kind_case_insensitive() {
        assert_eq!(FileManager::media_kind(Path::new("a.JPG")), Some(MediaKind::Image));
        assert_eq!(FileManager::media_kind(Path::new("a.jpeg")), Some(MediaKind::Image));
        assert_eq!(FileManager::media_kind(Path::new("a.Png")), Some(MediaKind::Image));
        assert_eq!(FileManager::media_kind(Path::new("b.MP4")), Some(MediaKind::Video));
        assert_eq!(FileManager::media_kind(Path::new("b.avi")), Some(MediaKind::Video));
        assert_eq!(FileManager::media_kind(Path::new("doc.txt")), None);
        assert_eq!(FileManager::media_kind(Path::new("clip.mkv")), None);
        assert_eq!(FileManager::media_kind(Path::new("noext")), None);
    }

    #[test]
    fn test_percent_saved() {
        assert_eq!(FileManager::percent_saved(2048, 1024), Some(50.0));
        assert_eq!(FileManager::percent_saved(3, 2), Some(33.33));
        assert_eq!(FileManager::percent_saved(3, 1), Some(66.67));
        assert_eq!(FileManager::percent_saved(100, 150), Some(-50.0));
        assert_eq!(FileManager::percent_saved(0, 0), None);
        assert_eq!(FileManager::percent_saved(0, 10), None);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(FileManager::format_size(512), "512 B");
        assert_eq!(FileManager::format_size(2048), "2.00 KB");
        assert_eq!(FileManager::format_size(10 * 1024 * 1024), "10.00 MB");
    }

    #[tokio::test]
    async fn test_file_size_kb_floors() {
        let dir = TempDir::new().unwrap();
        let small = dir.path().join("small.png");
        std::fs::write(&small, vec![0u8; 1023]).unwrap();
        let big = dir.path().join("big.png");
        std::fs::write(&big, vec![0u8; 2 * 1024 + 1000]).unwrap();

        assert_eq!(FileManager::file_size_kb(&small).await.unwrap(), 0);
        assert_eq!(FileManager::file_size_kb(&big).await.unwrap(), 2);
        assert!(FileManager::file_size_kb(&dir.path().join("missing.png")).await.is_err());
        assert!(FileManager::file_size_kb(dir.path()).await.is_err());
    }

    #[test]
    fn test_expand_inputs() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::write(nested.join("a.mp4"), b"x").unwrap();

        let explicit = PathBuf::from("/somewhere/doc.txt");
        let files = FileManager::expand_inputs(&[explicit.clone(), dir.path().to_path_buf()]);

        assert_eq!(files.len(), 3);
        assert_eq!(files[0], explicit);
        assert_eq!(files[1], dir.path().join("b.jpg"));
        assert_eq!(files[2], nested.join("a.mp4"));
    }
}
