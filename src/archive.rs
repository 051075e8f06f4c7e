//! # Archive Module
//!
//! Raccoglie tutti gli output di un batch in un unico archivio zip.
//!
//! - Ogni file viene salvato con il solo base name (nessuna struttura di directory)
//! - L'ordine delle entry segue l'ordine dei path ricevuti (= ordine dei risultati)
//! - Base name duplicati sono un errore: il batch garantisce nomi univoci

use crate::error::CompressError;
use crate::file_manager::FileManager;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Cursor, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Build a zip archive in memory containing every path under its base name
pub fn create_archive(paths: &[PathBuf]) -> Result<Vec<u8>, CompressError> {
    let cursor = write_entries(paths, Cursor::new(Vec::new()))?;
    Ok(cursor.into_inner())
}

/// Build the archive and write it to `dest`
pub async fn write_archive(paths: &[PathBuf], dest: &Path) -> Result<u64, CompressError> {
    let entries = paths.len();
    let paths = paths.to_vec();
    let bytes = tokio::task::spawn_blocking(move || create_archive(&paths))
        .await
        .map_err(|e| CompressError::Io(io::Error::new(io::ErrorKind::Other, e)))??;

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(dest, &bytes).await?;

    info!(
        "Archive written: {} ({} entries, {})",
        dest.display(),
        entries,
        FileManager::format_size(bytes.len() as u64)
    );
    Ok(bytes.len() as u64)
}

fn write_entries<W: Write + Seek>(paths: &[PathBuf], sink: W) -> Result<W, CompressError> {
    let mut zip = ZipWriter::new(sink);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut seen = HashSet::new();

    for path in paths {
        let name = FileManager::file_name(path);
        if !seen.insert(name.clone()) {
            return Err(CompressError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("duplicate archive entry: {}", name),
            )));
        }

        debug!("Adding {} to archive as {}", path.display(), name);
        zip.start_file(name, options)?;
        let mut file = File::open(path)?;
        io::copy(&mut file, &mut zip)?;
    }

    Ok(zip.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn entry_names(bytes: Vec<u8>) -> Vec<String> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_entries_use_base_names_in_order() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("deep").join("er");
        std::fs::create_dir_all(&nested).unwrap();
        let b = nested.join("compressed_b.jpg");
        let a = dir.path().join("compressed_a.mp4");
        std::fs::write(&b, b"bbbb").unwrap();
        std::fs::write(&a, b"aaaa").unwrap();

        let bytes = create_archive(&[b, a]).unwrap();
        assert_eq!(entry_names(bytes), vec!["compressed_b.jpg", "compressed_a.mp4"]);
    }

    #[test]
    fn test_entry_contents_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("compressed_x.jpg");
        std::fs::write(&path, b"jpeg bytes").unwrap();

        let bytes = create_archive(&[path]).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut content = String::new();
        archive.by_name("compressed_x.jpg").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "jpeg bytes");
    }

    #[test]
    fn test_empty_archive_is_valid() {
        let bytes = create_archive(&[]).unwrap();
        assert!(entry_names(bytes).is_empty());
    }

    #[test]
    fn test_duplicate_and_missing_entries_fail() {
        let dir = TempDir::new().unwrap();
        let one = dir.path().join("a").join("same.jpg");
        let two = dir.path().join("b").join("same.jpg");
        for p in [&one, &two] {
            std::fs::create_dir_all(p.parent().unwrap()).unwrap();
            std::fs::write(p, b"x").unwrap();
        }
        assert!(create_archive(&[one, two]).is_err());
        assert!(create_archive(&[dir.path().join("missing.jpg")]).is_err());
    }

    #[tokio::test]
    async fn test_write_archive_to_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("compressed_a.jpg");
        std::fs::write(&path, b"data").unwrap();
        let dest = dir.path().join("bundle").join("compressed_files.zip");

        let written = write_archive(&[path], &dest).await.unwrap();
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), written);
        assert_eq!(entry_names(std::fs::read(&dest).unwrap()), vec!["compressed_a.jpg"]);
    }
}
