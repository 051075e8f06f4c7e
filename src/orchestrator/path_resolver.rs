//! # Path Resolver Module
//!
//! Logica centralizzata per il calcolo dei path di output.
//! Tutti gli output finiscono flat nella directory di output (niente sottocartelle),
//! quindi i nomi devono essere univoci all'interno del batch: lo zip usa il base name.

use crate::job::MediaKind;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Hands out output paths for one batch
#[derive(Debug)]
pub struct PathResolver {
    output_dir: PathBuf,
    prefix: String,
    /// Lowercased names already assigned (case-insensitive filesystems)
    taken: HashSet<String>,
    /// Canonical output directory, used to compare candidates with the sources
    resolved_dir: PathBuf,
    /// Lowercased canonical paths of the submitted files; never used as outputs
    sources: HashSet<String>,
}

impl PathResolver {
    /// `sources` are the files submitted to the batch: no output may overwrite one of them
    pub fn new(output_dir: &Path, prefix: &str, sources: &[PathBuf]) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            prefix: prefix.to_string(),
            taken: HashSet::new(),
            resolved_dir: canonical(output_dir),
            sources: sources.iter().map(|p| path_key(&canonical(p))).collect(),
        }
    }

    /// Output path for `source`: `<output_dir>/<prefix><stem>.<ext>`, with `_N`
    /// appended to the stem when the name was already handed out in this batch
    /// or belongs to one of the submitted files
    pub fn output_path(&mut self, source: &Path, kind: MediaKind) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "output".to_string());
        let ext = kind.output_extension();

        let mut name = format!("{}{}.{}", self.prefix, stem, ext);
        let mut counter = 1;
        while !self.is_free(&name) {
            name = format!("{}{}_{}.{}", self.prefix, stem, counter, ext);
            counter += 1;
        }
        self.taken.insert(name.to_lowercase());

        self.output_dir.join(name)
    }

    fn is_free(&self, name: &str) -> bool {
        !self.taken.contains(&name.to_lowercase())
            && !self.sources.contains(&path_key(&self.resolved_dir.join(name)))
    }
}

/// Canonical form when the path exists, the path itself otherwise
fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}
