//! Tag application.
//!
//! The pipeline hands a directory of FLAC files, the assignments from
//! `tags.yml` and a conversion dictionary to a [`TagWriter`]. The writer logs
//! what it does to the stage log it is lent for the duration of the call.
//!
//! ```text
//! tags.yml ──┐
//!            ├── resolve_file_tags() ──► [(NAME, [values])] ──► FlacTagWriter
//! convert.yml┘
//! ```

mod flac;
mod resolve;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::logging::StageLog;
use crate::models::{ConversionDictionary, TagList};

pub use flac::FlacTagWriter;
pub use resolve::{resolve_file_tags, track_number, ResolvedTags};

/// Errors from applying tags.
#[derive(Error, Debug)]
pub enum TagError {
    #[error("Failed to list {dir}: {source}")]
    ListFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write tags to {path}: {message}")]
    WriteFailed { path: PathBuf, message: String },
}

/// Summary of one tag application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagReport {
    /// Files whose tags were rewritten, in order.
    pub files: Vec<PathBuf>,
    /// Total tag values written across all files.
    pub values_written: usize,
    /// Source spellings not found in the dictionary (sorted, unique).
    pub unknown_names: Vec<String>,
    /// Target names that are not valid Vorbis comment field names and were
    /// not written (sorted, unique).
    pub invalid_names: Vec<String>,
}

/// Applies tag assignments to every audio file in a directory.
pub trait TagWriter: Send + Sync {
    /// Apply `tags` to the files in `dir`, translating tag names through
    /// `dictionary`. Progress and warnings go to `log`.
    fn apply(
        &self,
        dir: &Path,
        tags: &TagList,
        dictionary: &ConversionDictionary,
        log: &StageLog,
    ) -> Result<TagReport, TagError>;
}

/// FLAC files directly inside `dir`, sorted by name.
pub fn list_flac_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_flac = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().ends_with(".flac"));

        if is_flac && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn lists_flac_files_sorted() {
        let dir = tempdir().unwrap();
        for name in ["02.flac", "01.flac", "folder.jpg", "shnsplit.log", "10.flac"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("sub.flac")).unwrap();

        let files = list_flac_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["01.flac", "02.flac", "10.flac"]);
    }

    #[test]
    fn listing_missing_dir_fails() {
        let dir = tempdir().unwrap();
        assert!(list_flac_files(&dir.path().join("missing")).is_err());
    }
}
