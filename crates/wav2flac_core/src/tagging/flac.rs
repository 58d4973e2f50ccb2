//! Vorbis comment writer for FLAC files, backed by `lofty`.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use lofty::config::{ParseOptions, WriteOptions};
use lofty::file::AudioFile;
use lofty::flac::FlacFile;
use lofty::ogg::VorbisComments;
use lofty::tag::TagExt;

use super::resolve::{resolve_file_tags, track_number, ResolvedTags};
use super::{list_flac_files, TagError, TagReport, TagWriter};
use crate::logging::StageLog;
use crate::models::{ConversionDictionary, TagList};

/// Whether `key` may be used as a Vorbis comment field name.
///
/// Field names are non-empty printable ASCII from 0x20 to 0x7D, without `=`.
pub fn is_valid_vorbis_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| (0x20..=0x7D).contains(&b) && b != b'=')
}

/// Vendor string of the file's current comment block, if it can be read.
fn existing_vendor(path: &Path) -> Option<String> {
    let mut file = File::open(path).ok()?;
    let flac = FlacFile::read_from(&mut file, ParseOptions::new().read_properties(false)).ok()?;
    flac.vorbis_comments().map(|c| c.vendor().to_string())
}

/// Replaces the Vorbis comment block of every `*.flac` file in a directory.
///
/// Existing comments are discarded; each file ends up with exactly the tags
/// resolved for its track number. The encoder's vendor string is kept.
#[derive(Debug, Clone, Default)]
pub struct FlacTagWriter;

impl FlacTagWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write `tags` to `path`. Keys must already be valid field names.
    fn write_file(&self, path: &Path, tags: &ResolvedTags) -> Result<usize, TagError> {
        let mut comments = VorbisComments::default();
        if let Some(vendor) = existing_vendor(path) {
            comments.set_vendor(vendor);
        }

        let mut written = 0;
        for (key, values) in tags {
            for value in values {
                comments.push(key.clone(), value.clone());
                written += 1;
            }
        }

        comments
            .save_to_path(path, WriteOptions::default())
            .map_err(|e| TagError::WriteFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Ok(written)
    }
}

impl TagWriter for FlacTagWriter {
    fn apply(
        &self,
        dir: &Path,
        tags: &TagList,
        dictionary: &ConversionDictionary,
        log: &StageLog,
    ) -> Result<TagReport, TagError> {
        let files = list_flac_files(dir).map_err(|source| TagError::ListFailed {
            dir: dir.to_path_buf(),
            source,
        })?;

        if files.is_empty() {
            log.warn(&format!("No FLAC files in {}", dir.display()));
            return Ok(TagReport::default());
        }

        log.info(&format!(
            "Applying {} assignment(s) to {} file(s)",
            tags.assignments.len(),
            files.len()
        ));

        let mut unknown = BTreeSet::new();
        let mut invalid = BTreeSet::new();
        let mut report = TagReport::default();

        for path in files {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let (resolved, rejected): (ResolvedTags, ResolvedTags) =
                resolve_file_tags(track_number(&path), tags, dictionary, &mut unknown)
                    .into_iter()
                    .partition(|(key, _)| is_valid_vorbis_key(key));

            for (key, values) in &resolved {
                log.debug(&format!("{}: {}={}", file_name, key, values.join("; ")));
            }
            invalid.extend(rejected.into_iter().map(|(key, _)| key));

            let written = match self.write_file(&path, &resolved) {
                Ok(written) => written,
                Err(e) => {
                    log.error(&e.to_string());
                    return Err(e);
                }
            };

            log.info(&format!("{}: wrote {} tag value(s)", file_name, written));

            report.values_written += written;
            report.files.push(path);
        }

        for name in &unknown {
            let key = name.to_uppercase();
            if !invalid.contains(&key) {
                log.warn(&format!(
                    "Tag name not in conversion dictionary, written as {}: {}",
                    key, name
                ));
            }
        }

        for key in &invalid {
            log.warn(&format!(
                "Tag name is not a valid Vorbis comment field, not written: {}",
                key
            ));
        }

        report.unknown_names = unknown.into_iter().collect();
        report.invalid_names = invalid.into_iter().collect();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LineFormat;
    use crate::models::TagAssignment;
    use std::fs;
    use tempfile::tempdir;

    const VENDOR: &str = "reference libFLAC 1.4.3 20230623";

    /// Smallest stream lofty accepts: STREAMINFO, a comment block holding
    /// only a vendor string and one old comment, then padding.
    fn minimal_flac() -> Vec<u8> {
        let mut bytes = b"fLaC".to_vec();

        bytes.extend([0x00, 0x00, 0x00, 34]);
        bytes.extend(4096u16.to_be_bytes());
        bytes.extend(4096u16.to_be_bytes());
        bytes.extend([0u8; 6]);
        let packed: u64 = (44_100 << 44) | (1 << 41) | (15 << 36);
        bytes.extend(packed.to_be_bytes());
        bytes.extend([0u8; 16]);

        let old = b"COMMENT=old";
        let mut comment = Vec::new();
        comment.extend((VENDOR.len() as u32).to_le_bytes());
        comment.extend(VENDOR.as_bytes());
        comment.extend(1u32.to_le_bytes());
        comment.extend((old.len() as u32).to_le_bytes());
        comment.extend(old);
        let len = (comment.len() as u32).to_be_bytes();
        bytes.extend([0x04, len[1], len[2], len[3]]);
        bytes.extend(comment);

        bytes.extend([0x81, 0x00, 0x00, 0x04, 0, 0, 0, 0]);
        bytes
    }

    fn read_comments(path: &Path) -> VorbisComments {
        let mut file = File::open(path).unwrap();
        let flac =
            FlacFile::read_from(&mut file, ParseOptions::new().read_properties(false)).unwrap();
        flac.vorbis_comments().cloned().unwrap()
    }

    fn assignment(tracks: Option<Vec<u32>>, tags: &[(&str, &[&str])]) -> TagAssignment {
        TagAssignment {
            tracks,
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
                .collect(),
        }
    }

    #[test]
    fn vorbis_key_rules() {
        assert!(is_valid_vorbis_key("TITLE"));
        assert!(is_valid_vorbis_key("REPLAYGAIN_TRACK_GAIN"));
        assert!(is_valid_vorbis_key("MY TAG"));
        assert!(!is_valid_vorbis_key(""));
        assert!(!is_valid_vorbis_key("A=B"));
        assert!(!is_valid_vorbis_key("TÍTULO"));
        assert!(!is_valid_vorbis_key("TAB\tKEY"));
        assert!(!is_valid_vorbis_key("CURLY~"));
    }

    #[test]
    fn writes_per_track_comments_to_real_flac_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("01.flac"), minimal_flac()).unwrap();
        fs::write(dir.path().join("02.flac"), minimal_flac()).unwrap();
        let log = StageLog::create(dir.path().join("tagflac.log"), LineFormat::Stamped).unwrap();

        let mut dictionary = ConversionDictionary::default();
        dictionary.insert("artist", Some("ARTIST".to_string()));
        dictionary.insert("title", Some("TITLE".to_string()));

        let tags = TagList {
            assignments: vec![
                assignment(None, &[("artist", &["Band", "Guest"]), ("título", &["x"])]),
                assignment(Some(vec![1]), &[("title", &["Opening"])]),
                assignment(Some(vec![2]), &[("title", &["Closing"])]),
            ],
        };

        let report = FlacTagWriter::new()
            .apply(dir.path(), &tags, &dictionary, &log)
            .unwrap();
        log.finish().unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.values_written, 6);
        assert_eq!(report.unknown_names, vec!["título"]);
        assert_eq!(report.invalid_names, vec!["TÍTULO"]);

        let first = read_comments(&dir.path().join("01.flac"));
        assert_eq!(first.vendor(), VENDOR);
        assert_eq!(first.get("TITLE"), Some("Opening"));
        assert_eq!(first.get_all("ARTIST").collect::<Vec<_>>(), vec!["Band", "Guest"]);
        assert_eq!(first.get("COMMENT"), None);
        assert_eq!(first.items().len(), 3);

        let second = read_comments(&dir.path().join("02.flac"));
        assert_eq!(second.get("TITLE"), Some("Closing"));

        let content = fs::read_to_string(dir.path().join("tagflac.log")).unwrap();
        assert!(content.contains("01.flac: wrote 3 tag value(s)"));
        assert!(content.contains("not a valid Vorbis comment field, not written: TÍTULO"));
        assert!(!content.contains("written as TÍTULO"));
    }

    #[test]
    fn empty_directory_is_a_no_op() {
        let dir = tempdir().unwrap();
        let log_dir = tempdir().unwrap();
        let log = StageLog::create(log_dir.path().join("tagflac.log"), LineFormat::Stamped)
            .unwrap();

        let report = FlacTagWriter::new()
            .apply(
                dir.path(),
                &TagList::default(),
                &ConversionDictionary::default(),
                &log,
            )
            .unwrap();

        assert!(report.files.is_empty());
        log.finish().unwrap();

        let content = fs::read_to_string(log_dir.path().join("tagflac.log")).unwrap();
        assert!(content.contains("No FLAC files"));
    }

    #[test]
    fn invalid_flac_reports_write_failure() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("01.flac"), b"not really flac").unwrap();
        let log = StageLog::create(dir.path().join("tagflac.log"), LineFormat::Stamped).unwrap();

        let err = FlacTagWriter::new()
            .apply(
                dir.path(),
                &TagList::default(),
                &ConversionDictionary::default(),
                &log,
            )
            .unwrap_err();

        assert!(matches!(err, TagError::WriteFailed { .. }));
        assert!(err.to_string().contains("01.flac"));
    }

    #[test]
    fn missing_directory_fails_listing() {
        let dir = tempdir().unwrap();
        let log = StageLog::create(dir.path().join("tagflac.log"), LineFormat::Stamped).unwrap();

        let err = FlacTagWriter::new()
            .apply(
                &dir.path().join("missing"),
                &TagList::default(),
                &ConversionDictionary::default(),
                &log,
            )
            .unwrap_err();

        assert!(matches!(err, TagError::ListFailed { .. }));
    }
}
