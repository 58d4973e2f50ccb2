//! Resolution of `tags.yml` assignments into per-file Vorbis comments.

use std::collections::BTreeSet;
use std::path::Path;

use crate::models::{ConversionDictionary, TagList, TargetName};

/// Target tag names and their values, in first-assigned order.
pub type ResolvedTags = Vec<(String, Vec<String>)>;

/// Track number from a file stem (`03.flac` is track 3).
pub fn track_number(path: &Path) -> Option<u32> {
    path.file_stem()?.to_str()?.parse().ok()
}

/// Compute the tags for one file.
///
/// Assignments are applied in order; a later assignment replaces the values
/// an earlier one gave the same target name, and an empty value list removes
/// the tag. Spellings missing from the dictionary are upper-cased and
/// recorded in `unknown`.
pub fn resolve_file_tags(
    track: Option<u32>,
    tags: &TagList,
    dictionary: &ConversionDictionary,
    unknown: &mut BTreeSet<String>,
) -> ResolvedTags {
    let mut resolved: ResolvedTags = Vec::new();

    for assignment in tags.assignments.iter().filter(|a| a.applies_to(track)) {
        for (name, values) in &assignment.tags {
            let target = match dictionary.resolve(name) {
                TargetName::Tag(target) => target.to_uppercase(),
                TargetName::Drop => continue,
                TargetName::Unknown => {
                    unknown.insert(name.clone());
                    name.to_uppercase()
                }
            };

            let existing = resolved.iter().position(|(key, _)| *key == target);

            match (existing, values.is_empty()) {
                (Some(index), true) => {
                    resolved.remove(index);
                }
                (Some(index), false) => resolved[index].1 = values.clone(),
                (None, true) => {}
                (None, false) => resolved.push((target, values.clone())),
            }
        }
    }

    resolved
}
