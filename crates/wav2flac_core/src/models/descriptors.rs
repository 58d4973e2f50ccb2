//! YAML descriptors that accompany a rip.
//!
//! - `meta.yml` references the cover image
//! - `tags.yml` lists tag assignments
//! - the conversion dictionary maps tag spellings to Vorbis comment names

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Sample conversion dictionary compiled into the library.
const BUNDLED_DICTIONARY: &str = include_str!("../../data/convert.yml");
/// Name shown for the bundled dictionary in errors.
const BUNDLED_ORIGIN: &str = "<bundled convert.yml>";
/// Reserved `tags.yml` key selecting the tracks an assignment applies to.
const TRACK_KEY: &str = "track";

/// Errors while reading descriptor files.
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid content in {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

impl DescriptorError {
    fn invalid(path: &Path, message: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Result type for descriptor operations.
pub type DescriptorResult<T> = Result<T, DescriptorError>;

/// The parts of `meta.yml` the pipeline reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetaDescriptor {
    /// Image entries. Only the first one is used.
    #[serde(default)]
    pub img: Vec<ImageEntry>,
}

/// One entry of the `img` list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageEntry {
    /// URL-like source the image was fetched from.
    #[serde(default)]
    pub src: Option<String>,
    /// Bare file name in the input directory.
    #[serde(default)]
    pub filename: Option<String>,
}

/// Cover image file named by `meta.yml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// File name relative to the input directory.
    pub file_name: String,
}

impl MetaDescriptor {
    /// Load `meta.yml`. An empty file is an empty descriptor.
    pub fn load(path: &Path) -> DescriptorResult<Self> {
        let value = read_yaml_value(path)?;

        if value.is_null() {
            return Ok(Self::default());
        }

        serde_yaml::from_value(value).map_err(|source| DescriptorError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The referenced image: the last segment of `src`, else `filename`.
    pub fn image_ref(&self) -> Option<ImageRef> {
        let entry = self.img.first()?;

        let file_name = entry
            .src
            .as_deref()
            .and_then(src_file_name)
            .or_else(|| entry.filename.clone().filter(|name| !name.is_empty()))?;

        Some(ImageRef { file_name })
    }
}

/// Text after the last `/` of a URL-like string, up to any `?`.
fn src_file_name(src: &str) -> Option<String> {
    let (_, tail) = src.rsplit_once('/')?;
    let name = tail.split('?').next().unwrap_or_default();
    (!name.is_empty()).then(|| name.to_string())
}

/// Tag assignments from `tags.yml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagList {
    /// Assignments in file order.
    pub assignments: Vec<TagAssignment>,
}

/// One mapping of `tags.yml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagAssignment {
    /// Track numbers this assignment is limited to. `None` means all tracks.
    pub tracks: Option<Vec<u32>>,
    /// Source tag spellings and their values, in file order.
    ///
    /// An empty value list clears the tag.
    pub tags: Vec<(String, Vec<String>)>,
}

impl TagAssignment {
    /// Whether this assignment applies to a file with the given track number.
    pub fn applies_to(&self, track: Option<u32>) -> bool {
        match (&self.tracks, track) {
            (None, _) => true,
            (Some(tracks), Some(track)) => tracks.contains(&track),
            (Some(_), None) => false,
        }
    }
}

impl TagList {
    /// Load `tags.yml`. An empty file has no assignments.
    pub fn load(path: &Path) -> DescriptorResult<Self> {
        let value = read_yaml_value(path)?;
        Self::from_value(value, path)
    }

    /// Build from parsed YAML. `origin` is used in error messages.
    pub fn from_value(value: Value, origin: &Path) -> DescriptorResult<Self> {
        let mappings = match value {
            Value::Null => Vec::new(),
            Value::Sequence(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Mapping(mapping) => Ok(mapping),
                    _ => Err(DescriptorError::invalid(
                        origin,
                        format!("entry {} is not a mapping", i + 1),
                    )),
                })
                .collect::<DescriptorResult<Vec<_>>>()?,
            Value::Mapping(mapping) => vec![mapping],
            _ => {
                return Err(DescriptorError::invalid(
                    origin,
                    "expected a list of tag mappings",
                ))
            }
        };

        let assignments = mappings
            .into_iter()
            .map(|mapping| parse_assignment(mapping, origin))
            .collect::<DescriptorResult<Vec<_>>>()?;

        Ok(Self { assignments })
    }

    /// Whether there is nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

fn parse_assignment(mapping: Mapping, origin: &Path) -> DescriptorResult<TagAssignment> {
    let mut assignment = TagAssignment::default();

    for (key, value) in mapping {
        let key = scalar_text(&key)
            .ok_or_else(|| DescriptorError::invalid(origin, "tag names must be scalars"))?;

        if key == TRACK_KEY {
            assignment.tracks = Some(parse_tracks(&value, origin)?);
            continue;
        }

        let values = match &value {
            Value::Null => Vec::new(),
            Value::Sequence(items) => items
                .iter()
                .map(|item| {
                    scalar_text(item).ok_or_else(|| {
                        DescriptorError::invalid(origin, format!("{}: values must be scalars", key))
                    })
                })
                .collect::<DescriptorResult<Vec<_>>>()?,
            other => vec![scalar_text(other).ok_or_else(|| {
                DescriptorError::invalid(origin, format!("{}: values must be scalars", key))
            })?],
        };

        assignment.tags.push((key, values));
    }

    Ok(assignment)
}

fn parse_tracks(value: &Value, origin: &Path) -> DescriptorResult<Vec<u32>> {
    let invalid = || DescriptorError::invalid(origin, "track must be a number or a list of numbers");

    let number = |value: &Value| {
        value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(invalid)
    };

    match value {
        Value::Sequence(items) => items.iter().map(number).collect(),
        other => Ok(vec![number(other)?]),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// What a source tag spelling maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetName<'a> {
    /// Write under this Vorbis comment name.
    Tag(&'a str),
    /// The dictionary says to drop this tag.
    Drop,
    /// Not in the dictionary.
    Unknown,
}

/// Maps source tag spellings to target tag names.
#[derive(Debug, Clone, Default)]
pub struct ConversionDictionary {
    /// Exact spellings.
    entries: HashMap<String, Option<String>>,
    /// Lower-cased spellings for the case-insensitive fallback.
    folded: HashMap<String, Option<String>>,
}

impl ConversionDictionary {
    /// The sample dictionary shipped with the library.
    pub fn bundled() -> DescriptorResult<Self> {
        Self::from_yaml_str(BUNDLED_DICTIONARY, Path::new(BUNDLED_ORIGIN))
    }

    /// Load a dictionary file.
    pub fn load(path: &Path) -> DescriptorResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| DescriptorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content, path)
    }

    /// Load `path` if given, else the bundled dictionary.
    pub fn load_or_bundled(path: Option<&Path>) -> DescriptorResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::bundled(),
        }
    }

    /// Parse dictionary YAML. `origin` is used in error messages.
    pub fn from_yaml_str(content: &str, origin: &Path) -> DescriptorResult<Self> {
        let value = parse_yaml_value(content, origin)?;

        let mapping = match value {
            Value::Null => Mapping::new(),
            Value::Mapping(mapping) => mapping,
            _ => return Err(DescriptorError::invalid(origin, "expected a mapping")),
        };

        let mut dictionary = Self::default();

        for (key, value) in mapping {
            let key = scalar_text(&key)
                .ok_or_else(|| DescriptorError::invalid(origin, "keys must be scalars"))?;

            let target = match value {
                Value::Null => None,
                other => Some(scalar_text(&other).ok_or_else(|| {
                    DescriptorError::invalid(origin, format!("{}: target must be a scalar", key))
                })?),
            };

            dictionary.insert(key, target);
        }

        Ok(dictionary)
    }

    /// Add or replace an entry. `None` drops the tag.
    pub fn insert(&mut self, source: impl Into<String>, target: Option<String>) {
        let source = source.into();
        self.folded.insert(source.to_lowercase(), target.clone());
        self.entries.insert(source, target);
    }

    /// Look up a spelling, exactly first, then ignoring case.
    pub fn resolve(&self, name: &str) -> TargetName<'_> {
        let entry = self
            .entries
            .get(name)
            .or_else(|| self.folded.get(&name.to_lowercase()));

        match entry {
            Some(Some(target)) => TargetName::Tag(target),
            Some(None) => TargetName::Drop,
            None => TargetName::Unknown,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_yaml_value(path: &Path) -> DescriptorResult<Value> {
    let content = fs::read_to_string(path).map_err(|source| DescriptorError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_yaml_value(&content, path)
}

/// Parse YAML, treating a document with no content as null.
fn parse_yaml_value(content: &str, origin: &Path) -> DescriptorResult<Value> {
    let blank = content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---"
    });

    if blank {
        return Ok(Value::Null);
    }

    serde_yaml::from_str(content).map_err(|source| DescriptorError::Parse {
        path: origin.to_path_buf(),
        source,
    })
}
