//! Path helpers: output directory derivation, home expansion and
//! relative paths for tool arguments.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Directory name that marks the raw rip tree.
const SOURCE_SEGMENT: &str = "wav";
/// Directory name that replaces it in the output tree.
const TARGET_SEGMENT: &str = "flac";

/// Derive the output directory for an (absolute) input directory.
///
/// The last path segment equal to `wav` becomes `flac`; every other segment
/// is kept. A path without such a segment is returned unchanged.
///
/// ```
/// use std::path::Path;
/// use wav2flac_core::paths::derive_output_dir;
///
/// let out = derive_output_dir(Path::new("/archive/wav/artist/wav/album"));
/// assert_eq!(out, Path::new("/archive/wav/artist/flac/album"));
/// ```
pub fn derive_output_dir(input_dir: &Path) -> PathBuf {
    let components: Vec<Component<'_>> = input_dir.components().collect();

    let Some(index) = components
        .iter()
        .rposition(|c| matches!(c, Component::Normal(s) if *s == SOURCE_SEGMENT))
    else {
        return input_dir.to_path_buf();
    };

    let mut out = PathBuf::new();

    for (i, component) in components.iter().enumerate() {
        if i == index {
            out.push(TARGET_SEGMENT);
        } else {
            out.push(component.as_os_str());
        }
    }

    out
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    PathBuf::from(path)
}

/// Expand `~`, make the path absolute against the current directory and
/// collapse `.` and `..` segments.
pub fn resolve_input_dir(path: &Path) -> io::Result<PathBuf> {
    let expanded = match path.to_str() {
        Some(s) => expand_home(s),
        None => path.to_path_buf(),
    };

    std::path::absolute(expanded).map(|p| normalize_lexically(&p))
}

/// Collapse `.` and `..` segments without touching the filesystem.
///
/// `..` removes the preceding normal segment. At the root it is dropped, and
/// in a relative path with nothing left to remove it is kept.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            _ => parts.push(component),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }

    parts.iter().map(|c| c.as_os_str()).collect()
}

/// Express `target` relative to `base`. Both must be absolute.
///
/// `relative_path("/a/b/c.cue", "/a/x")` is `../b/c.cue`, and a path
/// relative to itself is `.`.
pub fn relative_path(target: &Path, base: &Path) -> PathBuf {
    let target: Vec<Component<'_>> = target.components().collect();
    let base: Vec<Component<'_>> = base.components().collect();

    let common = target
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();

    for _ in common..base.len() {
        out.push("..");
    }

    for component in &target[common..] {
        out.push(component.as_os_str());
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }

    out
}
