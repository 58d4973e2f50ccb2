//! Shared fixtures for orchestrator tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Settings;
use crate::models::{ConversionJob, JobFlags, CUE_FILE, META_FILE, TAGS_FILE, WAV_FILE};
use crate::orchestrator::types::Context;

pub const META_YML: &str = "img:\n  - src: http://example.com/images/cover.jpg?size=large\n";

pub const TAGS_YML: &str = "\
- TITLE: Album Title
  ARTIST: Someone
- track: 1
  TITLE: First
- track: [2]
  TITLE: Second
";

/// Fake split tool: checks that the cue sheet and rip resolve from the
/// working directory, echoes a progress line with backspaces, then creates
/// `00.flac`, `01.flac` and `02.flac` in the `-d` directory.
pub const FAKE_SHNTOOL: &str = r#"#!/bin/sh
printf 'args: %s\n' "$*"
[ -f "$9" ] || { echo "cue-missing: $9"; exit 1; }
[ -f "${12}" ] || { echo "wav-missing: ${12}"; exit 1; }
printf 'Splitting [%s] (1:00.00) --> [01.flac] (0:30.00) : 10%%\b\b\b20%%\r\n' "${12}"
printf 'warning: file 1 will be too short to be burned\n' >&2
: > "$5/00.flac"
: > "$5/01.flac"
: > "$5/02.flac"
"#;

/// Fake metadata tool: prints the files it was asked to list.
pub const FAKE_METAFLAC: &str = r#"#!/bin/sh
shift 2
for f in "$@"; do
  printf '%s:  comment[0]: TITLE=x\r\n' "$f"
done
"#;

/// Write an executable shell script into `dir`.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, name: &str, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Create `<root>/wav/<name>` with every input file a job can need.
pub fn populated_input_dir(root: &Path, name: &str) -> PathBuf {
    let input = root.join("wav").join(name);
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join(WAV_FILE), b"RIFF").unwrap();
    fs::write(input.join(CUE_FILE), "FILE \"a.wav\" WAVE\n").unwrap();
    fs::write(input.join(META_FILE), META_YML).unwrap();
    fs::write(input.join(TAGS_FILE), TAGS_YML).unwrap();
    fs::write(input.join("cover.jpg"), b"\xFF\xD8\xFFjpeg").unwrap();
    input
}

/// Settings that point both tools at fake scripts.
pub fn settings_with_tools(shntool: &Path, metaflac: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.tools.shntool = shntool.display().to_string();
    settings.tools.metaflac = metaflac.display().to_string();
    settings
}

/// Context for a job over `input` with the derived output directory.
pub fn context_for(input: &Path, flags: JobFlags, settings: Settings) -> Context {
    let job = ConversionJob::new(input.to_path_buf(), None, flags);
    Context::new(job, Arc::new(settings))
}
