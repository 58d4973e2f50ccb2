//! Cleanup of captured tool output before it is persisted.
//!
//! Progress-style tools redraw their status line with backspaces and
//! carriage returns. Stage logs should read the way the terminal looked, and
//! use `\n` line endings only.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const BACKSPACE: char = '\u{8}';

/// Apply every backspace in `text` to the character before it.
///
/// A backspace at the start of a line has nothing to erase and is dropped,
/// the same way a terminal cursor stops at column zero.
pub fn collapse_backspaces(text: &str) -> String {
    if !text.contains(BACKSPACE) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());

    for c in text.chars() {
        if c == BACKSPACE {
            if out.chars().next_back().is_some_and(|last| last != '\n') {
                out.pop();
            }
        } else {
            out.push(c);
        }
    }

    out
}

/// Rewrite `path` in place, removing one trailing `\r` from every line.
///
/// The cleaned content goes to a sibling temp file which is then renamed over
/// the original, so a failure leaves the original untouched.
pub fn strip_carriage_returns(path: &Path) -> io::Result<()> {
    let content = fs::read(path)?;
    let mut cleaned = Vec::with_capacity(content.len());

    for line in content.split_inclusive(|b| *b == b'\n') {
        let (body, newline) = match line.strip_suffix(b"\n") {
            Some(body) => (body, true),
            None => (line, false),
        };

        let body = body.strip_suffix(b"\r").unwrap_or(body);
        cleaned.extend_from_slice(body);

        if newline {
            cleaned.push(b'\n');
        }
    }

    if cleaned.len() == content.len() {
        return Ok(());
    }

    atomic_write(path, &cleaned)
}

/// Write to `<path>.tmp` in the same directory, then rename over `path`.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let temp_path = temp_sibling(path);

    let written = (|| {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, path)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("log"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn backspace_erases_previous_char() {
        assert_eq!(collapse_backspaces("ab\u{8}c"), "ac");
    }

    #[test]
    fn backspace_runs_erase_progress() {
        let input = "Splitting [a.wav] :  10%\u{8}\u{8}\u{8}\u{8} 55%\u{8}\u{8}\u{8}\u{8}100% : OK\n";
        assert_eq!(collapse_backspaces(input), "Splitting [a.wav] : 100% : OK\n");
    }

    #[test]
    fn backspace_does_not_cross_lines() {
        assert_eq!(collapse_backspaces("ab\n\u{8}\u{8}c"), "ab\nc");
        assert_eq!(collapse_backspaces("\u{8}x"), "x");
    }

    #[test]
    fn collapsing_is_idempotent() {
        let inputs = ["ab\u{8}c", "x\u{8}\u{8}\u{8}yz\u{8}", "plain text\n", ""];
        for input in inputs {
            let once = collapse_backspaces(input);
            assert_eq!(collapse_backspaces(&once), once);
        }
    }

    #[test]
    fn multibyte_chars_are_erased_whole() {
        assert_eq!(collapse_backspaces("日本\u{8}語"), "日語");
    }

    #[test]
    fn strips_trailing_cr_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("split.log");
        fs::write(&path, "foo\r\nbar\n").unwrap();

        strip_carriage_returns(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "foo\nbar\n");
    }

    #[test]
    fn keeps_inner_cr_and_final_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("split.log");
        fs::write(&path, "a\rb\r\r\nlast\r").unwrap();

        strip_carriage_returns(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a\rb\r\nlast");
    }

    #[test]
    fn leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("metaflac.log");
        fs::write(&path, "x\r\n").unwrap();

        strip_carriage_returns(&path).unwrap();

        assert!(!dir.path().join("metaflac.log.tmp").exists());
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(strip_carriage_returns(&dir.path().join("nope.log")).is_err());
    }
}
