//! Terminal output.
//!
//! stdout carries exactly one line, the `matrix=<json>` line CI captures.
//! Everything else (warnings, verbose detail, errors) goes to stderr with a
//! colored label when stderr is a terminal.

use anyhow::{Context, Result};
use console::{Color, Term, style};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

fn stderr_is_tty() -> bool {
    Term::stderr().is_term()
}

fn format_label(label: &str, color: Color, is_tty: bool) -> String {
    if is_tty {
        style(label).bold().fg(color).to_string()
    } else {
        label.to_string()
    }
}

fn write_labeled(
    label: &str,
    color: Color,
    msg: &str,
    w: &mut dyn Write,
    is_tty: bool,
) -> io::Result<()> {
    let label = format_label(label, color, is_tty);
    writeln!(w, "{label} {msg}")
}

pub fn note_to_with_tty(w: &mut dyn Write, msg: &str, is_tty: bool) {
    let _ = write_labeled("note:", Color::Yellow, msg, w, is_tty);
}

pub fn fail_to_with_tty(w: &mut dyn Write, msg: &str, is_tty: bool) {
    let _ = write_labeled("error:", Color::Red, msg, w, is_tty);
}

pub fn detail_to_with_tty(w: &mut dyn Write, msg: &str, is_tty: bool) {
    let line = if is_tty {
        style(format!("  {msg}")).dim().to_string()
    } else {
        format!("  {msg}")
    };
    let _ = writeln!(w, "{line}");
}

pub fn note(msg: &str) {
    note_to_with_tty(&mut io::stderr(), msg, stderr_is_tty());
}

pub fn fail(msg: &str) {
    fail_to_with_tty(&mut io::stderr(), msg, stderr_is_tty());
}

/// Print a detail line, only when `--verbose` is on.
pub fn detail(msg: &str) {
    if is_verbose() {
        detail_to_with_tty(&mut io::stderr(), msg, stderr_is_tty());
    }
}

pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Write the matrix line followed by a newline, and flush.
pub fn write_matrix_line(w: &mut dyn Write, line: &str) -> Result<()> {
    writeln!(w, "{line}").context("failed to write matrix")?;
    w.flush().context("failed to flush matrix output")?;
    Ok(())
}

/// Append the matrix line to a GitHub Actions output file.
///
/// The file is shared by every step of the job, so it is opened in append
/// mode and created if it does not exist yet.
pub fn append_matrix_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open GitHub output file at {}", path.display()))?;
    write_matrix_line(&mut file, line)
        .with_context(|| format!("failed to write GitHub output file at {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn capture(f: impl FnOnce(&mut Vec<u8>)) -> String {
        let mut buf = Vec::new();
        f(&mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_note_plain_when_not_tty() {
        let out = capture(|w| note_to_with_tty(w, "duplicate row", false));
        assert_eq!(out, "note: duplicate row\n");
    }

    #[test]
    fn test_fail_plain_when_not_tty() {
        let out = capture(|w| fail_to_with_tty(w, "boom", false));
        assert_eq!(out, "error: boom\n");
    }

    #[test]
    fn test_detail_is_indented() {
        let out = capture(|w| detail_to_with_tty(w, "python 3.9", false));
        assert_eq!(out, "  python 3.9\n");
    }

    #[test]
    fn test_tty_label_keeps_text() {
        let out = capture(|w| note_to_with_tty(w, "hello", true));
        assert!(out.contains("note:"));
        assert!(out.ends_with("hello\n"));
    }

    #[test]
    fn test_write_matrix_line_appends_newline() {
        let out = capture(|w| write_matrix_line(w, r#"matrix={"include":[]}"#).unwrap());
        assert_eq!(out, "matrix={\"include\":[]}\n");
    }

    #[test]
    fn test_append_matrix_line_keeps_existing_outputs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("github_output");
        std::fs::write(&path, "other=1\n").unwrap();

        append_matrix_line(&path, "matrix={}").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "other=1\nmatrix={}\n");
    }

    #[test]
    fn test_append_matrix_line_creates_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("github_output");
        append_matrix_line(&path, "matrix={}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "matrix={}\n");
    }

    #[test]
    fn test_append_matrix_line_missing_dir_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing").join("github_output");
        let err_msg = format!("{:#}", append_matrix_line(&path, "matrix={}").unwrap_err());
        assert!(err_msg.contains("failed to open GitHub output file"), "got: {}", err_msg);
    }
}
