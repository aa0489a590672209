//! Turning raw user input into a list of usernames.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure reading a username list from disk.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InputError {
    /// The file does not exist.
    #[error("file not found: {}", .path.display())]
    NotFound {
        /// Path as given.
        path: PathBuf,
    },
    /// The file exists but could not be read.
    #[error("error reading file {}: {source}", .path.display())]
    Read {
        /// Path as given.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

/// Split a comma-separated list.
#[must_use]
pub fn parse_list(raw: &str) -> Vec<String> {
    collect(raw.split(','))
}

/// Split one username per line, as read from a file or stdin.
#[must_use]
pub fn parse_lines(raw: &str) -> Vec<String> {
    collect(raw.lines())
}

/// Trim each entry and drop blanks. Order and repeats are kept.
pub fn collect<'a>(parts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read a file holding one username per line.
///
/// # Errors
///
/// [`InputError::NotFound`] when `path` does not exist, [`InputError::Read`]
/// for any other I/O failure.
pub fn read_file(path: &Path) -> Result<Vec<String>, InputError> {
    match std::fs::read_to_string(path) {
        Ok(raw) => Ok(parse_lines(&raw)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(InputError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(InputError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
