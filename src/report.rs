//! Summaries of a [`ResultSet`], for the terminal and for a results file.

use std::fmt::Write as _;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tempfile::NamedTempFile;

use crate::bulk::ResultSet;

const RULE_WIDTH: usize = 50;

/// File name used for a report written at `timestamp` (unix seconds).
#[must_use]
pub fn file_name(timestamp: u64) -> String {
    format!("roblox_results_{timestamp}.txt")
}

/// Grouped summary for the terminal.
#[must_use]
pub fn summary(results: &ResultSet) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut s = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(s, "\n{rule}\nRESULTS SUMMARY\n{rule}");

    let _ = writeln!(s, "\nAvailable: {}", results.available.len());
    for name in &results.available {
        let _ = writeln!(s, "   - {name}");
    }

    let _ = writeln!(s, "\nTaken: {}", results.taken.len());
    for entry in &results.taken {
        let _ = writeln!(s, "   - {} (ID: {})", entry.username, entry.user.id);
    }

    let _ = writeln!(s, "\nInvalid: {}", results.invalid.len());
    for entry in &results.invalid {
        let _ = writeln!(s, "   - {}: {}", entry.username, entry.reason);
    }

    let _ = writeln!(s, "\n{rule}");
    s
}

/// Body of a results file.
#[must_use]
pub fn render(results: &ResultSet) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "ROBLOX USERNAME CHECK RESULTS");
    let _ = writeln!(s, "{}\n", "=".repeat(RULE_WIDTH));

    let _ = writeln!(s, "Available ({}):", results.available.len());
    for name in &results.available {
        let _ = writeln!(s, "  + {name}");
    }

    let _ = writeln!(s, "\nTaken ({}):", results.taken.len());
    for entry in &results.taken {
        let _ = writeln!(s, "  x {} (ID: {})", entry.username, entry.user.id);
    }

    let _ = writeln!(s, "\nInvalid ({}):", results.invalid.len());
    for entry in &results.invalid {
        let _ = writeln!(s, "  ! {}: {}", entry.username, entry.reason);
    }
    s
}

/// Write a results file into `dir`, named after the current time.
///
/// # Errors
///
/// Any I/O failure creating, writing or renaming the file.
pub fn save(results: &ResultSet, dir: &Path) -> io::Result<PathBuf> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    save_at(results, dir, timestamp)
}

/// Write a results file into `dir` for a given unix `timestamp`.
///
/// The report is rendered in full and written to a temporary file in the
/// same directory, then renamed into place, so the target path either
/// holds a complete report or does not exist.
///
/// # Errors
///
/// Any I/O failure creating, writing or renaming the file.
pub fn save_at(results: &ResultSet, dir: &Path, timestamp: u64) -> io::Result<PathBuf> {
    let path = dir.join(file_name(timestamp));
    let body = render(results);

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(body.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(&path).map_err(|e| e.error)?;

    tracing::info!(path = %path.display(), entries = results.len(), "saved results");
    Ok(path)
}
