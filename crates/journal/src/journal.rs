//! Append-only, fsync-durable journal file.

use crate::error::JournalError;
use crate::record::{parse_line, NodeHeader, Record, Transition};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct Journal {
    file: File,
    path: PathBuf,
}

impl Journal {
    /// Opens `path` for append, creating it if it does not exist yet.
    pub fn open_for_append(path: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the journal already holds at least one record — recovery
    /// step 1's "exists and is non-empty" test.
    pub fn is_rerun(path: &Path) -> Result<bool, JournalError> {
        match std::fs::metadata(path) {
            Ok(meta) => Ok(meta.len() > 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn append_line(&mut self, line: &str) -> Result<(), JournalError> {
        writeln!(self.file, "{line}")?;
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    pub fn write_header(&mut self, header: &NodeHeader) -> Result<(), JournalError> {
        self.append_line(&header.to_line())
    }

    pub fn write_transition(&mut self, transition: &Transition) -> Result<(), JournalError> {
        self.append_line(&transition.to_line())
    }

    /// Parses every record in `path` in order. A malformed line is fatal:
    /// the whole replay aborts rather than skipping it. A missing trailing
    /// newline on the last record is itself a corruption signal (a crash
    /// mid-`fsync` can leave a partially-written final line), so it is
    /// checked before the file is split into lines rather than being
    /// silently normalized away the way `BufRead::lines` would.
    pub fn replay(path: &Path) -> Result<Vec<Record>, JournalError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if !bytes.is_empty() && *bytes.last().unwrap() != b'\n' {
            let line_no = bytes.iter().filter(|&&b| b == b'\n').count() + 1;
            let tail = String::from_utf8_lossy(&bytes);
            let line = tail.lines().next_back().unwrap_or_default().to_string();
            return Err(JournalError::Corruption {
                line_no,
                line,
                reason: "missing trailing newline on last record".to_string(),
            });
        }

        let text = String::from_utf8(bytes)
            .map_err(|e| JournalError::Corruption { line_no: 0, line: String::new(), reason: format!("invalid utf-8: {e}") })?;
        let mut records = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            records.push(parse_line(idx + 1, line)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
