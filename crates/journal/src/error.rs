//! Errors produced while reading or writing a journal file.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A line the journal could not parse. Recovery treats this as fatal:
    /// the engine must never silently skip a corrupt record and proceed
    /// with a state it cannot account for.
    #[error("corrupt journal line {line_no}: {line:?}: {reason}")]
    Corruption { line_no: usize, line: String, reason: String },
}
