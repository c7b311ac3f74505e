//! Error types for timetable-engine operations.
//!
//! Conflicts and inactive sessions are ordinary results, not errors. These
//! variants only describe input that could not be turned into typed values.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimetableError {
    #[error("Invalid clock time: {0}")]
    InvalidTime(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid time range: {start}-{end} (end must be after start)")]
    InvertedRange { start: String, end: String },

    #[error("Invalid day of week: {0} (expected 0=Sunday..6=Saturday)")]
    InvalidWeekday(i64),

    #[error("Invalid session record '{}': {message}", .id.as_deref().unwrap_or("<no id>"))]
    InvalidSession { id: Option<String>, message: String },

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl TimetableError {
    pub(crate) fn session(id: Option<&str>, message: impl Into<String>) -> Self {
        TimetableError::InvalidSession {
            id: id.map(str::to_string),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TimetableError>;
