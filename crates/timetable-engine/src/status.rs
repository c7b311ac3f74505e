//! Live status of a session at a wall-clock instant.
//!
//! Manual overrides (`cancelled`, `delayed`, `absent`) always win. Otherwise the
//! status follows the clock on the half-open range `[start, end)`: the start
//! minute is already `ongoing` and the end minute is already `finished`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Session, StoredStatus};
use crate::time::ClockTime;

/// Display status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveStatus {
    /// Scheduled, not started yet.
    Normal,
    Ongoing,
    Finished,
    Cancelled,
    Delayed,
    Absent,
}

impl LiveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LiveStatus::Normal => "normal",
            LiveStatus::Ongoing => "ongoing",
            LiveStatus::Finished => "finished",
            LiveStatus::Cancelled => "cancelled",
            LiveStatus::Delayed => "delayed",
            LiveStatus::Absent => "absent",
        }
    }

    /// Whether the status was set by an administrator rather than the clock.
    pub fn is_override(self) -> bool {
        matches!(
            self,
            LiveStatus::Cancelled | LiveStatus::Delayed | LiveStatus::Absent
        )
    }
}

impl fmt::Display for LiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<StoredStatus> for LiveStatus {
    fn from(status: StoredStatus) -> Self {
        match status {
            StoredStatus::Normal => LiveStatus::Normal,
            StoredStatus::Cancelled => LiveStatus::Cancelled,
            StoredStatus::Delayed => LiveStatus::Delayed,
            StoredStatus::Absent => LiveStatus::Absent,
        }
    }
}

/// Status of `session` at `now` (time of day on the session's date).
pub fn live_status(session: &Session, now: ClockTime) -> LiveStatus {
    match session.status {
        StoredStatus::Cancelled | StoredStatus::Delayed | StoredStatus::Absent => {
            session.status.into()
        }
        StoredStatus::Normal => {
            if now >= session.time.end {
                LiveStatus::Finished
            } else if session.time.contains(now) {
                LiveStatus::Ongoing
            } else {
                LiveStatus::Normal
            }
        }
    }
}
