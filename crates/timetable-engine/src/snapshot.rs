//! Loading a full timetable snapshot: branch configuration plus every branch's
//! stored sessions.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::Result;
use crate::model::{Branch, Session};
use crate::record::{RejectedRecord, SessionPool};

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    branches: Vec<Branch>,
    #[serde(default)]
    sessions: BTreeMap<String, Vec<serde_json::Value>>,
}

/// Everything the engine needs to answer questions about a moment in time.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub branches: Vec<Branch>,
    pub sessions: SessionPool,
    /// Stored session records that could not be converted and were left out.
    pub rejected: Vec<RejectedRecord>,
}

impl Snapshot {
    /// Parse a snapshot document:
    ///
    /// ```json
    /// { "branches": [ { "name": "A", "rooms": 4, "exceptionalPeriods": [] } ],
    ///   "sessions": { "A": [ { "id": "s1", "dayOfWeek": 1, "startTime": "19:00", "endTime": "20:30" } ] } }
    /// ```
    ///
    /// Malformed session records are collected in [`Snapshot::rejected`]; only a
    /// malformed document or branch configuration fails the load.
    ///
    /// # Errors
    /// Returns `TimetableError::JsonParse` if the document is not valid.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawSnapshot = serde_json::from_str(json)?;
        let (sessions, rejected) = SessionPool::from_records(raw.sessions);
        Ok(Snapshot {
            branches: raw.branches,
            sessions,
            rejected,
        })
    }

    pub fn branch(&self, name: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.name == name)
    }

    /// Stored sessions of the branch called `name`.
    pub fn sessions_of(&self, name: &str) -> &[Session] {
        self.sessions.branch(name)
    }
}
