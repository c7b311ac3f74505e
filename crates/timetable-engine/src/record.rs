//! The stored session document and its conversion to [`Session`].
//!
//! Stored sessions are one loose record shape for recurring and exceptional
//! sessions alike: every field may be missing, blank strings stand for "unset"
//! and the kind is sniffed from `isExceptional` + `specificDate`. Conversion
//! happens once, at the boundary, so the rest of the engine works on the tagged
//! [`SessionKind`].

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimetableError};
use crate::model::{
    weekday_from_index, weekday_index, ExceptionalReason, Makeup, Session, SessionKind,
    StoredStatus,
};
use crate::time::{parse_date, ClockTime, TimeRange};

/// A session as stored by the persistence layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub makeup_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub makeup_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_exceptional: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_after: Option<String>,
}

/// Treat missing and blank strings alike.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl TryFrom<SessionRecord> for Session {
    type Error = TimetableError;

    fn try_from(record: SessionRecord) -> Result<Self> {
        let id = present(&record.id);
        let fail = |message: &str| TimetableError::session(id, message);

        let start = present(&record.start_time).ok_or_else(|| fail("missing startTime"))?;
        let end = present(&record.end_time).ok_or_else(|| fail("missing endTime"))?;
        let time = TimeRange::parse(start, end)?;

        let kind = match (record.is_exceptional, present(&record.specific_date)) {
            (Some(true), Some(date)) => SessionKind::Exceptional {
                date: parse_date(date)?,
                reason: present(&record.reason)
                    .map(ExceptionalReason::from_stored)
                    .unwrap_or_default(),
            },
            (Some(true), None) => return Err(fail("exceptional session without specificDate")),
            _ => {
                let index = record.day_of_week.ok_or_else(|| fail("missing dayOfWeek"))?;
                SessionKind::Recurring {
                    day: weekday_from_index(index)?,
                }
            }
        };

        let makeup = match present(&record.makeup_date) {
            Some(date) => Some(Makeup {
                date: parse_date(date)?,
                time: present(&record.makeup_time).map(ClockTime::parse).transpose()?,
            }),
            None => None,
        };

        let expires_after = present(&record.expires_after).map(parse_date).transpose()?;

        Ok(Session {
            id: id.unwrap_or_default().to_string(),
            kind,
            time,
            level: record.level.unwrap_or_default(),
            subject: record.subject.unwrap_or_default(),
            professor: record.professor.unwrap_or_default(),
            room: record.room.unwrap_or_default(),
            status: present(&record.status)
                .map(StoredStatus::from_stored)
                .unwrap_or_default(),
            period: present(&record.period).map(str::to_string),
            makeup,
            expires_after,
        })
    }
}

impl From<Session> for SessionRecord {
    fn from(session: Session) -> Self {
        let (day, is_exceptional, specific_date, reason) = match session.kind {
            SessionKind::Recurring { day } => (day, None, None, None),
            SessionKind::Exceptional { date, reason } => (
                date.weekday(),
                Some(true),
                Some(date.to_string()),
                Some(reason.as_str().to_string()),
            ),
        };
        let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };

        SessionRecord {
            id: non_empty(session.id),
            day_of_week: Some(i64::from(weekday_index(day))),
            start_time: Some(session.time.start.to_string()),
            end_time: Some(session.time.end.to_string()),
            level: Some(session.level),
            subject: Some(session.subject),
            professor: Some(session.professor),
            room: Some(session.room),
            status: Some(session.status.as_str().to_string()),
            period: session.period,
            makeup_date: session.makeup.map(|m| m.date.to_string()),
            makeup_time: session.makeup.and_then(|m| m.time).map(|t| t.to_string()),
            is_exceptional,
            specific_date,
            reason,
            expires_after: session.expires_after.map(|d| d.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Session pool
// ---------------------------------------------------------------------------

/// A stored record that could not be converted and was left out of the pool.
#[derive(Debug)]
pub struct RejectedRecord {
    pub branch: String,
    pub id: Option<String>,
    pub error: TimetableError,
}

/// Every branch's sessions, keyed by branch name.
///
/// Iteration is ordered by branch name, so anything computed from a pool is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionPool {
    branches: BTreeMap<String, Vec<Session>>,
}

impl SessionPool {
    pub fn new() -> Self {
        SessionPool::default()
    }

    /// Convert raw stored records, keeping the valid ones.
    ///
    /// Each record is decoded on its own, so a record with a mistyped field
    /// (`"dayOfWeek": "1"`) is rejected like any other invalid record instead of
    /// failing the whole load. Rejected records are returned alongside the pool;
    /// they take no part in activation or conflict checks.
    pub fn from_records(
        records: BTreeMap<String, Vec<serde_json::Value>>,
    ) -> (SessionPool, Vec<RejectedRecord>) {
        let mut pool = SessionPool::new();
        let mut rejected = Vec::new();

        for (branch, branch_records) in records {
            let sessions = pool.branches.entry(branch.clone()).or_default();
            for value in branch_records {
                let id = value
                    .get("id")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string);
                let converted = serde_json::from_value::<SessionRecord>(value)
                    .map_err(|e| TimetableError::session(id.as_deref(), e.to_string()))
                    .and_then(Session::try_from);
                match converted {
                    Ok(session) => sessions.push(session),
                    Err(error) => rejected.push(RejectedRecord {
                        branch: branch.clone(),
                        id,
                        error,
                    }),
                }
            }
        }

        (pool, rejected)
    }

    pub fn insert(&mut self, branch: impl Into<String>, session: Session) {
        self.branches.entry(branch.into()).or_default().push(session);
    }

    /// Sessions stored for `branch` (empty for unknown branches).
    pub fn branch(&self, branch: &str) -> &[Session] {
        self.branches.get(branch).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `(branch name, sessions)` pairs in branch-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Session])> {
        self.branches
            .iter()
            .map(|(name, sessions)| (name.as_str(), sessions.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.branches.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<(String, Vec<Session>)> for SessionPool {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Session>)>>(iter: I) -> Self {
        let mut pool = SessionPool::new();
        for (branch, sessions) in iter {
            pool.branches.entry(branch).or_default().extend(sessions);
        }
        pool
    }
}
