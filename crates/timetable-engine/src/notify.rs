//! Status change events between two board evaluations.
//!
//! Instead of remembering previous statuses in shared state, the caller keeps
//! the last [`StatusSnapshot`] and diffs it against the next one. The diff is a
//! plain list of events; playing sounds or showing banners is up to the caller.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::board::DayBoard;
use crate::model::SessionId;
use crate::status::LiveStatus;
use crate::time::{minutes_until, ClockTime};

/// Live status per session id.
pub type StatusSnapshot = BTreeMap<SessionId, LiveStatus>;

pub fn status_snapshot(board: &DayBoard<'_>) -> StatusSnapshot {
    board
        .entries
        .iter()
        .map(|e| (e.session.id.clone(), e.status))
        .collect()
}

/// A session whose live status changed between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChanged {
    pub session_id: SessionId,
    pub from: LiveStatus,
    pub to: LiveStatus,
}

/// Audible/visual cue associated with a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    Delay,
    Absence,
    Cancellation,
    SessionStarted,
}

impl Cue {
    pub fn as_str(self) -> &'static str {
        match self {
            Cue::Delay => "delay",
            Cue::Absence => "absence",
            Cue::Cancellation => "cancellation",
            Cue::SessionStarted => "session_started",
        }
    }
}

impl StatusChanged {
    pub fn cue(&self) -> Option<Cue> {
        match self.to {
            LiveStatus::Delayed => Some(Cue::Delay),
            LiveStatus::Absent => Some(Cue::Absence),
            LiveStatus::Cancelled => Some(Cue::Cancellation),
            LiveStatus::Ongoing => Some(Cue::SessionStarted),
            LiveStatus::Normal | LiveStatus::Finished => None,
        }
    }
}

/// Sessions present in both snapshots whose status differs, in id order.
///
/// Sessions appearing or disappearing between snapshots produce no event.
pub fn diff_statuses(previous: &StatusSnapshot, current: &StatusSnapshot) -> Vec<StatusChanged> {
    current
        .iter()
        .filter_map(|(id, &to)| {
            let &from = previous.get(id)?;
            (from != to).then(|| StatusChanged {
                session_id: id.clone(),
                from,
                to,
            })
        })
        .collect()
}

/// A session starting exactly `minutes_ahead` minutes from now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reminder {
    pub session_id: SessionId,
    pub starts_at: ClockTime,
    pub minutes_ahead: u16,
}

/// Reminders for board entries starting exactly `lead_minutes` after `now`.
///
/// Evaluated once per minute this fires once per session; callers that
/// evaluate more often must de-duplicate on `session_id`.
pub fn starting_soon(board: &DayBoard<'_>, now: ClockTime, lead_minutes: u16) -> Vec<Reminder> {
    board
        .entries
        .iter()
        .filter(|e| minutes_until(now, e.session.time.start) == i32::from(lead_minutes))
        .map(|e| Reminder {
            session_id: e.session.id.clone(),
            starts_at: e.session.time.start,
            minutes_ahead: lead_minutes,
        })
        .collect()
}
