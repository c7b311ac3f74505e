//! The day board: a branch's sessions for one day, each with its live status.
//!
//! Sessions are narrowed to the period in force, then to those active on the
//! date, then sorted by start time.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::activation::{occurrence_on, Occurrence};
use crate::model::{Branch, Session};
use crate::period::{active_period, ActivePeriod};
use crate::status::{live_status, LiveStatus};
use crate::time::ClockTime;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardEntry<'a> {
    pub session: &'a Session,
    pub occurrence: Occurrence,
    pub status: LiveStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayBoard<'a> {
    pub branch: &'a str,
    pub date: NaiveDate,
    pub period: ActivePeriod,
    pub entries: Vec<BoardEntry<'a>>,
}

/// Build the board of `branch` for the day of `now`, with statuses at `now`.
///
/// `sessions` are the branch's stored sessions.
pub fn day_board<'a>(branch: &'a Branch, sessions: &'a [Session], now: NaiveDateTime) -> DayBoard<'a> {
    let date = now.date();
    let clock = ClockTime::of(&now);
    let period = active_period(branch, date);

    let mut entries: Vec<BoardEntry<'a>> = sessions
        .iter()
        .filter(|s| period.includes(s))
        .filter_map(|session| {
            occurrence_on(session, date).map(|occurrence| BoardEntry {
                session,
                occurrence,
                status: live_status(session, clock),
            })
        })
        .collect();
    entries.sort_by_key(|e| e.session.time.start);

    DayBoard {
        branch: &branch.name,
        date,
        period,
        entries,
    }
}

impl<'a> DayBoard<'a> {
    /// Drop finished sessions. Manual overrides are never `finished` and stay.
    pub fn hide_finished(mut self) -> Self {
        self.entries.retain(|e| e.status != LiveStatus::Finished);
        self
    }

    /// Entries that start strictly after `now`.
    pub fn upcoming(&self, now: ClockTime) -> Vec<&BoardEntry<'a>> {
        self.entries
            .iter()
            .filter(|e| e.session.time.start > now)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
