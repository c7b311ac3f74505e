//! Session activation: which sessions are in force on a calendar day.
//!
//! Gates are applied top to bottom and the first decisive one wins:
//!
//! 1. weekday (recurring sessions only)
//! 2. exact date (exceptional sessions, decisive)
//! 3. makeup window (absent sessions with a makeup date, decisive)
//! 4. expiration
//! 5. default: a plain weekly session is active on its weekday

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::model::{ExceptionalReason, Session, SessionKind, StoredStatus};

/// Why a session shows up on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Occurrence {
    /// The weekly slot, as usual.
    Regular,
    /// A one-off session on its date.
    Exceptional { reason: ExceptionalReason },
    /// The professor is absent; the session is rescheduled to `makeup_date`.
    AbsentPendingMakeup { makeup_date: NaiveDate },
    /// The rescheduled occurrence itself.
    Makeup,
}

/// Decide whether `session` is in force on `date`, and as what.
pub fn occurrence_on(session: &Session, date: NaiveDate) -> Option<Occurrence> {
    let day = match session.kind {
        SessionKind::Exceptional {
            date: specific,
            reason,
        } => {
            return (specific == date).then_some(Occurrence::Exceptional { reason });
        }
        SessionKind::Recurring { day } => day,
    };

    if day != date.weekday() {
        return None;
    }

    if let (StoredStatus::Absent, Some(makeup)) = (session.status, session.makeup) {
        return match date.cmp(&makeup.date) {
            std::cmp::Ordering::Less => Some(Occurrence::AbsentPendingMakeup {
                makeup_date: makeup.date,
            }),
            std::cmp::Ordering::Equal => Some(Occurrence::Makeup),
            std::cmp::Ordering::Greater => None,
        };
    }

    if let Some(expires_after) = session.expires_after {
        if date > expires_after {
            return None;
        }
    }

    Some(Occurrence::Regular)
}

/// Sessions in force on `date`. Order follows the input; see [`sort_by_start`].
pub fn active_sessions<'a, I>(sessions: I, date: NaiveDate) -> Vec<&'a Session>
where
    I: IntoIterator<Item = &'a Session>,
{
    sessions
        .into_iter()
        .filter(|s| occurrence_on(s, date).is_some())
        .collect()
}

/// Sessions in force on each of the seven days starting at `week_start`.
pub fn sessions_for_week<'a>(
    sessions: &'a [Session],
    week_start: NaiveDate,
) -> Vec<(NaiveDate, Vec<&'a Session>)> {
    (0..7)
        .map(|offset| {
            let date = week_start + Duration::days(offset);
            (date, active_sessions(sessions, date))
        })
        .collect()
}

/// Stable sort by start time.
pub fn sort_by_start(sessions: &mut [&Session]) {
    sessions.sort_by_key(|s| s.time.start);
}
