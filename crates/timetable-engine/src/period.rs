//! Period resolution: which schedule (normal or a named period) is in force
//! for a branch on a given day.
//!
//! Dates are calendar days; time of day never takes part in the comparison.
//! Periods are expected not to overlap. When they do, the first one in the
//! branch's list wins, which keeps resolution deterministic.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use crate::model::{Branch, DayHours, ExceptionalPeriod, PeriodType, Session};
use crate::time::ClockTime;

/// The schedule in force: the normal one or a configured period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ActivePeriod {
    #[default]
    Normal,
    Period(String),
}

impl ActivePeriod {
    /// The period id, `None` for the normal schedule.
    pub fn id(&self) -> Option<&str> {
        match self {
            ActivePeriod::Normal => None,
            ActivePeriod::Period(id) => Some(id),
        }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, ActivePeriod::Normal)
    }

    /// Whether `session` belongs to this schedule.
    pub fn includes(&self, session: &Session) -> bool {
        session.effective_period() == self.id()
    }
}

impl fmt::Display for ActivePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id().unwrap_or("normal"))
    }
}

impl Serialize for ActivePeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The first period of `periods` containing `date`.
pub fn period_on(periods: &[ExceptionalPeriod], date: NaiveDate) -> Option<&ExceptionalPeriod> {
    periods.iter().find(|p| p.contains(date))
}

/// Resolve the schedule in force for `branch` on `date`.
///
/// Pure: identical inputs always resolve identically.
pub fn active_period(branch: &Branch, date: NaiveDate) -> ActivePeriod {
    match period_on(&branch.exceptional_periods, date) {
        Some(period) => ActivePeriod::Period(period.id.clone()),
        None => ActivePeriod::Normal,
    }
}

/// Keep the sessions that belong to `period`.
pub fn filter_by_period<'a>(sessions: &'a [Session], period: &ActivePeriod) -> Vec<&'a Session> {
    sessions.iter().filter(|s| period.includes(s)).collect()
}

/// Every `(branch name, period)` pair in force on `date`.
pub fn active_periods_on(branches: &[Branch], date: NaiveDate) -> Vec<(&str, &ExceptionalPeriod)> {
    branches
        .iter()
        .filter_map(|b| period_on(&b.exceptional_periods, date).map(|p| (b.name.as_str(), p)))
        .collect()
}

/// Display name of a period id across all branches; `Normal` for `None`.
pub fn period_name<'a>(branches: &'a [Branch], id: Option<&str>) -> Option<&'a str> {
    match id {
        None => Some("Normal"),
        Some(id) => branches
            .iter()
            .flat_map(|b| b.exceptional_periods.iter())
            .find(|p| p.id == id)
            .map(|p| p.name.as_str()),
    }
}

// ---------------------------------------------------------------------------
// Period lifecycle
// ---------------------------------------------------------------------------

/// Where a period stands relative to a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodPhase {
    Upcoming,
    Active,
    Past,
}

pub fn phase(period: &ExceptionalPeriod, today: NaiveDate) -> PeriodPhase {
    if today < period.start_date {
        PeriodPhase::Upcoming
    } else if today > period.end_date {
        PeriodPhase::Past
    } else {
        PeriodPhase::Active
    }
}

/// Days left in an active period, counting `today` and the last day.
pub fn days_remaining(period: &ExceptionalPeriod, today: NaiveDate) -> Option<i64> {
    (phase(period, today) == PeriodPhase::Active)
        .then(|| (period.end_date - today).num_days() + 1)
}

pub fn days_until_start(period: &ExceptionalPeriod, today: NaiveDate) -> Option<i64> {
    (phase(period, today) == PeriodPhase::Upcoming).then(|| (period.start_date - today).num_days())
}

/// Existing periods whose inclusive date range intersects `candidate`.
///
/// A period with the same id as the candidate is ignored (editing in place).
pub fn overlapping_periods<'a>(
    candidate: &ExceptionalPeriod,
    existing: &'a [ExceptionalPeriod],
) -> Vec<&'a ExceptionalPeriod> {
    existing
        .iter()
        .filter(|p| p.id != candidate.id)
        .filter(|p| candidate.start_date <= p.end_date && p.start_date <= candidate.end_date)
        .collect()
}

/// Identifier for a new period: the slugged name followed by the start year,
/// e.g. `Vacances d'été` starting 2025-07-01 gives `vacances-d-été-2025`.
///
/// Letters and digits of any script are kept. A name with none falls back to
/// the period type, so the id never starts with the year alone.
pub fn period_id_for(name: &str, kind: PeriodType, start_date: NaiveDate) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = match slug.trim_end_matches('-') {
        "" => kind.as_str(),
        trimmed => trimmed,
    };
    format!("{}-{}", slug, start_date.year())
}

// ---------------------------------------------------------------------------
// Opening hours
// ---------------------------------------------------------------------------

/// The opening hours in force for a branch on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveHours<'a> {
    pub hours: Option<&'a DayHours>,
    /// The period whose schedule supplied `hours`, if any.
    pub period: Option<&'a ExceptionalPeriod>,
}

/// Opening hours for `date`. `None` when the branch is inactive.
///
/// A period with its own schedule replaces the branch's weekly hours; a period
/// without one keeps them.
pub fn effective_hours(branch: &Branch, date: NaiveDate) -> Option<EffectiveHours<'_>> {
    if !branch.active {
        return None;
    }
    let weekday = date.weekday();
    let period = period_on(&branch.exceptional_periods, date);
    let schedule = period
        .and_then(|p| p.schedule.as_ref())
        .unwrap_or(&branch.schedule);

    Some(EffectiveHours {
        hours: schedule.for_weekday(weekday),
        period,
    })
}

/// Whether the branch is open at `time` on `date`. Both ends are inclusive.
pub fn is_branch_open(branch: &Branch, date: NaiveDate, time: ClockTime) -> bool {
    let Some(effective) = effective_hours(branch, date) else {
        return false;
    };
    match effective.hours {
        Some(DayHours {
            open: true,
            start: Some(start),
            end: Some(end),
        }) => *start <= time && time <= *end,
        _ => false,
    }
}
