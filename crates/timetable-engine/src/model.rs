//! Branch, period and session types.
//!
//! Sessions are a tagged type: a weekly [`SessionKind::Recurring`] slot or a
//! one-off [`SessionKind::Exceptional`] slot pinned to a calendar date. The
//! loosely-typed storage shape lives in [`crate::record`] and is converted on
//! the way in.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, TimetableError};
use crate::time::{parse_date, ClockTime, TimeRange};

/// Opaque session identifier, unique within a branch.
pub type SessionId = String;

// ---------------------------------------------------------------------------
// Weekdays
// ---------------------------------------------------------------------------

/// Convert a stored day number (0 = Sunday .. 6 = Saturday) to a [`Weekday`].
///
/// # Errors
/// Returns `TimetableError::InvalidWeekday` outside `0..=6`.
pub fn weekday_from_index(index: i64) -> Result<Weekday> {
    match index {
        0 => Ok(Weekday::Sun),
        1 => Ok(Weekday::Mon),
        2 => Ok(Weekday::Tue),
        3 => Ok(Weekday::Wed),
        4 => Ok(Weekday::Thu),
        5 => Ok(Weekday::Fri),
        6 => Ok(Weekday::Sat),
        other => Err(TimetableError::InvalidWeekday(other)),
    }
}

/// The stored day number of a [`Weekday`] (0 = Sunday).
pub fn weekday_index(day: Weekday) -> u8 {
    day.num_days_from_sunday() as u8
}

// ---------------------------------------------------------------------------
// Branch configuration
// ---------------------------------------------------------------------------

/// Opening hours for one weekday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    #[serde(default)]
    pub open: bool,
    #[serde(default, deserialize_with = "blank_clock_time")]
    pub start: Option<ClockTime>,
    #[serde(default, deserialize_with = "blank_clock_time")]
    pub end: Option<ClockTime>,
}

impl DayHours {
    pub fn open(start: ClockTime, end: ClockTime) -> Self {
        DayHours {
            open: true,
            start: Some(start),
            end: Some(end),
        }
    }
}

/// Weekly opening schedule keyed by weekday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyHours {
    #[serde(default, alias = "monday", skip_serializing_if = "Option::is_none")]
    pub mon: Option<DayHours>,
    #[serde(default, alias = "tuesday", skip_serializing_if = "Option::is_none")]
    pub tue: Option<DayHours>,
    #[serde(default, alias = "wednesday", skip_serializing_if = "Option::is_none")]
    pub wed: Option<DayHours>,
    #[serde(default, alias = "thursday", skip_serializing_if = "Option::is_none")]
    pub thu: Option<DayHours>,
    #[serde(default, alias = "friday", skip_serializing_if = "Option::is_none")]
    pub fri: Option<DayHours>,
    #[serde(default, alias = "saturday", skip_serializing_if = "Option::is_none")]
    pub sat: Option<DayHours>,
    #[serde(default, alias = "sunday", skip_serializing_if = "Option::is_none")]
    pub sun: Option<DayHours>,
}

impl WeeklyHours {
    pub fn for_weekday(&self, day: Weekday) -> Option<&DayHours> {
        match day {
            Weekday::Mon => self.mon.as_ref(),
            Weekday::Tue => self.tue.as_ref(),
            Weekday::Wed => self.wed.as_ref(),
            Weekday::Thu => self.thu.as_ref(),
            Weekday::Fri => self.fri.as_ref(),
            Weekday::Sat => self.sat.as_ref(),
            Weekday::Sun => self.sun.as_ref(),
        }
    }

    pub fn set(&mut self, day: Weekday, hours: DayHours) {
        let slot = match day {
            Weekday::Mon => &mut self.mon,
            Weekday::Tue => &mut self.tue,
            Weekday::Wed => &mut self.wed,
            Weekday::Thu => &mut self.thu,
            Weekday::Fri => &mut self.fri,
            Weekday::Sat => &mut self.sat,
            Weekday::Sun => &mut self.sun,
        };
        *slot = Some(hours);
    }
}

/// Kind of exceptional period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Ramadan,
    #[serde(alias = "vacances")]
    Vacation,
    #[serde(alias = "examens")]
    Exam,
    #[default]
    #[serde(other)]
    Other,
}

impl PeriodType {
    pub fn as_str(self) -> &'static str {
        match self {
            PeriodType::Ramadan => "ramadan",
            PeriodType::Vacation => "vacation",
            PeriodType::Exam => "exam",
            PeriodType::Other => "other",
        }
    }
}

/// A named, date-bounded override of a branch's normal schedule.
///
/// `start_date` and `end_date` are inclusive calendar days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionalPeriod {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: PeriodType,
    #[serde(deserialize_with = "lenient_date")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "lenient_date")]
    pub end_date: NaiveDate,
    /// Opening hours in force during the period, when they differ from normal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<WeeklyHours>,
}

impl ExceptionalPeriod {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: PeriodType,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        ExceptionalPeriod {
            id: id.into(),
            name: name.into(),
            kind,
            start_date,
            end_date,
            schedule: None,
        }
    }

    /// Whether `date` falls inside `[start_date, end_date]`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Check the definition before it is stored.
    ///
    /// # Errors
    /// Returns `TimetableError::InvalidPeriod` for a blank name or a start date
    /// after the end date.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TimetableError::InvalidPeriod("name is required".to_string()));
        }
        if self.start_date > self.end_date {
            return Err(TimetableError::InvalidPeriod(format!(
                "'{}' starts on {} after it ends on {}",
                self.name, self.start_date, self.end_date
            )));
        }
        Ok(())
    }
}

fn default_active() -> bool {
    true
}

/// A teaching location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Number of rooms; rooms themselves are synthesised, see [`Branch::rooms`].
    #[serde(default)]
    pub rooms: u32,
    #[serde(default)]
    pub schedule: WeeklyHours,
    /// Ordered; the first period containing a date wins.
    #[serde(default)]
    pub exceptional_periods: Vec<ExceptionalPeriod>,
}

impl Branch {
    pub fn new(name: impl Into<String>) -> Self {
        Branch {
            name: name.into(),
            active: true,
            rooms: 0,
            schedule: WeeklyHours::default(),
            exceptional_periods: Vec::new(),
        }
    }

    /// `Room 1` .. `Room N`.
    pub fn rooms(&self) -> Vec<String> {
        (1..=self.rooms).map(|n| format!("Room {n}")).collect()
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Administrator-asserted status. `ongoing` and `finished` are derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoredStatus {
    #[default]
    Normal,
    Cancelled,
    Delayed,
    Absent,
}

impl StoredStatus {
    /// Parse a stored status string. Unknown and derived values read as `Normal`.
    pub fn from_stored(s: &str) -> Self {
        match s.trim() {
            "cancelled" => StoredStatus::Cancelled,
            "delayed" => StoredStatus::Delayed,
            "absent" => StoredStatus::Absent,
            _ => StoredStatus::Normal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StoredStatus::Normal => "normal",
            StoredStatus::Cancelled => "cancelled",
            StoredStatus::Delayed => "delayed",
            StoredStatus::Absent => "absent",
        }
    }
}

/// Why an exceptional session exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionalReason {
    Makeup,
    Extra,
    Exam,
    MakeupStudent,
    #[default]
    Other,
}

impl ExceptionalReason {
    pub fn from_stored(s: &str) -> Self {
        match s.trim() {
            "makeup" => ExceptionalReason::Makeup,
            "extra" => ExceptionalReason::Extra,
            "exam" => ExceptionalReason::Exam,
            "makeup_student" => ExceptionalReason::MakeupStudent,
            _ => ExceptionalReason::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExceptionalReason::Makeup => "makeup",
            ExceptionalReason::Extra => "extra",
            ExceptionalReason::Exam => "exam",
            ExceptionalReason::MakeupStudent => "makeup_student",
            ExceptionalReason::Other => "other",
        }
    }
}

/// How a session recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    /// Every week on `day`.
    Recurring { day: Weekday },
    /// Once, on `date`.
    Exceptional {
        date: NaiveDate,
        reason: ExceptionalReason,
    },
}

/// Rescheduling of an absent session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Makeup {
    pub date: NaiveDate,
    pub time: Option<ClockTime>,
}

/// A class slot in a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "crate::record::SessionRecord", into = "crate::record::SessionRecord")]
pub struct Session {
    pub id: SessionId,
    pub kind: SessionKind,
    pub time: TimeRange,
    /// One or more level names joined with `" + "`.
    pub level: String,
    pub subject: String,
    pub professor: String,
    pub room: String,
    pub status: StoredStatus,
    /// `None` for the normal schedule, otherwise an [`ExceptionalPeriod`] id.
    pub period: Option<String>,
    pub makeup: Option<Makeup>,
    pub expires_after: Option<NaiveDate>,
}

impl Session {
    /// A weekly session with empty descriptive fields and `normal` status.
    pub fn recurring(id: impl Into<SessionId>, day: Weekday, time: TimeRange) -> Self {
        Session::with_kind(id.into(), SessionKind::Recurring { day }, time)
    }

    /// A one-off session on `date`.
    pub fn exceptional(
        id: impl Into<SessionId>,
        date: NaiveDate,
        reason: ExceptionalReason,
        time: TimeRange,
    ) -> Self {
        Session::with_kind(id.into(), SessionKind::Exceptional { date, reason }, time)
    }

    fn with_kind(id: SessionId, kind: SessionKind, time: TimeRange) -> Self {
        Session {
            id,
            kind,
            time,
            level: String::new(),
            subject: String::new(),
            professor: String::new(),
            room: String::new(),
            status: StoredStatus::Normal,
            period: None,
            makeup: None,
            expires_after: None,
        }
    }

    /// The weekday the session falls on. Exceptional sessions derive it from their date.
    pub fn weekday(&self) -> Weekday {
        match self.kind {
            SessionKind::Recurring { day } => day,
            SessionKind::Exceptional { date, .. } => date.weekday(),
        }
    }

    pub fn is_exceptional(&self) -> bool {
        matches!(self.kind, SessionKind::Exceptional { .. })
    }

    /// The period this session belongs to, `None` for the normal schedule.
    pub fn effective_period(&self) -> Option<&str> {
        self.period.as_deref().filter(|p| !p.is_empty())
    }

    /// Individual level names.
    pub fn levels(&self) -> Vec<&str> {
        split_levels(&self.level)
    }

    pub fn includes_level(&self, level: &str) -> bool {
        !level.is_empty() && self.levels().contains(&level)
    }
}

/// Split a joined level string on `+` or `,`.
pub fn split_levels(joined: &str) -> Vec<&str> {
    joined
        .split(['+', ','])
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// serde helpers
// ---------------------------------------------------------------------------

fn blank_clock_time<'de, D>(deserializer: D) -> std::result::Result<Option<ClockTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => ClockTime::parse(s).map(Some).map_err(serde::de::Error::custom),
    }
}

fn lenient_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}
