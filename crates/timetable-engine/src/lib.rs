//! # timetable-engine
//!
//! Deterministic schedule resolution and conflict detection for class
//! timetables spread over several branches.
//!
//! Given branch configuration and stored sessions, the engine answers four
//! questions for the caller, always as pure functions over in-memory data:
//!
//! - which schedule is in force for a branch on a day ([`period::active_period`]);
//! - which sessions are active on a day ([`activation::active_sessions`]);
//! - what a session's live status is at an instant ([`status::live_status`]);
//! - whether saving a session would double-book a professor or a room
//!   ([`conflict::has_conflict`], [`conflict::find_conflicts`]).
//!
//! The engine never reads the system clock and never performs I/O; the caller
//! supplies the current time and the data.
//!
//! ## Modules
//!
//! - [`time`]: `HH:MM` clock times and half-open time ranges
//! - [`model`]: branches, periods and the tagged session type
//! - [`record`]: the stored session document and the per-branch session pool
//! - [`period`]: period resolution, period lifecycle and opening hours
//! - [`activation`]: which sessions are in force on a date
//! - [`status`]: live status at an instant
//! - [`conflict`]: professor and room double-booking detection, guarded writes
//! - [`board`]: a branch's sessions for one day with live statuses
//! - [`notify`]: status change events between two evaluations
//! - [`rooms`]: room occupancy for a time slot
//! - [`snapshot`]: loading branches and sessions from a JSON document
//! - [`error`]: Error types

pub mod activation;
pub mod board;
pub mod conflict;
pub mod error;
pub mod model;
pub mod notify;
pub mod period;
pub mod record;
pub mod rooms;
pub mod snapshot;
pub mod status;
pub mod time;

pub use activation::{active_sessions, occurrence_on, Occurrence};
pub use board::{day_board, BoardEntry, DayBoard};
pub use conflict::{find_conflicts, has_conflict, Conflict, ConflictKind, WriteRejected};
pub use error::TimetableError;
pub use model::{Branch, ExceptionalPeriod, Session, SessionKind, StoredStatus};
pub use notify::{diff_statuses, StatusChanged};
pub use period::{active_period, ActivePeriod};
pub use record::{SessionPool, SessionRecord};
pub use snapshot::Snapshot;
pub use status::{live_status, LiveStatus};
pub use time::{ClockTime, TimeRange};
