//! Detect double-bookings before a session is written.
//!
//! A candidate is compared against every stored session of every branch:
//!
//! - the candidate's own stored record (same id, same branch) is skipped;
//! - sessions of a different period never conflict, they are never in force
//!   at the same time;
//! - only sessions on the same weekday whose `[start, end)` ranges overlap are
//!   compared further. Back-to-back sessions do not conflict.
//!
//! A **professor** conflict is the same professor in a *different* branch. A
//! **room** conflict is the same room in the *same* branch. Both block the write.
//!
//! The check is only as good as the snapshot it runs on: callers must run it on
//! the latest known pool right before writing.

use serde::Serialize;
use thiserror::Error;

use crate::model::{Session, SessionId};
use crate::record::{SessionPool, SessionRecord};

/// What kind of double-booking was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// The professor teaches an overlapping session in another branch.
    ProfessorDoubleBooking,
    /// The room is taken by an overlapping session in the same branch.
    RoomConflict,
}

/// Every conflict blocks the write; there is no warning tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Critical,
}

/// A detected conflict, ready to be shown to the administrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub severity: Severity,
    /// The stored session the candidate collides with.
    pub session: Session,
    /// Branch of `session`.
    pub branch: String,
    pub message: String,
    pub details: String,
}

impl Conflict {
    fn new(kind: ConflictKind, branch: &str, session: &Session) -> Self {
        let (message, details) = match kind {
            ConflictKind::ProfessorDoubleBooking => (
                format!(
                    "{} is already scheduled {} at {}",
                    session.professor, session.time, branch
                ),
                format!("Level: {}, Subject: {}", session.level, session.subject),
            ),
            ConflictKind::RoomConflict => (
                format!(
                    "{} is already taken from {} to {}",
                    session.room, session.time.start, session.time.end
                ),
                format!("Professor: {}, Level: {}", session.professor, session.level),
            ),
        };
        Conflict {
            kind,
            severity: Severity::Critical,
            session: session.clone(),
            branch: branch.to_string(),
            message,
            details,
        }
    }
}

/// The conflict kinds between `candidate` (in `candidate_branch`) and one stored
/// session (in `branch`).
fn classify(
    candidate: &Session,
    candidate_branch: &str,
    stored: &Session,
    branch: &str,
) -> [Option<ConflictKind>; 2] {
    let same_branch = branch == candidate_branch;
    let none = [None, None];

    if same_branch && !candidate.id.is_empty() && stored.id == candidate.id {
        return none;
    }
    if stored.effective_period() != candidate.effective_period() {
        return none;
    }
    if stored.weekday() != candidate.weekday() || !stored.time.overlaps(&candidate.time) {
        return none;
    }

    let professor = (!same_branch
        && !candidate.professor.is_empty()
        && stored.professor == candidate.professor)
        .then_some(ConflictKind::ProfessorDoubleBooking);
    let room = (same_branch && !candidate.room.is_empty() && stored.room == candidate.room)
        .then_some(ConflictKind::RoomConflict);

    [professor, room]
}

fn conflicts_with<'a>(
    pool: &'a SessionPool,
    candidate: &'a Session,
    candidate_branch: &'a str,
) -> impl Iterator<Item = (ConflictKind, &'a str, &'a Session)> + 'a {
    pool.iter().flat_map(move |(branch, sessions)| {
        sessions.iter().flat_map(move |stored| {
            classify(candidate, candidate_branch, stored, branch)
                .into_iter()
                .flatten()
                .map(move |kind| (kind, branch, stored))
        })
    })
}

/// Every conflict `candidate` would create if saved in `candidate_branch`.
///
/// Results follow branch-name order, then stored order within a branch.
pub fn find_conflicts(pool: &SessionPool, candidate: &Session, candidate_branch: &str) -> Vec<Conflict> {
    conflicts_with(pool, candidate, candidate_branch)
        .map(|(kind, branch, stored)| Conflict::new(kind, branch, stored))
        .collect()
}

/// Whether saving `candidate` in `candidate_branch` would create any conflict.
pub fn has_conflict(pool: &SessionPool, candidate: &Session, candidate_branch: &str) -> bool {
    conflicts_with(pool, candidate, candidate_branch)
        .next()
        .is_some()
}

/// Conflicts of a raw, not yet validated candidate.
///
/// An incomplete candidate (no day, no start or end time) cannot be placed on
/// the timetable and reports no conflicts.
pub fn find_record_conflicts(
    pool: &SessionPool,
    candidate: &SessionRecord,
    candidate_branch: &str,
) -> Vec<Conflict> {
    match Session::try_from(candidate.clone()) {
        Ok(session) => find_conflicts(pool, &session, candidate_branch),
        Err(_) => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Guarded writes
// ---------------------------------------------------------------------------

/// Why a planned write must not be persisted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WriteRejected {
    #[error("at least one level must be selected")]
    NoLevels,

    #[error("{} conflict(s) for level '{level}'", .conflicts.len())]
    Conflict {
        level: String,
        conflicts: Vec<Conflict>,
    },
}

/// Plan the insertion of a session taught to several levels at once.
///
/// One session is produced per level, copied from `template` with its `level`
/// replaced and an id from `id_for`. Every per-level candidate is checked on
/// its own; if any conflicts, nothing is returned and the whole batch is
/// rejected.
///
/// # Errors
/// `WriteRejected::NoLevels` for an empty `levels`, or `WriteRejected::Conflict`
/// for the first level that conflicts.
pub fn plan_insert<F>(
    pool: &SessionPool,
    template: &Session,
    levels: &[String],
    branch: &str,
    mut id_for: F,
) -> Result<Vec<Session>, WriteRejected>
where
    F: FnMut(&str) -> SessionId,
{
    if levels.is_empty() {
        return Err(WriteRejected::NoLevels);
    }

    let mut planned = Vec::with_capacity(levels.len());
    for level in levels {
        let candidate = Session {
            id: id_for(level),
            level: level.clone(),
            ..template.clone()
        };
        let conflicts = find_conflicts(pool, &candidate, branch);
        if !conflicts.is_empty() {
            return Err(WriteRejected::Conflict {
                level: level.clone(),
                conflicts,
            });
        }
        planned.push(candidate);
    }
    Ok(planned)
}

/// Check an in-place edit of a stored session.
///
/// # Errors
/// `WriteRejected::Conflict` when the edited session collides with another one.
pub fn check_update(pool: &SessionPool, session: &Session, branch: &str) -> Result<(), WriteRejected> {
    let conflicts = find_conflicts(pool, session, branch);
    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(WriteRejected::Conflict {
            level: session.level.clone(),
            conflicts,
        })
    }
}
