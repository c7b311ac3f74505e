//! Room occupancy for a branch at a weekly time slot.

use chrono::Weekday;
use serde::Serialize;

use crate::model::{Branch, Session};
use crate::period::ActivePeriod;
use crate::time::TimeRange;

/// Map any room label carrying a number to `Room <n>` (`Salle 3`, `room3`,
/// `3` all become `Room 3`). Labels without a digit are kept as they are.
pub fn normalize_room(label: &str) -> String {
    let digits: String = label
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        return label.trim().to_string();
    }
    match digits.trim_start_matches('0') {
        "" => "Room 0".to_string(),
        number => format!("Room {number}"),
    }
}

/// The slot being looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomQuery {
    pub day: Weekday,
    pub time: TimeRange,
    pub period: ActivePeriod,
}

/// One room and the sessions occupying it during the queried slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomOccupancy<'a> {
    pub room: String,
    pub occupants: Vec<&'a Session>,
}

impl RoomOccupancy<'_> {
    pub fn is_free(&self) -> bool {
        self.occupants.is_empty()
    }
}

/// Occupancy of every synthesised room of `branch` during `query`.
///
/// `sessions` are the branch's stored sessions; only those of the queried
/// period and weekday whose time overlaps the slot count.
pub fn room_availability<'a>(
    branch: &Branch,
    sessions: &'a [Session],
    query: &RoomQuery,
) -> Vec<RoomOccupancy<'a>> {
    branch
        .rooms()
        .into_iter()
        .map(|room| {
            let occupants = sessions
                .iter()
                .filter(|s| s.weekday() == query.day)
                .filter(|s| query.period.includes(s))
                .filter(|s| s.time.overlaps(&query.time))
                .filter(|s| !s.room.is_empty() && normalize_room(&s.room) == room)
                .collect();
            RoomOccupancy { room, occupants }
        })
        .collect()
}
