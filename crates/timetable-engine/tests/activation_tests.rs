//! Tests for session activation on a calendar date.

use chrono::{NaiveDate, Weekday};
use timetable_engine::activation::{sessions_for_week, sort_by_start};
use timetable_engine::model::{ExceptionalReason, Makeup};
use timetable_engine::{active_sessions, occurrence_on, Occurrence, Session, StoredStatus, TimeRange};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn range(start: &str, end: &str) -> TimeRange {
    TimeRange::parse(start, end).unwrap()
}

fn weekly(id: &str, day: Weekday) -> Session {
    Session::recurring(id, day, range("10:00", "11:00"))
}

fn ids(sessions: &[&Session]) -> Vec<String> {
    sessions.iter().map(|s| s.id.clone()).collect()
}

// 2025-03-10 and 2025-03-17 are Mondays.

#[test]
fn recurring_session_is_active_on_its_weekday_only() {
    let s = weekly("s", Weekday::Mon);

    assert_eq!(occurrence_on(&s, date(2025, 3, 10)), Some(Occurrence::Regular));
    assert_eq!(occurrence_on(&s, date(2025, 3, 17)), Some(Occurrence::Regular));
    assert_eq!(occurrence_on(&s, date(2025, 3, 11)), None);
}

#[test]
fn makeup_exceptional_session_appears_only_on_its_date() {
    let s = Session::exceptional(
        "m",
        date(2025, 3, 10),
        ExceptionalReason::Makeup,
        range("15:00", "16:00"),
    );

    assert_eq!(
        occurrence_on(&s, date(2025, 3, 10)),
        Some(Occurrence::Exceptional {
            reason: ExceptionalReason::Makeup
        })
    );
    // Same weekday, different dates.
    assert_eq!(occurrence_on(&s, date(2025, 3, 3)), None);
    assert_eq!(occurrence_on(&s, date(2025, 3, 17)), None);
    // Any other day.
    assert_eq!(occurrence_on(&s, date(2025, 3, 11)), None);
}

#[test]
fn exceptional_date_wins_over_expiration() {
    let mut s = Session::exceptional(
        "e",
        date(2025, 3, 10),
        ExceptionalReason::Extra,
        range("15:00", "16:00"),
    );
    s.expires_after = Some(date(2025, 3, 1));

    assert!(occurrence_on(&s, date(2025, 3, 10)).is_some());
}

#[test]
fn absent_session_shows_until_and_on_its_makeup_date() {
    let mut s = weekly("a", Weekday::Mon);
    s.status = StoredStatus::Absent;
    s.makeup = Some(Makeup {
        date: date(2025, 3, 17),
        time: None,
    });

    assert_eq!(
        occurrence_on(&s, date(2025, 3, 10)),
        Some(Occurrence::AbsentPendingMakeup {
            makeup_date: date(2025, 3, 17)
        })
    );
    assert_eq!(occurrence_on(&s, date(2025, 3, 17)), Some(Occurrence::Makeup));
    assert_eq!(occurrence_on(&s, date(2025, 3, 24)), None);
}

#[test]
fn makeup_date_is_ignored_unless_absent() {
    let mut s = weekly("a", Weekday::Mon);
    s.makeup = Some(Makeup {
        date: date(2025, 3, 17),
        time: None,
    });

    assert_eq!(occurrence_on(&s, date(2025, 3, 24)), Some(Occurrence::Regular));
}

#[test]
fn makeup_window_still_requires_the_weekday() {
    let mut s = weekly("a", Weekday::Mon);
    s.status = StoredStatus::Absent;
    s.makeup = Some(Makeup {
        date: date(2025, 3, 20),
        time: None,
    });

    // Thursday 2025-03-20 is the makeup date but not the session's weekday.
    assert_eq!(occurrence_on(&s, date(2025, 3, 20)), None);
    assert!(occurrence_on(&s, date(2025, 3, 17)).is_some());
}

#[test]
fn expired_recurring_session_disappears_after_its_date() {
    let mut s = weekly("x", Weekday::Mon);
    s.expires_after = Some(date(2025, 3, 10));

    assert!(occurrence_on(&s, date(2025, 3, 10)).is_some(), "expiry day is inclusive");
    assert!(occurrence_on(&s, date(2025, 3, 17)).is_none());
}

#[test]
fn active_sessions_keeps_input_order_and_sorting_is_by_start() {
    let late = Session::recurring("late", Weekday::Mon, range("18:00", "19:00"));
    let early = Session::recurring("early", Weekday::Mon, range("08:00", "09:00"));
    let other_day = weekly("tue", Weekday::Tue);
    let sessions = vec![late, other_day, early];

    let mut active = active_sessions(&sessions, date(2025, 3, 10));
    assert_eq!(ids(&active), vec!["late", "early"]);

    sort_by_start(&mut active);
    assert_eq!(ids(&active), vec!["early", "late"]);
}

#[test]
fn active_sessions_is_idempotent() {
    let sessions = vec![weekly("a", Weekday::Mon), weekly("b", Weekday::Tue)];
    let day = date(2025, 3, 10);
    assert_eq!(active_sessions(&sessions, day), active_sessions(&sessions, day));
}

#[test]
fn empty_pool_has_no_active_sessions() {
    let sessions: Vec<Session> = Vec::new();
    assert!(active_sessions(&sessions, date(2025, 3, 10)).is_empty());
}

#[test]
fn week_view_covers_seven_days() {
    let sessions = vec![
        weekly("mon", Weekday::Mon),
        weekly("sun", Weekday::Sun),
        Session::exceptional(
            "exam",
            date(2025, 3, 12),
            ExceptionalReason::Exam,
            range("09:00", "12:00"),
        ),
    ];

    let week = sessions_for_week(&sessions, date(2025, 3, 10));

    assert_eq!(week.len(), 7);
    assert_eq!(week[0].0, date(2025, 3, 10));
    assert_eq!(ids(&week[0].1), vec!["mon"]);
    assert_eq!(ids(&week[2].1), vec!["exam"]);
    assert_eq!(ids(&week[6].1), vec!["sun"]);
    assert!(week[1].1.is_empty());
}
