//! Tests for professor and room double-booking detection.

use chrono::Weekday;
use timetable_engine::conflict::{check_update, plan_insert, Severity};
use timetable_engine::{
    find_conflicts, has_conflict, ConflictKind, Session, SessionPool, SessionRecord, TimeRange,
    WriteRejected,
};

/// Helper to create a session on `day` from `HH:MM` bounds.
fn session(id: &str, day: Weekday, start: &str, end: &str, professor: &str, room: &str) -> Session {
    Session {
        professor: professor.to_string(),
        room: room.to_string(),
        level: "2BAC".to_string(),
        subject: "Math".to_string(),
        ..Session::recurring(id, day, TimeRange::parse(start, end).unwrap())
    }
}

fn in_period(mut s: Session, period: &str) -> Session {
    s.period = Some(period.to_string());
    s
}

fn pool(entries: Vec<(&str, Session)>) -> SessionPool {
    entries
        .into_iter()
        .map(|(branch, s)| (branch.to_string(), vec![s]))
        .collect()
}

// ── Professor conflicts ─────────────────────────────────────────────────────

#[test]
fn professor_in_two_branches_at_once_is_a_conflict() {
    let stored = pool(vec![(
        "A",
        session("a1", Weekday::Mon, "19:00", "20:30", "X", "Salle 1"),
    )]);
    let candidate = session("", Weekday::Mon, "19:30", "20:00", "X", "");

    let conflicts = find_conflicts(&stored, &candidate, "B");

    assert_eq!(conflicts.len(), 1, "should detect exactly one conflict");
    assert_eq!(conflicts[0].kind, ConflictKind::ProfessorDoubleBooking);
    assert_eq!(conflicts[0].severity, Severity::Critical);
    assert_eq!(conflicts[0].branch, "A");
    assert_eq!(conflicts[0].session.id, "a1");
    assert!(conflicts[0].message.contains("X"));
    assert!(conflicts[0].message.contains("19:00-20:30"));
    assert!(has_conflict(&stored, &candidate, "B"));
}

#[test]
fn period_scoped_candidate_does_not_conflict_with_normal_schedule() {
    let stored = pool(vec![(
        "A",
        session("a1", Weekday::Mon, "19:00", "20:30", "X", "Salle 1"),
    )]);
    let candidate = in_period(
        session("", Weekday::Mon, "19:30", "20:00", "X", ""),
        "ramadan-2025",
    );

    assert!(find_conflicts(&stored, &candidate, "B").is_empty());
    assert!(!has_conflict(&stored, &candidate, "B"));
}

#[test]
fn sessions_in_the_same_period_do_conflict() {
    let stored = pool(vec![(
        "A",
        in_period(
            session("a1", Weekday::Mon, "19:00", "20:30", "X", "Salle 1"),
            "ramadan-2025",
        ),
    )]);
    let candidate = in_period(
        session("", Weekday::Mon, "19:30", "20:00", "X", ""),
        "ramadan-2025",
    );

    assert!(has_conflict(&stored, &candidate, "B"));
}

#[test]
fn professor_back_to_back_in_two_branches_is_not_a_conflict() {
    let stored = pool(vec![(
        "A",
        session("a1", Weekday::Mon, "09:00", "10:00", "X", "Salle 1"),
    )]);
    let candidate = session("", Weekday::Mon, "10:00", "11:00", "X", "Salle 1");

    assert!(!has_conflict(&stored, &candidate, "B"));
}

#[test]
fn same_professor_same_branch_is_not_a_professor_conflict() {
    let stored = pool(vec![(
        "A",
        session("a1", Weekday::Mon, "09:00", "10:00", "X", "Salle 1"),
    )]);
    let candidate = session("", Weekday::Mon, "09:30", "10:30", "X", "Salle 2");

    assert!(find_conflicts(&stored, &candidate, "A").is_empty());
}

#[test]
fn empty_professor_never_conflicts() {
    let stored = pool(vec![(
        "A",
        session("a1", Weekday::Mon, "09:00", "10:00", "", "Salle 1"),
    )]);
    let candidate = session("", Weekday::Mon, "09:00", "10:00", "", "Salle 1");

    assert!(!has_conflict(&stored, &candidate, "B"));
}

#[test]
fn different_day_is_not_a_conflict() {
    let stored = pool(vec![(
        "A",
        session("a1", Weekday::Mon, "09:00", "10:00", "X", "Salle 1"),
    )]);
    let candidate = session("", Weekday::Tue, "09:00", "10:00", "X", "Salle 1");

    assert!(!has_conflict(&stored, &candidate, "A"));
    assert!(!has_conflict(&stored, &candidate, "B"));
}

// ── Room conflicts ──────────────────────────────────────────────────────────

#[test]
fn same_room_same_branch_overlapping_is_a_room_conflict() {
    let stored = pool(vec![(
        "A",
        session("a1", Weekday::Wed, "14:00", "16:00", "Y", "Salle 3"),
    )]);
    let candidate = session("", Weekday::Wed, "15:00", "17:00", "Z", "Salle 3");

    let conflicts = find_conflicts(&stored, &candidate, "A");

    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].kind, ConflictKind::RoomConflict);
    assert!(conflicts[0].message.contains("Salle 3"));
    assert!(conflicts[0].details.contains("Y"));
}

#[test]
fn same_room_name_in_another_branch_is_not_a_conflict() {
    let stored = pool(vec![(
        "A",
        session("a1", Weekday::Wed, "14:00", "16:00", "Y", "Salle 3"),
    )]);
    let candidate = session("", Weekday::Wed, "14:00", "16:00", "Z", "Salle 3");

    assert!(!has_conflict(&stored, &candidate, "B"));
}

#[test]
fn empty_room_never_conflicts() {
    let stored = pool(vec![(
        "A",
        session("a1", Weekday::Wed, "14:00", "16:00", "Y", ""),
    )]);
    let candidate = session("", Weekday::Wed, "14:00", "16:00", "Z", "");

    assert!(!has_conflict(&stored, &candidate, "A"));
}

#[test]
fn fully_contained_session_conflicts() {
    let stored = pool(vec![(
        "A",
        session("a1", Weekday::Sat, "09:00", "12:00", "Y", "Salle 1"),
    )]);
    let candidate = session("", Weekday::Sat, "10:00", "11:00", "Z", "Salle 1");

    assert!(has_conflict(&stored, &candidate, "A"));
}

// ── Self-exclusion ──────────────────────────────────────────────────────────

#[test]
fn resubmitting_an_unchanged_session_does_not_conflict_with_itself() {
    let original = session("a1", Weekday::Mon, "19:00", "20:30", "X", "Salle 1");
    let stored = pool(vec![("A", original.clone())]);

    assert!(find_conflicts(&stored, &original, "A").is_empty());
    assert!(check_update(&stored, &original, "A").is_ok());
}

#[test]
fn same_id_in_another_branch_is_not_excluded() {
    let stored = pool(vec![(
        "A",
        session("s1", Weekday::Mon, "19:00", "20:30", "X", "Salle 1"),
    )]);
    let candidate = session("s1", Weekday::Mon, "19:00", "20:30", "X", "Salle 1");

    assert!(has_conflict(&stored, &candidate, "B"));
}

// ── Multi-branch scan ───────────────────────────────────────────────────────

#[test]
fn both_kinds_reported_across_branches_in_branch_order() {
    let stored = pool(vec![
        (
            "B",
            session("b1", Weekday::Thu, "10:00", "11:00", "X", "Salle 2"),
        ),
        (
            "A",
            session("a1", Weekday::Thu, "10:30", "11:30", "W", "Salle 1"),
        ),
    ]);
    let candidate = session("", Weekday::Thu, "10:00", "12:00", "X", "Salle 1");

    let conflicts = find_conflicts(&stored, &candidate, "A");

    let kinds: Vec<_> = conflicts.iter().map(|c| (c.kind, c.branch.as_str())).collect();
    assert_eq!(
        kinds,
        vec![
            (ConflictKind::RoomConflict, "A"),
            (ConflictKind::ProfessorDoubleBooking, "B"),
        ]
    );
}

#[test]
fn empty_pool_no_conflicts() {
    let candidate = session("", Weekday::Mon, "09:00", "10:00", "X", "Salle 1");
    assert!(find_conflicts(&SessionPool::new(), &candidate, "A").is_empty());
}

#[test]
fn incomplete_record_reports_no_conflicts() {
    let stored = pool(vec![(
        "A",
        session("a1", Weekday::Mon, "09:00", "10:00", "X", "Salle 1"),
    )]);
    let candidate = SessionRecord {
        day_of_week: Some(1),
        start_time: Some("09:00".to_string()),
        professor: Some("X".to_string()),
        ..SessionRecord::default()
    };

    assert!(timetable_engine::conflict::find_record_conflicts(&stored, &candidate, "B").is_empty());
}

#[test]
fn complete_record_is_checked() {
    let stored = pool(vec![(
        "A",
        session("a1", Weekday::Sun, "09:00", "10:00", "X", "Salle 1"),
    )]);
    let candidate = SessionRecord {
        day_of_week: Some(0),
        start_time: Some("09:30".to_string()),
        end_time: Some("10:30".to_string()),
        professor: Some("X".to_string()),
        ..SessionRecord::default()
    };

    let conflicts = timetable_engine::conflict::find_record_conflicts(&stored, &candidate, "B");
    assert_eq!(conflicts.len(), 1, "Sunday (day 0) is a valid day");
}

// ── Guarded writes ──────────────────────────────────────────────────────────

#[test]
fn multi_level_insert_creates_one_session_per_level() {
    let stored = pool(vec![]);
    let template = session("", Weekday::Fri, "17:00", "18:30", "X", "Salle 1");
    let levels = vec!["1BAC".to_string(), "2BAC".to_string()];

    let planned = plan_insert(&stored, &template, &levels, "A", |level| format!("new-{level}")).unwrap();

    assert_eq!(planned.len(), 2);
    assert_eq!(planned[0].id, "new-1BAC");
    assert_eq!(planned[0].level, "1BAC");
    assert_eq!(planned[1].level, "2BAC");
    assert_eq!(planned[1].time, template.time);
}

#[test]
fn multi_level_insert_is_aborted_when_any_level_conflicts() {
    let stored = pool(vec![(
        "B",
        session("b1", Weekday::Fri, "17:30", "18:00", "X", "Salle 9"),
    )]);
    let template = session("", Weekday::Fri, "17:00", "18:30", "X", "Salle 1");
    let levels = vec!["1BAC".to_string(), "2BAC".to_string()];

    let err = plan_insert(&stored, &template, &levels, "A", |level| level.to_string()).unwrap_err();

    match err {
        WriteRejected::Conflict { level, conflicts } => {
            assert_eq!(level, "1BAC");
            assert_eq!(conflicts.len(), 1);
        }
        other => panic!("expected a conflict, got {other:?}"),
    }
}

#[test]
fn insert_without_levels_is_rejected() {
    let template = session("", Weekday::Fri, "17:00", "18:30", "X", "Salle 1");
    let err = plan_insert(&SessionPool::new(), &template, &[], "A", |l| l.to_string()).unwrap_err();
    assert_eq!(err, WriteRejected::NoLevels);
}

#[test]
fn moving_an_edited_session_onto_a_taken_room_is_rejected() {
    let stored = pool(vec![
        (
            "A",
            session("a1", Weekday::Mon, "09:00", "10:00", "X", "Salle 1"),
        ),
        (
            "A",
            session("a2", Weekday::Mon, "11:00", "12:00", "Y", "Salle 1"),
        ),
    ]);
    let mut edited = stored.branch("A")[1].clone();
    edited.time = TimeRange::parse("09:30", "10:30").unwrap();

    let err = check_update(&stored, &edited, "A").unwrap_err();
    assert!(err.to_string().contains("1 conflict(s)"));
}
