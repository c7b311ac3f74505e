//! `timetable` CLI: inspect branch timetables from a snapshot file.
//!
//! ## Usage
//!
//! ```sh
//! # Which schedule is in force today, for every branch
//! timetable --snapshot school.json period
//!
//! # Live board of a branch at a given instant
//! timetable --snapshot school.json board --branch A --at 2025-03-10T19:30
//!
//! # Same, at the current time in the branch's timezone, as JSON
//! TIMETABLE_TZ=Africa/Casablanca timetable --snapshot school.json --json board --branch A
//!
//! # Would this session double-book anyone? (exit status 2 if so)
//! timetable --snapshot school.json check --branch A --candidate new.json
//!
//! # Room occupancy for Monday 19:00-20:30
//! timetable --snapshot school.json rooms --branch A --day 1 --start 19:00 --end 20:30
//!
//! # Status changes between two snapshots
//! timetable diff --before old.json --after new.json --branch A --at 2025-03-10T19:30
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use std::io::{self, Read};
use std::process;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use timetable_engine::activation::{sessions_for_week, sort_by_start};
use timetable_engine::conflict::{find_conflicts, plan_insert};
use timetable_engine::model::{split_levels, weekday_from_index};
use timetable_engine::notify::status_snapshot;
use timetable_engine::period::{active_periods_on, days_remaining, effective_hours, period_name};
use timetable_engine::rooms::{room_availability, RoomQuery};
use timetable_engine::time::parse_date;
use timetable_engine::{
    active_period, day_board, diff_statuses, ActivePeriod, Branch, Conflict, Session,
    SessionRecord, Snapshot, TimeRange, WriteRejected,
};

/// Exit status when a candidate session is blocked by conflicts.
const EXIT_CONFLICT: i32 = 2;

#[derive(Parser)]
#[command(
    name = "timetable",
    version,
    about = "Multi-branch class timetable: periods, live boards, conflicts and rooms"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Snapshot file with branches and sessions (reads from stdin if omitted)
    #[arg(short, long, global = true, env = "TIMETABLE_SNAPSHOT")]
    snapshot: Option<String>,

    /// IANA timezone used for "now" and "today" (system local time if omitted)
    #[arg(long, global = true, env = "TIMETABLE_TZ")]
    tz: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the period in force (every branch if --branch is omitted)
    Period {
        #[arg(short, long)]
        branch: Option<String>,
        /// Day to resolve, YYYY-MM-DD (today if omitted)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Show a branch's sessions for one day with their live status
    Board {
        #[arg(short, long)]
        branch: String,
        /// Instant to evaluate, YYYY-MM-DDTHH:MM (now if omitted)
        #[arg(long)]
        at: Option<String>,
        /// Leave out sessions that are over
        #[arg(long)]
        hide_finished: bool,
    },
    /// Show a branch's sessions for seven days
    Week {
        #[arg(short, long)]
        branch: String,
        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: String,
    },
    /// Check a candidate session for professor and room conflicts
    Check {
        #[arg(short, long)]
        branch: String,
        /// JSON file holding one stored session record
        #[arg(short, long)]
        candidate: String,
        /// Insert once per level (comma or + separated) instead of the record's level
        #[arg(long)]
        levels: Option<String>,
    },
    /// Show which rooms are taken during a weekly slot
    Rooms {
        #[arg(short, long)]
        branch: String,
        /// Day of week, 0 = Sunday .. 6 = Saturday
        #[arg(long)]
        day: i64,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// Period id (normal schedule if omitted)
        #[arg(long)]
        period: Option<String>,
    },
    /// List status changes of a branch's board between two snapshots
    Diff {
        #[arg(long)]
        before: String,
        #[arg(long)]
        after: String,
        #[arg(short, long)]
        branch: String,
        /// Instant to evaluate, YYYY-MM-DDTHH:MM (now if omitted)
        #[arg(long)]
        at: Option<String>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let tz = cli.tz.as_deref();

    match cli.command {
        Commands::Period { branch, date } => {
            let snapshot = load_snapshot(cli.snapshot.as_deref())?;
            let date = match date {
                Some(d) => parse_date(&d)?,
                None => now_in(tz)?.date(),
            };
            match branch {
                Some(name) => print_branch_period(&snapshot, find_branch(&snapshot, &name)?, date, cli.json)?,
                None => print_all_periods(&snapshot, date, cli.json)?,
            }
        }
        Commands::Board {
            branch,
            at,
            hide_finished,
        } => {
            let snapshot = load_snapshot(cli.snapshot.as_deref())?;
            let branch = find_branch(&snapshot, &branch)?;
            let now = resolve_instant(at.as_deref(), tz)?;

            let mut board = day_board(branch, snapshot.sessions_of(&branch.name), now);
            info!(branch = %branch.name, period = %board.period, entries = board.entries.len(), "board built");
            if hide_finished {
                board = board.hide_finished();
            }

            if cli.json {
                print_json(&board)?;
            } else {
                println!("{} {} ({})", board.branch, board.date, board.period);
                if board.is_empty() {
                    println!("No sessions.");
                }
                for entry in &board.entries {
                    println!("{:<10} {}", entry.status, describe(entry.session));
                }
            }
        }
        Commands::Week { branch, start } => {
            let snapshot = load_snapshot(cli.snapshot.as_deref())?;
            let branch = find_branch(&snapshot, &branch)?;
            let start = parse_date(&start)?;

            let week: Vec<_> = sessions_for_week(snapshot.sessions_of(&branch.name), start)
                .into_iter()
                .map(|(date, mut sessions)| {
                    let period = active_period(branch, date);
                    sessions.retain(|s| period.includes(s));
                    sort_by_start(&mut sessions);
                    (date, period, sessions)
                })
                .collect();

            if cli.json {
                let days: Vec<_> = week
                    .iter()
                    .map(|(date, period, sessions)| json!({ "date": date, "period": period, "sessions": sessions }))
                    .collect();
                print_json(&days)?;
            } else {
                for (date, period, sessions) in &week {
                    println!("{} ({})", date.format("%a %Y-%m-%d"), period);
                    for session in sessions {
                        println!("  {}", describe(session));
                    }
                }
            }
        }
        Commands::Check {
            branch,
            candidate,
            levels,
        } => {
            let snapshot = load_snapshot(cli.snapshot.as_deref())?;
            let branch = find_branch(&snapshot, &branch)?;
            let raw = read_input(Some(&candidate))?;
            let record: SessionRecord = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse candidate record: {}", candidate))?;

            let session = match Session::try_from(record) {
                Ok(session) => session,
                Err(err) => {
                    // Incomplete candidates cannot collide with anything.
                    warn!(error = %err, "candidate is incomplete, nothing to check");
                    print_check(&branch.name, &[], cli.json)?;
                    return Ok(());
                }
            };

            let conflicts = match levels {
                Some(levels) => check_levels(&snapshot, &session, &branch.name, &levels)?,
                None => find_conflicts(&snapshot.sessions, &session, &branch.name),
            };

            print_check(&branch.name, &conflicts, cli.json)?;
            if !conflicts.is_empty() {
                warn!(count = conflicts.len(), "candidate rejected");
                process::exit(EXIT_CONFLICT);
            }
        }
        Commands::Rooms {
            branch,
            day,
            start,
            end,
            period,
        } => {
            let snapshot = load_snapshot(cli.snapshot.as_deref())?;
            let branch = find_branch(&snapshot, &branch)?;
            let query = RoomQuery {
                day: weekday_from_index(day)?,
                time: TimeRange::parse(&start, &end)?,
                period: match period.as_deref() {
                    None | Some("normal") => ActivePeriod::Normal,
                    Some(id) => ActivePeriod::Period(id.to_string()),
                },
            };

            let rooms = room_availability(branch, snapshot.sessions_of(&branch.name), &query);
            if cli.json {
                print_json(&rooms)?;
            } else {
                for room in &rooms {
                    if room.is_free() {
                        println!("{:<10} free", room.room);
                    } else {
                        for session in &room.occupants {
                            println!("{:<10} taken  {}", room.room, describe(session));
                        }
                    }
                }
            }
        }
        Commands::Diff {
            before,
            after,
            branch,
            at,
        } => {
            let old = load_snapshot(Some(&before))?;
            let new = load_snapshot(Some(&after))?;
            let now = resolve_instant(at.as_deref(), tz)?;

            let previous = status_snapshot(&day_board(
                find_branch(&old, &branch)?,
                old.sessions_of(&branch),
                now,
            ));
            let current = status_snapshot(&day_board(
                find_branch(&new, &branch)?,
                new.sessions_of(&branch),
                now,
            ));

            let events = diff_statuses(&previous, &current);
            if cli.json {
                let events: Vec<_> = events
                    .iter()
                    .map(|e| json!({ "sessionId": e.session_id, "from": e.from, "to": e.to, "cue": e.cue() }))
                    .collect();
                print_json(&events)?;
            } else {
                for event in &events {
                    match event.cue() {
                        Some(cue) => println!(
                            "{}: {} -> {} ({})",
                            event.session_id,
                            event.from,
                            event.to,
                            cue.as_str()
                        ),
                        None => println!("{}: {} -> {}", event.session_id, event.from, event.to),
                    }
                }
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Load a snapshot and report the session records that had to be left out.
fn load_snapshot(path: Option<&str>) -> Result<Snapshot> {
    let json = read_input(path)?;
    let snapshot = Snapshot::from_json(&json).context("Failed to load snapshot")?;
    for rejected in &snapshot.rejected {
        warn!(
            branch = %rejected.branch,
            id = rejected.id.as_deref().unwrap_or("<no id>"),
            error = %rejected.error,
            "skipping malformed session record"
        );
    }
    debug!(
        branches = snapshot.branches.len(),
        sessions = snapshot.sessions.len(),
        "snapshot loaded"
    );
    Ok(snapshot)
}

fn find_branch<'a>(snapshot: &'a Snapshot, name: &str) -> Result<&'a Branch> {
    snapshot.branch(name).ok_or_else(|| {
        let known: Vec<&str> = snapshot.branches.iter().map(|b| b.name.as_str()).collect();
        anyhow!("Unknown branch: '{}'. Known branches: {}", name, known.join(", "))
    })
}

/// Current wall-clock time, in `tz` when given.
fn now_in(tz: Option<&str>) -> Result<NaiveDateTime> {
    match tz {
        Some(name) => {
            let zone: Tz = name
                .parse()
                .map_err(|e| anyhow!("Unknown timezone: '{}': {}", name, e))?;
            Ok(Utc::now().with_timezone(&zone).naive_local())
        }
        None => Ok(Local::now().naive_local()),
    }
}

/// Parse `--at` (`YYYY-MM-DDTHH:MM` or `YYYY-MM-DD HH:MM`), or fall back to now.
fn resolve_instant(at: Option<&str>, tz: Option<&str>) -> Result<NaiveDateTime> {
    let Some(raw) = at else {
        return now_in(tz);
    };
    ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw.trim(), fmt).ok())
        .with_context(|| format!("Invalid instant: '{}'. Expected YYYY-MM-DDTHH:MM", raw))
}

/// Plan one session per level and return the conflicts of the first rejected one.
fn check_levels(
    snapshot: &Snapshot,
    template: &Session,
    branch: &str,
    levels: &str,
) -> Result<Vec<Conflict>> {
    let levels: Vec<String> = split_levels(levels).into_iter().map(String::from).collect();
    let base = template.id.clone();
    let planned = plan_insert(&snapshot.sessions, template, &levels, branch, |level| {
        format!("{}-{}", base, level.to_lowercase())
    });
    match planned {
        Ok(sessions) => {
            info!(count = sessions.len(), "every level can be inserted");
            Ok(Vec::new())
        }
        Err(WriteRejected::NoLevels) => bail!("--levels must name at least one level"),
        Err(WriteRejected::Conflict { level, conflicts }) => {
            warn!(level = %level, "level is blocked");
            Ok(conflicts)
        }
    }
}

fn print_branch_period(snapshot: &Snapshot, branch: &Branch, date: NaiveDate, json: bool) -> Result<()> {
    let period = active_period(branch, date);
    let name = period_name(&snapshot.branches, period.id()).unwrap_or_default();
    let remaining = branch
        .exceptional_periods
        .iter()
        .find(|p| Some(p.id.as_str()) == period.id())
        .and_then(|p| days_remaining(p, date));
    let hours = effective_hours(branch, date).and_then(|h| h.hours.cloned());

    if json {
        return print_json(&json!({
            "branch": branch.name,
            "date": date,
            "period": period,
            "name": name,
            "daysRemaining": remaining,
            "active": branch.active,
            "hours": hours,
        }));
    }

    match remaining {
        Some(days) => println!("{} {} {} ({}, {} days left)", branch.name, date, period, name, days),
        None => println!("{} {} {}", branch.name, date, period),
    }
    match hours {
        _ if !branch.active => println!("branch inactive"),
        Some(h) if h.open => match (h.start, h.end) {
            (Some(start), Some(end)) => println!("open {}-{}", start, end),
            _ => println!("open"),
        },
        _ => println!("closed"),
    }
    Ok(())
}

fn print_all_periods(snapshot: &Snapshot, date: NaiveDate, json: bool) -> Result<()> {
    let active = active_periods_on(&snapshot.branches, date);

    if json {
        let rows: Vec<_> = snapshot
            .branches
            .iter()
            .map(|b| {
                let period = active_period(b, date);
                json!({ "branch": b.name, "period": period })
            })
            .collect();
        return print_json(&json!({ "date": date, "branches": rows }));
    }

    for branch in &snapshot.branches {
        match active.iter().find(|(name, _)| *name == branch.name) {
            Some((_, period)) => println!("{:<12} {} ({})", branch.name, period.id, period.name),
            None => println!("{:<12} {}", branch.name, ActivePeriod::Normal),
        }
    }
    Ok(())
}

fn print_check(branch: &str, conflicts: &[Conflict], json: bool) -> Result<()> {
    if json {
        return print_json(&json!({
            "branch": branch,
            "blocked": !conflicts.is_empty(),
            "conflicts": conflicts,
        }));
    }

    if conflicts.is_empty() {
        println!("No conflicts.");
    }
    for conflict in conflicts {
        println!("[{}] {}", conflict.branch, conflict.message);
        println!("    {}", conflict.details);
    }
    Ok(())
}

/// One line per session: time, level, subject, professor, room and length.
fn describe(session: &Session) -> String {
    let mut line = format!("{}  {}", session.time, session.level);
    for field in [&session.subject, &session.professor, &session.room] {
        if !field.is_empty() {
            line.push_str("  ");
            line.push_str(field);
        }
    }
    line.push_str(&format!("  {} min", session.time.duration_minutes()));
    line
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let pretty = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", pretty);
    Ok(())
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
