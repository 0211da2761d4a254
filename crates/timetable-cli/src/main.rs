//! `timetable` CLI: query and edit a school timetable stored in a JSON data file.
//!
//! ## Usage
//!
//! ```sh
//! # Lessons of class C1 in the week of 2025-03-03
//! timetable --data school.json schedule --class C1 --week 2025-03-03
//!
//! # Which rooms are free on Monday at 10:00
//! timetable rooms --date 2025-03-03 --time 10:00
//!
//! # Weekly Math lesson in the 4th period until the end of the school year
//! timetable add-entry --teacher T1 --room R1 --class C1 --subject Math \
//!     --date 2025-03-03 --slot 4 --recurring
//!
//! # Cancel a lesson and every later occurrence of it
//! timetable delete-entry <id> --recurring
//!
//! # Absence dashboard and double bookings
//! timetable absences --today 2025-03-03
//! timetable conflicts
//! ```
//!
//! The data file defaults to `$TIMETABLE_DATA`, then `timetable.json`. Editing
//! commands need `--user`/`--password` matching `TIMETABLE_ADMIN_USER` and
//! `TIMETABLE_ADMIN_PASSWORD`. A `.env` file in the working directory is read
//! first. Logging goes to stderr and follows `RUST_LOG`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use timetable_engine::dashboard::{absences_today, delays_today, long_term_absences};
use timetable_engine::filter::in_school_week;
use timetable_engine::slots::{parse_clock, period_by_number};
use timetable_engine::{
    entry_status, find_double_bookings, room_board, Absence, EntryStatus, NewScheduleEntry,
    ScheduleEntry, ScheduleQuery,
};
use timetable_store::{
    Authenticator, Credentials, InMemoryBackend, Snapshot, StaticCredentials, Timetable,
};

#[derive(Parser)]
#[command(name = "timetable", version, about = "School timetable CLI")]
struct Cli {
    /// JSON data file holding every table
    #[arg(long, env = "TIMETABLE_DATA", default_value = "timetable.json")]
    data: PathBuf,

    /// Username for editing commands
    #[arg(long, env = "TIMETABLE_USER")]
    user: Option<String>,

    /// Password for editing commands
    #[arg(long, env = "TIMETABLE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List lessons matching every given filter
    Schedule {
        #[arg(long)]
        class: Option<String>,
        #[arg(long)]
        teacher: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        /// Only the Monday-to-Friday week containing this date
        #[arg(long, value_parser = parse_date)]
        week: Option<NaiveDate>,
    },
    /// Show which rooms are free at a given moment
    Rooms {
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        /// Time of day, HH:MM
        #[arg(long, value_parser = parse_time)]
        time: NaiveTime,
    },
    /// Add a lesson, optionally repeated weekly until the end of the school year
    AddEntry {
        #[arg(long)]
        teacher: String,
        #[arg(long)]
        room: String,
        #[arg(long)]
        class: String,
        #[arg(long)]
        subject: String,
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        /// Period number (1-10, lunch excluded)
        #[arg(long)]
        slot: u8,
        #[arg(long)]
        recurring: bool,
    },
    /// Delete a lesson, or with --recurring the lesson and its later occurrences
    DeleteEntry {
        id: String,
        #[arg(long)]
        recurring: bool,
    },
    /// Absences, long-term absences and delays for a day
    Absences {
        /// Defaults to the local date
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },
    /// Lessons sharing a room or a teacher in the same period
    Conflicts,
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    s.parse::<NaiveDate>()
        .map_err(|_| format!("'{}' is not a date (expected YYYY-MM-DD)", s))
}

fn parse_time(s: &str) -> std::result::Result<NaiveTime, String> {
    parse_clock(s).map_err(|e| e.to_string())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Lesson<'a> {
    #[serde(flatten)]
    entry: &'a ScheduleEntry,
    status: EntryStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AbsenceDashboard<'a> {
    date: NaiveDate,
    absences: Vec<&'a Absence>,
    long_term: Vec<&'a Absence>,
    delays: Vec<&'a Absence>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut timetable = Timetable::new(InMemoryBackend::from_snapshot(read_snapshot(&cli.data)?));
    timetable
        .load()
        .await
        .with_context(|| format!("Failed to load {}", cli.data.display()))?;

    match cli.command {
        Commands::Schedule {
            class,
            teacher,
            subject,
            week,
        } => {
            let query = ScheduleQuery {
                class_id: class,
                teacher_id: teacher,
                subject,
            };
            let state = timetable.state();
            let mut matched = query.apply(state.schedule_entries());
            if let Some(day) = week {
                matched = in_school_week(&matched, day);
            }
            let lessons: Vec<Lesson> = matched
                .into_iter()
                .map(|entry| Lesson {
                    entry,
                    status: entry_status(entry, state.absences()),
                })
                .collect();
            print_json(&lessons)?;
        }
        Commands::Rooms { date, time } => {
            let state = timetable.state();
            let board = room_board(
                state.rooms(),
                date,
                time,
                state.schedule_entries(),
                state.absences(),
            );
            print_json(&board)?;
        }
        Commands::AddEntry {
            teacher,
            room,
            class,
            subject,
            date,
            slot,
            recurring,
        } => {
            authorize(cli.user.as_deref(), cli.password.as_deref())?;
            let period = match period_by_number(slot) {
                Some(p) if p.is_course() => p,
                _ => bail!("Slot {} is not a course period", slot),
            };
            let draft = NewScheduleEntry {
                teacher_id: teacher,
                room_id: room,
                subject,
                group_ids: vec![class],
                date,
                time_slot: period.time_slot(),
            };
            let mutation = timetable
                .add_schedule_entry(draft, recurring)
                .await
                .context("Failed to add the lesson")?;
            save(&cli.data, timetable.backend()).await?;
            print_json(&mutation)?;
        }
        Commands::DeleteEntry { id, recurring } => {
            authorize(cli.user.as_deref(), cli.password.as_deref())?;
            let mutation = timetable
                .delete_schedule_entry(&id, recurring)
                .await
                .with_context(|| format!("Failed to delete lesson {}", id))?;
            save(&cli.data, timetable.backend()).await?;
            print_json(&mutation)?;
        }
        Commands::Absences { today } => {
            let date = today.unwrap_or_else(|| chrono::Local::now().date_naive());
            let absences = timetable.state().absences();
            print_json(&AbsenceDashboard {
                date,
                absences: absences_today(absences, date),
                long_term: long_term_absences(absences, date),
                delays: delays_today(absences, date),
            })?;
        }
        Commands::Conflicts => {
            print_json(&find_double_bookings(timetable.state().schedule_entries()))?;
        }
    }

    Ok(())
}

fn authorize(user: Option<&str>, password: Option<&str>) -> Result<()> {
    let (Some(user), Some(password)) = (user, password) else {
        bail!("This command needs --user and --password");
    };
    let auth = StaticCredentials::from_env()?;
    let session = auth.verify(&Credentials::new(user, password))?;
    tracing::debug!(user = %session.username, "Authorized");
    Ok(())
}

/// A missing data file is an empty timetable.
fn read_snapshot(path: &Path) -> Result<Snapshot> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Data file not found, starting empty");
        return Ok(Snapshot::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid data file: {}", path.display()))
}

async fn save(path: &Path, backend: &InMemoryBackend) -> Result<()> {
    let snapshot = backend.snapshot().await;
    let json = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write file: {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
