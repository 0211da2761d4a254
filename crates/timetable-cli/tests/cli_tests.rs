//! Integration tests for the `timetable` CLI binary.
//!
//! Each test writes its own data file under the system temp dir and runs the
//! binary against it through `assert_cmd`. The file is removed on drop.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use std::ops::Deref;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};

const USER: &str = "admin";
const PASSWORD: &str = "s3cret";

fn fixture() -> Value {
    let lesson = |id: &str, teacher: &str, room: &str, class: &str, subject: &str, date: &str, start: &str, end: &str| {
        json!({
            "id": id, "teacher_id": teacher, "room_id": room, "class_id": class,
            "subject": subject, "date": date, "start_time": start, "end_time": end
        })
    };
    json!({
        "teachers": [
            {"id": "T1", "name": "Alice Martin", "email": "a.martin@school.test", "subjects": ["Math"]},
            {"id": "T2", "name": "Bob Durand", "email": "b.durand@school.test", "subjects": ["French"]}
        ],
        "rooms": [
            {"id": "R1", "name": "V101", "capacity": 30, "type": "classroom"},
            {"id": "R2", "name": "R202", "capacity": 24, "type": "classroom"}
        ],
        "classes": [
            {"id": "C1", "name": "10A", "level": "10"},
            {"id": "C2", "name": "11B", "level": "11"}
        ],
        "students": [],
        "absences": [
            {"id": "A1", "teacher_id": "T2", "start_date": "2025-03-01", "end_date": "2025-03-05",
             "type": "absence", "delay_time_str": null},
            {"id": "A2", "teacher_id": "T1", "start_date": "2025-03-04", "end_date": null,
             "type": "delay", "delay_time_str": "09:30"}
        ],
        "schedule_entries": [
            lesson("e1", "T1", "R1", "C1", "Math", "2025-03-03", "10:50:00", "11:40:00"),
            lesson("e2", "T2", "R2", "C2", "French", "2025-03-03", "10:50:00", "11:40:00"),
            lesson("e3", "T1", "R2", "C2", "Math", "2025-03-04", "08:05:00", "08:55:00"),
            lesson("e4", "T2", "R2", "C1", "French", "2025-03-04", "08:05:00", "08:55:00")
        ]
    })
}

/// Scratch data file, removed when the test ends.
struct DataFile(PathBuf);

impl DataFile {
    fn scratch(name: &str) -> Self {
        Self(std::env::temp_dir().join(format!("timetable-cli-{}-{}.json", name, std::process::id())))
    }
}

impl Deref for DataFile {
    type Target = PathBuf;

    fn deref(&self) -> &PathBuf {
        &self.0
    }
}

impl Drop for DataFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

/// Helper: write the fixture to a data file unique to `name`.
fn data_file(name: &str) -> DataFile {
    let file = DataFile::scratch(name);
    std::fs::write(&*file, serde_json::to_string_pretty(&fixture()).unwrap()).unwrap();
    file
}

fn read_data(path: &PathBuf) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn timetable(path: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("timetable").unwrap();
    cmd.env_remove("TIMETABLE_USER")
        .env_remove("TIMETABLE_PASSWORD")
        .env("TIMETABLE_ADMIN_USER", USER)
        .env("TIMETABLE_ADMIN_PASSWORD", PASSWORD)
        .arg("--data")
        .arg(path);
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout must be JSON")
}

fn ids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap().to_string())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn schedule_filters_by_class() {
    let path = data_file("schedule-class");
    let lessons = stdout_json(timetable(&path).args(["schedule", "--class", "C1"]));

    assert_eq!(ids(&lessons), vec!["e1", "e4"]);
    assert_eq!(lessons[0]["timeSlot"]["start"], "10:50");
    assert_eq!(lessons[0]["status"], "scheduled");
    assert_eq!(lessons[1]["status"], "teacher_absent");
}

#[test]
fn schedule_filters_combine() {
    let path = data_file("schedule-and");
    let lessons = stdout_json(timetable(&path).args(["schedule", "--class", "C2", "--subject", "Math"]));
    assert_eq!(ids(&lessons), vec!["e3"]);
    assert_eq!(lessons[0]["status"], "teacher_delayed");
}

#[test]
fn schedule_without_filters_is_empty() {
    let path = data_file("schedule-none");
    let lessons = stdout_json(timetable(&path).arg("schedule"));
    assert_eq!(lessons, json!([]));
}

#[test]
fn schedule_week_excludes_other_weeks() {
    let path = data_file("schedule-week");
    let lessons = stdout_json(timetable(&path).args(["schedule", "--teacher", "T1", "--week", "2025-03-10"]));
    assert_eq!(lessons, json!([]));
}

#[test]
fn rooms_board_frees_rooms_of_absent_teachers() {
    let path = data_file("rooms");
    let board = stdout_json(timetable(&path).args(["rooms", "--date", "2025-03-03", "--time", "11:00"]));

    assert_eq!(board[0]["room_name"], "V101");
    assert_eq!(board[0]["available"], false);
    assert_eq!(board[1]["room_name"], "R202");
    assert_eq!(board[1]["available"], true);
    assert_eq!(board[1]["booked_entry_ids"], json!(["e2"]));
}

#[test]
fn rooms_rejects_a_bad_time() {
    let path = data_file("rooms-bad-time");
    timetable(&path)
        .args(["rooms", "--date", "2025-03-03", "--time", "11h"])
        .assert()
        .failure();
}

#[test]
fn absences_dashboard_for_a_day() {
    let path = data_file("absences");
    let dashboard = stdout_json(timetable(&path).args(["absences", "--today", "2025-03-04"]));

    assert_eq!(ids(&dashboard["absences"]), vec!["A1"]);
    assert_eq!(ids(&dashboard["longTerm"]), vec!["A1"]);
    assert_eq!(ids(&dashboard["delays"]), vec!["A2"]);
}

#[test]
fn conflicts_reports_double_bookings() {
    let path = data_file("conflicts");
    let conflicts = stdout_json(timetable(&path).arg("conflicts"));

    assert_eq!(conflicts.as_array().unwrap().len(), 1);
    assert_eq!(conflicts[0]["kind"], "room");
    assert_eq!(conflicts[0]["first_id"], "e3");
    assert_eq!(conflicts[0]["second_id"], "e4");
}

// ─────────────────────────────────────────────────────────────────────────────
// Edits
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn add_entry_requires_credentials() {
    let path = data_file("add-no-auth");
    timetable(&path)
        .args(["add-entry", "--teacher", "T1", "--room", "R1", "--class", "C1"])
        .args(["--subject", "Math", "--date", "2025-03-05", "--slot", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--user"));

    assert_eq!(read_data(&path)["schedule_entries"].as_array().unwrap().len(), 4);
}

#[test]
fn add_entry_rejects_a_wrong_password() {
    let path = data_file("add-bad-auth");
    timetable(&path)
        .args(["--user", USER, "--password", "guess"])
        .args(["add-entry", "--teacher", "T1", "--room", "R1", "--class", "C1"])
        .args(["--subject", "Math", "--date", "2025-03-05", "--slot", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid credentials"));
}

#[test]
fn add_entry_rejects_the_lunch_period() {
    let path = data_file("add-lunch");
    timetable(&path)
        .args(["--user", USER, "--password", PASSWORD])
        .args(["add-entry", "--teacher", "T1", "--room", "R1", "--class", "C1"])
        .args(["--subject", "Math", "--date", "2025-03-05", "--slot", "6"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a course period"));
}

#[test]
fn recurring_add_then_cancel_from_a_later_week() {
    let path = data_file("series");

    let added = stdout_json(
        timetable(&path)
            .args(["--user", USER, "--password", PASSWORD])
            .args(["add-entry", "--teacher", "T1", "--room", "R1", "--class", "C2"])
            .args(["--subject", "Music", "--date", "2025-03-03", "--slot", "4", "--recurring"]),
    );
    assert_eq!(added["mutation"], "entries_added");
    assert_eq!(added["payload"].as_array().unwrap().len(), 17);

    let stored = read_data(&path);
    let rows = stored["schedule_entries"].as_array().unwrap();
    assert_eq!(rows.len(), 4 + 17);
    let anchor = rows
        .iter()
        .find(|r| r["subject"] == "Music" && r["date"] == "2025-03-17")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let removed = stdout_json(
        timetable(&path)
            .args(["--user", USER, "--password", PASSWORD])
            .args(["delete-entry", anchor.as_str(), "--recurring"]),
    );
    assert_eq!(removed["mutation"], "entries_removed");
    assert_eq!(removed["payload"].as_array().unwrap().len(), 15);

    let left: Vec<String> = read_data(&path)["schedule_entries"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["subject"] == "Music")
        .map(|r| r["date"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(left, vec!["2025-03-03", "2025-03-10"]);
}

#[test]
fn delete_single_entry() {
    let path = data_file("delete-one");
    timetable(&path)
        .args(["--user", USER, "--password", PASSWORD, "delete-entry", "e2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("entries_removed"));

    let stored = read_data(&path);
    assert_eq!(ids(&stored["schedule_entries"]), vec!["e1", "e3", "e4"]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Data file
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn invalid_data_file_fails_with_context() {
    let path = DataFile::scratch("invalid");
    std::fs::write(&*path, "{ not json").unwrap();

    timetable(&path)
        .arg("conflicts")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid data file"));
}

#[test]
fn missing_data_file_is_an_empty_timetable() {
    let path = DataFile::scratch("missing");
    let _ = std::fs::remove_file(&*path);

    timetable(&path)
        .arg("conflicts")
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn scratch_data_file_is_removed_on_drop() {
    let path = data_file("scratch").to_path_buf();
    assert!(!path.exists());
}
