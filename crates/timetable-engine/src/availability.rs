//! Room availability and absence lookups.
//!
//! A room is busy during a period when a lesson is scheduled there, unless the
//! lesson's teacher is absent that day. There is no substitute tracking: a room
//! booked by an absent teacher is reported free.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::model::{Absence, AbsenceKind, Room, ScheduleEntry};
use crate::slots;

/// The first absence or delay of `teacher_id` that covers `date`.
pub fn absence_covering<'a>(
    teacher_id: &str,
    date: NaiveDate,
    absences: &'a [Absence],
) -> Option<&'a Absence> {
    absences
        .iter()
        .find(|a| a.teacher_id == teacher_id && a.covers(date))
}

/// Whether `room_id` is free on `date` at `time`.
///
/// 1. A time outside every period (before school, the morning break, after
///    school) is always free.
/// 2. Otherwise the lessons in that room, on that date, starting at that period's
///    start are collected. The room is free when there are none, or when every one
///    of their teachers has an absence covering the date.
pub fn is_room_available(
    room_id: &str,
    date: NaiveDate,
    time: NaiveTime,
    entries: &[ScheduleEntry],
    absences: &[Absence],
) -> bool {
    occupying_entries(room_id, date, time, entries)
        .iter()
        .all(|entry| absence_covering(&entry.teacher_id, date, absences).is_some())
}

/// Lessons held in `room_id` during the period that contains `time`.
pub fn occupying_entries<'a>(
    room_id: &str,
    date: NaiveDate,
    time: NaiveTime,
    entries: &'a [ScheduleEntry],
) -> Vec<&'a ScheduleEntry> {
    let Some(period) = slots::period_at(time) else {
        return Vec::new();
    };
    let start = period.start();

    entries
        .iter()
        .filter(|e| e.date == date && e.room_id == room_id && e.time_slot.start == start)
        .collect()
}

/// How a lesson should be presented given its teacher's absences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Scheduled,
    TeacherAbsent,
    TeacherDelayed,
}

pub fn entry_status(entry: &ScheduleEntry, absences: &[Absence]) -> EntryStatus {
    match absence_covering(&entry.teacher_id, entry.date, absences).map(|a| a.kind) {
        None => EntryStatus::Scheduled,
        Some(AbsenceKind::Absence) => EntryStatus::TeacherAbsent,
        Some(AbsenceKind::Delay) => EntryStatus::TeacherDelayed,
    }
}

/// Availability of a single room at a given moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomAvailability {
    pub room_id: String,
    pub room_name: String,
    pub available: bool,
    /// Lessons booked in the room for that period, including ones whose teacher is absent.
    pub booked_entry_ids: Vec<String>,
}

/// Availability of every room on `date` at `time`, in the order of `rooms`.
pub fn room_board(
    rooms: &[Room],
    date: NaiveDate,
    time: NaiveTime,
    entries: &[ScheduleEntry],
    absences: &[Absence],
) -> Vec<RoomAvailability> {
    rooms
        .iter()
        .map(|room| RoomAvailability {
            room_id: room.id.clone(),
            room_name: room.name.clone(),
            available: is_room_available(&room.id, date, time, entries, absences),
            booked_entry_ids: occupying_entries(&room.id, date, time, entries)
                .into_iter()
                .map(|e| e.id.clone())
                .collect(),
        })
        .collect()
}
