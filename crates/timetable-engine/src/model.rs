//! Timetable data model.
//!
//! Entities carry the ids the backend assigned them. Each has a matching
//! `New*` draft used for creation, which is the same record without an id.
//!
//! Schedule entries and students serialize in camelCase; the other entities
//! keep the column names they share with the backend.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TimetableError};
use crate::slots;

// ---------------------------------------------------------------------------
// Teachers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
    /// Subjects this teacher can be scheduled for, in display order.
    #[serde(default)]
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTeacher {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
}

impl NewTeacher {
    pub fn with_id(self, id: impl Into<String>) -> Teacher {
        Teacher {
            id: id.into(),
            name: self.name,
            email: self.email,
            phone: self.phone,
            abbreviation: self.abbreviation,
            subjects: self.subjects,
        }
    }
}

impl Teacher {
    pub fn teaches(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s == subject)
    }
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    Classroom,
    Workshop,
    Lab,
    Gym,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub capacity: u32,
    #[serde(rename = "type", default)]
    pub kind: Option<RoomKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoom {
    pub name: String,
    pub capacity: u32,
    #[serde(rename = "type", default)]
    pub kind: Option<RoomKind>,
}

impl NewRoom {
    pub fn with_id(self, id: impl Into<String>) -> Room {
        Room {
            id: id.into(),
            name: self.name,
            capacity: self.capacity,
            kind: self.kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Classes and students
// ---------------------------------------------------------------------------

/// A class (group of students).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: String,
    pub name: String,
    pub level: String,
    #[serde(default)]
    pub student_count: Option<u32>,
    #[serde(default)]
    pub adult_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClass {
    pub name: String,
    pub level: String,
    #[serde(default)]
    pub student_count: Option<u32>,
    #[serde(default)]
    pub adult_count: Option<u32>,
}

impl NewClass {
    pub fn with_id(self, id: impl Into<String>) -> Class {
        Class {
            id: id.into(),
            name: self.name,
            level: self.level,
            student_count: self.student_count,
            adult_count: self.adult_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub student_number: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub class_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub name: String,
    pub student_number: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub class_id: String,
}

impl NewStudent {
    pub fn with_id(self, id: impl Into<String>) -> Student {
        Student {
            id: id.into(),
            name: self.name,
            student_number: self.student_number,
            birth_date: self.birth_date,
            gender: self.gender,
            class_id: self.class_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule entries
// ---------------------------------------------------------------------------

/// Start and end of a lesson, at minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl TimeSlot {
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self {
            start: slots::parse_clock(start)?,
            end: slots::parse_clock(end)?,
        })
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            slots::format_clock(self.start),
            slots::format_clock(self.end)
        )
    }
}

/// One lesson occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: String,
    pub course_id: String,
    pub teacher_id: String,
    pub room_id: String,
    pub subject: String,
    /// Modeled as a list, but every persisted write uses exactly one class.
    pub group_ids: Vec<String>,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScheduleEntry {
    pub teacher_id: String,
    pub room_id: String,
    pub subject: String,
    pub group_ids: Vec<String>,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
}

/// Course ids are derived from the entry id; the backend has no such column.
pub fn course_id_for(entry_id: &str) -> String {
    format!("{}-course", entry_id)
}

impl NewScheduleEntry {
    pub fn with_id(self, id: impl Into<String>) -> ScheduleEntry {
        let id = id.into();
        ScheduleEntry {
            course_id: course_id_for(&id),
            id,
            teacher_id: self.teacher_id,
            room_id: self.room_id,
            subject: self.subject,
            group_ids: self.group_ids,
            date: self.date,
            time_slot: self.time_slot,
        }
    }

    pub fn class_id(&self) -> Option<&str> {
        self.group_ids.first().map(String::as_str)
    }

    /// Check the draft against the period grid and the single-class rule.
    pub fn validate(&self) -> Result<()> {
        slots::validate_course_slot(&self.time_slot)?;
        match self.group_ids.len() {
            0 => Err(TimetableError::MissingClass),
            1 => Ok(()),
            n => Err(TimetableError::MultipleClasses(n)),
        }
    }
}

impl ScheduleEntry {
    pub fn class_id(&self) -> Option<&str> {
        self.group_ids.first().map(String::as_str)
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    pub fn to_draft(&self) -> NewScheduleEntry {
        NewScheduleEntry {
            teacher_id: self.teacher_id.clone(),
            room_id: self.room_id.clone(),
            subject: self.subject.clone(),
            group_ids: self.group_ids.clone(),
            date: self.date,
            time_slot: self.time_slot,
        }
    }

    /// Same lesson on the same day: everything but the id matches.
    pub fn same_lesson(&self, draft: &NewScheduleEntry) -> bool {
        self.teacher_id == draft.teacher_id
            && self.room_id == draft.room_id
            && self.subject == draft.subject
            && self.group_ids == draft.group_ids
            && self.date == draft.date
            && self.time_slot == draft.time_slot
    }
}

// ---------------------------------------------------------------------------
// Absences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsenceKind {
    Absence,
    Delay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absence {
    pub id: String,
    pub teacher_id: String,
    pub start_date: NaiveDate,
    /// Last day of an absence; `None` means a single day. Always `None` for delays.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub kind: AbsenceKind,
    /// Expected arrival time of a delay.
    #[serde(rename = "delay_time_str", default, with = "hhmm::option")]
    pub delay_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAbsence {
    pub teacher_id: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub kind: AbsenceKind,
    #[serde(rename = "delay_time_str", default, with = "hhmm::option")]
    pub delay_time: Option<NaiveTime>,
}

impl NewAbsence {
    /// A multi-day absence, `start..=end`.
    pub fn absence(teacher_id: impl Into<String>, start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            start_date: start,
            end_date: end,
            kind: AbsenceKind::Absence,
            delay_time: None,
        }
    }

    /// A late arrival on a single day.
    pub fn delay(teacher_id: impl Into<String>, day: NaiveDate, arrival: NaiveTime) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            start_date: day,
            end_date: None,
            kind: AbsenceKind::Delay,
            delay_time: Some(arrival),
        }
    }

    pub fn with_id(self, id: impl Into<String>) -> Absence {
        Absence {
            id: id.into(),
            teacher_id: self.teacher_id,
            start_date: self.start_date,
            end_date: self.end_date,
            kind: self.kind,
            delay_time: self.delay_time,
        }
    }
}

impl Absence {
    /// Last covered day. Delays cover their start day only.
    pub fn last_day(&self) -> NaiveDate {
        match self.kind {
            AbsenceKind::Absence => self.end_date.unwrap_or(self.start_date),
            AbsenceKind::Delay => self.start_date,
        }
    }

    /// Inclusive on both ends.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.last_day()
    }
}

/// `HH:MM` serde helpers for times of day.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::slots;

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&slots::format_clock(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        slots::parse_clock(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => serializer.serialize_some(&slots::format_clock(*t)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            raw.map(|s| slots::parse_clock(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
