//! Two-way mapping between backend rows and model records.
//!
//! Most tables share their column names with the model, so those records go
//! through serde unchanged. Schedule entries and students differ:
//!
//! | model                  | column                    |
//! |------------------------|---------------------------|
//! | `groupIds` (one class) | `class_id`                |
//! | `timeSlot.start/end`   | `start_time`, `end_time`  |
//! | `birthDate`            | `birthdate`               |
//! | `courseId`             | derived from `id` on read |
//!
//! Time columns are written as `HH:MM:SS`; reads accept `HH:MM` too and keep
//! minute precision.

use chrono::{NaiveDate, NaiveTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use timetable_engine::slots::parse_clock;
use timetable_engine::{
    Absence, Class, Gender, NewAbsence, NewClass, NewRoom, NewScheduleEntry, NewStudent, NewTeacher,
    Room, ScheduleEntry, Student, Teacher, TimeSlot, TimetableError,
};

use crate::backend::{Row, Table};
use crate::error::{Result, StoreError};

const COLUMN_TIME_FORMAT: &str = "%H:%M:%S";

/// A model record stored in one backend table.
pub trait Record: Sized {
    const TABLE: Table;
    /// The record before the backend assigned it an id.
    type Draft;

    fn id(&self) -> &str;

    /// Row for an insert. Carries no `id`; the backend assigns it.
    fn draft_row(draft: &Self::Draft) -> Result<Row>;

    /// Row for an update. Carries every column except `id`.
    fn update_row(&self) -> Result<Row>;

    fn from_row(row: Row) -> Result<Self>;
}

fn to_row<T: Serialize>(value: &T) -> Result<Row> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Mapping(format!("expected a JSON object, got {}", other))),
    }
}

fn without_id(mut row: Row) -> Row {
    row.remove("id");
    row
}

fn from_row<T: DeserializeOwned>(row: Row) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Tables whose columns match the model field names.
macro_rules! same_shape_record {
    ($record:ty, $draft:ty, $table:expr) => {
        impl Record for $record {
            const TABLE: Table = $table;
            type Draft = $draft;

            fn id(&self) -> &str {
                &self.id
            }

            fn draft_row(draft: &$draft) -> Result<Row> {
                to_row(draft)
            }

            fn update_row(&self) -> Result<Row> {
                to_row(self).map(without_id)
            }

            fn from_row(row: Row) -> Result<Self> {
                from_row(row)
            }
        }
    };
}

same_shape_record!(Teacher, NewTeacher, Table::Teachers);
same_shape_record!(Room, NewRoom, Table::Rooms);
same_shape_record!(Class, NewClass, Table::Classes);
same_shape_record!(Absence, NewAbsence, Table::Absences);

// ---------------------------------------------------------------------------
// Schedule entries
// ---------------------------------------------------------------------------

/// A `schedule_entries` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntryRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub teacher_id: String,
    pub room_id: String,
    pub class_id: String,
    pub subject: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
}

pub(crate) fn column_time(time: NaiveTime) -> String {
    time.format(COLUMN_TIME_FORMAT).to_string()
}

fn read_time(raw: &str) -> Result<NaiveTime> {
    parse_clock(raw).map_err(|e| StoreError::Mapping(e.to_string()))
}

impl ScheduleEntryRow {
    pub fn from_draft(draft: &NewScheduleEntry) -> Result<Self> {
        let class_id = match draft.group_ids.as_slice() {
            [class_id] => class_id,
            [] => return Err(TimetableError::MissingClass.into()),
            many => return Err(TimetableError::MultipleClasses(many.len()).into()),
        };
        Ok(Self {
            id: None,
            teacher_id: draft.teacher_id.clone(),
            room_id: draft.room_id.clone(),
            class_id: class_id.to_string(),
            subject: draft.subject.clone(),
            date: draft.date,
            start_time: column_time(draft.time_slot.start),
            end_time: column_time(draft.time_slot.end),
        })
    }

    pub fn into_entry(self) -> Result<ScheduleEntry> {
        let id = self
            .id
            .ok_or_else(|| StoreError::Mapping("schedule entry row without id".to_string()))?;
        let time_slot = TimeSlot {
            start: read_time(&self.start_time)?,
            end: read_time(&self.end_time)?,
        };
        let draft = NewScheduleEntry {
            teacher_id: self.teacher_id,
            room_id: self.room_id,
            subject: self.subject,
            group_ids: vec![self.class_id],
            date: self.date,
            time_slot,
        };
        Ok(draft.with_id(id))
    }
}

impl Record for ScheduleEntry {
    const TABLE: Table = Table::ScheduleEntries;
    type Draft = NewScheduleEntry;

    fn id(&self) -> &str {
        &self.id
    }

    fn draft_row(draft: &NewScheduleEntry) -> Result<Row> {
        to_row(&ScheduleEntryRow::from_draft(draft)?)
    }

    fn update_row(&self) -> Result<Row> {
        Self::draft_row(&self.to_draft())
    }

    fn from_row(row: Row) -> Result<Self> {
        from_row::<ScheduleEntryRow>(row)?.into_entry()
    }
}

// ---------------------------------------------------------------------------
// Students
// ---------------------------------------------------------------------------

/// A `students` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub student_number: String,
    pub birthdate: NaiveDate,
    pub gender: Gender,
    pub class_id: String,
}

impl From<&NewStudent> for StudentRow {
    fn from(draft: &NewStudent) -> Self {
        Self {
            id: None,
            name: draft.name.clone(),
            student_number: draft.student_number.clone(),
            birthdate: draft.birth_date,
            gender: draft.gender,
            class_id: draft.class_id.clone(),
        }
    }
}

impl Record for Student {
    const TABLE: Table = Table::Students;
    type Draft = NewStudent;

    fn id(&self) -> &str {
        &self.id
    }

    fn draft_row(draft: &NewStudent) -> Result<Row> {
        to_row(&StudentRow::from(draft))
    }

    fn update_row(&self) -> Result<Row> {
        let draft = NewStudent {
            name: self.name.clone(),
            student_number: self.student_number.clone(),
            birth_date: self.birth_date,
            gender: self.gender,
            class_id: self.class_id.clone(),
        };
        Self::draft_row(&draft)
    }

    fn from_row(row: Row) -> Result<Self> {
        let row: StudentRow = from_row(row)?;
        let id = row
            .id
            .ok_or_else(|| StoreError::Mapping("student row without id".to_string()))?;
        Ok(NewStudent {
            name: row.name,
            student_number: row.student_number,
            birth_date: row.birthdate,
            gender: row.gender,
            class_id: row.class_id,
        }
        .with_id(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entry_row_uses_seconds_and_single_class() {
        let draft = NewScheduleEntry {
            teacher_id: "T1".into(),
            room_id: "R1".into(),
            subject: "Math".into(),
            group_ids: vec!["C1".into()],
            date: "2025-03-03".parse().unwrap(),
            time_slot: TimeSlot::parse("08:05", "08:55").unwrap(),
        };
        let row = ScheduleEntry::draft_row(&draft).unwrap();

        assert_eq!(row["start_time"], json!("08:05:00"));
        assert_eq!(row["end_time"], json!("08:55:00"));
        assert_eq!(row["class_id"], json!("C1"));
        assert!(!row.contains_key("id"));
        assert!(!row.contains_key("group_ids"));
    }

    #[test]
    fn entry_without_class_cannot_be_written() {
        let draft = NewScheduleEntry {
            teacher_id: "T1".into(),
            room_id: "R1".into(),
            subject: "Math".into(),
            group_ids: vec![],
            date: "2025-03-03".parse().unwrap(),
            time_slot: TimeSlot::parse("08:05", "08:55").unwrap(),
        };
        assert!(matches!(
            ScheduleEntry::draft_row(&draft),
            Err(StoreError::Validation(TimetableError::MissingClass))
        ));
    }

    #[test]
    fn entry_for_two_classes_cannot_be_written() {
        let draft = NewScheduleEntry {
            teacher_id: "T1".into(),
            room_id: "R1".into(),
            subject: "Math".into(),
            group_ids: vec!["C1".into(), "C2".into()],
            date: "2025-03-03".parse().unwrap(),
            time_slot: TimeSlot::parse("08:05", "08:55").unwrap(),
        };
        assert!(matches!(
            ScheduleEntry::draft_row(&draft),
            Err(StoreError::Validation(TimetableError::MultipleClasses(2)))
        ));
    }

    #[test]
    fn malformed_time_column_is_a_mapping_error() {
        let row = json!({
            "id": "e1", "teacher_id": "T1", "room_id": "R1", "class_id": "C1",
            "subject": "Math", "date": "2025-03-03",
            "start_time": "8h05", "end_time": "08:55:00"
        });
        let result = ScheduleEntry::from_row(row.as_object().cloned().unwrap());
        assert!(matches!(result, Err(StoreError::Mapping(_))));
    }
}
