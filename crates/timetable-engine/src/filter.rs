//! Schedule display query and management-screen search.
//!
//! The schedule view shows nothing until at least one of class, teacher, or
//! subject is selected. Once one is, the selected filters are combined with AND.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::{Class, Room, ScheduleEntry, Student, Teacher};

/// Active schedule filters. An empty string counts as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleQuery {
    #[serde(default)]
    pub class_id: Option<String>,
    #[serde(default)]
    pub teacher_id: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

fn active(filter: &Option<String>) -> Option<&str> {
    filter.as_deref().filter(|s| !s.is_empty())
}

impl ScheduleQuery {
    pub fn is_empty(&self) -> bool {
        active(&self.class_id).is_none()
            && active(&self.teacher_id).is_none()
            && active(&self.subject).is_none()
    }

    /// An empty query matches nothing.
    pub fn matches(&self, entry: &ScheduleEntry) -> bool {
        if self.is_empty() {
            return false;
        }
        if let Some(class_id) = active(&self.class_id) {
            if !entry.group_ids.iter().any(|g| g == class_id) {
                return false;
            }
        }
        if let Some(teacher_id) = active(&self.teacher_id) {
            if entry.teacher_id != teacher_id {
                return false;
            }
        }
        if let Some(subject) = active(&self.subject) {
            if entry.subject != subject {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, entries: &'a [ScheduleEntry]) -> Vec<&'a ScheduleEntry> {
        entries.iter().filter(|e| self.matches(e)).collect()
    }
}

/// Monday through Friday of the week containing `day`.
pub fn school_week(day: NaiveDate) -> [NaiveDate; 5] {
    let monday = day - Duration::days(i64::from(day.weekday().num_days_from_monday()));
    [0, 1, 2, 3, 4].map(|offset| monday + Duration::days(offset))
}

/// Entries falling on a school day of the week containing `day`, sorted by date
/// then start time.
pub fn in_school_week<'a>(entries: &[&'a ScheduleEntry], day: NaiveDate) -> Vec<&'a ScheduleEntry> {
    let week = school_week(day);
    let mut selected: Vec<&ScheduleEntry> = entries
        .iter()
        .copied()
        .filter(|e| week.contains(&e.date))
        .collect();
    selected.sort_by_key(|e| (e.date, e.time_slot.start));
    selected
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Teachers whose name or email contains `term`, case-insensitively.
pub fn search_teachers<'a>(teachers: &'a [Teacher], term: &str) -> Vec<&'a Teacher> {
    teachers
        .iter()
        .filter(|t| contains_ignore_case(&t.name, term) || contains_ignore_case(&t.email, term))
        .collect()
}

pub fn search_rooms<'a>(rooms: &'a [Room], term: &str) -> Vec<&'a Room> {
    rooms
        .iter()
        .filter(|r| contains_ignore_case(&r.name, term))
        .collect()
}

pub fn search_classes<'a>(classes: &'a [Class], term: &str) -> Vec<&'a Class> {
    classes
        .iter()
        .filter(|c| contains_ignore_case(&c.name, term))
        .collect()
}

pub fn students_in_class<'a>(students: &'a [Student], class_id: &str) -> Vec<&'a Student> {
    students.iter().filter(|s| s.class_id == class_id).collect()
}
