//! Absence summaries for the administration dashboard, and the dismissal report
//! listing the lessons an absence leaves without a teacher.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::model::{Absence, AbsenceKind, Class, ScheduleEntry};

/// Absences (not delays) covering `today`.
pub fn absences_today(absences: &[Absence], today: NaiveDate) -> Vec<&Absence> {
    absences
        .iter()
        .filter(|a| a.kind == AbsenceKind::Absence && a.covers(today))
        .collect()
}

/// Absences with an explicit end date after `today` that are already under way.
pub fn long_term_absences(absences: &[Absence], today: NaiveDate) -> Vec<&Absence> {
    absences
        .iter()
        .filter(|a| a.kind == AbsenceKind::Absence)
        .filter(|a| matches!(a.end_date, Some(end) if end > today))
        .filter(|a| a.covers(today))
        .collect()
}

pub fn delays_today(absences: &[Absence], today: NaiveDate) -> Vec<&Absence> {
    absences
        .iter()
        .filter(|a| a.kind == AbsenceKind::Delay && a.start_date == today)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedClass {
    pub class_id: String,
    pub class_name: String,
    /// `"<Weekday> HH:MM-HH:MM"`, chronological.
    pub periods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissalReport {
    pub teacher_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub affected_classes: Vec<AffectedClass>,
}

/// Classes losing a lesson while `teacher_id` is away from `start` to `end`
/// inclusive, ordered by class name.
///
/// Lessons whose class is unknown are reported under the raw class id.
pub fn dismissal_report(
    teacher_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    entries: &[ScheduleEntry],
    classes: &[Class],
) -> DismissalReport {
    let mut lessons: Vec<&ScheduleEntry> = entries
        .iter()
        .filter(|e| e.teacher_id == teacher_id && start <= e.date && e.date <= end)
        .collect();
    lessons.sort_by_key(|e| (e.date, e.time_slot.start));

    let mut affected: Vec<AffectedClass> = Vec::new();
    for lesson in lessons {
        let Some(class_id) = lesson.class_id() else {
            continue;
        };
        let period = format!("{} {}", weekday_name(lesson.date.weekday()), lesson.time_slot);
        match affected.iter_mut().find(|c| c.class_id == class_id) {
            Some(class) => class.periods.push(period),
            None => affected.push(AffectedClass {
                class_id: class_id.to_string(),
                class_name: classes
                    .iter()
                    .find(|c| c.id == class_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| class_id.to_string()),
                periods: vec![period],
            }),
        }
    }
    affected.sort_by(|a, b| a.class_name.cmp(&b.class_name));

    DismissalReport {
        teacher_id: teacher_id.to_string(),
        start_date: start,
        end_date: end,
        affected_classes: affected,
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
