//! The fixed daily period grid.
//!
//! Every schedule entry and every availability check is aligned to one of ten
//! periods. Two stretches of the day carry no lesson: the lunch period, which is
//! part of the grid, and the morning break between the third and fourth period,
//! which is not covered by any period at all.

use chrono::{Duration, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimetableError};
use crate::model::TimeSlot;

/// What a period is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Course,
    Break,
    Lunch,
}

/// One window of the school day.
///
/// Bounds are kept as minutes after midnight so the grid can be a `const`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub number: u8,
    start_minute: u16,
    end_minute: u16,
    pub kind: SlotKind,
    pub label: &'static str,
}

const fn period(number: u8, start: (u16, u16), end: (u16, u16), kind: SlotKind, label: &'static str) -> Period {
    Period {
        number,
        start_minute: start.0 * 60 + start.1,
        end_minute: end.0 * 60 + end.1,
        kind,
        label,
    }
}

/// The ten periods of a school day, in order.
pub const PERIODS: [Period; 10] = [
    period(1, (8, 5), (8, 55), SlotKind::Course, "1st period"),
    period(2, (8, 55), (9, 45), SlotKind::Course, "2nd period"),
    period(3, (9, 45), (10, 35), SlotKind::Course, "3rd period"),
    period(4, (10, 50), (11, 40), SlotKind::Course, "4th period"),
    period(5, (11, 40), (12, 30), SlotKind::Course, "5th period"),
    period(6, (12, 30), (13, 30), SlotKind::Lunch, "Lunch break"),
    period(7, (13, 30), (14, 20), SlotKind::Course, "7th period"),
    period(8, (14, 20), (15, 10), SlotKind::Course, "8th period"),
    period(9, (15, 10), (16, 0), SlotKind::Course, "9th period"),
    period(10, (16, 0), (16, 50), SlotKind::Course, "10th period"),
];

/// The gap between the third and fourth period. Not part of [`PERIODS`].
pub const MORNING_BREAK: Period = period(0, (10, 35), (10, 50), SlotKind::Break, "Morning break");

impl Period {
    pub fn start(&self) -> NaiveTime {
        from_minute_of_day(self.start_minute)
    }

    pub fn end(&self) -> NaiveTime {
        from_minute_of_day(self.end_minute)
    }

    /// Half-open containment: `start <= time < end`.
    pub fn contains(&self, time: NaiveTime) -> bool {
        let minute = minute_of_day(time);
        self.start_minute <= minute && minute < self.end_minute
    }

    pub fn time_slot(&self) -> TimeSlot {
        TimeSlot {
            start: self.start(),
            end: self.end(),
        }
    }

    pub fn is_course(&self) -> bool {
        self.kind == SlotKind::Course
    }
}

/// The period containing `time`, if any. Times in the morning break, before the
/// first period, or after the last one return `None`.
pub fn period_at(time: NaiveTime) -> Option<&'static Period> {
    PERIODS.iter().find(|p| p.contains(time))
}

/// Look up a period by its 1-based number.
pub fn period_by_number(number: u8) -> Option<&'static Period> {
    PERIODS.iter().find(|p| p.number == number)
}

/// The course period whose bounds are exactly `slot`.
pub fn course_period_for(slot: &TimeSlot) -> Option<&'static Period> {
    PERIODS
        .iter()
        .find(|p| p.is_course() && p.start() == slot.start && p.end() == slot.end)
}

/// Reject a time slot that is not one of the course periods.
pub fn validate_course_slot(slot: &TimeSlot) -> Result<&'static Period> {
    course_period_for(slot).ok_or_else(|| TimetableError::InvalidTimeSlot(slot.to_string()))
}

/// Parse a wall-clock time given as `HH:MM` or `HH:MM:SS`.
///
/// Seconds are dropped: the timetable works at minute precision.
pub fn parse_clock(s: &str) -> Result<NaiveTime> {
    let trimmed = s.trim();
    let time = NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| TimetableError::InvalidTime(s.to_string()))?;
    Ok(from_minute_of_day(minute_of_day(time)))
}

/// Format a time as `HH:MM`.
pub fn format_clock(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

fn minute_of_day(time: NaiveTime) -> u16 {
    (time.hour() * 60 + time.minute()) as u16
}

fn from_minute_of_day(minute: u16) -> NaiveTime {
    NaiveTime::default() + Duration::minutes(i64::from(minute))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        parse_clock(s).unwrap()
    }

    #[test]
    fn grid_is_contiguous_except_for_the_morning_break() {
        for pair in PERIODS.windows(2) {
            if pair[0].number == 3 {
                assert_eq!(pair[0].end(), MORNING_BREAK.start());
                assert_eq!(pair[1].start(), MORNING_BREAK.end());
            } else {
                assert_eq!(pair[0].end(), pair[1].start());
            }
        }
    }

    #[test]
    fn period_lookup_is_half_open() {
        assert_eq!(period_at(t("08:05")).map(|p| p.number), Some(1));
        assert_eq!(period_at(t("08:54")).map(|p| p.number), Some(1));
        assert_eq!(period_at(t("08:55")).map(|p| p.number), Some(2));
        assert_eq!(period_at(t("12:45")).map(|p| p.kind), Some(SlotKind::Lunch));
    }

    #[test]
    fn gaps_have_no_period() {
        assert!(period_at(t("07:59")).is_none());
        assert!(period_at(t("10:40")).is_none());
        assert!(period_at(t("16:50")).is_none());
    }

    #[test]
    fn lunch_is_not_a_course_slot() {
        let lunch = period_by_number(6).unwrap();
        assert!(validate_course_slot(&lunch.time_slot()).is_err());
        assert!(validate_course_slot(&period_by_number(7).unwrap().time_slot()).is_ok());
    }

    #[test]
    fn clock_parsing_truncates_to_the_minute() {
        assert_eq!(format_clock(t("08:05:00")), "08:05");
        assert_eq!(format_clock(t("08:05:59")), "08:05");
        assert_eq!(format_clock(t(" 16:00 ")), "16:00");
        assert!(parse_clock("8h05").is_err());
    }
}
