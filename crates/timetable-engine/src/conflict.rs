//! Double-booking report.
//!
//! Lessons are never blocked at creation time; overlaps are only surfaced. Because
//! every lesson sits on the period grid, two lessons overlap exactly when they share
//! a date and a start time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{ScheduleEntry, TimeSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    /// Two lessons in the same room.
    Room,
    /// The same teacher in two lessons.
    Teacher,
}

/// Two lessons booked against the same resource at the same time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubleBooking {
    pub kind: ConflictKind,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub first_id: String,
    pub second_id: String,
}

/// Find every pair of lessons sharing a room or a teacher in the same period.
///
/// A pair sharing both is reported twice, once per kind. Pairs keep the input order.
pub fn find_double_bookings(entries: &[ScheduleEntry]) -> Vec<DoubleBooking> {
    let mut bookings = Vec::new();

    for (i, a) in entries.iter().enumerate() {
        for b in &entries[i + 1..] {
            if a.date != b.date || a.time_slot.start != b.time_slot.start {
                continue;
            }
            let mut report = |kind| {
                bookings.push(DoubleBooking {
                    kind,
                    date: a.date,
                    time_slot: a.time_slot,
                    first_id: a.id.clone(),
                    second_id: b.id.clone(),
                })
            };
            if a.room_id == b.room_id {
                report(ConflictKind::Room);
            }
            if a.teacher_id == b.teacher_id {
                report(ConflictKind::Teacher);
            }
        }
    }

    bookings
}
