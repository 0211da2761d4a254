//! Weekly lesson series.
//!
//! A recurring lesson is expanded once, at creation time, into one concrete entry
//! per week up to the end of the school year. Cancelling "this and following"
//! resolves the series from any of its entries and removes the anchor plus every
//! later occurrence; earlier occurrences are left alone.
//!
//! Weekly dates go through the `rrule` crate, so the expansion follows RFC 5545
//! `FREQ=WEEKLY` semantics.

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use rrule::RRuleSet;

use crate::error::{Result, TimetableError};
use crate::model::{NewScheduleEntry, ScheduleEntry, TimeSlot};

/// Last day of the school year. Series never run past it.
pub fn school_year_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 30).expect("school year end is a valid calendar date")
}

/// Expand a lesson into the entries to persist.
///
/// Without `is_recurring` the result is exactly `[entry]`. Otherwise the entry is
/// followed by one copy per week, each 7 days after the previous one, for as long
/// as the next date is strictly before [`school_year_end`]. Copies differ from the
/// original only in `date`.
///
/// No double-booking check happens here; see [`crate::conflict`].
///
/// # Errors
/// Returns `TimetableError::Recurrence` if the weekly rule cannot be expanded.
pub fn expand(entry: NewScheduleEntry, is_recurring: bool) -> Result<Vec<NewScheduleEntry>> {
    if !is_recurring {
        return Ok(vec![entry]);
    }

    let dates = weekly_dates_before(entry.date, school_year_end())?;
    Ok(dates
        .into_iter()
        .map(|date| NewScheduleEntry {
            date,
            ..entry.clone()
        })
        .collect())
}

/// Every 7th day from `start` (inclusive) that falls strictly before `cutoff`.
///
/// `start` itself is always returned, even when it is on or after `cutoff`.
pub fn weekly_dates_before(start: NaiveDate, cutoff: NaiveDate) -> Result<Vec<NaiveDate>> {
    if start >= cutoff {
        return Ok(vec![start]);
    }

    // UNTIL is inclusive, so the last admissible day is the one before the cutoff.
    let last = cutoff - Duration::days(1);
    let weeks = (last - start).num_days() / 7 + 1;
    let limit = u16::try_from(weeks).map_err(|_| {
        TimetableError::Recurrence(format!(
            "series from {} to {} has {} occurrences",
            start, cutoff, weeks
        ))
    })?;

    let rule_text = format!(
        "DTSTART:{}T000000Z\nRRULE:FREQ=WEEKLY;UNTIL={}T000000Z",
        start.format("%Y%m%d"),
        last.format("%Y%m%d")
    );
    let rule_set: RRuleSet = rule_text
        .parse()
        .map_err(|e| TimetableError::Recurrence(format!("{}", e)))?;

    Ok(rule_set
        .all(limit)
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .collect())
}

/// What a weekly series has in common: everything but the date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesKey {
    pub teacher_id: String,
    pub room_id: String,
    pub subject: String,
    pub time_slot: TimeSlot,
    pub weekday: Weekday,
}

impl SeriesKey {
    pub fn of(entry: &ScheduleEntry) -> Self {
        Self {
            teacher_id: entry.teacher_id.clone(),
            room_id: entry.room_id.clone(),
            subject: entry.subject.clone(),
            time_slot: entry.time_slot,
            weekday: entry.date.weekday(),
        }
    }

    /// Weekday is derived from the candidate's date, never stored.
    pub fn matches(&self, entry: &ScheduleEntry) -> bool {
        entry.teacher_id == self.teacher_id
            && entry.room_id == self.room_id
            && entry.subject == self.subject
            && entry.time_slot == self.time_slot
            && entry.date.weekday() == self.weekday
    }
}

/// Which entries a deletion removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelCriteria {
    /// Exactly one entry.
    Single { id: String },
    /// The anchor and every later occurrence of its series, up to `until`.
    Following {
        key: SeriesKey,
        from: NaiveDate,
        until: NaiveDate,
    },
}

/// Resolve a deletion request into removal criteria.
///
/// Without `delete_recurring` this is always [`CancelCriteria::Single`]. With it,
/// the anchor entry is looked up in `entries`; `None` means there is no such
/// entry and nothing should be removed.
pub fn cancel(entry_id: &str, delete_recurring: bool, entries: &[ScheduleEntry]) -> Option<CancelCriteria> {
    if !delete_recurring {
        return Some(CancelCriteria::Single {
            id: entry_id.to_string(),
        });
    }

    let anchor = entries.iter().find(|e| e.id == entry_id)?;
    Some(CancelCriteria::following(anchor))
}

impl CancelCriteria {
    pub fn following(anchor: &ScheduleEntry) -> Self {
        CancelCriteria::Following {
            key: SeriesKey::of(anchor),
            from: anchor.date,
            until: school_year_end(),
        }
    }

    pub fn matches(&self, entry: &ScheduleEntry) -> bool {
        match self {
            CancelCriteria::Single { id } => entry.id == *id,
            CancelCriteria::Following { key, from, until } => {
                *from <= entry.date && entry.date <= *until && key.matches(entry)
            }
        }
    }

    /// Remove every matching entry, returning the removed ids in their original order.
    pub fn apply(&self, entries: &mut Vec<ScheduleEntry>) -> Vec<String> {
        let mut removed = Vec::new();
        entries.retain(|entry| {
            if self.matches(entry) {
                removed.push(entry.id.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// The dates a `Following` cancellation can hit: the anchor date and every
    /// 7th day after it through `until` (inclusive). Empty for `Single`.
    ///
    /// Lets a backend that only filters on columns express the weekday rule as a
    /// set of dates.
    pub fn series_dates(&self) -> Result<Vec<NaiveDate>> {
        match self {
            CancelCriteria::Single { .. } => Ok(Vec::new()),
            CancelCriteria::Following { from, until, .. } => {
                if from > until {
                    return Ok(Vec::new());
                }
                weekly_dates_before(*from, *until + Duration::days(1))
            }
        }
    }
}
