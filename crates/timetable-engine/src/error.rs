//! Error types for timetable-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimetableError {
    #[error("Invalid time slot: {0}")]
    InvalidTimeSlot(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Schedule entry has no class")]
    MissingClass,

    #[error("Schedule entry belongs to {0} classes, expected exactly one")]
    MultipleClasses(usize),

    #[error("Recurrence error: {0}")]
    Recurrence(String),
}

pub type Result<T> = std::result::Result<T, TimetableError>;
