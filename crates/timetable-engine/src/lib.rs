//! # timetable-engine
//!
//! Weekly school timetable logic: recurring lesson series, room availability,
//! and the schedule filters used by the administration screens.
//!
//! Everything here is pure and synchronous. The engine works on collections the
//! caller already loaded from the backend; persistence lives in
//! `timetable-store`.
//!
//! ## Modules
//!
//! - [`model`]: teachers, rooms, classes, students, schedule entries, absences
//! - [`slots`]: the fixed daily period grid and clock parsing
//! - [`recurrence`]: weekly series expansion and "this and following" cancellation
//! - [`availability`]: room availability and absence lookups
//! - [`filter`]: schedule display query and substring search
//! - [`conflict`]: double-booking report (surfaced, never blocked)
//! - [`dashboard`]: absence summaries and dismissal report
//! - [`error`]: Error types

pub mod availability;
pub mod conflict;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod model;
pub mod recurrence;
pub mod slots;

pub use availability::{absence_covering, entry_status, is_room_available, room_board, EntryStatus};
pub use conflict::find_double_bookings;
pub use error::TimetableError;
pub use filter::ScheduleQuery;
pub use model::{
    Absence, AbsenceKind, Class, Gender, NewAbsence, NewClass, NewRoom, NewScheduleEntry,
    NewStudent, NewTeacher, Room, RoomKind, ScheduleEntry, Student, Teacher, TimeSlot,
};
pub use recurrence::{cancel, expand, school_year_end, CancelCriteria};
pub use slots::{period_at, Period, SlotKind, PERIODS};
