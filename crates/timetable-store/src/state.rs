//! Cached collections and the mutations applied to them.
//!
//! [`AppState`] only changes through [`AppState::apply`], and the service
//! calls it only after the backend accepted the matching write.

use serde::{Deserialize, Serialize};

use timetable_engine::{Absence, Class, Room, ScheduleEntry, Student, Teacher};

/// A successful change to the cached collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mutation", content = "payload", rename_all = "snake_case")]
pub enum Mutation {
    TeacherAdded(Teacher),
    TeacherUpdated(Teacher),
    TeacherDeleted(String),
    RoomAdded(Room),
    RoomUpdated(Room),
    RoomDeleted(String),
    ClassAdded(Class),
    ClassUpdated(Class),
    ClassDeleted(String),
    StudentAdded(Student),
    StudentUpdated(Student),
    StudentDeleted(String),
    AbsenceAdded(Absence),
    AbsenceUpdated(Absence),
    AbsenceDeleted(String),
    EntriesAdded(Vec<ScheduleEntry>),
    EntryUpdated(ScheduleEntry),
    EntriesRemoved(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    teachers: Vec<Teacher>,
    rooms: Vec<Room>,
    classes: Vec<Class>,
    students: Vec<Student>,
    absences: Vec<Absence>,
    schedule_entries: Vec<ScheduleEntry>,
}

trait Identified {
    fn key(&self) -> &str;
}

macro_rules! identified {
    ($($t:ty),*) => {
        $(impl Identified for $t {
            fn key(&self) -> &str {
                &self.id
            }
        })*
    };
}

identified!(Teacher, Room, Class, Student, Absence, ScheduleEntry);

fn replace<T: Identified + Clone>(items: &mut [T], updated: &T) {
    if let Some(slot) = items.iter_mut().find(|item| item.key() == updated.key()) {
        *slot = updated.clone();
    }
}

fn remove<T: Identified>(items: &mut Vec<T>, id: &str) {
    items.retain(|item| item.key() != id);
}

impl AppState {
    pub fn new(
        teachers: Vec<Teacher>,
        rooms: Vec<Room>,
        classes: Vec<Class>,
        students: Vec<Student>,
        absences: Vec<Absence>,
        schedule_entries: Vec<ScheduleEntry>,
    ) -> Self {
        Self {
            teachers,
            rooms,
            classes,
            students,
            absences,
            schedule_entries,
        }
    }

    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn absences(&self) -> &[Absence] {
        &self.absences
    }

    pub fn schedule_entries(&self) -> &[ScheduleEntry] {
        &self.schedule_entries
    }

    pub fn teacher(&self, id: &str) -> Option<&Teacher> {
        self.teachers.iter().find(|t| t.id == id)
    }

    pub fn schedule_entry(&self, id: &str) -> Option<&ScheduleEntry> {
        self.schedule_entries.iter().find(|e| e.id == id)
    }

    /// Apply a change. Updates and deletes of unknown ids leave the state as is.
    pub fn apply(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::TeacherAdded(t) => self.teachers.push(t.clone()),
            Mutation::TeacherUpdated(t) => replace(&mut self.teachers, t),
            Mutation::TeacherDeleted(id) => remove(&mut self.teachers, id),
            Mutation::RoomAdded(r) => self.rooms.push(r.clone()),
            Mutation::RoomUpdated(r) => replace(&mut self.rooms, r),
            Mutation::RoomDeleted(id) => remove(&mut self.rooms, id),
            Mutation::ClassAdded(c) => self.classes.push(c.clone()),
            Mutation::ClassUpdated(c) => replace(&mut self.classes, c),
            Mutation::ClassDeleted(id) => remove(&mut self.classes, id),
            Mutation::StudentAdded(s) => self.students.push(s.clone()),
            Mutation::StudentUpdated(s) => replace(&mut self.students, s),
            Mutation::StudentDeleted(id) => remove(&mut self.students, id),
            Mutation::AbsenceAdded(a) => self.absences.push(a.clone()),
            Mutation::AbsenceUpdated(a) => replace(&mut self.absences, a),
            Mutation::AbsenceDeleted(id) => remove(&mut self.absences, id),
            Mutation::EntriesAdded(entries) => self.schedule_entries.extend(entries.iter().cloned()),
            Mutation::EntryUpdated(e) => replace(&mut self.schedule_entries, e),
            Mutation::EntriesRemoved(ids) => self
                .schedule_entries
                .retain(|e| !ids.iter().any(|id| *id == e.id)),
        }
    }
}
