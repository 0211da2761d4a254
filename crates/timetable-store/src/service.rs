//! `Timetable`: CRUD over the backend with a cached [`AppState`].
//!
//! Every operation issues one backend call (a series insert is one batch
//! call). On success the change is applied to the state and returned as a
//! [`Mutation`]; on failure the error is logged and returned and the state is
//! left as it was.

use tracing::{debug, error, info};

use timetable_engine::recurrence::CancelCriteria;
use timetable_engine::slots::format_clock;
use timetable_engine::{
    cancel, expand, Absence, Class, NewAbsence, NewClass, NewRoom, NewScheduleEntry, NewStudent,
    NewTeacher, Room, ScheduleEntry, Student, Teacher,
};

use crate::backend::{Backend, RowFilter, Table};
use crate::error::{BackendError, Result, StoreError};
use crate::rows::{column_time, Record};
use crate::state::{AppState, Mutation};

pub struct Timetable<B> {
    backend: B,
    state: AppState,
}

fn logged<T>(result: std::result::Result<T, BackendError>, table: Table, op: &str) -> Result<T> {
    result.map_err(|err| {
        error!(%table, op, code = ?err.code, error = %err, "Backend call failed");
        StoreError::Backend(err)
    })
}

fn ensure_known<R: Record>(items: &[R], id: &str) -> Result<()> {
    if items.iter().any(|item| item.id() == id) {
        Ok(())
    } else {
        Err(StoreError::NotFound {
            table: R::TABLE,
            id: id.to_string(),
        })
    }
}

/// Map a unique violation on `teachers` to the user-facing error.
fn teacher_write_error(err: StoreError, email: &str) -> StoreError {
    match err {
        StoreError::Backend(ref e) if e.is_unique_violation() => {
            StoreError::DuplicateTeacherEmail(email.to_string())
        }
        other => other,
    }
}

impl<B: Backend> Timetable<B> {
    /// A service with empty state. Call [`Timetable::load`] to fill it.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: AppState::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Select every table and replace the cached state.
    pub async fn load(&mut self) -> Result<()> {
        let state = AppState::new(
            self.select().await?,
            self.select().await?,
            self.select().await?,
            self.select().await?,
            self.select().await?,
            self.select().await?,
        );
        debug!(
            teachers = state.teachers().len(),
            rooms = state.rooms().len(),
            classes = state.classes().len(),
            students = state.students().len(),
            absences = state.absences().len(),
            schedule_entries = state.schedule_entries().len(),
            "State loaded"
        );
        self.state = state;
        Ok(())
    }

    async fn select<R: Record>(&self) -> Result<Vec<R>> {
        let rows = logged(self.backend.select_all(R::TABLE).await, R::TABLE, "select")?;
        rows.into_iter().map(R::from_row).collect()
    }

    async fn insert<R: Record>(&self, drafts: &[R::Draft]) -> Result<Vec<R>> {
        let rows = drafts.iter().map(R::draft_row).collect::<Result<Vec<_>>>()?;
        let stored = logged(self.backend.insert(R::TABLE, rows).await, R::TABLE, "insert")?;
        stored.into_iter().map(R::from_row).collect()
    }

    async fn insert_one<R: Record>(&self, draft: R::Draft) -> Result<R> {
        self.insert::<R>(std::slice::from_ref(&draft))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Mapping(format!("insert into {} returned no row", R::TABLE)))
    }

    async fn update<R: Record>(&self, record: &R) -> Result<()> {
        let row = record.update_row()?;
        logged(
            self.backend.update(R::TABLE, record.id(), row).await,
            R::TABLE,
            "update",
        )
    }

    async fn delete(&self, table: Table, id: &str) -> Result<()> {
        logged(self.backend.delete(table, id).await, table, "delete")
    }

    fn commit(&mut self, mutation: Mutation) -> Mutation {
        self.state.apply(&mutation);
        mutation
    }

    // -----------------------------------------------------------------------
    // Teachers
    // -----------------------------------------------------------------------

    pub async fn add_teacher(&mut self, draft: NewTeacher) -> Result<Mutation> {
        let email = draft.email.clone();
        let teacher: Teacher = self
            .insert_one(draft)
            .await
            .map_err(|e| teacher_write_error(e, &email))?;
        info!(id = %teacher.id, "Teacher added");
        Ok(self.commit(Mutation::TeacherAdded(teacher)))
    }

    pub async fn update_teacher(&mut self, teacher: Teacher) -> Result<Mutation> {
        ensure_known(self.state.teachers(), &teacher.id)?;
        self.update(&teacher)
            .await
            .map_err(|e| teacher_write_error(e, &teacher.email))?;
        info!(id = %teacher.id, "Teacher updated");
        Ok(self.commit(Mutation::TeacherUpdated(teacher)))
    }

    pub async fn delete_teacher(&mut self, id: &str) -> Result<Mutation> {
        self.delete(Table::Teachers, id).await?;
        info!(id, "Teacher deleted");
        Ok(self.commit(Mutation::TeacherDeleted(id.to_string())))
    }

    // -----------------------------------------------------------------------
    // Rooms
    // -----------------------------------------------------------------------

    pub async fn add_room(&mut self, draft: NewRoom) -> Result<Mutation> {
        let room: Room = self.insert_one(draft).await?;
        info!(id = %room.id, "Room added");
        Ok(self.commit(Mutation::RoomAdded(room)))
    }

    pub async fn update_room(&mut self, room: Room) -> Result<Mutation> {
        ensure_known(self.state.rooms(), &room.id)?;
        self.update(&room).await?;
        info!(id = %room.id, "Room updated");
        Ok(self.commit(Mutation::RoomUpdated(room)))
    }

    pub async fn delete_room(&mut self, id: &str) -> Result<Mutation> {
        self.delete(Table::Rooms, id).await?;
        info!(id, "Room deleted");
        Ok(self.commit(Mutation::RoomDeleted(id.to_string())))
    }

    // -----------------------------------------------------------------------
    // Classes
    // -----------------------------------------------------------------------

    pub async fn add_class(&mut self, draft: NewClass) -> Result<Mutation> {
        let class: Class = self.insert_one(draft).await?;
        info!(id = %class.id, "Class added");
        Ok(self.commit(Mutation::ClassAdded(class)))
    }

    pub async fn update_class(&mut self, class: Class) -> Result<Mutation> {
        ensure_known(self.state.classes(), &class.id)?;
        self.update(&class).await?;
        info!(id = %class.id, "Class updated");
        Ok(self.commit(Mutation::ClassUpdated(class)))
    }

    pub async fn delete_class(&mut self, id: &str) -> Result<Mutation> {
        self.delete(Table::Classes, id).await?;
        info!(id, "Class deleted");
        Ok(self.commit(Mutation::ClassDeleted(id.to_string())))
    }

    // -----------------------------------------------------------------------
    // Students
    // -----------------------------------------------------------------------

    pub async fn add_student(&mut self, draft: NewStudent) -> Result<Mutation> {
        let student: Student = self.insert_one(draft).await?;
        info!(id = %student.id, "Student added");
        Ok(self.commit(Mutation::StudentAdded(student)))
    }

    pub async fn update_student(&mut self, student: Student) -> Result<Mutation> {
        ensure_known(self.state.students(), &student.id)?;
        self.update(&student).await?;
        info!(id = %student.id, "Student updated");
        Ok(self.commit(Mutation::StudentUpdated(student)))
    }

    pub async fn delete_student(&mut self, id: &str) -> Result<Mutation> {
        self.delete(Table::Students, id).await?;
        info!(id, "Student deleted");
        Ok(self.commit(Mutation::StudentDeleted(id.to_string())))
    }

    // -----------------------------------------------------------------------
    // Absences
    // -----------------------------------------------------------------------

    pub async fn add_absence(&mut self, draft: NewAbsence) -> Result<Mutation> {
        let absence: Absence = self.insert_one(draft).await?;
        info!(id = %absence.id, kind = ?absence.kind, "Absence added");
        Ok(self.commit(Mutation::AbsenceAdded(absence)))
    }

    pub async fn update_absence(&mut self, absence: Absence) -> Result<Mutation> {
        ensure_known(self.state.absences(), &absence.id)?;
        self.update(&absence).await?;
        info!(id = %absence.id, "Absence updated");
        Ok(self.commit(Mutation::AbsenceUpdated(absence)))
    }

    pub async fn delete_absence(&mut self, id: &str) -> Result<Mutation> {
        self.delete(Table::Absences, id).await?;
        info!(id, "Absence deleted");
        Ok(self.commit(Mutation::AbsenceDeleted(id.to_string())))
    }

    // -----------------------------------------------------------------------
    // Schedule entries
    // -----------------------------------------------------------------------

    /// Insert a lesson, or with `is_recurring` its weekly series up to the end
    /// of the school year, in a single batch.
    ///
    /// Series occurrences already present in the state are skipped, so
    /// retrying a series after a failed or interrupted call does not create
    /// duplicates.
    pub async fn add_schedule_entry(
        &mut self,
        draft: NewScheduleEntry,
        is_recurring: bool,
    ) -> Result<Mutation> {
        draft.validate()?;
        let mut series = expand(draft, is_recurring)?;
        if is_recurring {
            let existing = self.state.schedule_entries();
            series.retain(|clone| !existing.iter().any(|e| e.same_lesson(clone)));
        }
        if series.is_empty() {
            info!("Series already stored, nothing to insert");
            return Ok(Mutation::EntriesAdded(Vec::new()));
        }

        let entries: Vec<ScheduleEntry> = self.insert(&series).await?;
        info!(count = entries.len(), is_recurring, "Schedule entries added");
        Ok(self.commit(Mutation::EntriesAdded(entries)))
    }

    pub async fn update_schedule_entry(
        &mut self,
        id: &str,
        draft: NewScheduleEntry,
    ) -> Result<Mutation> {
        ensure_known(self.state.schedule_entries(), id)?;
        draft.validate()?;
        let entry = draft.with_id(id);
        self.update(&entry).await?;
        info!(id, "Schedule entry updated");
        Ok(self.commit(Mutation::EntryUpdated(entry)))
    }

    /// Delete one lesson, or with `delete_recurring` the lesson and every later
    /// occurrence of its weekly series.
    ///
    /// An id the state does not know removes nothing; a series deletion for
    /// one makes no remote call.
    pub async fn delete_schedule_entry(
        &mut self,
        id: &str,
        delete_recurring: bool,
    ) -> Result<Mutation> {
        let Some(criteria) = cancel(id, delete_recurring, self.state.schedule_entries()) else {
            info!(id, "No such schedule entry, nothing to delete");
            return Ok(Mutation::EntriesRemoved(Vec::new()));
        };

        match &criteria {
            CancelCriteria::Single { id } => {
                self.delete(Table::ScheduleEntries, id).await?;
            }
            CancelCriteria::Following { .. } => {
                let filter = series_filter(&criteria)?;
                let count = logged(
                    self.backend.delete_where(Table::ScheduleEntries, &filter).await,
                    Table::ScheduleEntries,
                    "delete_where",
                )?;
                debug!(remote = count, "Series rows deleted");
            }
        }

        // Only ids the state actually held are reported as removed.
        let mut remaining = self.state.schedule_entries().to_vec();
        let removed = criteria.apply(&mut remaining);

        info!(id, count = removed.len(), delete_recurring, "Schedule entries removed");
        Ok(self.commit(Mutation::EntriesRemoved(removed)))
    }
}

/// Express a series cancellation as column clauses.
///
/// The backend cannot filter on weekday, so the weekday rule becomes the set of
/// dates a week apart from the anchor. Time columns may hold `HH:MM:SS` or
/// `HH:MM`; both spellings are matched.
fn series_filter(criteria: &CancelCriteria) -> Result<RowFilter> {
    let CancelCriteria::Following { key, from, until } = criteria else {
        return Ok(RowFilter::new());
    };
    let dates = criteria.series_dates()?;
    let spellings = |t| [column_time(t), format_clock(t)];

    Ok(RowFilter::new()
        .eq("teacher_id", key.teacher_id.as_str())
        .eq("room_id", key.room_id.as_str())
        .eq("subject", key.subject.as_str())
        .one_of("start_time", spellings(key.time_slot.start))
        .one_of("end_time", spellings(key.time_slot.end))
        .gte("date", from.to_string())
        .lte("date", until.to_string())
        .one_of("date", dates.iter().map(|d| d.to_string())))
}
