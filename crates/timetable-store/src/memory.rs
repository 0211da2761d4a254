//! In-memory implementation of the Backend port.
//!
//! Backs the CLI (seeded from and dumped to a JSON snapshot file) and the
//! service tests. Mirrors the hosted backend where the store depends on it:
//! - ids are assigned on insert (UUID v7) and unique per table
//! - teacher emails are unique (code 23505)
//! - a batch insert either stores every row or none
//! - updating a missing row fails, deleting one does not

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::{Backend, Row, RowFilter, Table};
use crate::error::BackendError;

/// Every table's rows, as stored in a data file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub teachers: Vec<Row>,
    #[serde(default)]
    pub rooms: Vec<Row>,
    #[serde(default)]
    pub classes: Vec<Row>,
    #[serde(default)]
    pub students: Vec<Row>,
    #[serde(default)]
    pub absences: Vec<Row>,
    #[serde(default)]
    pub schedule_entries: Vec<Row>,
}

impl Snapshot {
    pub fn table(&self, table: Table) -> &Vec<Row> {
        match table {
            Table::Teachers => &self.teachers,
            Table::Rooms => &self.rooms,
            Table::Classes => &self.classes,
            Table::Students => &self.students,
            Table::Absences => &self.absences,
            Table::ScheduleEntries => &self.schedule_entries,
        }
    }

    fn table_mut(&mut self, table: Table) -> &mut Vec<Row> {
        match table {
            Table::Teachers => &mut self.teachers,
            Table::Rooms => &mut self.rooms,
            Table::Classes => &mut self.classes,
            Table::Students => &mut self.students,
            Table::Absences => &mut self.absences,
            Table::ScheduleEntries => &mut self.schedule_entries,
        }
    }
}

#[derive(Default)]
struct Inner {
    tables: Snapshot,
    failures: VecDeque<BackendError>,
}

impl Inner {
    fn take_failure(&mut self) -> Result<(), BackendError> {
        match self.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct InMemoryBackend {
    inner: RwLock<Inner>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(tables: Snapshot) -> Self {
        Self {
            inner: RwLock::new(Inner {
                tables,
                failures: VecDeque::new(),
            }),
        }
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.inner.read().await.tables.clone()
    }

    /// Make the next call fail with `err`. Queued failures are consumed in order.
    pub async fn fail_next(&self, err: BackendError) {
        self.inner.write().await.failures.push_back(err);
    }
}

fn row_id(row: &Row) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

fn email(row: &Row) -> Option<&str> {
    row.get("email").and_then(Value::as_str)
}

fn duplicate_email(email: &str) -> BackendError {
    BackendError::with_code(
        BackendError::UNIQUE_VIOLATION,
        format!(
            "duplicate key value violates unique constraint \"teachers_email_key\": {}",
            email
        ),
    )
}

/// Check a batch's ids against the stored rows and against each other.
fn check_unique_ids<'a>(
    table: Table,
    existing: impl Iterator<Item = &'a Row>,
    incoming: &'a [Row],
) -> Result<(), BackendError> {
    let mut seen: HashSet<&str> = existing.filter_map(row_id).collect();
    for row in incoming {
        if let Some(id) = row_id(row) {
            if !seen.insert(id) {
                return Err(BackendError::with_code(
                    BackendError::UNIQUE_VIOLATION,
                    format!("duplicate key value violates unique constraint \"{}_pkey\": {}", table, id),
                ));
            }
        }
    }
    Ok(())
}

/// Check a batch of teacher rows against the stored ones and against each other.
fn check_unique_emails<'a>(
    existing: impl Iterator<Item = &'a Row>,
    incoming: &'a [Row],
) -> Result<(), BackendError> {
    let mut seen: HashSet<&str> = existing.filter_map(email).collect();
    for row in incoming {
        if let Some(e) = email(row) {
            if !seen.insert(e) {
                return Err(duplicate_email(e));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn select_all(&self, table: Table) -> Result<Vec<Row>, BackendError> {
        let mut g = self.inner.write().await;
        g.take_failure()?;
        Ok(g.tables.table(table).clone())
    }

    async fn insert(&self, table: Table, rows: Vec<Row>) -> Result<Vec<Row>, BackendError> {
        let mut g = self.inner.write().await;
        g.take_failure()?;

        let mut stored = Vec::with_capacity(rows.len());
        for mut row in rows {
            if row_id(&row).is_none() {
                row.insert("id".to_string(), Value::String(Uuid::now_v7().to_string()));
            }
            stored.push(row);
        }

        let current = g.tables.table(table);
        check_unique_ids(table, current.iter(), &stored)?;
        if table == Table::Teachers {
            check_unique_emails(current.iter(), &stored)?;
        }

        g.tables.table_mut(table).extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn update(&self, table: Table, id: &str, row: Row) -> Result<(), BackendError> {
        let mut g = self.inner.write().await;
        g.take_failure()?;

        let rows = g.tables.table(table);
        let index = rows
            .iter()
            .position(|r| row_id(r) == Some(id))
            .ok_or_else(|| BackendError::new(format!("no {} row with id {}", table, id)))?;

        if table == Table::Teachers {
            if let Some(e) = email(&row) {
                let taken = rows
                    .iter()
                    .any(|r| row_id(r) != Some(id) && email(r) == Some(e));
                if taken {
                    return Err(duplicate_email(e));
                }
            }
        }

        let target = &mut g.tables.table_mut(table)[index];
        for (column, value) in row {
            if column != "id" {
                target.insert(column, value);
            }
        }
        Ok(())
    }

    async fn delete(&self, table: Table, id: &str) -> Result<(), BackendError> {
        let mut g = self.inner.write().await;
        g.take_failure()?;
        g.tables.table_mut(table).retain(|r| row_id(r) != Some(id));
        Ok(())
    }

    async fn delete_where(&self, table: Table, filter: &RowFilter) -> Result<usize, BackendError> {
        let mut g = self.inner.write().await;
        g.take_failure()?;
        let rows = g.tables.table_mut(table);
        let before = rows.len();
        rows.retain(|r| !filter.matches(r));
        Ok(before - rows.len())
    }
}
