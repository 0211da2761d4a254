//! The Backend port: what the store needs from the hosted data API.
//!
//! The backend is a set of tables of JSON rows. Every call is one remote round
//! trip. Implementations decide how ids are assigned and which constraints are
//! enforced; the store only relies on the contract below.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

use crate::error::BackendError;

/// A row as the backend sees it: column name to JSON value.
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Teachers,
    Rooms,
    Classes,
    Students,
    Absences,
    ScheduleEntries,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Teachers,
        Table::Rooms,
        Table::Classes,
        Table::Students,
        Table::Absences,
        Table::ScheduleEntries,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Teachers => "teachers",
            Table::Rooms => "rooms",
            Table::Classes => "classes",
            Table::Students => "students",
            Table::Absences => "absences",
            Table::ScheduleEntries => "schedule_entries",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One condition on a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Eq(String, Value),
    Gte(String, Value),
    Lte(String, Value),
    OneOf(String, Vec<Value>),
}

/// A conjunction of column clauses, used for multi-row deletes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowFilter {
    clauses: Vec<Clause>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq(column.to_string(), value.into()));
        self
    }

    pub fn gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Gte(column.to_string(), value.into()));
        self
    }

    pub fn lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Lte(column.to_string(), value.into()));
        self
    }

    pub fn one_of<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.clauses.push(Clause::OneOf(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Whether `row` satisfies every clause. A missing column fails its clause.
    ///
    /// Ranges compare numbers numerically and strings lexicographically, which
    /// orders ISO dates and `HH:MM:SS` times correctly.
    pub fn matches(&self, row: &Row) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Eq(col, v) => row.get(col) == Some(v),
            Clause::Gte(col, v) => row
                .get(col)
                .and_then(|actual| compare(actual, v))
                .is_some_and(|ord| ord != Ordering::Less),
            Clause::Lte(col, v) => row
                .get(col)
                .and_then(|actual| compare(actual, v))
                .is_some_and(|ord| ord != Ordering::Greater),
            Clause::OneOf(col, values) => row.get(col).is_some_and(|actual| values.contains(actual)),
        })
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        _ => None,
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn select_all(&self, table: Table) -> Result<Vec<Row>, BackendError>;

    /// Insert one or many rows and return them as stored, ids included.
    async fn insert(&self, table: Table, rows: Vec<Row>) -> Result<Vec<Row>, BackendError>;

    async fn update(&self, table: Table, id: &str, row: Row) -> Result<(), BackendError>;

    async fn delete(&self, table: Table, id: &str) -> Result<(), BackendError>;

    /// Delete every row matching `filter`; returns how many were removed.
    async fn delete_where(&self, table: Table, filter: &RowFilter) -> Result<usize, BackendError>;
}
