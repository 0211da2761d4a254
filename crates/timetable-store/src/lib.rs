//! # timetable-store
//!
//! Everything between the timetable engine and the hosted data backend.
//!
//! The backend is a row-oriented table API consumed through the [`Backend`]
//! port. Rows use snake_case columns and `HH:MM:SS` times; [`rows`] converts
//! them to and from the engine's model. [`Timetable`] keeps the loaded
//! collections in an [`AppState`] and changes them only after the backend
//! accepted a write, returning the change as a [`Mutation`].
//!
//! ## Modules
//!
//! - [`backend`]: the `Backend` port, tables, rows, and row filters
//! - [`rows`]: two-way mapping between backend rows and model records
//! - [`memory`]: in-memory backend and JSON snapshots
//! - [`state`]: cached collections and the mutations applied to them
//! - [`service`]: `Timetable`, the CRUD service
//! - [`auth`]: pluggable credential verification
//! - [`error`]: Error types

pub mod auth;
pub mod backend;
pub mod error;
pub mod memory;
pub mod rows;
pub mod service;
pub mod state;

pub use auth::{AuthError, Authenticator, Credentials, Session, StaticCredentials};
pub use backend::{Backend, Row, RowFilter, Table};
pub use error::{BackendError, StoreError};
pub use memory::{InMemoryBackend, Snapshot};
pub use service::Timetable;
pub use state::{AppState, Mutation};
