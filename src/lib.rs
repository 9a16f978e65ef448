//! taskdeck: personal task tracking, twice over.
//!
//! Two independent stores share a vocabulary but no state or ids:
//!
//! - The client store (`task`, `query`, `local`, `store`): an
//!   embeddable in-memory task list persisted through a
//!   localStorage-style key-value seam, with filtering, sorting,
//!   search and JSON import/export.
//! - The server store (`api`, `persist`, `http`): a REST API over a
//!   single JSON file, one read-modify-write cycle per request.
//!
//! They deliberately do not interoperate; the binary serves only the
//! REST side.

pub mod api;
pub mod http;
pub mod local;
pub mod persist;
pub mod query;
pub mod store;
pub mod task;

pub use query::{SortKey, StatusFilter};
pub use store::{ImportMode, ImportReport, StoreError, TaskStore};
pub use task::{Priority, Task, TaskDraft, TaskPatch};
