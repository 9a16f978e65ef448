//! The client task store.
//!
//! Owns the in-memory collection, which is the runtime truth, plus the
//! view state a shell renders from: filter, sort key, search text and
//! the edit/delete markers. Every mutation rewrites the full collection
//! to the local store before returning. A persist failure is reported
//! to the caller but never rolls the in-memory mutation back; the next
//! successful persist heals the gap.

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::local::{LocalStore, TASKS_KEY};
use crate::query::{self, SortKey, StatusFilter};
use crate::task::{Task, TaskDraft, TaskPatch};

// ── Errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Content was not the JSON shape the store expects.
    #[error("{0}")]
    Format(String),
    /// The persistence layer failed. In-memory state is unaffected.
    #[error("{0}")]
    Storage(String),
}

// ── Import ───────────────────────────────────────────────────────────

/// What happens to the current collection when an import succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Drop the current collection and take the imported one.
    Replace,
    /// Keep the current collection and concatenate the import after it.
    Append,
}

/// Outcome of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    /// Elements that passed validation and entered the collection.
    pub imported: usize,
    /// Elements silently discarded for failing validation.
    pub dropped: usize,
}

// ── Store ────────────────────────────────────────────────────────────

pub struct TaskStore<L: LocalStore> {
    local: L,
    tasks: Vec<Task>,
    filter: StatusFilter,
    sort: SortKey,
    search: String,
    editing: Option<String>,
    pending_delete: Option<String>,
}

impl<L: LocalStore> TaskStore<L> {
    /// Load the collection from the local store. Never fails outright:
    /// a missing or blank record is an empty collection, and a
    /// malformed or unreadable one comes back as the second element
    /// while the store starts empty. The bad record stays on disk
    /// until the next mutation overwrites it.
    pub fn open(local: L) -> (Self, Option<StoreError>) {
        let mut store = TaskStore {
            local,
            tasks: Vec::new(),
            filter: StatusFilter::default(),
            sort: SortKey::default(),
            search: String::new(),
            editing: None,
            pending_delete: None,
        };
        let warning = match store.local.get(TASKS_KEY) {
            Ok(None) => None,
            Ok(Some(raw)) if raw.trim().is_empty() => None,
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Task>>(&raw) {
                Ok(tasks) => {
                    store.tasks = tasks;
                    None
                }
                Err(e) => Some(StoreError::Format(format!(
                    "stored tasks are not valid JSON: {e}"
                ))),
            },
            Err(e) => Some(e),
        };
        (store, warning)
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&self.tasks)
            .map_err(|e| StoreError::Format(format!("serialize tasks: {e}")))?;
        self.local.set(TASKS_KEY, &raw)
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Build a task from the draft and append it. The mutation itself
    /// cannot fail; an `Err` means the follow-up persist did.
    pub fn add(&mut self, draft: TaskDraft) -> Result<&Task, StoreError> {
        let idx = self.tasks.len();
        self.tasks.push(Task::new(draft));
        self.persist()?;
        Ok(&self.tasks[idx])
    }

    /// Merge `patch` into the task with `id` and refresh its
    /// `updated_at`. An unknown id is a silent no-op, `Ok(false)`.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<bool, StoreError> {
        let task = match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => task,
            None => return Ok(false),
        };
        task.merge(patch);
        task.updated_at = Utc::now();
        self.persist()?;
        Ok(true)
    }

    /// Flip completion on the task with `id` and refresh its
    /// `updated_at`. An unknown id is a silent no-op.
    pub fn toggle(&mut self, id: &str) -> Result<bool, StoreError> {
        let task = match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => task,
            None => return Ok(false),
        };
        task.completed = !task.completed;
        task.updated_at = Utc::now();
        self.persist()?;
        Ok(true)
    }

    /// Delete the task with `id`, dropping any marker that pointed at
    /// it. An unknown id is a silent no-op.
    pub fn remove(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return Ok(false);
        }
        if self.editing.as_deref() == Some(id) {
            self.editing = None;
        }
        if self.pending_delete.as_deref() == Some(id) {
            self.pending_delete = None;
        }
        self.persist()?;
        Ok(true)
    }

    // ── Views ────────────────────────────────────────────────────────

    /// The whole collection in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// The collection through the current filter, search and sort.
    pub fn visible(&self) -> Vec<&Task> {
        query::select(&self.tasks, self.filter, &self.search, self.sort)
    }

    /// Tasks not yet completed, for the "N active" counter.
    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.completed).count()
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    // ── Edit and delete markers ──────────────────────────────────────

    /// Mark `id` as being edited and hand the task back for form
    /// population. An unknown id clears nothing and returns `None`.
    pub fn start_edit(&mut self, id: &str) -> Option<&Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        self.editing = Some(self.tasks[idx].id.clone());
        Some(&self.tasks[idx])
    }

    /// Id currently being edited, if any.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Remember `id` for a later confirmed delete.
    pub fn mark_for_delete(&mut self, id: impl Into<String>) {
        self.pending_delete = Some(id.into());
    }

    /// Id awaiting delete confirmation, if any.
    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Take the pending-delete marker, the confirm step. The caller
    /// follows up with `remove` or drops the id to abort.
    pub fn take_pending_delete(&mut self) -> Option<String> {
        self.pending_delete.take()
    }

    // ── Export and import ────────────────────────────────────────────

    /// The whole collection as a pretty-printed JSON array, what the
    /// export button downloads.
    pub fn export_json(&self) -> Result<String, StoreError> {
        serde_json::to_string_pretty(&self.tasks)
            .map_err(|e| StoreError::Format(format!("serialize tasks: {e}")))
    }

    /// Import a JSON array of tasks. Elements failing validation
    /// (not a task shape, empty id or title, non-boolean completion)
    /// are dropped and counted; if nothing survives the whole import
    /// is rejected and the collection stays untouched.
    pub fn import_json(&mut self, raw: &str, mode: ImportMode) -> Result<ImportReport, StoreError> {
        let parsed: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| StoreError::Format(format!("import is not valid JSON: {e}")))?;
        let items = match parsed {
            serde_json::Value::Array(items) => items,
            _ => return Err(StoreError::Format("import must be a JSON array".into())),
        };

        let total = items.len();
        let mut incoming = Vec::new();
        for item in items {
            match serde_json::from_value::<Task>(item) {
                Ok(task) if !task.id.is_empty() && !task.title.is_empty() => incoming.push(task),
                _ => {}
            }
        }

        if incoming.is_empty() {
            return Err(StoreError::Format("no valid tasks in import".into()));
        }

        let report = ImportReport {
            imported: incoming.len(),
            dropped: total - incoming.len(),
        };
        match mode {
            ImportMode::Replace => self.tasks = incoming,
            ImportMode::Append => self.tasks.extend(incoming),
        }
        self.persist()?;
        Ok(report)
    }
}

/// Suggested download name for an export taken on `date`, such as
/// `todo-tasks-2024-06-01.json`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("todo-tasks-{date}.json")
}
