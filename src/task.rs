//! The client-side task record.
//!
//! Field names serialize as camelCase, matching the JSON shape the
//! browser app kept under its `todoTasks` key, so old exports import
//! cleanly. Deserialization is deliberately lenient where hand-edited
//! or foreign data tends to drift: unknown priorities fold to the
//! default, an empty deadline string means no deadline, and missing
//! timestamps fall back to the Unix epoch.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

// ── Priority ─────────────────────────────────────────────────────────

/// Task priority. Variant order is Low < Medium < High so comparators
/// can lean on `Ord` directly.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

// ── Task ─────────────────────────────────────────────────────────────

/// One task as stored and exported.
///
/// `id` is assigned once at creation and never changes. `created_at`
/// is stamped at creation; `updated_at` is refreshed by every mutation
/// that goes through the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assignee: String,
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Priority,
    #[serde(
        default,
        deserialize_with = "lenient_deadline",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub category: String,
    pub completed: bool,
    #[serde(default = "epoch")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "epoch")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task. Everything except the title is optional;
/// the defaults match what an entry form submits when left blank.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub assignee: String,
    pub priority: Priority,
    pub deadline: Option<NaiveDate>,
    pub category: String,
}

impl TaskDraft {
    /// A draft with just a title, everything else default.
    pub fn titled(title: impl Into<String>) -> Self {
        TaskDraft {
            title: title.into(),
            ..TaskDraft::default()
        }
    }
}

/// Field-level change set for `TaskStore::update`. `None` leaves a
/// field alone. The deadline is doubly optional so a patch can clear
/// it. Completion is not here: toggling is its own operation.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub priority: Option<Priority>,
    pub deadline: Option<Option<NaiveDate>>,
    pub category: Option<String>,
}

impl Task {
    /// Build a fresh task from a draft: generates the id, marks it
    /// pending and stamps both timestamps with the same instant.
    pub fn new(draft: TaskDraft) -> Self {
        let now = Utc::now();
        Task {
            id: generate_id(),
            title: draft.title,
            description: draft.description,
            assignee: draft.assignee,
            priority: draft.priority,
            deadline: draft.deadline,
            category: draft.category,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a patch into this task. Timestamps are the store's
    /// business; this only touches the fields the patch names.
    pub fn merge(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(assignee) = patch.assignee {
            self.assignee = assignee;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
    }
}

// ── Id generation ────────────────────────────────────────────────────

/// Millisecond timestamp plus nine random base-36 characters. A
/// collision would need two ids drawn in the same millisecond with the
/// same suffix; uniqueness is not verified anywhere downstream.
pub fn generate_id() -> String {
    const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let mut id = Utc::now().timestamp_millis().to_string();
    for _ in 0..9 {
        id.push(BASE36[rng.gen_range(0..BASE36.len())] as char);
    }
    id
}

// ── Serde helpers ────────────────────────────────────────────────────

fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

/// Unknown or mistyped priorities fold to the default instead of
/// failing the element they came in on.
fn lenient_priority<'de, D>(de: D) -> Result<Priority, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Priority::deserialize(de).unwrap_or_default())
}

/// Absent, null and `""` all mean no deadline. A non-empty string must
/// be a real `YYYY-MM-DD` date.
fn lenient_deadline<'de, D>(de: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
