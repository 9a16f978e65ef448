//! The REST task contract: record shape, input decoding, validation
//! and the error-to-response mapping.
//!
//! Request bodies are decoded off `serde_json::Value` field by field
//! rather than through one typed struct, so every constraint failure
//! names the offending field. The messages here go to callers verbatim
//! as `{"error": ...}` bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 1000;

// ── Record ───────────────────────────────────────────────────────────

/// One task as stored in the tasks file and returned on the wire.
///
/// `updated_at` only exists once the task has been modified; creation
/// alone never sets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTask {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ApiTask {
    /// Merge a patch, stamping `updated_at`. `id` and `created_at`
    /// stay as they are no matter what the request carried.
    pub fn apply(&mut self, patch: TaskPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        self.updated_at = Some(now);
    }
}

// ── Create ───────────────────────────────────────────────────────────

/// Fields read from a POST body. Anything else in the body is ignored.
#[derive(Debug, Clone, Default)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl CreateTaskRequest {
    /// Pull the create fields out of a JSON body. The body does not
    /// have to be an object; a shape without a title simply fails the
    /// title requirement in `validate`.
    pub fn from_value(body: &Value) -> Result<Self, ApiError> {
        Ok(CreateTaskRequest {
            title: string_field(body, "title")?,
            description: string_field(body, "description")?,
        })
    }

    /// Check constraints and normalize: the stored title is trimmed,
    /// a missing description becomes empty. Length limits apply to the
    /// input as given, before trimming.
    pub fn validate(&self) -> Result<(String, String), ApiError> {
        let title = self.title.as_deref().unwrap_or("");
        if title.trim().is_empty() {
            return Err(ApiError::Validation("title is required".into()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(ApiError::Validation(format!(
                "title must be at most {MAX_TITLE_LEN} characters"
            )));
        }
        let description = self.description.clone().unwrap_or_default();
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(ApiError::Validation(format!(
                "description must be at most {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        Ok((title.trim().to_string(), description))
    }
}

/// A field that must be a string when present; null counts as absent.
fn string_field(body: &Value, name: &str) -> Result<Option<String>, ApiError> {
    match body.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ApiError::Validation(format!("{name} must be a string"))),
    }
}

// ── Update ───────────────────────────────────────────────────────────

/// A PUT body, checked field by field. Only title, description and
/// completion are mutable; anything else in the body, `id` and
/// `createdAt` included, is dropped on the floor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Build a patch from a JSON body, rejecting type and constraint
    /// violations with a message naming the field.
    pub fn from_value(body: &Value) -> Result<Self, ApiError> {
        let map = match body.as_object() {
            Some(map) => map,
            None => {
                return Err(ApiError::Validation(
                    "request body must be a JSON object".into(),
                ))
            }
        };

        let mut patch = TaskPatch::default();

        if let Some(completed) = map.get("completed") {
            match completed.as_bool() {
                Some(flag) => patch.completed = Some(flag),
                None => {
                    return Err(ApiError::Validation(
                        "completed must be a boolean".into(),
                    ))
                }
            }
        }

        if let Some(title) = map.get("title") {
            let title = title
                .as_str()
                .ok_or_else(|| ApiError::Validation("title must be a string".into()))?;
            if title.trim().is_empty() {
                return Err(ApiError::Validation("title must not be empty".into()));
            }
            if title.chars().count() > MAX_TITLE_LEN {
                return Err(ApiError::Validation(format!(
                    "title must be at most {MAX_TITLE_LEN} characters"
                )));
            }
            patch.title = Some(title.to_string());
        }

        if let Some(description) = map.get("description") {
            let description = description
                .as_str()
                .ok_or_else(|| ApiError::Validation("description must be a string".into()))?;
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(ApiError::Validation(format!(
                    "description must be at most {MAX_DESCRIPTION_LEN} characters"
                )));
            }
            patch.description = Some(description.to_string());
        }

        Ok(patch)
    }
}

// ── Id assignment ────────────────────────────────────────────────────

/// Smallest positive integer no current task uses. Ids vacated by a
/// delete get handed out again on the next create. Ids below 1, which
/// only a hand-edited file can produce, are skipped over.
pub fn first_free_id(tasks: &[ApiTask]) -> i64 {
    let mut ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
    ids.sort_unstable();
    let mut next = 1;
    for id in ids {
        if id == next {
            next += 1;
        } else if id > next {
            break;
        }
    }
    next
}

// ── Errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Bad caller input; the message names the violated constraint.
    #[error("{0}")]
    Validation(String),
    /// No task with the requested id.
    #[error("Task not found")]
    NotFound { id: i64 },
    /// The tasks file could not be read, parsed or written.
    #[error("{0}")]
    Storage(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Storage(msg) = &self {
            tracing::error!(error = %msg, "storage failure");
        }
        let body = match &self {
            ApiError::NotFound { id } => json!({ "error": self.to_string(), "id": id }),
            _ => json!({ "error": self.to_string() }),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: i64) -> ApiTask {
        ApiTask {
            id,
            title: format!("task {id}"),
            description: String::new(),
            completed: false,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn validation_message(err: ApiError) -> String {
        match err {
            ApiError::Validation(msg) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn first_free_id_starts_at_one() {
        assert_eq!(first_free_id(&[]), 1);
    }

    #[test]
    fn first_free_id_extends_a_dense_run() {
        let tasks = [task(1), task(2), task(3)];
        assert_eq!(first_free_id(&tasks), 4);
    }

    #[test]
    fn first_free_id_fills_the_first_gap() {
        let tasks = [task(1), task(2), task(4)];
        assert_eq!(first_free_id(&tasks), 3);
        let tasks = [task(2), task(3)];
        assert_eq!(first_free_id(&tasks), 1);
    }

    #[test]
    fn first_free_id_ignores_out_of_range_ids() {
        let tasks = [task(-5), task(0), task(1)];
        assert_eq!(first_free_id(&tasks), 2);
    }

    #[test]
    fn create_requires_a_non_blank_title() {
        let req = CreateTaskRequest::default();
        assert_eq!(validation_message(req.validate().unwrap_err()), "title is required");

        let req = CreateTaskRequest {
            title: Some("   ".into()),
            description: None,
        };
        assert_eq!(validation_message(req.validate().unwrap_err()), "title is required");
    }

    #[test]
    fn create_trims_title_and_defaults_description() {
        let req = CreateTaskRequest {
            title: Some("  Buy milk  ".into()),
            description: None,
        };
        let (title, description) = req.validate().unwrap();
        assert_eq!(title, "Buy milk");
        assert_eq!(description, "");
    }

    #[test]
    fn create_enforces_length_limits_on_raw_input() {
        let req = CreateTaskRequest {
            title: Some("a".repeat(MAX_TITLE_LEN)),
            description: Some("b".repeat(MAX_DESCRIPTION_LEN)),
        };
        assert!(req.validate().is_ok());

        let req = CreateTaskRequest {
            title: Some("a".repeat(MAX_TITLE_LEN + 1)),
            description: None,
        };
        assert_eq!(
            validation_message(req.validate().unwrap_err()),
            "title must be at most 200 characters"
        );

        let req = CreateTaskRequest {
            title: Some("ok".into()),
            description: Some("b".repeat(MAX_DESCRIPTION_LEN + 1)),
        };
        assert_eq!(
            validation_message(req.validate().unwrap_err()),
            "description must be at most 1000 characters"
        );
    }

    #[test]
    fn create_fields_must_be_strings_when_present() {
        let err = CreateTaskRequest::from_value(&json!({ "title": 42 })).unwrap_err();
        assert_eq!(validation_message(err), "title must be a string");

        let err =
            CreateTaskRequest::from_value(&json!({ "title": "x", "description": [] })).unwrap_err();
        assert_eq!(validation_message(err), "description must be a string");

        // Null and absent mean the same thing.
        let req = CreateTaskRequest::from_value(&json!({ "title": null })).unwrap();
        assert_eq!(req.title, None);
    }

    #[test]
    fn create_from_a_non_object_body_just_lacks_a_title() {
        let req = CreateTaskRequest::from_value(&json!([1, 2])).unwrap();
        assert_eq!(req.title, None);
        assert_eq!(
            validation_message(req.validate().unwrap_err()),
            "title is required"
        );
    }

    #[test]
    fn patch_accepts_an_empty_object() {
        let patch = TaskPatch::from_value(&json!({})).unwrap();
        assert_eq!(patch, TaskPatch::default());
    }

    #[test]
    fn patch_rejects_non_object_bodies() {
        let err = TaskPatch::from_value(&json!([1])).unwrap_err();
        assert_eq!(validation_message(err), "request body must be a JSON object");
    }

    #[test]
    fn patch_requires_boolean_completed() {
        let err = TaskPatch::from_value(&json!({ "completed": "yes" })).unwrap_err();
        assert_eq!(validation_message(err), "completed must be a boolean");

        let err = TaskPatch::from_value(&json!({ "completed": null })).unwrap_err();
        assert_eq!(validation_message(err), "completed must be a boolean");
    }

    #[test]
    fn patch_rejects_blank_or_oversized_title() {
        let err = TaskPatch::from_value(&json!({ "title": "   " })).unwrap_err();
        assert_eq!(validation_message(err), "title must not be empty");

        let err = TaskPatch::from_value(&json!({ "title": "a".repeat(201) })).unwrap_err();
        assert_eq!(
            validation_message(err),
            "title must be at most 200 characters"
        );

        let err = TaskPatch::from_value(&json!({ "title": 7 })).unwrap_err();
        assert_eq!(validation_message(err), "title must be a string");
    }

    #[test]
    fn patch_checks_completed_before_title() {
        let body = json!({ "completed": "nope", "title": "" });
        let err = TaskPatch::from_value(&body).unwrap_err();
        assert_eq!(validation_message(err), "completed must be a boolean");
    }

    #[test]
    fn patch_ignores_immutable_and_unknown_fields() {
        let body = json!({
            "id": 999,
            "createdAt": "2020-01-01T00:00:00Z",
            "favoriteColor": "green",
            "completed": true
        });
        let patch = TaskPatch::from_value(&body).unwrap();
        assert_eq!(
            patch,
            TaskPatch {
                completed: Some(true),
                ..TaskPatch::default()
            }
        );
    }

    #[test]
    fn apply_preserves_identity_and_stamps_update_time() {
        let mut task = task(3);
        let created = task.created_at;
        let now = Utc::now();
        task.apply(
            TaskPatch {
                title: Some("  raw kept  ".into()),
                description: Some("new".into()),
                completed: Some(true),
            },
            now,
        );
        assert_eq!(task.id, 3);
        assert_eq!(task.created_at, created);
        // Updated titles are stored as sent, without trimming.
        assert_eq!(task.title, "  raw kept  ");
        assert_eq!(task.description, "new");
        assert!(task.completed);
        assert_eq!(task.updated_at, Some(now));
    }

    #[test]
    fn task_serializes_camel_case_and_omits_unset_update_stamp() {
        let json = serde_json::to_string(&task(1)).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(!json.contains("\"updatedAt\""));

        let mut updated = task(2);
        updated.apply(TaskPatch::default(), Utc::now());
        let json = serde_json::to_string(&updated).unwrap();
        assert!(json.contains("\"updatedAt\""));
    }
}
