//! Tasks-file persistence for the REST API.
//!
//! One JSON array in one file, and the file is the only truth between
//! requests. Every operation is a full read-modify-write cycle: load
//! the whole collection, change it, write the whole collection back.
//! Nothing is cached, so edits made to the file by hand show up on the
//! next request.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::api::{first_free_id, ApiError, ApiTask, CreateTaskRequest, TaskPatch};

/// Handle on the tasks file. Cheap to construct; callers wanting
/// serialized read-modify-write cycles put it behind a lock, as the
/// HTTP state does.
pub struct TasksFile {
    path: PathBuf,
}

impl TasksFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TasksFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── File I/O ─────────────────────────────────────────────────────

    /// Read the whole collection. A file that does not exist yet is an
    /// empty collection, not an error; a file that exists but does not
    /// parse is.
    pub fn read(&self) -> Result<Vec<ApiTask>, ApiError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ApiError::Storage(format!(
                    "read {}: {e}",
                    self.path.display()
                )))
            }
        };
        serde_json::from_str(&raw)
            .map_err(|_| ApiError::Storage("tasks file contains invalid JSON".into()))
    }

    /// Write the whole collection back, pretty-printed with two-space
    /// indentation so the file diffs and hand-edits cleanly.
    pub fn write(&self, tasks: &[ApiTask]) -> Result<(), ApiError> {
        let raw = serde_json::to_string_pretty(tasks)
            .map_err(|e| ApiError::Storage(format!("serialize tasks: {e}")))?;
        fs::write(&self.path, raw).map_err(|e| {
            ApiError::Storage(format!("write {}: {e}", self.path.display()))
        })
    }

    // ── Operations ───────────────────────────────────────────────────

    /// All tasks, ascending by id regardless of file order.
    pub fn list_all(&self) -> Result<Vec<ApiTask>, ApiError> {
        let mut tasks = self.read()?;
        tasks.sort_by_key(|t| t.id);
        Ok(tasks)
    }

    /// Validate the request, assign the first free id, append and
    /// persist. Validation runs before the file is touched.
    pub fn create(&self, req: &CreateTaskRequest) -> Result<ApiTask, ApiError> {
        let (title, description) = req.validate()?;
        let mut tasks = self.read()?;
        let task = ApiTask {
            id: first_free_id(&tasks),
            title,
            description,
            completed: false,
            created_at: Utc::now(),
            updated_at: None,
        };
        tasks.push(task.clone());
        self.write(&tasks)?;
        Ok(task)
    }

    /// Merge a patch into the task with `id` and persist. The body is
    /// validated after the lookup, so an unknown id reports not-found
    /// even when the body is also bad.
    pub fn update(&self, id: i64, body: &serde_json::Value) -> Result<ApiTask, ApiError> {
        let mut tasks = self.read()?;
        let idx = tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(ApiError::NotFound { id })?;
        let patch = TaskPatch::from_value(body)?;
        tasks[idx].apply(patch, Utc::now());
        let task = tasks[idx].clone();
        self.write(&tasks)?;
        Ok(task)
    }

    /// Remove the task with `id` and persist, returning the removed
    /// record as it stood.
    pub fn delete(&self, id: i64) -> Result<ApiTask, ApiError> {
        let mut tasks = self.read()?;
        let idx = tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(ApiError::NotFound { id })?;
        let task = tasks.remove(idx);
        self.write(&tasks)?;
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn temp_tasks() -> (TempDir, TasksFile) {
        let dir = tempfile::tempdir().unwrap();
        let file = TasksFile::new(dir.path().join("tasks.json"));
        (dir, file)
    }

    fn create_titled(file: &TasksFile, title: &str) -> ApiTask {
        file.create(&CreateTaskRequest {
            title: Some(title.into()),
            description: None,
        })
        .unwrap()
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let (_dir, file) = temp_tasks();
        assert_eq!(file.read().unwrap(), Vec::new());
        assert_eq!(file.list_all().unwrap(), Vec::new());
    }

    #[test]
    fn corrupt_file_reports_storage_error() {
        let (_dir, file) = temp_tasks();
        fs::write(file.path(), "{definitely not json").unwrap();

        let err = file.read().unwrap_err();
        assert_eq!(
            err,
            ApiError::Storage("tasks file contains invalid JSON".into())
        );
        // Operations propagate the same failure.
        assert!(matches!(
            file.create(&CreateTaskRequest {
                title: Some("x".into()),
                description: None
            }),
            Err(ApiError::Storage(_))
        ));
    }

    #[test]
    fn create_assigns_sequential_ids_from_one() {
        let (_dir, file) = temp_tasks();
        let a = create_titled(&file, "a");
        let b = create_titled(&file, "b");
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert!(!a.completed);
        assert_eq!(a.updated_at, None);
    }

    #[test]
    fn create_reuses_the_first_vacated_id() {
        let (_dir, file) = temp_tasks();
        create_titled(&file, "a");
        create_titled(&file, "b");
        create_titled(&file, "c");
        file.delete(2).unwrap();

        let filler = create_titled(&file, "fills the gap");
        assert_eq!(filler.id, 2);
        // The run is dense again, so the next one extends it.
        assert_eq!(create_titled(&file, "d").id, 4);
    }

    #[test]
    fn create_validates_before_touching_the_file() {
        let (_dir, file) = temp_tasks();
        let err = file
            .create(&CreateTaskRequest::default())
            .unwrap_err();
        assert_eq!(err, ApiError::Validation("title is required".into()));
        assert!(!file.path().exists());
    }

    #[test]
    fn update_merges_and_survives_reread() {
        let (_dir, file) = temp_tasks();
        let created = create_titled(&file, "before");

        let updated = file
            .update(created.id, &json!({ "title": "after", "completed": true }))
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.title, "after");
        assert!(updated.completed);
        assert!(updated.updated_at.is_some());

        let reread = file.list_all().unwrap();
        assert_eq!(reread, vec![updated]);
    }

    #[test]
    fn update_unknown_id_is_not_found_even_with_a_bad_body() {
        let (_dir, file) = temp_tasks();
        create_titled(&file, "a");

        let err = file.update(42, &json!({ "title": "x" })).unwrap_err();
        assert_eq!(err, ApiError::NotFound { id: 42 });

        // Lookup wins over validation.
        let err = file.update(42, &json!({ "completed": "nope" })).unwrap_err();
        assert_eq!(err, ApiError::NotFound { id: 42 });
    }

    #[test]
    fn update_rejects_a_bad_body_for_an_existing_task() {
        let (_dir, file) = temp_tasks();
        let created = create_titled(&file, "a");

        let err = file
            .update(created.id, &json!({ "completed": "nope" }))
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Validation("completed must be a boolean".into())
        );
        // The failed update left the record alone.
        assert_eq!(file.list_all().unwrap(), vec![created]);
    }

    #[test]
    fn delete_returns_the_removed_record() {
        let (_dir, file) = temp_tasks();
        let a = create_titled(&file, "a");
        let b = create_titled(&file, "b");

        let removed = file.delete(a.id).unwrap();
        assert_eq!(removed, a);
        assert_eq!(file.list_all().unwrap(), vec![b.clone()]);

        // A failed delete leaves the collection as it was.
        let err = file.delete(a.id).unwrap_err();
        assert_eq!(err, ApiError::NotFound { id: a.id });
        assert_eq!(file.list_all().unwrap(), vec![b]);
    }

    #[test]
    fn list_sorts_by_id_whatever_the_file_order() {
        let (_dir, file) = temp_tasks();
        let raw = r#"[
            {"id": 3, "title": "c", "completed": false, "createdAt": "2024-01-03T00:00:00Z"},
            {"id": 1, "title": "a", "completed": true, "createdAt": "2024-01-01T00:00:00Z"},
            {"id": 2, "title": "b", "completed": false, "createdAt": "2024-01-02T00:00:00Z"}
        ]"#;
        fs::write(file.path(), raw).unwrap();

        let ids: Vec<i64> = file.list_all().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, [1, 2, 3]);
    }

    #[test]
    fn file_on_disk_is_pretty_printed_camel_case() {
        let (_dir, file) = temp_tasks();
        create_titled(&file, "a");

        let raw = fs::read_to_string(file.path()).unwrap();
        assert!(raw.starts_with("[\n"));
        assert!(raw.contains("\"id\": 1"));
        assert!(raw.contains("\"createdAt\""));
        assert!(!raw.contains("\"updatedAt\""));
    }
}
