use crate::domain::ids::{IdGenerator, TaskId};
use crate::domain::models::{full_seconds, PomodoroSegment, Task, TaskMode};
use crate::infrastructure::blob_store::BlobStore;
use crate::infrastructure::error::InfraError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_STORAGE_KEY: &str = "tasks";
const UNNAMED_TASK: &str = "Unnamed Task";
const FALLBACK_MINUTES: u32 = 1;

/// Persists the task list as one JSON array blob.
pub struct TaskStore<S: BlobStore> {
    store: Arc<S>,
    key: String,
}

impl<S: BlobStore> TaskStore<S> {
    pub fn new(store: Arc<S>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loads and repairs the saved list.
    ///
    /// A blob that does not parse is removed and treated as no saved state.
    /// Loaded ids are registered with `ids`; missing or duplicate ids are
    /// replaced with fresh ones.
    pub fn load(&self, ids: &mut IdGenerator) -> Result<Vec<Task>, InfraError> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(Vec::new());
        };

        let parsed = match serde_json::from_str::<Value>(&raw) {
            Ok(value) => value,
            Err(error) => {
                warn!(key = %self.key, %error, "discarding corrupt saved tasks");
                self.store.remove(&self.key)?;
                return Ok(Vec::new());
            }
        };

        let Some(records) = parsed.as_array().filter(|records| !records.is_empty()) else {
            debug!(key = %self.key, "saved tasks are empty or not a list");
            return Ok(Vec::new());
        };

        for record in records {
            let saved = record.get("id").and_then(Value::as_u64);
            if let Some(id) = saved.and_then(TaskId::from_saved) {
                ids.observe(id);
            }
        }

        let mut seen = HashSet::new();
        let mut tasks = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let Some(object) = record.as_object() else {
                warn!(index, "skipping saved task that is not an object");
                continue;
            };
            tasks.push(repair_record(object, ids, &mut seen));
        }

        debug!(key = %self.key, count = tasks.len(), "loaded saved tasks");
        Ok(tasks)
    }

    pub fn save(&self, tasks: &[Task]) -> Result<(), InfraError> {
        for task in tasks {
            task.validate().map_err(InfraError::InvalidInput)?;
        }
        let records = tasks.iter().map(TaskRecord::from).collect::<Vec<_>>();
        let payload = serde_json::to_string(&records)?;
        self.store.set(&self.key, &payload)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord<'a> {
    id: u64,
    name: &'a str,
    minutes: u32,
    time_left: u64,
    running: bool,
    completed: bool,
    mode: &'static str,
    #[serde(skip_serializing_if = "is_false")]
    is_pomodoro_work: bool,
    #[serde(skip_serializing_if = "is_false")]
    is_pomodoro_break: bool,
    #[serde(skip_serializing_if = "is_false")]
    is_pomodoro_task_break: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    part_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_parts: Option<u32>,
}

impl<'a> From<&'a Task> for TaskRecord<'a> {
    fn from(task: &'a Task) -> Self {
        let mut record = TaskRecord {
            id: task.id.value(),
            name: &task.name,
            minutes: task.minutes,
            time_left: task.time_left,
            running: task.running,
            completed: task.completed,
            mode: task.mode.as_str(),
            is_pomodoro_work: false,
            is_pomodoro_break: false,
            is_pomodoro_task_break: false,
            original_name: None,
            part_number: None,
            total_parts: None,
        };
        match &task.segment {
            Some(PomodoroSegment::Work {
                original_name,
                part_number,
                total_parts,
            }) => {
                record.is_pomodoro_work = true;
                record.original_name = Some(original_name);
                record.part_number = Some(*part_number);
                record.total_parts = Some(*total_parts);
            }
            Some(PomodoroSegment::Break) => record.is_pomodoro_break = true,
            Some(PomodoroSegment::TaskBreak) => record.is_pomodoro_task_break = true,
            None => {}
        }
        record
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn repair_record(
    record: &Map<String, Value>,
    ids: &mut IdGenerator,
    seen: &mut HashSet<TaskId>,
) -> Task {
    let saved = record
        .get("id")
        .and_then(Value::as_u64)
        .and_then(TaskId::from_saved);
    let id = match saved {
        Some(id) if seen.insert(id) => id,
        _ => {
            let mut fresh = ids.next_id();
            while !seen.insert(fresh) {
                fresh = ids.next_id();
            }
            warn!(id = %fresh, "assigned fresh id to saved task");
            fresh
        }
    };

    let name = read_str(record, "name").unwrap_or(UNNAMED_TASK).to_string();
    let minutes = record
        .get("minutes")
        .and_then(read_positive_u32)
        .unwrap_or(FALLBACK_MINUTES);
    let full = full_seconds(minutes);
    let time_left = record
        .get("timeLeft")
        .and_then(read_seconds)
        .unwrap_or(full)
        .min(full);
    let completed = record
        .get("completed")
        .and_then(Value::as_bool)
        .unwrap_or(false)
        && time_left == 0;
    let mode = read_str(record, "mode")
        .and_then(TaskMode::parse)
        .unwrap_or_default();

    Task {
        id,
        name: name.clone(),
        minutes,
        time_left,
        running: false,
        completed,
        mode,
        segment: read_segment(record, &name),
    }
}

fn read_segment(record: &Map<String, Value>, name: &str) -> Option<PomodoroSegment> {
    let flag = |key: &str| record.get(key).and_then(Value::as_bool).unwrap_or(false);

    if flag("isPomodoroWork") {
        let part_number = record
            .get("partNumber")
            .and_then(read_positive_u32)
            .unwrap_or(1);
        let total_parts = record
            .get("totalParts")
            .and_then(read_positive_u32)
            .unwrap_or(part_number)
            .max(part_number);
        return Some(PomodoroSegment::Work {
            original_name: read_str(record, "originalName").unwrap_or(name).to_string(),
            part_number,
            total_parts,
        });
    }
    if flag("isPomodoroBreak") {
        return Some(PomodoroSegment::Break);
    }
    if flag("isPomodoroTaskBreak") {
        return Some(PomodoroSegment::TaskBreak);
    }
    None
}

fn read_str<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn read_positive_u32(value: &Value) -> Option<u32> {
    let whole = match value.as_u64() {
        Some(whole) => whole,
        None => value.as_f64().filter(|raw| *raw >= 1.0)?.floor() as u64,
    };
    u32::try_from(whole).ok().filter(|whole| *whole > 0)
}

fn read_seconds(value: &Value) -> Option<u64> {
    if let Some(whole) = value.as_u64() {
        return Some(whole);
    }
    let raw = value.as_f64()?;
    Some(if raw <= 0.0 { 0 } else { raw.floor() as u64 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::engine::TaskListEngine;
    use crate::domain::models::PomodoroSettings;
    use crate::infrastructure::blob_store::InMemoryBlobStore;
    use serde_json::json;

    fn store_with(raw: &str) -> (Arc<InMemoryBlobStore>, TaskStore<InMemoryBlobStore>) {
        let blobs = Arc::new(InMemoryBlobStore::with_entry(DEFAULT_STORAGE_KEY, raw));
        let store = TaskStore::new(Arc::clone(&blobs), DEFAULT_STORAGE_KEY);
        (blobs, store)
    }

    #[test]
    fn missing_blob_loads_empty() {
        let store = TaskStore::new(Arc::new(InMemoryBlobStore::default()), DEFAULT_STORAGE_KEY);
        let mut ids = IdGenerator::starting_at(1);
        assert!(store.load(&mut ids).expect("load").is_empty());
    }

    #[test]
    fn corrupt_blob_loads_empty_and_is_removed() {
        let (blobs, store) = store_with("{not json");
        let mut ids = IdGenerator::starting_at(1);

        let tasks = store.load(&mut ids).expect("load");

        assert!(tasks.is_empty());
        assert_eq!(blobs.get(DEFAULT_STORAGE_KEY).expect("get"), None);
    }

    #[test]
    fn non_array_and_empty_array_load_empty_but_are_kept() {
        for raw in ["{\"id\": 1}", "[]", "42"] {
            let (blobs, store) = store_with(raw);
            let mut ids = IdGenerator::starting_at(1);
            assert!(store.load(&mut ids).expect("load").is_empty());
            assert_eq!(blobs.get(DEFAULT_STORAGE_KEY).expect("get"), Some(raw.to_string()));
        }
    }

    #[test]
    fn repairs_missing_fields_with_defaults() {
        let (_blobs, store) = store_with(&json!([{ "id": 5 }]).to_string());
        let mut ids = IdGenerator::starting_at(1);

        let tasks = store.load(&mut ids).expect("load");

        assert_eq!(tasks.len(), 1);
        let task = &tasks[0];
        assert_eq!(task.id, TaskId::new(5));
        assert_eq!(task.name, "Unnamed Task");
        assert_eq!(task.minutes, 1);
        assert_eq!(task.time_left, 60);
        assert!(!task.running);
        assert!(!task.completed);
        assert_eq!(task.mode, TaskMode::Countdown);
        assert!(task.validate().is_ok());
    }

    #[test]
    fn running_is_forced_off_and_time_left_is_clamped() {
        let raw = json!([
            { "id": 1, "name": "Read", "minutes": 2, "timeLeft": 90, "running": true },
            { "id": 2, "name": "Write", "minutes": 1, "timeLeft": 500, "running": true },
            { "id": 3, "name": "Rest", "minutes": 1, "timeLeft": -4, "completed": true }
        ]);
        let (_blobs, store) = store_with(&raw.to_string());
        let mut ids = IdGenerator::starting_at(1);

        let tasks = store.load(&mut ids).expect("load");

        assert!(tasks.iter().all(|task| !task.running));
        assert_eq!(tasks[0].time_left, 90);
        assert_eq!(tasks[1].time_left, 60);
        assert_eq!(tasks[2].time_left, 0);
        assert!(tasks[2].completed);
    }

    #[test]
    fn duplicate_and_missing_ids_get_fresh_unique_ids() {
        let raw = json!([
            { "id": 9, "name": "A", "minutes": 5 },
            { "id": 9, "name": "B", "minutes": 5 },
            { "name": "C", "minutes": 5 },
            "garbage"
        ]);
        let (_blobs, store) = store_with(&raw.to_string());
        let mut ids = IdGenerator::starting_at(1);

        let tasks = store.load(&mut ids).expect("load");

        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].id, TaskId::new(9));
        let unique = tasks.iter().map(|task| task.id).collect::<HashSet<_>>();
        assert_eq!(unique.len(), 3);
        assert!(tasks[1].id > TaskId::new(9));
        assert!(ids.next_id() > tasks[2].id);
    }

    #[test]
    fn save_then_load_keeps_pomodoro_tags() {
        let blobs = Arc::new(InMemoryBlobStore::default());
        let store = TaskStore::new(Arc::clone(&blobs), "custom");
        let mut work = Task::countdown(TaskId::new(11), "Essay - Part 1 (🍅 45min)", 45)
            .with_segment(PomodoroSegment::Work {
                original_name: "Essay".to_string(),
                part_number: 1,
                total_parts: 2,
            });
        work.running = true;
        let pause = Task::countdown(TaskId::new(12), "☕ Break 1 (15min)", 15)
            .with_segment(PomodoroSegment::Break);

        store.save(&[work.clone(), pause.clone()]).expect("save");
        let raw = blobs.get("custom").expect("get").expect("saved blob");
        let saved: Value = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(saved[0]["isPomodoroWork"], json!(true));
        assert_eq!(saved[0]["originalName"], json!("Essay"));
        assert_eq!(saved[0]["timeLeft"], json!(2700));
        assert_eq!(saved[1]["isPomodoroBreak"], json!(true));
        assert!(saved[1].get("originalName").is_none());

        let mut ids = IdGenerator::starting_at(1);
        let loaded = store.load(&mut ids).expect("load");
        work.running = false;
        assert_eq!(loaded, vec![work, pause]);
    }

    #[test]
    fn ids_at_the_integer_ceiling_are_reassigned() {
        let raw = json!([
            { "id": u64::MAX, "name": "A", "minutes": 5 },
            { "id": u64::MAX, "name": "B", "minutes": 5 }
        ]);
        let (_blobs, store) = store_with(&raw.to_string());
        let mut engine = TaskListEngine::new(IdGenerator::starting_at(1));

        let tasks = store.load(engine.ids_mut()).expect("load");
        engine.replace_all(tasks);
        engine.add_task("C", Some(5)).expect("added");
        engine.expand_pomodoro(&PomodoroSettings::default()).expect("expand");

        let snapshot = engine.snapshot();
        let unique = snapshot.iter().map(|task| task.id).collect::<HashSet<_>>();
        assert_eq!(unique.len(), snapshot.len());
        assert!(snapshot.iter().all(|task| task.id.value() < u64::MAX));
    }

    #[test]
    fn fresh_ids_skip_ids_taken_later_in_the_blob() {
        let raw = json!([
            { "name": "No id", "minutes": 5 },
            { "id": 1, "name": "Taken", "minutes": 5 },
            { "id": 1, "name": "Duplicate", "minutes": 5 }
        ]);
        let (_blobs, store) = store_with(&raw.to_string());
        let mut ids = IdGenerator::starting_at(1);

        let tasks = store.load(&mut ids).expect("load");

        let unique = tasks.iter().map(|task| task.id).collect::<HashSet<_>>();
        assert_eq!(tasks.len(), 3);
        assert_eq!(unique.len(), 3);
        assert_eq!(tasks[1].id, TaskId::new(1));
    }

    #[test]
    fn save_rejects_invalid_tasks_without_writing() {
        let blobs = Arc::new(InMemoryBlobStore::default());
        let store = TaskStore::new(Arc::clone(&blobs), DEFAULT_STORAGE_KEY);
        let mut task = Task::countdown(TaskId::new(1), "Read", 1);
        task.time_left = 61;

        let result = store.save(&[task]);

        assert!(matches!(result, Err(InfraError::InvalidInput(_))));
        assert_eq!(blobs.get(DEFAULT_STORAGE_KEY).expect("get"), None);
    }
}
