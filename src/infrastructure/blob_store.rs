use crate::infrastructure::error::InfraError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// String blobs addressed by key; the only persistence capability the task
/// list needs.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, InfraError>;
    fn set(&self, key: &str, value: &str) -> Result<(), InfraError>;
    fn remove(&self, key: &str) -> Result<(), InfraError>;
}

pub fn initialize_database(path: &Path) -> Result<(), InfraError> {
    let connection = Connection::open(path)?;
    connection.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct SqliteBlobStore {
    db_path: PathBuf,
}

impl SqliteBlobStore {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, InfraError> {
        Connection::open(&self.db_path).map_err(InfraError::from)
    }
}

impl BlobStore for SqliteBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, InfraError> {
        let connection = self.connect()?;
        let value = connection
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), InfraError> {
        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
               value = excluded.value,
               updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), InfraError> {
        let connection = self.connect()?;
        connection.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryBlobStore {
    pub fn with_entry(key: &str, value: &str) -> Self {
        Self {
            entries: Mutex::new(HashMap::from([(key.to_string(), value.to_string())])),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, InfraError> {
        self.entries
            .lock()
            .map_err(|error| {
                InfraError::InvalidConfig(format!("blob store lock poisoned: {error}"))
            })
    }
}

impl BlobStore for InMemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, InfraError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), InfraError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), InfraError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_DB: AtomicUsize = AtomicUsize::new(0);

    struct TempDatabase {
        dir: PathBuf,
        path: PathBuf,
    }

    impl TempDatabase {
        fn new() -> Self {
            let sequence = NEXT_TEMP_DB.fetch_add(1, Ordering::Relaxed);
            let dir = std::env::temp_dir().join(format!(
                "task-timer-blob-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&dir).expect("create temp dir");
            let path = dir.join("tasks.sqlite");
            initialize_database(&path).expect("initialize database");
            Self { dir, path }
        }
    }

    impl Drop for TempDatabase {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }

    #[test]
    fn sqlite_store_sets_overwrites_and_removes() {
        let database = TempDatabase::new();
        let store = SqliteBlobStore::new(&database.path);

        assert_eq!(store.get("tasks").expect("get"), None);
        store.set("tasks", "[1]").expect("set");
        store.set("tasks", "[2]").expect("overwrite");
        assert_eq!(store.get("tasks").expect("get"), Some("[2]".to_string()));

        store.remove("tasks").expect("remove");
        assert_eq!(store.get("tasks").expect("get"), None);
    }

    #[test]
    fn sqlite_store_keeps_keys_separate_across_connections() {
        let database = TempDatabase::new();
        SqliteBlobStore::new(&database.path)
            .set("a", "first")
            .expect("set a");
        SqliteBlobStore::new(&database.path)
            .set("b", "second")
            .expect("set b");

        let reopened = SqliteBlobStore::new(&database.path);
        assert_eq!(reopened.get("a").expect("get a"), Some("first".to_string()));
        assert_eq!(reopened.get("b").expect("get b"), Some("second".to_string()));
    }

    #[test]
    fn in_memory_store_roundtrip() {
        let store = InMemoryBlobStore::with_entry("tasks", "[]");
        assert_eq!(store.get("tasks").expect("get"), Some("[]".to_string()));
        store.remove("tasks").expect("remove");
        assert_eq!(store.get("tasks").expect("get"), None);
    }
}
