//! Key-value persistence for the two task collections.
//!
//! `Storage` is the raw slot API (one string value per key). `Persistence`
//! sits on top of it and speaks in task collections; it never fails a load,
//! an absent or unreadable slot is simply an empty collection.

use crate::error::StorageError;
use crate::models::Task;
#[cfg(test)]
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const TASKS_KEY: &str = "tasks";
pub const HISTORY_KEY: &str = "history";

pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per slot inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: io::Error| StorageError::Io { path, source }
        };

        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;
        let path = self.slot_path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(io_err(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_err(&path))?;
        Ok(())
    }
}

#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

#[cfg(test)]
impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub history: Vec<Task>,
}

pub struct Persistence<S> {
    storage: S,
}

impl<S: Storage> Persistence<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    #[cfg(test)]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn save(&mut self, tasks: &[Task], history: &[Task]) -> Result<(), StorageError> {
        let tasks = serde_json::to_string(tasks)?;
        let history = serde_json::to_string(history)?;
        self.storage.set_item(TASKS_KEY, &tasks)?;
        self.storage.set_item(HISTORY_KEY, &history)?;
        Ok(())
    }

    pub fn load(&self) -> Snapshot {
        Snapshot {
            tasks: self.load_tasks(),
            history: self.load_history(),
        }
    }

    fn load_tasks(&self) -> Vec<Task> {
        self.load_slot(TASKS_KEY)
    }

    fn load_history(&self) -> Vec<Task> {
        self.load_slot(HISTORY_KEY)
    }

    fn load_slot(&self, key: &str) -> Vec<Task> {
        let content = match self.storage.get_item(key) {
            Ok(Some(content)) => content,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(key, error = %err, "could not read stored tasks, starting empty");
                return Vec::new();
            }
        };

        // `null` is what an emptied browser slot looks like, accept it too.
        match serde_json::from_str::<Option<Vec<Task>>>(&content) {
            Ok(tasks) => tasks.unwrap_or_default(),
            Err(err) => {
                warn!(key, error = %err, "malformed stored tasks, starting empty");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    fn task(id: i64, title: &str, status: Status) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: format!("{title} description"),
            priority: "High".to_string(),
            date: "18/10/2026".to_string(),
            status,
        }
    }

    #[test]
    fn test_save_then_load_reproduces_both_collections() {
        let dir = tempfile::tempdir().unwrap();
        let mut persistence = Persistence::new(FileStorage::new(dir.path().join("data")));

        let tasks = vec![
            task(3, "Write report", Status::Pending),
            task(1, "Call Ana", Status::Completed),
        ];
        let history = vec![task(2, "Old chore", Status::Completed)];
        persistence.save(&tasks, &history).unwrap();

        let snapshot = persistence.load();
        assert_eq!(snapshot.tasks, tasks);
        assert_eq!(snapshot.history, history);
    }

    #[test]
    fn test_absent_slots_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = Persistence::new(FileStorage::new(dir.path()));
        assert_eq!(persistence.load(), Snapshot::default());
    }

    #[test]
    fn test_malformed_slot_loads_empty_without_touching_the_other() {
        let mut storage = MemoryStorage::default();
        storage.set_item(TASKS_KEY, "{not json").unwrap();
        storage
            .set_item(
                HISTORY_KEY,
                &serde_json::to_string(&[task(7, "Kept", Status::Pending)]).unwrap(),
            )
            .unwrap();

        let persistence = Persistence::new(storage);
        assert!(persistence.load_tasks().is_empty());
        assert_eq!(persistence.load_history().len(), 1);
    }

    #[test]
    fn test_null_slot_loads_empty() {
        let mut storage = MemoryStorage::default();
        storage.set_item(TASKS_KEY, "null").unwrap();
        assert!(Persistence::new(storage).load_tasks().is_empty());
    }

    #[test]
    fn test_file_storage_writes_one_file_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path());
        storage.set_item(TASKS_KEY, "[]").unwrap();

        assert!(dir.path().join("tasks.json").exists());
        assert!(!dir.path().join("tasks.json.tmp").exists());
        assert_eq!(storage.get_item(TASKS_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(storage.get_item(HISTORY_KEY).unwrap(), None);
    }
}
