use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to prepare storage directory: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// String key-value store with the semantics of browser local storage.
pub trait LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(path: &std::path::Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let storage = Self::new(Connection::open(path)?);
        storage.initialize()?;
        Ok(storage)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        let storage = Self::new(Connection::open_in_memory()?);
        storage.initialize()?;
        Ok(storage)
    }

    pub fn initialize(&self) -> Result<(), StorageError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl LocalStorage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO local_storage (key, value) VALUES (?1, ?2)",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM local_storage WHERE key = ?1", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> SqliteStorage {
        SqliteStorage::in_memory().unwrap()
    }

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let mut storage = SqliteStorage::new(conn);

        storage.initialize().unwrap();
        storage.set_item("calendars", "[]").unwrap();
        storage.initialize().unwrap();

        assert_eq!(storage.get_item("calendars").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn open_reports_unusable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let result = SqliteStorage::open(&blocker.join("storage.db"));

        assert!(matches!(result, Err(StorageError::IoError(_))));
    }

    #[test]
    fn missing_key_returns_none() {
        let storage = create_test_storage();

        assert_eq!(storage.get_item("calendars").unwrap(), None);
    }

    #[test]
    fn stores_and_reads_item() {
        let mut storage = create_test_storage();

        storage.set_item("calendars", "[]").unwrap();

        assert_eq!(storage.get_item("calendars").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn overwrites_existing_item() {
        let mut storage = create_test_storage();
        storage.set_item("calendars", "[]").unwrap();

        storage.set_item("calendars", r#"[{"name":"A"}]"#).unwrap();

        assert_eq!(
            storage.get_item("calendars").unwrap().as_deref(),
            Some(r#"[{"name":"A"}]"#)
        );
    }

    #[test]
    fn removes_item() {
        let mut storage = create_test_storage();
        storage.set_item("calendars", "[]").unwrap();

        storage.remove_item("calendars").unwrap();

        assert!(storage.get_item("calendars").unwrap().is_none());
    }

    #[test]
    fn file_backed_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.db");

        {
            let mut storage = SqliteStorage::open(&path).unwrap();
            storage.set_item("calendars", "[1]").unwrap();
        }

        let storage = SqliteStorage::open(&path).unwrap();
        assert_eq!(storage.get_item("calendars").unwrap().as_deref(), Some("[1]"));
    }
}
