pub mod config;
pub mod local;

pub use local::{LocalStorage, SqliteStorage, StorageError};
