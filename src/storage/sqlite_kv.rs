//! # SQLite Key-Value Store
//!
//! Durable [`KeyValueStore`] kept in a single `kv_store` table, the same way
//! device key-value storage is backed by SQLite on mobile platforms.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use crate::storage::kv::KeyValueStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use sqlite::{Connection, State};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)";

#[derive(Clone)]
pub struct SqliteKeyValueStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteKeyValueStore {
    /// Open (or create) the store at `path`, creating parent directories as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create key-value store directory {}", parent.display())
                })?;
            }
        }

        let connection = sqlite::open(path)
            .with_context(|| format!("Failed to open key-value store {}", path.display()))?;
        Self::from_connection(connection)
    }

    /// Open a store that lives only as long as this handle
    pub fn in_memory() -> Result<Self> {
        let connection = sqlite::open(":memory:").context("Failed to open in-memory key-value store")?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self> {
        connection
            .execute(CREATE_TABLE_SQL)
            .context("Failed to create kv_store table")?;
        debug!("Key-value store ready");
        Ok(SqliteKeyValueStore {
            connection: Arc::new(Mutex::new(connection)),
        })
    }
}

fn read_value(connection: &Connection, key: &str) -> Result<Option<String>> {
    let mut statement = connection.prepare("SELECT value FROM kv_store WHERE key = ?")?;
    statement.bind((1, key))?;
    match statement.next()? {
        State::Row => Ok(Some(statement.read::<String, _>(0)?)),
        State::Done => Ok(None),
    }
}

fn write_value(connection: &Connection, key: &str, value: &str) -> Result<()> {
    let mut statement =
        connection.prepare("INSERT OR REPLACE INTO kv_store (key, value) VALUES (?, ?)")?;
    statement.bind((1, key))?;
    statement.bind((2, value))?;
    while statement.next()? != State::Done {}
    Ok(())
}

fn delete_value(connection: &Connection, key: &str) -> Result<()> {
    let mut statement = connection.prepare("DELETE FROM kv_store WHERE key = ?")?;
    statement.bind((1, key))?;
    while statement.next()? != State::Done {}
    Ok(())
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let connection = self.connection.lock().await;
        read_value(&connection, key).with_context(|| format!("Failed to read key '{key}'"))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let connection = self.connection.lock().await;
        write_value(&connection, key, value).with_context(|| format!("Failed to write key '{key}'"))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let connection = self.connection.lock().await;
        delete_value(&connection, key).with_context(|| format!("Failed to remove key '{key}'"))
    }
}
