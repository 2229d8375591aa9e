//! Player preference storage
//!
//! Preferences are key-value pairs with JSON-serialized values, stored in a
//! single `preferences` table.
//!
//! # Example
//!
//! ```rust,no_run
//! use refrain_storage::preferences::{PreferenceStore, SqlitePreferences};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqlitePreferences::open("refrain.db").await?;
//!
//! store.set("ui.theme", &serde_json::json!("dark")).await?;
//! let theme = store.get("ui.theme").await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::Mutex;

use crate::error::{Result, StorageError};

/// Durable key → JSON store
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Returns `Ok(None)` if the key was never written
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Insert or replace
    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<()>;

    /// Returns whether the key existed
    async fn remove(&self, key: &str) -> Result<bool>;
}

/// `SQLite`-backed preferences
#[derive(Debug, Clone)]
pub struct SqlitePreferences {
    pool: SqlitePool,
}

impl SqlitePreferences {
    /// Wrap an existing, migrated pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database file at `path` and run migrations
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::Connection(format!("{}: {}", parent.display(), e))
            })?;
        }

        let pool = crate::create_pool_at(path).await?;
        crate::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Close the underlying pool, waiting for in-flight writes
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl PreferenceStore for SqlitePreferences {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM preferences WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some((raw,)) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let value_str = serde_json::to_string(value)?;
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO preferences (key, value, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value_str)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM preferences WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// In-process preferences, lost on exit
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferences {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.values.lock().await.remove(key).is_some())
    }
}
