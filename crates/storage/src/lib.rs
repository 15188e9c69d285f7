//! Transient persistence of the submitted assessment and its prediction.
//!
//! Two fixed slots hold plain JSON text with no versioning or expiry. Each successful
//! submission overwrites both; there is no atomicity between them.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use shared::{domain::FormState, protocol::PredictionResponse};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub const ASSESSMENT_KEY: &str = "assessmentData";
pub const PREDICTION_KEY: &str = "predictionResults";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to serialize session value for '{key}': {source}")]
    Serialize {
        key: &'static str,
        source: serde_json::Error,
    },
    /// The backend refused the write, e.g. quota exceeded or storage disabled.
    #[error("session storage unavailable: {0}")]
    Unavailable(String),
    #[error("session storage backend failure: {0}")]
    Backend(#[from] sqlx::Error),
    #[error("failed to create parent directory '{}' for session database: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Key-value capability backing the assessment session.
///
/// Implementors provide raw text slots; the typed operations are shared.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, key: &'static str, value: String) -> Result<()>;
    async fn get(&self, key: &'static str) -> Result<Option<String>>;
    async fn remove(&self, key: &'static str) -> Result<()>;

    async fn save_assessment(&self, form: &FormState) -> Result<()> {
        self.put(ASSESSMENT_KEY, encode(ASSESSMENT_KEY, form)?).await
    }

    async fn save_prediction(&self, prediction: &PredictionResponse) -> Result<()> {
        self.put(PREDICTION_KEY, encode(PREDICTION_KEY, prediction)?)
            .await
    }

    async fn load_assessment(&self) -> Result<Option<FormState>> {
        Ok(self.get(ASSESSMENT_KEY).await?.and_then(|raw| decode(ASSESSMENT_KEY, &raw)))
    }

    async fn load_prediction(&self) -> Result<Option<PredictionResponse>> {
        Ok(self.get(PREDICTION_KEY).await?.and_then(|raw| decode(PREDICTION_KEY, &raw)))
    }

    async fn clear(&self) -> Result<()> {
        self.remove(ASSESSMENT_KEY).await?;
        self.remove(PREDICTION_KEY).await
    }
}

fn encode<T: Serialize>(key: &'static str, value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|source| StorageError::Serialize { key, source })
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "discarding unreadable session value");
            None
        }
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    slots: RwLock<HashMap<&'static str, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, key: &'static str, value: String) -> Result<()> {
        self.slots.write().await.insert(key, value);
        Ok(())
    }

    async fn get(&self, key: &'static str) -> Result<Option<String>> {
        Ok(self.slots.read().await.get(key).cloned())
    }

    async fn remove(&self, key: &'static str) -> Result<()> {
        self.slots.write().await.remove(key);
        Ok(())
    }
}

#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: Pool<Sqlite>,
}

impl SqliteSessionStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // A single long-lived connection keeps `sqlite::memory:` databases alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_kv (
                key        TEXT PRIMARY KEY NOT NULL,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await?;

        debug!(database_url, "opened session store");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn put(&self, key: &'static str, value: String) -> Result<()> {
        sqlx::query(
            "INSERT INTO session_kv (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, key: &'static str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM session_kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get::<String, _>(0)))
    }

    async fn remove(&self, key: &'static str) -> Result<()> {
        sqlx::query("DELETE FROM session_kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).map_err(|source| StorageError::Io {
        path: parent.to_path_buf(),
        source,
    })
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
