use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::ai::config::merge;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    Startup,
    MemeCreated,
    MemeLiked,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub session_id: Uuid,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub data: Value,
    pub metadata: Value,
}

/// Append-only sink for analytics events.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends `event` and returns the identifier the store assigned to it.
    async fn insert(&self, event: &Event) -> anyhow::Result<String>;
}

/// Stores events as JSON lines in a single file.
pub struct JsonlEventStore {
    path: PathBuf,
}

impl JsonlEventStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonlEventStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EventStore for JsonlEventStore {
    async fn insert(&self, event: &Event) -> anyhow::Result<String> {
        let event_id = Uuid::now_v7().to_string();
        let record = json!({
            "event_id": event_id,
            "session_id": event.session_id,
            "type": event.event_type,
            "data": event.data,
            "metadata": event.metadata,
        });
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        if let Some(directory) = self.path.parent() {
            if !directory.as_os_str().is_empty() {
                tokio::fs::create_dir_all(directory).await?;
            }
        }

        // One write per record so concurrent appenders do not interleave lines.
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        anyhow::Ok(event_id)
    }
}

/// Stores events in the `events` table of a SQLite database.
///
/// The row id is returned as the event id.
pub struct SqliteEventStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEventStore {
    /// Opens (or creates) the database at `path` and makes sure the table exists.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(directory) = path.parent() {
            if !directory.as_os_str().is_empty() {
                std::fs::create_dir_all(directory)?;
            }
        }
        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "opened event database");
        Self::with_connection(conn)
    }

    pub fn in_memory() -> anyhow::Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS events (
                event_id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                type TEXT NOT NULL,
                data TEXT NOT NULL,
                metadata TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        anyhow::Ok(SqliteEventStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Events recorded for `session_id`, oldest first.
    pub fn session_events(&self, session_id: Uuid) -> anyhow::Result<Vec<Event>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("event database lock poisoned"))?;
        let mut stmt = conn.prepare(
            "SELECT session_id, type, data, metadata
             FROM events
             WHERE session_id = ?1
             ORDER BY event_id",
        )?;
        let rows = stmt.query_map([session_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (session_id, event_type, data, metadata) = row?;
            events.push(Event {
                session_id: Uuid::parse_str(&session_id)?,
                event_type: EventType::from_str(&event_type)?,
                data: serde_json::from_str(&data)?,
                metadata: serde_json::from_str(&metadata)?,
            });
        }
        anyhow::Ok(events)
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn insert(&self, event: &Event) -> anyhow::Result<String> {
        let conn = self.conn.clone();
        let session_id = event.session_id.to_string();
        let event_type = event.event_type.to_string();
        let data = event.data.to_string();
        let metadata = event.metadata.to_string();

        let event_id = tokio::task::spawn_blocking(move || -> anyhow::Result<i64> {
            let conn = conn
                .lock()
                .map_err(|_| anyhow!("event database lock poisoned"))?;
            conn.execute(
                "INSERT INTO events (session_id, type, data, metadata) VALUES (?1, ?2, ?3, ?4)",
                params![session_id, event_type, data, metadata],
            )?;
            anyhow::Ok(conn.last_insert_rowid())
        })
        .await??;

        anyhow::Ok(event_id.to_string())
    }
}

/// Keeps events in memory; used for dry runs and tests.
#[derive(Default)]
pub struct MemoryEventStore {
    events: Mutex<Vec<(String, Event)>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.iter().map(|(_, event)| event.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, event: &Event) -> anyhow::Result<String> {
        let event_id = Uuid::now_v7().to_string();
        self.events
            .lock()
            .map_err(|_| anyhow!("event store lock poisoned"))?
            .push((event_id.clone(), event.clone()));
        anyhow::Ok(event_id)
    }
}

/// Writes events on behalf of the pipeline without ever failing it.
///
/// Every event gets `timestamp_utc` and `environment` metadata; caller
/// metadata with the same keys wins. A store error or timeout is logged and
/// reported as `None`.
#[derive(Clone)]
pub struct EventLogger {
    store: Arc<dyn EventStore>,
    environment: String,
    timeout: Option<Duration>,
}

impl EventLogger {
    pub fn new(store: Arc<dyn EventStore>, environment: impl Into<String>) -> Self {
        EventLogger {
            store,
            environment: environment.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub async fn log_event(
        &self,
        session_id: Uuid,
        event_type: EventType,
        data: Value,
        metadata: Option<Value>,
    ) -> Option<String> {
        let mut full_metadata = json!({
            "timestamp_utc": Utc::now().to_rfc3339(),
            "environment": self.environment,
        });
        match metadata {
            Some(Value::Object(extra)) => {
                let extra = extra.into_iter().collect::<HashMap<String, Value>>();
                full_metadata = merge(&full_metadata, &extra);
            }
            Some(other) => {
                tracing::debug!(%session_id, %event_type, metadata = %other, "ignoring non-object event metadata");
            }
            None => {}
        }

        let event = Event {
            session_id,
            event_type,
            data,
            metadata: full_metadata,
        };

        let insert = self.store.insert(&event);
        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, insert)
                .await
                .unwrap_or_else(|_| Err(anyhow!("event store timed out after {timeout:?}"))),
            None => insert.await,
        };

        match result {
            Ok(event_id) => {
                tracing::info!(%session_id, %event_type, %event_id, "logged event");
                Some(event_id)
            }
            Err(err) => {
                tracing::warn!(%session_id, %event_type, "failed to log event: {err:#}");
                None
            }
        }
    }
}
