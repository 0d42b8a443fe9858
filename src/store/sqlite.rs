// SQLite-backed guest store: one JSON document per household

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use super::{GuestDocument, GuestStore};
use crate::error::StoreError;
use crate::guest::{GuestInput, GuestPatch, GuestRecord};

#[derive(Clone)]
pub struct SqliteGuestStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGuestStore {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        setup_database(&conn)?;
        info!(path = %path.display(), "guest database opened");
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        SqliteGuestStore {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        lock_connection(&self.conn)
    }

    /// Run `work` on the blocking pool so a caller's timeout can fire while
    /// SQLite is busy.
    async fn blocking<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = lock_connection(&conn)?;
            work(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("database task failed: {}", e)))?
    }

    /// Store a raw document under a known id (imports from older exports).
    /// Returns false when the id already exists.
    pub fn import_document(
        &self,
        id: &str,
        created_at: DateTime<Utc>,
        document: &GuestDocument,
    ) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let json = serde_json::to_string(document)?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO guests (id, created_at, document) VALUES (?1, ?2, ?3)",
            params![id, created_at.to_rfc3339(), json],
        )?;
        Ok(inserted == 1)
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM guests", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn lock_connection(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
    conn.lock()
        .map_err(|_| StoreError::Unavailable("guest database lock poisoned".to_string()))
}

pub fn setup_database(conn: &Connection) -> Result<(), StoreError> {
    // WAL mode is a no-op for in-memory databases
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS guests (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            document TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_guests_created_at ON guests(created_at)",
        [],
    )?;

    Ok(())
}

fn parse_created_at(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Backend(format!("bad created_at '{}': {}", raw, e)))
}

#[async_trait]
impl GuestStore for SqliteGuestStore {
    async fn list_all(&self) -> Result<Vec<GuestRecord>, StoreError> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, created_at, document FROM guests ORDER BY created_at DESC, rowid DESC",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut records = Vec::with_capacity(rows.len());
            for (id, created_at, json) in rows {
                let document: GuestDocument = serde_json::from_str(&json)?;
                records.push(document.into_record(id, parse_created_at(&created_at)?));
            }

            debug!(count = records.len(), "listed guest records");
            Ok(records)
        })
        .await
    }

    async fn insert(&self, input: GuestInput) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let record = GuestRecord::from_input(id.clone(), input, Utc::now());
        let json = serde_json::to_string(&GuestDocument::from_record(&record))?;

        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO guests (id, created_at, document) VALUES (?1, ?2, ?3)",
                params![record.id, record.created_at.to_rfc3339(), json],
            )?;
            Ok(())
        })
        .await?;

        Ok(id)
    }

    async fn update(&self, id: &str, patch: GuestPatch) -> Result<(), StoreError> {
        let id = id.to_string();
        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            let row: Option<(String, String)> = tx
                .query_row(
                    "SELECT created_at, document FROM guests WHERE id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let (created_at, json) = row.ok_or_else(|| StoreError::NotFound(id.clone()))?;

            let document: GuestDocument = serde_json::from_str(&json)?;
            let mut record = document.into_record(id.clone(), parse_created_at(&created_at)?);
            record.apply(&patch);
            let json = serde_json::to_string(&GuestDocument::from_record(&record))?;

            tx.execute(
                "UPDATE guests SET document = ?1 WHERE id = ?2",
                params![json, id],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        self.blocking(move |conn| {
            let deleted = conn.execute("DELETE FROM guests WHERE id = ?1", params![id])?;
            if deleted == 0 {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        })
        .await
    }
}
