use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde_json::Value;
use tracing::info;

use crate::errors::{AppError, AppResult};

/// Most write operations a single commit may carry.
pub const MAX_BATCH_WRITES: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct SetWrite {
    pub collection: String,
    pub key: String,
    pub document: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<SetWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, collection: &str, key: &str, document: Value) -> AppResult<()> {
        if self.writes.len() >= MAX_BATCH_WRITES {
            return Err(AppError::Config(format!(
                "write batch already holds {MAX_BATCH_WRITES} operations"
            )));
        }
        self.writes.push(SetWrite {
            collection: collection.to_string(),
            key: key.to_string(),
            document,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[SetWrite] {
        &self.writes
    }
}

pub trait DocumentStore: Send + Sync {
    /// Applies every write in `batch` or none of them.
    fn commit(&self, batch: WriteBatch) -> AppResult<()>;
}

pub struct SqliteDocumentStore {
    connection: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteDocumentStore {
    pub fn open<P: AsRef<Path>>(data_dir: P, database_file: &str) -> AppResult<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(database_file);
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        let connection = Connection::open_with_flags(&path, flags)?;
        connection.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA foreign_keys = ON;
            "#,
        )?;
        run_migrations(&connection)?;
        info!(
            target: "document_store",
            path = %path.display(),
            "document store ready"
        );
        Ok(Self {
            connection: Mutex::new(connection),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, collection: &str, key: &str) -> AppResult<Option<Value>> {
        let conn = self.connection.lock();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2",
                (collection, key),
                |row| row.get(0),
            )
            .optional()?;
        body.map(|text| serde_json::from_str(&text))
            .transpose()
            .map_err(AppError::from)
    }

    pub fn count(&self, collection: &str) -> AppResult<usize> {
        let conn = self.connection.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            [collection],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn commit(&self, batch: WriteBatch) -> AppResult<()> {
        let written_at = Utc::now().to_rfc3339();
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO documents (collection, doc_id, body, written_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(collection, doc_id) DO UPDATE SET
                    body = excluded.body,
                    written_at = excluded.written_at",
            )?;
            for write in batch.writes() {
                stmt.execute(params![
                    write.collection,
                    write.key,
                    serde_json::to_string(&write.document)?,
                    written_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn run_migrations(connection: &Connection) -> AppResult<()> {
    connection.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            doc_id TEXT NOT NULL,
            body TEXT NOT NULL,
            written_at TEXT NOT NULL,
            PRIMARY KEY (collection, doc_id)
        );
        "#,
    )?;
    Ok(())
}
