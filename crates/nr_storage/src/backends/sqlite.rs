use async_trait::async_trait;
use nr_core::{
    CollectionPath, Document, DocumentData, DocumentPath, DocumentStore, Error, FieldTransform, OrderBy, Precondition,
    ReaderConfig, Result,
};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::StorageBackend;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        path TEXT PRIMARY KEY,
        collection TEXT NOT NULL,
        data TEXT NOT NULL,
        version INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS documents_collection ON documents (collection)",
];

const MAX_WRITE_ATTEMPTS: usize = 16;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn storage_error(what: &str, e: sqlx::Error) -> Error {
    Error::Storage(format!("{}: {}", what, e))
}

fn decode_data(raw: &str) -> Result<DocumentData> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Storage(format!("stored document is not an object: {}", other))),
    }
}

pub struct SqliteDocumentStore {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SqliteDocumentStore {
    fn get_error_message() -> &'static str {
        "SQLite database should be writable at the configured database path"
    }

    async fn new(config: &ReaderConfig) -> Result<Self> {
        Self::new_with_path(&config.database_path).await
    }
}

impl SqliteDocumentStore {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| storage_error("failed to connect to database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| storage_error(&format!("failed to run migration {}", i), e))?;
        }

        Ok(Self { pool: Arc::new(pool), db_path: db_path.to_path_buf() })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    /// Writes `data` only if `expected` holds at the moment of the write, in a
    /// single statement. `None` means another writer got there first.
    async fn write_if(&self, path: &DocumentPath, data: &DocumentData, expected: Precondition) -> Result<Option<u64>> {
        let raw = serde_json::to_string(data)?;
        let (result, version) = match expected {
            Precondition::Missing => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO documents (path, collection, data, version)
                    VALUES (?, ?, ?, 1)
                    ON CONFLICT(path) DO NOTHING
                    "#,
                )
                .bind(path.to_string())
                .bind(path.parent().to_string())
                .bind(raw)
                .execute(&*self.pool)
                .await;
                (result, 1)
            }
            Precondition::Version(v) => {
                let result = sqlx::query(
                    "UPDATE documents SET data = ?, version = version + 1 WHERE path = ? AND version = ?",
                )
                .bind(raw)
                .bind(path.to_string())
                .bind(v as i64)
                .execute(&*self.pool)
                .await;
                (result, v + 1)
            }
        };
        let result = result.map_err(|e| storage_error("failed to write document", e))?;
        Ok((result.rows_affected() == 1).then_some(version))
    }

    /// Read-modify-write retried on lost races until `change` lands on the
    /// version it was computed from.
    async fn modify<F>(&self, path: &DocumentPath, change: F) -> Result<u64>
    where
        F: Fn(Option<DocumentData>) -> DocumentData + Send + Sync,
    {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let current = self.get_document(path).await?;
            let expected = Precondition::of(current.as_ref());
            let data = change(current.map(|d| d.data));
            if let Some(version) = self.write_if(path, &data, expected).await? {
                return Ok(version);
            }
            debug!("Lost a write race on {}, retrying", path);
        }
        Err(Error::Conflict(format!("{} kept changing while being written", path)))
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get_document(&self, path: &DocumentPath) -> Result<Option<Document>> {
        let row = sqlx::query("SELECT data, version FROM documents WHERE path = ?")
            .bind(path.to_string())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| storage_error("failed to read document", e))?;

        row.map(|row| {
            let raw: String = row.get("data");
            let version: i64 = row.get("version");
            Ok(Document { path: path.clone(), data: decode_data(&raw)?, version: version as u64 })
        })
        .transpose()
    }

    async fn set_document(&self, path: &DocumentPath, data: DocumentData, merge: bool) -> Result<()> {
        if merge {
            self.modify(path, |existing| {
                let mut merged = existing.unwrap_or_default();
                merged.extend(data.clone());
                merged
            })
            .await?;
            return Ok(());
        }

        let raw = serde_json::to_string(&data)?;
        sqlx::query(
            r#"
            INSERT INTO documents (path, collection, data, version)
            VALUES (?, ?, ?, 1)
            ON CONFLICT(path) DO UPDATE SET data = excluded.data, version = documents.version + 1
            "#,
        )
        .bind(path.to_string())
        .bind(path.parent().to_string())
        .bind(raw)
        .execute(&*self.pool)
        .await
        .map_err(|e| storage_error("failed to write document", e))?;
        Ok(())
    }

    async fn set_document_if(&self, path: &DocumentPath, data: DocumentData, expected: Precondition) -> Result<u64> {
        self.write_if(path, &data, expected)
            .await?
            .ok_or_else(|| Error::Conflict(format!("{} changed since it was read", path)))
    }

    async fn update_document(&self, path: &DocumentPath, transforms: Vec<FieldTransform>) -> Result<()> {
        self.modify(path, |existing| {
            let mut data = existing.unwrap_or_default();
            for t in &transforms {
                t.apply(&mut data);
            }
            data
        })
        .await?;
        Ok(())
    }

    async fn delete_document(&self, path: &DocumentPath) -> Result<()> {
        sqlx::query("DELETE FROM documents WHERE path = ?")
            .bind(path.to_string())
            .execute(&*self.pool)
            .await
            .map_err(|e| storage_error("failed to delete document", e))?;
        Ok(())
    }

    async fn list_documents(&self, collection: &CollectionPath, order_by: &OrderBy) -> Result<Vec<Document>> {
        let rows = sqlx::query("SELECT path, data, version FROM documents WHERE collection = ?")
            .bind(collection.to_string())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| storage_error("failed to list documents", e))?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let path: String = row.get("path");
            let raw: String = row.get("data");
            let version: i64 = row.get("version");
            documents.push(Document {
                path: DocumentPath::parse(&path)?,
                data: decode_data(&raw)?,
                version: version as u64,
            });
        }
        documents.sort_by(|a, b| order_by.compare(&a.data, &b.data));
        Ok(documents)
    }
}
