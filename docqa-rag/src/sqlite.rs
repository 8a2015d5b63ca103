//! Persistent vector store on SQLite.
//!
//! [`SqliteVectorStore`] keeps every collection in a single database file,
//! `docqa.sqlite3`, inside the configured directory. Records store the
//! embedding as a little-endian `f32` blob and metadata as JSON; search is an
//! exact cosine-similarity scan over the collection.
//!
//! Writers in two processes are only serialized by SQLite's own file locking.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{VectorStore, cosine_similarity, rank};

/// File name of the database inside the persist directory.
pub const DATABASE_FILE: &str = "docqa.sqlite3";

const BACKEND: &str = "sqlite";

/// A [`VectorStore`] persisted to a SQLite database file.
#[derive(Clone, Debug)]
pub struct SqliteVectorStore {
    location: PathBuf,
    pool: SqlitePool,
}

impl SqliteVectorStore {
    /// Open or create the store under `location`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::StoreInitError`] if the directory or database
    /// cannot be created or opened.
    pub async fn open(location: impl AsRef<Path>) -> Result<Self> {
        let location = location.as_ref().to_path_buf();
        let init_error = |message: String| RagError::StoreInitError {
            location: location.display().to_string(),
            message,
        };

        tokio::fs::create_dir_all(&location).await.map_err(|e| init_error(e.to_string()))?;

        let options = SqliteConnectOptions::new()
            .filename(location.join(DATABASE_FILE))
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| init_error(e.to_string()))?;

        Self::create_tables(&pool).await.map_err(|e| init_error(e.to_string()))?;

        info!(location = %location.display(), "opened vector store");
        Ok(Self { location, pool })
    }

    /// Whether a store has already been created under `location`.
    pub fn exists(location: impl AsRef<Path>) -> bool {
        location.as_ref().join(DATABASE_FILE).is_file()
    }

    /// Directory the store was opened in.
    pub fn location(&self) -> &Path {
        &self.location
    }

    async fn create_tables(pool: &SqlitePool) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                dimensions INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS records (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                document_id TEXT NOT NULL,
                text TEXT NOT NULL,
                metadata TEXT NOT NULL,
                embedding BLOB NOT NULL,
                PRIMARY KEY (collection, id)
            )",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    fn map_err(e: impl std::fmt::Display) -> RagError {
        RagError::VectorStoreError { backend: BACKEND.to_string(), message: e.to_string() }
    }

    async fn dimensions(&self, collection: &str) -> Result<Option<usize>> {
        let row = sqlx::query("SELECT dimensions FROM collections WHERE name = ?1")
            .bind(collection)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::map_err)?;

        row.map(|row| row.try_get::<i64, _>("dimensions").map(|d| d as usize))
            .transpose()
            .map_err(Self::map_err)
    }
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes.chunks_exact(4).map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])).collect()
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO collections (name, dimensions) VALUES (?1, ?2)")
            .bind(name)
            .bind(dimensions as i64)
            .execute(&self.pool)
            .await
            .map_err(Self::map_err)?;

        debug!(collection = name, dimensions, "ensured collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Self::map_err)?;
        let removed = sqlx::query("DELETE FROM records WHERE collection = ?1")
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?
            .rows_affected();
        sqlx::query("DELETE FROM collections WHERE name = ?1")
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?;
        tx.commit().await.map_err(Self::map_err)?;

        info!(collection = name, removed, "deleted collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let dimensions = self.dimensions(collection).await?.ok_or_else(|| {
            Self::map_err(format!("collection '{collection}' does not exist"))
        })?;

        if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != dimensions) {
            return Err(Self::map_err(format!(
                "chunk '{}' has {} dimensions, collection '{collection}' expects {dimensions}",
                bad.id,
                bad.embedding.len()
            )));
        }

        // One transaction per batch: either every chunk is written or none is.
        let mut tx = self.pool.begin().await.map_err(Self::map_err)?;
        for chunk in chunks {
            let metadata = serde_json::to_string(&chunk.metadata).map_err(Self::map_err)?;
            sqlx::query(
                "INSERT OR REPLACE INTO records (collection, id, document_id, text, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(collection)
            .bind(&chunk.id)
            .bind(&chunk.document_id)
            .bind(&chunk.text)
            .bind(metadata)
            .bind(encode_embedding(&chunk.embedding))
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?;
        }
        tx.commit().await.map_err(Self::map_err)?;

        debug!(collection, count = chunks.len(), "upserted chunks");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let rows = sqlx::query(
            "SELECT id, document_id, text, metadata, embedding FROM records WHERE collection = ?1",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::map_err)?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in rows {
            let metadata: String = row.try_get("metadata").map_err(Self::map_err)?;
            let metadata: HashMap<String, String> =
                serde_json::from_str(&metadata).map_err(Self::map_err)?;
            let blob: Vec<u8> = row.try_get("embedding").map_err(Self::map_err)?;
            let stored = decode_embedding(&blob);
            let score = cosine_similarity(&stored, embedding);

            scored.push(SearchResult {
                chunk: Chunk {
                    id: row.try_get("id").map_err(Self::map_err)?,
                    text: row.try_get("text").map_err(Self::map_err)?,
                    embedding: stored,
                    metadata,
                    document_id: row.try_get("document_id").map_err(Self::map_err)?,
                },
                score,
            });
        }

        Ok(rank(scored, top_k))
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM records WHERE collection = ?1")
            .bind(collection)
            .fetch_one(&self.pool)
            .await
            .map_err(Self::map_err)?;
        let n: i64 = row.try_get("n").map_err(Self::map_err)?;
        Ok(n as usize)
    }
}
