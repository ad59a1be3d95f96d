use crate::types::{
    AppError, ConversationRecord, Document, DocumentMetadata, DocumentSummary, NewChunk,
    PublicShare, Result, SourceRef, StoredChunk,
};
use crate::utils::toml_config::KassistConfig;
use chrono::{DateTime, Utc};
use libsql::{params, Builder, Connection, Database, Row};
use std::collections::BTreeMap;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Relational store for documents, chunks, conversations and public shares.
///
/// Backed by libsql: a local SQLite file, an in-memory database, or a remote
/// Turso database.
pub struct TursoClient {
    db: Database,
    /// In-memory databases vanish with their connection, so one is kept open
    /// and handed to one caller at a time.
    shared: Option<Arc<Mutex<Connection>>>,
}

/// Connection with foreign keys enforced.
///
/// For an in-memory database this holds the shared connection exclusively
/// until dropped, so transactions from concurrent requests never interleave.
pub enum DbConnection {
    Owned(Connection),
    Shared(OwnedMutexGuard<Connection>),
}

impl Deref for DbConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        match self {
            DbConnection::Owned(conn) => conn,
            DbConnection::Shared(guard) => guard,
        }
    }
}

/// SQLite leaves foreign key checks off unless asked, per connection.
async fn enforce_foreign_keys(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", ())
        .await
        .map_err(db_err("Failed to enable foreign keys"))?;
    Ok(())
}

fn db_err(context: &'static str) -> impl Fn(libsql::Error) -> AppError {
    move |e| AppError::Database(format!("{}: {}", context, e))
}

fn to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

impl TursoClient {
    /// Connect to a remote Turso database.
    pub async fn new(url: String, auth_token: String) -> Result<Self> {
        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Turso: {}", e)))?;

        let client = Self { db, shared: None };
        client.initialize_schema().await?;

        Ok(client)
    }

    /// Open (or create) a local SQLite file. `:memory:` opens an in-memory database.
    pub async fn new_local(path: &str) -> Result<Self> {
        if path == ":memory:" {
            return Self::new_memory().await;
        }

        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Database(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open local database: {}", e)))?;

        let client = Self { db, shared: None };
        client.initialize_schema().await?;

        Ok(client)
    }

    /// Open a fresh in-memory database.
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open memory database: {}", e)))?;
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;
        enforce_foreign_keys(&conn).await?;

        let client = Self {
            db,
            shared: Some(Arc::new(Mutex::new(conn))),
        };
        client.initialize_schema().await?;

        Ok(client)
    }

    /// Remote Turso when both env vars resolve, otherwise the local `database.url`.
    pub async fn from_config(config: &KassistConfig) -> Result<Self> {
        match config.turso_remote() {
            Some((url, token)) => Self::new(url, token).await,
            None => Self::new_local(&config.database.url).await,
        }
    }

    pub async fn connection(&self) -> Result<DbConnection> {
        match &self.shared {
            Some(shared) => Ok(DbConnection::Shared(Arc::clone(shared).lock_owned().await)),
            None => {
                let conn = self
                    .db
                    .connect()
                    .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;
                enforce_foreign_keys(&conn).await?;
                Ok(DbConnection::Owned(conn))
            }
        }
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection().await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                file_type TEXT NOT NULL,
                content TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                is_public INTEGER NOT NULL DEFAULT 0,
                metadata TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(db_err("Failed to create documents table"))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS document_chunks (
                id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL,
                content TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                start_char INTEGER NOT NULL,
                end_char INTEGER NOT NULL,
                page_number INTEGER,
                embedding TEXT,
                FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
            )",
            (),
        )
        .await
        .map_err(db_err("Failed to create document_chunks table"))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_chunks_document ON document_chunks(document_id)",
            (),
        )
        .await
        .map_err(db_err("Failed to create chunk index"))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                user_message TEXT NOT NULL,
                ai_response TEXT NOT NULL,
                mode TEXT NOT NULL,
                sources_used TEXT NOT NULL,
                confidence_score REAL NOT NULL,
                created_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(db_err("Failed to create conversations table"))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_conversations_session ON conversations(session_id)",
            (),
        )
        .await
        .map_err(db_err("Failed to create conversation index"))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS public_shares (
                id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL,
                share_token TEXT UNIQUE NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER,
                FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
            )",
            (),
        )
        .await
        .map_err(db_err("Failed to create public_shares table"))?;

        Ok(())
    }

    /// Cheap round trip used by the health check.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.connection().await?;
        let mut rows = conn
            .query("SELECT 1", ())
            .await
            .map_err(db_err("Ping failed"))?;
        rows.next().await.map_err(db_err("Ping failed"))?;
        Ok(())
    }

    // ============= Documents =============

    pub async fn create_document(&self, doc: &Document) -> Result<()> {
        let conn = self.connection().await?;
        let metadata = serde_json::to_string(&doc.metadata)
            .map_err(|e| AppError::Internal(format!("Failed to encode metadata: {}", e)))?;

        conn.execute(
            "INSERT INTO documents
             (id, filename, file_type, content, file_size, is_public, metadata, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                doc.id.as_str(),
                doc.filename.as_str(),
                doc.file_type.as_str(),
                doc.content.as_str(),
                doc.file_size,
                doc.is_public as i64,
                metadata,
                doc.created_at.timestamp_millis(),
                doc.updated_at.timestamp_millis(),
            ],
        )
        .await
        .map_err(db_err("Failed to create document"))?;

        Ok(())
    }

    pub async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let conn = self.connection().await?;
        let mut rows = conn
            .query(
                "SELECT id, filename, file_type, content, file_size, is_public, metadata,
                        created_at, updated_at
                 FROM documents WHERE id = ?",
                [id],
            )
            .await
            .map_err(db_err("Failed to query document"))?;

        match rows.next().await.map_err(db_err("Failed to read document"))? {
            Some(row) => Ok(Some(row_to_document(&row)?)),
            None => Ok(None),
        }
    }

    /// Newest first, without content.
    pub async fn list_documents(
        &self,
        skip: u32,
        limit: u32,
        public_only: bool,
    ) -> Result<Vec<DocumentSummary>> {
        let conn = self.connection().await?;
        let sql = if public_only {
            "SELECT id, filename, file_type, file_size, is_public, metadata, created_at
             FROM documents WHERE is_public = 1
             ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?"
        } else {
            "SELECT id, filename, file_type, file_size, is_public, metadata, created_at
             FROM documents
             ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?"
        };

        let mut rows = conn
            .query(sql, (limit as i64, skip as i64))
            .await
            .map_err(db_err("Failed to list documents"))?;

        let mut documents = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err("Failed to read document"))? {
            let metadata: String = row.get(5).map_err(db_err("Bad metadata column"))?;
            documents.push(DocumentSummary {
                id: row.get(0).map_err(db_err("Bad id column"))?,
                filename: row.get(1).map_err(db_err("Bad filename column"))?,
                file_type: row.get(2).map_err(db_err("Bad file_type column"))?,
                file_size: row.get(3).map_err(db_err("Bad file_size column"))?,
                is_public: row.get::<i64>(4).map_err(db_err("Bad is_public column"))? != 0,
                metadata: parse_metadata(&metadata)?,
                created_at: to_datetime(row.get(6).map_err(db_err("Bad created_at column"))?),
            });
        }

        Ok(documents)
    }

    pub async fn count_documents(&self, public_only: bool) -> Result<u64> {
        let sql = if public_only {
            "SELECT COUNT(*) FROM documents WHERE is_public = 1"
        } else {
            "SELECT COUNT(*) FROM documents"
        };
        self.count(sql, ()).await
    }

    /// Removes the document with its chunks and shares. Returns `false` when
    /// the document doesn't exist.
    pub async fn delete_document(&self, id: &str) -> Result<bool> {
        let conn = self.connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(db_err("Failed to begin transaction"))?;

        tx.execute("DELETE FROM document_chunks WHERE document_id = ?", [id])
            .await
            .map_err(db_err("Failed to delete chunks"))?;
        tx.execute("DELETE FROM public_shares WHERE document_id = ?", [id])
            .await
            .map_err(db_err("Failed to delete shares"))?;
        let deleted = tx
            .execute("DELETE FROM documents WHERE id = ?", [id])
            .await
            .map_err(db_err("Failed to delete document"))?;

        tx.commit().await.map_err(db_err("Failed to commit delete"))?;

        Ok(deleted > 0)
    }

    /// Document count per file type.
    pub async fn file_type_distribution(&self, public_only: bool) -> Result<BTreeMap<String, u64>> {
        let conn = self.connection().await?;
        let sql = if public_only {
            "SELECT file_type, COUNT(*) FROM documents WHERE is_public = 1 GROUP BY file_type"
        } else {
            "SELECT file_type, COUNT(*) FROM documents GROUP BY file_type"
        };

        let mut rows = conn
            .query(sql, ())
            .await
            .map_err(db_err("Failed to query file types"))?;

        let mut distribution = BTreeMap::new();
        while let Some(row) = rows.next().await.map_err(db_err("Failed to read file types"))? {
            let file_type: String = row.get(0).map_err(db_err("Bad file_type column"))?;
            let count: i64 = row.get(1).map_err(db_err("Bad count column"))?;
            distribution.insert(file_type, count.max(0) as u64);
        }

        Ok(distribution)
    }

    // ============= Chunks =============

    /// Insert all chunks of a document in one transaction.
    pub async fn insert_chunks(&self, document_id: &str, chunks: &[NewChunk]) -> Result<()> {
        let conn = self.connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(db_err("Failed to begin transaction"))?;

        for chunk in chunks {
            let embedding = match &chunk.embedding {
                Some(values) => Some(serde_json::to_string(values).map_err(|e| {
                    AppError::Internal(format!("Failed to encode embedding: {}", e))
                })?),
                None => None,
            };

            tx.execute(
                "INSERT INTO document_chunks
                 (id, document_id, content, chunk_index, start_char, end_char, page_number, embedding)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    document_id,
                    chunk.content.as_str(),
                    chunk.chunk_index as i64,
                    chunk.start_char as i64,
                    chunk.end_char as i64,
                    chunk.page_number.map(i64::from),
                    embedding,
                ],
            )
            .await
            .map_err(db_err("Failed to insert chunk"))?;
        }

        tx.commit().await.map_err(db_err("Failed to commit chunks"))?;
        Ok(())
    }

    /// Every chunk that has an embedding, joined with its document.
    pub async fn chunks_with_embeddings(&self) -> Result<Vec<StoredChunk>> {
        let conn = self.connection().await?;
        let mut rows = conn
            .query(
                "SELECT c.document_id, d.filename, d.is_public, c.content, c.chunk_index,
                        c.start_char, c.end_char, c.page_number, c.embedding
                 FROM document_chunks c
                 JOIN documents d ON d.id = c.document_id
                 WHERE c.embedding IS NOT NULL
                 ORDER BY d.created_at, c.document_id, c.chunk_index",
                (),
            )
            .await
            .map_err(db_err("Failed to query chunks"))?;

        let mut chunks = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err("Failed to read chunk"))? {
            let raw: String = row.get(8).map_err(db_err("Bad embedding column"))?;
            let embedding: Vec<f32> = match serde_json::from_str(&raw) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping chunk with unreadable embedding");
                    continue;
                }
            };

            chunks.push(StoredChunk {
                document_id: row.get(0).map_err(db_err("Bad document_id column"))?,
                document_name: row.get(1).map_err(db_err("Bad filename column"))?,
                is_public: row.get::<i64>(2).map_err(db_err("Bad is_public column"))? != 0,
                content: row.get(3).map_err(db_err("Bad content column"))?,
                chunk_index: row.get::<i64>(4).map_err(db_err("Bad chunk_index column"))? as usize,
                start_char: row.get::<i64>(5).map_err(db_err("Bad start_char column"))? as usize,
                end_char: row.get::<i64>(6).map_err(db_err("Bad end_char column"))? as usize,
                page_number: row
                    .get::<Option<i64>>(7)
                    .map_err(db_err("Bad page_number column"))?
                    .map(|p| p as u32),
                embedding,
            });
        }

        Ok(chunks)
    }

    // ============= Conversations =============

    pub async fn save_conversation(&self, record: &ConversationRecord) -> Result<()> {
        let conn = self.connection().await?;
        let sources = serde_json::to_string(&record.sources_used)
            .map_err(|e| AppError::Internal(format!("Failed to encode sources: {}", e)))?;

        conn.execute(
            "INSERT INTO conversations
             (id, session_id, user_message, ai_response, mode, sources_used, confidence_score, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                record.id.as_str(),
                record.session_id.as_str(),
                record.user_message.as_str(),
                record.ai_response.as_str(),
                record.mode.as_str(),
                sources,
                record.confidence_score,
                record.created_at.timestamp_millis(),
            ],
        )
        .await
        .map_err(db_err("Failed to save conversation"))?;

        Ok(())
    }

    /// Newest first.
    pub async fn conversation_history(
        &self,
        session_id: &str,
        limit: u32,
    ) -> Result<Vec<ConversationRecord>> {
        let conn = self.connection().await?;
        let mut rows = conn
            .query(
                "SELECT id, session_id, user_message, ai_response, mode, sources_used,
                        confidence_score, created_at
                 FROM conversations WHERE session_id = ?
                 ORDER BY created_at DESC, rowid DESC LIMIT ?",
                (session_id, limit as i64),
            )
            .await
            .map_err(db_err("Failed to query conversations"))?;

        let mut history = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err("Failed to read conversation"))? {
            let sources: String = row.get(5).map_err(db_err("Bad sources_used column"))?;
            let sources_used: Vec<SourceRef> = match serde_json::from_str(&sources) {
                Ok(sources) => sources,
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "Unreadable sources_used, returning none");
                    Vec::new()
                }
            };

            history.push(ConversationRecord {
                id: row.get(0).map_err(db_err("Bad id column"))?,
                session_id: row.get(1).map_err(db_err("Bad session_id column"))?,
                user_message: row.get(2).map_err(db_err("Bad user_message column"))?,
                ai_response: row.get(3).map_err(db_err("Bad ai_response column"))?,
                mode: row.get(4).map_err(db_err("Bad mode column"))?,
                sources_used,
                confidence_score: row.get(6).map_err(db_err("Bad confidence_score column"))?,
                created_at: to_datetime(row.get(7).map_err(db_err("Bad created_at column"))?),
            });
        }

        Ok(history)
    }

    /// Returns the number of deleted turns.
    pub async fn delete_conversation_history(&self, session_id: &str) -> Result<u64> {
        let conn = self.connection().await?;
        conn.execute("DELETE FROM conversations WHERE session_id = ?", [session_id])
            .await
            .map_err(db_err("Failed to delete conversations"))
    }

    // ============= Public shares =============

    /// Create the document's share, or replace the token and expiry of the
    /// existing one. The document is marked public in the same transaction.
    pub async fn upsert_share(
        &self,
        document_id: &str,
        share_token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<PublicShare> {
        let conn = self.connection().await?;
        let now = Utc::now();
        let expires = expires_at.map(|t| t.timestamp_millis());

        let tx = conn
            .transaction()
            .await
            .map_err(db_err("Failed to begin transaction"))?;

        let existing = {
            let mut rows = tx
                .query(
                    "SELECT id FROM public_shares WHERE document_id = ? LIMIT 1",
                    [document_id],
                )
                .await
                .map_err(db_err("Failed to query share"))?;
            match rows.next().await.map_err(db_err("Failed to read share"))? {
                Some(row) => Some(row.get::<String>(0).map_err(db_err("Bad id column"))?),
                None => None,
            }
        };

        let id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE public_shares SET share_token = ?, expires_at = ?, created_at = ?
                     WHERE id = ?",
                    (share_token, expires, now.timestamp_millis(), id.as_str()),
                )
                .await
                .map_err(db_err("Failed to update share"))?;
                id
            }
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                tx.execute(
                    "INSERT INTO public_shares (id, document_id, share_token, created_at, expires_at)
                     VALUES (?, ?, ?, ?, ?)",
                    (
                        id.as_str(),
                        document_id,
                        share_token,
                        now.timestamp_millis(),
                        expires,
                    ),
                )
                .await
                .map_err(db_err("Failed to create share"))?;
                id
            }
        };

        tx.execute(
            "UPDATE documents SET is_public = 1, updated_at = ? WHERE id = ?",
            (now.timestamp_millis(), document_id),
        )
        .await
        .map_err(db_err("Failed to mark document public"))?;

        tx.commit().await.map_err(db_err("Failed to commit share"))?;

        Ok(PublicShare {
            id,
            document_id: document_id.to_string(),
            share_token: share_token.to_string(),
            created_at: to_datetime(now.timestamp_millis()),
            expires_at: expires.map(to_datetime),
        })
    }

    pub async fn get_share_by_token(&self, share_token: &str) -> Result<Option<PublicShare>> {
        self.find_share(
            "SELECT id, document_id, share_token, created_at, expires_at
             FROM public_shares WHERE share_token = ?",
            share_token,
        )
        .await
    }

    pub async fn get_share_for_document(&self, document_id: &str) -> Result<Option<PublicShare>> {
        self.find_share(
            "SELECT id, document_id, share_token, created_at, expires_at
             FROM public_shares WHERE document_id = ? LIMIT 1",
            document_id,
        )
        .await
    }

    /// Revoke a share. The document stops being public once it has no shares
    /// left. Returns the document id, or `None` for an unknown token.
    pub async fn delete_share(&self, share_token: &str) -> Result<Option<String>> {
        let Some(share) = self.get_share_by_token(share_token).await? else {
            return Ok(None);
        };
        let document_id = share.document_id;

        let conn = self.connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(db_err("Failed to begin transaction"))?;

        tx.execute(
            "DELETE FROM public_shares WHERE share_token = ?",
            [share_token],
        )
        .await
        .map_err(db_err("Failed to delete share"))?;

        let remaining = {
            let mut rows = tx
                .query(
                    "SELECT COUNT(*) FROM public_shares WHERE document_id = ?",
                    [document_id.as_str()],
                )
                .await
                .map_err(db_err("Failed to count shares"))?;
            match rows.next().await.map_err(db_err("Failed to count shares"))? {
                Some(row) => row.get::<i64>(0).map_err(db_err("Bad count column"))?,
                None => 0,
            }
        };

        if remaining == 0 {
            tx.execute(
                "UPDATE documents SET is_public = 0, updated_at = ? WHERE id = ?",
                (Utc::now().timestamp_millis(), document_id.as_str()),
            )
            .await
            .map_err(db_err("Failed to mark document private"))?;
        }

        tx.commit().await.map_err(db_err("Failed to commit revoke"))?;

        Ok(Some(document_id))
    }

    pub async fn count_shares(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM public_shares", ()).await
    }

    // ============= Helpers =============

    async fn count(&self, sql: &str, params: impl libsql::params::IntoParams) -> Result<u64> {
        let conn = self.connection().await?;
        let mut rows = conn
            .query(sql, params)
            .await
            .map_err(db_err("Failed to count rows"))?;

        match rows.next().await.map_err(db_err("Failed to count rows"))? {
            Some(row) => Ok(row.get::<i64>(0).map_err(db_err("Bad count column"))?.max(0) as u64),
            None => Ok(0),
        }
    }

    async fn find_share(&self, sql: &str, key: &str) -> Result<Option<PublicShare>> {
        let conn = self.connection().await?;
        let mut rows = conn
            .query(sql, [key])
            .await
            .map_err(db_err("Failed to query share"))?;

        match rows.next().await.map_err(db_err("Failed to read share"))? {
            Some(row) => Ok(Some(PublicShare {
                id: row.get(0).map_err(db_err("Bad id column"))?,
                document_id: row.get(1).map_err(db_err("Bad document_id column"))?,
                share_token: row.get(2).map_err(db_err("Bad share_token column"))?,
                created_at: to_datetime(row.get(3).map_err(db_err("Bad created_at column"))?),
                expires_at: row
                    .get::<Option<i64>>(4)
                    .map_err(db_err("Bad expires_at column"))?
                    .map(to_datetime),
            })),
            None => Ok(None),
        }
    }
}

fn parse_metadata(raw: &str) -> Result<DocumentMetadata> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::Database(format!("Corrupt document metadata: {}", e)))
}

fn row_to_document(row: &Row) -> Result<Document> {
    let metadata: String = row.get(6).map_err(db_err("Bad metadata column"))?;

    Ok(Document {
        id: row.get(0).map_err(db_err("Bad id column"))?,
        filename: row.get(1).map_err(db_err("Bad filename column"))?,
        file_type: row.get(2).map_err(db_err("Bad file_type column"))?,
        content: row.get(3).map_err(db_err("Bad content column"))?,
        file_size: row.get(4).map_err(db_err("Bad file_size column"))?,
        is_public: row.get::<i64>(5).map_err(db_err("Bad is_public column"))? != 0,
        metadata: parse_metadata(&metadata)?,
        created_at: to_datetime(row.get(7).map_err(db_err("Bad created_at column"))?),
        updated_at: to_datetime(row.get(8).map_err(db_err("Bad updated_at column"))?),
    })
}
