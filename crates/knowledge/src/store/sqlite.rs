//! SQLite-backed store for tenants, chunks, sessions and conversations.

use super::{ConversationStore, KnowledgeStore, SessionStore, TenantStore};
use crate::types::{
    AnalysisSession, ChatExchange, KnowledgeChunk, NewChunk, NewTenant, SessionStatus,
    SetupStatus, SourceType, Tenant,
};
use chrono::{DateTime, Utc};
use dot_core::{AppError, AppResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS tenants (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        domain TEXT NOT NULL,
        business_context TEXT,
        ai_model TEXT,
        temperature REAL,
        max_tokens INTEGER,
        setup_status TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS knowledge_chunks (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
        content TEXT NOT NULL,
        source_type TEXT NOT NULL,
        source_url TEXT NOT NULL,
        embedding BLOB,
        embedding_provider TEXT,
        metadata TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_tenant ON knowledge_chunks(tenant_id);

    CREATE TABLE IF NOT EXISTS analysis_sessions (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
        url TEXT NOT NULL,
        status TEXT NOT NULL,
        urls_analyzed INTEGER NOT NULL,
        chunks_created INTEGER NOT NULL,
        error_message TEXT,
        started_at TEXT NOT NULL,
        completed_at TEXT
    );

    CREATE TABLE IF NOT EXISTS conversations (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
        user_message TEXT NOT NULL,
        assistant_message TEXT NOT NULL,
        relevant_chunks_used INTEGER NOT NULL,
        user_at TEXT NOT NULL,
        assistant_at TEXT NOT NULL
    );
"#;

const CHUNK_COLUMNS: &str = "id, tenant_id, content, source_type, source_url, embedding, embedding_provider, metadata, created_at";
const TENANT_COLUMNS: &str =
    "id, name, domain, business_context, ai_model, temperature, max_tokens, setup_status, created_at";
const SESSION_COLUMNS: &str = "id, tenant_id, url, status, urls_analyzed, chunks_created, error_message, started_at, completed_at";

/// One SQLite connection behind a mutex. Every statement is short, so
/// callers hold the lock only for the duration of a single query.
///
/// Queries run inline on the calling task rather than through
/// `spawn_blocking`: they block the executor thread for the length of one
/// local SQLite statement. Put a blocking pool in front of this store if it
/// ever backs a remote or contended database.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file and its schema.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Store(format!("Failed to create store directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Store(format!("Failed to open SQLite store: {}", e)))?;
        let store = Self::init(conn)?;
        tracing::debug!("Opened SQLite store at {:?}", db_path);
        Ok(store)
    }

    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Store(format!("Failed to open SQLite store: {}", e)))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| AppError::Store(format!("Failed to create tables: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Store("SQLite connection lock poisoned".to_string()))
    }

    fn transition(
        &self,
        session_id: &str,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> AppResult<AnalysisSession> {
        let conn = self.conn()?;
        let changed = conn
            .execute(sql, params)
            .map_err(db("Failed to update session"))?;

        let session = query_session(&conn, session_id)?
            .ok_or_else(|| AppError::NotFound(format!("analysis session {}", session_id)))?;

        if changed == 0 {
            return Err(AppError::Store(format!(
                "analysis session {} is already {}",
                session_id, session.status
            )));
        }
        Ok(session)
    }
}

#[async_trait::async_trait]
impl KnowledgeStore for SqliteStore {
    async fn insert_chunk(&self, chunk: NewChunk) -> AppResult<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let embedding = chunk.embedding.as_deref().map(embedding_to_bytes);
        let metadata = serde_json::to_string(&chunk.metadata)?;

        self.conn()?
            .execute(
                "INSERT INTO knowledge_chunks
                 (id, tenant_id, content, source_type, source_url, embedding, embedding_provider, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    id,
                    chunk.tenant_id,
                    chunk.content,
                    chunk.source_type.as_str(),
                    chunk.source_url,
                    embedding,
                    chunk.embedding_provider,
                    metadata,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(db("Failed to insert chunk"))?;

        Ok(id)
    }

    async fn chunks_for_tenant(&self, tenant_id: &str) -> AppResult<Vec<KnowledgeChunk>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM knowledge_chunks WHERE tenant_id = ?1 ORDER BY seq",
                CHUNK_COLUMNS
            ))
            .map_err(db("Failed to prepare chunk query"))?;

        let rows = stmt
            .query_map(params![tenant_id], chunk_from_row)
            .map_err(db("Failed to query chunks"))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(db("Failed to read chunk"))
    }

    async fn chunk_count(&self, tenant_id: &str) -> AppResult<usize> {
        let count: i64 = self
            .conn()?
            .query_row(
                "SELECT COUNT(*) FROM knowledge_chunks WHERE tenant_id = ?1",
                params![tenant_id],
                |row| row.get(0),
            )
            .map_err(db("Failed to count chunks"))?;
        Ok(count as usize)
    }
}

#[async_trait::async_trait]
impl TenantStore for SqliteStore {
    async fn create_tenant(&self, tenant: NewTenant) -> AppResult<Tenant> {
        let tenant = Tenant::from_new(uuid::Uuid::new_v4().to_string(), tenant);

        self.conn()?
            .execute(
                "INSERT INTO tenants
                 (id, name, domain, business_context, ai_model, temperature, max_tokens, setup_status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    tenant.id,
                    tenant.name,
                    tenant.domain,
                    tenant.business_context,
                    tenant.ai_model,
                    tenant.temperature.map(f64::from),
                    tenant.max_tokens.map(i64::from),
                    tenant.setup_status.as_str(),
                    tenant.created_at.to_rfc3339(),
                ],
            )
            .map_err(db("Failed to insert tenant"))?;

        Ok(tenant)
    }

    async fn get_tenant(&self, tenant_id: &str) -> AppResult<Option<Tenant>> {
        self.conn()?
            .query_row(
                &format!("SELECT {} FROM tenants WHERE id = ?1", TENANT_COLUMNS),
                params![tenant_id],
                tenant_from_row,
            )
            .optional()
            .map_err(db("Failed to read tenant"))
    }

    async fn list_tenants(&self) -> AppResult<Vec<Tenant>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM tenants ORDER BY created_at, name",
                TENANT_COLUMNS
            ))
            .map_err(db("Failed to prepare tenant query"))?;

        let rows = stmt
            .query_map([], tenant_from_row)
            .map_err(db("Failed to query tenants"))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(db("Failed to read tenant"))
    }

    async fn set_setup_status(&self, tenant_id: &str, status: SetupStatus) -> AppResult<()> {
        let changed = self
            .conn()?
            .execute(
                "UPDATE tenants SET setup_status = ?1 WHERE id = ?2",
                params![status.as_str(), tenant_id],
            )
            .map_err(db("Failed to update tenant"))?;

        if changed == 0 {
            return Err(AppError::NotFound(format!("tenant {}", tenant_id)));
        }
        Ok(())
    }

    async fn delete_tenant(&self, tenant_id: &str) -> AppResult<bool> {
        let changed = self
            .conn()?
            .execute("DELETE FROM tenants WHERE id = ?1", params![tenant_id])
            .map_err(db("Failed to delete tenant"))?;
        Ok(changed > 0)
    }
}

#[async_trait::async_trait]
impl SessionStore for SqliteStore {
    async fn create_session(&self, tenant_id: &str, url: &str) -> AppResult<AnalysisSession> {
        let session = AnalysisSession::start(tenant_id, url);

        self.conn()?
            .execute(
                "INSERT INTO analysis_sessions
                 (id, tenant_id, url, status, urls_analyzed, chunks_created, error_message, started_at, completed_at)
                 VALUES (?1, ?2, ?3, ?4, 0, 0, NULL, ?5, NULL)",
                params![
                    session.id,
                    session.tenant_id,
                    session.url,
                    session.status.as_str(),
                    session.started_at.to_rfc3339(),
                ],
            )
            .map_err(db("Failed to create session"))?;

        Ok(session)
    }

    async fn complete_session(
        &self,
        session_id: &str,
        urls_analyzed: u32,
        chunks_created: u32,
    ) -> AppResult<AnalysisSession> {
        self.transition(
            session_id,
            "UPDATE analysis_sessions
             SET status = 'completed', urls_analyzed = ?2, chunks_created = ?3, completed_at = ?4
             WHERE id = ?1 AND status = 'running'",
            params![
                session_id,
                i64::from(urls_analyzed),
                i64::from(chunks_created),
                Utc::now().to_rfc3339(),
            ],
        )
    }

    async fn fail_session(&self, session_id: &str, error: &str) -> AppResult<AnalysisSession> {
        self.transition(
            session_id,
            "UPDATE analysis_sessions
             SET status = 'failed', error_message = ?2, completed_at = ?3
             WHERE id = ?1 AND status = 'running'",
            params![session_id, error, Utc::now().to_rfc3339()],
        )
    }

    async fn get_session(&self, session_id: &str) -> AppResult<Option<AnalysisSession>> {
        let conn = self.conn()?;
        query_session(&conn, session_id)
    }

    async fn sessions_for_tenant(&self, tenant_id: &str) -> AppResult<Vec<AnalysisSession>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM analysis_sessions WHERE tenant_id = ?1 ORDER BY seq",
                SESSION_COLUMNS
            ))
            .map_err(db("Failed to prepare session query"))?;

        let rows = stmt
            .query_map(params![tenant_id], session_from_row)
            .map_err(db("Failed to query sessions"))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(db("Failed to read session"))
    }
}

#[async_trait::async_trait]
impl ConversationStore for SqliteStore {
    async fn append_exchange(&self, exchange: ChatExchange) -> AppResult<()> {
        self.conn()?
            .execute(
                "INSERT INTO conversations
                 (id, tenant_id, user_message, assistant_message, relevant_chunks_used, user_at, assistant_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    exchange.id,
                    exchange.tenant_id,
                    exchange.user_message,
                    exchange.assistant_message,
                    exchange.relevant_chunks_used as i64,
                    exchange.user_at.to_rfc3339(),
                    exchange.assistant_at.to_rfc3339(),
                ],
            )
            .map_err(db("Failed to append exchange"))?;
        Ok(())
    }

    async fn exchanges_for_tenant(&self, tenant_id: &str) -> AppResult<Vec<ChatExchange>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, tenant_id, user_message, assistant_message, relevant_chunks_used, user_at, assistant_at
                 FROM conversations WHERE tenant_id = ?1 ORDER BY seq",
            )
            .map_err(db("Failed to prepare conversation query"))?;

        let rows = stmt
            .query_map(params![tenant_id], |row| {
                Ok(ChatExchange {
                    id: row.get(0)?,
                    tenant_id: row.get(1)?,
                    user_message: row.get(2)?,
                    assistant_message: row.get(3)?,
                    relevant_chunks_used: row.get::<_, i64>(4)? as usize,
                    user_at: timestamp(row, 5)?,
                    assistant_at: timestamp(row, 6)?,
                })
            })
            .map_err(db("Failed to query conversations"))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(db("Failed to read exchange"))
    }
}

fn db(context: &'static str) -> impl Fn(rusqlite::Error) -> AppError {
    move |e| AppError::Store(format!("{}: {}", context, e))
}

fn query_session(conn: &Connection, session_id: &str) -> AppResult<Option<AnalysisSession>> {
    conn.query_row(
        &format!("SELECT {} FROM analysis_sessions WHERE id = ?1", SESSION_COLUMNS),
        params![session_id],
        session_from_row,
    )
    .optional()
    .map_err(db("Failed to read session"))
}

fn chunk_from_row(row: &Row<'_>) -> rusqlite::Result<KnowledgeChunk> {
    let embedding = row
        .get::<_, Option<Vec<u8>>>(5)?
        .map(|bytes| bytes_to_embedding(&bytes))
        .transpose()
        .map_err(|e| conversion(5, Type::Blob, e))?;

    let metadata_json: String = row.get(7)?;
    let metadata = serde_json::from_str(&metadata_json)
        .map_err(|e| conversion(7, Type::Text, AppError::from(e)))?;

    let source_type = text_enum(row, 3, SourceType::parse)?;

    Ok(KnowledgeChunk {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        content: row.get(2)?,
        source_type,
        source_url: row.get(4)?,
        embedding,
        embedding_provider: row.get(6)?,
        metadata,
        created_at: timestamp(row, 8)?,
    })
}

fn tenant_from_row(row: &Row<'_>) -> rusqlite::Result<Tenant> {
    Ok(Tenant {
        id: row.get(0)?,
        name: row.get(1)?,
        domain: row.get(2)?,
        business_context: row.get(3)?,
        ai_model: row.get(4)?,
        temperature: row.get::<_, Option<f64>>(5)?.map(|t| t as f32),
        max_tokens: row.get::<_, Option<i64>>(6)?.map(|m| m as u32),
        setup_status: text_enum(row, 7, SetupStatus::parse)?,
        created_at: timestamp(row, 8)?,
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<AnalysisSession> {
    let completed_at = row
        .get::<_, Option<String>>(8)?
        .map(|raw| parse_timestamp(8, &raw))
        .transpose()?;

    Ok(AnalysisSession {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        url: row.get(2)?,
        status: text_enum(row, 3, SessionStatus::parse)?,
        urls_analyzed: row.get::<_, i64>(4)? as u32,
        chunks_created: row.get::<_, i64>(5)? as u32,
        error_message: row.get(6)?,
        started_at: timestamp(row, 7)?,
        completed_at,
    })
}

fn text_enum<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        conversion(
            idx,
            Type::Text,
            AppError::Store(format!("unexpected value '{}'", raw)),
        )
    })
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(idx, &raw)
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion(idx, Type::Text, AppError::Store(e.to_string())))
}

fn conversion(idx: usize, ty: Type, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

/// Little-endian `f32` bytes.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Store(format!(
            "embedding blob length {} is not a multiple of 4",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
