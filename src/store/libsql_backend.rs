//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. Timestamps are stored as
//! fixed-width RFC 3339 UTC text so SQL string comparison orders them
//! chronologically.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::Database;
use crate::todos::model::{TodoDraft, TodoItem};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and initialize the schema.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run a SELECT over `TODO_COLUMNS` and collect every row.
    async fn query_todos(
        &self,
        op: &'static str,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<TodoItem>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(sql, params)
            .await
            .map_err(|e| DatabaseError::Query(format!("{op}: {e}")))?;

        let mut todos = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => todos.push(row_to_todo(&row)?),
                Ok(None) => break,
                Err(e) => return Err(DatabaseError::Query(format!("{op} row: {e}"))),
            }
        }
        debug!(op, count = todos.len(), "Todos listed");
        Ok(todos)
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Canonical write format: `2026-01-02T03:04:05.000000Z`.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(column: &str, s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Query(format!("todo.{column} parse {s:?}: {e}")))
}

const TODO_COLUMNS: &str = "id, title, description, status, due_date, created_at, updated_at";

/// Map a libsql Row to a TodoItem. Column order matches `TODO_COLUMNS`.
fn row_to_todo(row: &libsql::Row) -> Result<TodoItem, DatabaseError> {
    let text = |idx: i32, column: &str| -> Result<String, DatabaseError> {
        row.get::<String>(idx)
            .map_err(|e| DatabaseError::Query(format!("todo.{column}: {e}")))
    };

    let id: i64 = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("todo.id: {e}")))?;

    Ok(TodoItem {
        id,
        title: text(1, "title")?,
        description: text(2, "description")?,
        status: text(3, "status")?,
        due_date: parse_datetime("due_date", &text(4, "due_date")?)?,
        created_at: parse_datetime("created_at", &text(5, "created_at")?)?,
        updated_at: parse_datetime("updated_at", &text(6, "updated_at")?)?,
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl Database for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    async fn create_todo(&self, draft: &TodoDraft) -> Result<i64, DatabaseError> {
        let now = format_datetime(&Utc::now());
        let mut rows = self
            .conn()
            .query(
                "INSERT INTO todos (title, description, status, due_date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5) RETURNING id",
                params![
                    draft.title.as_str(),
                    draft.description.as_str(),
                    draft.status.as_str(),
                    format_datetime(&draft.due_date),
                    now,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create_todo: {e}")))?;

        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("create_todo row: {e}")))?
            .ok_or_else(|| DatabaseError::Query("create_todo: no id returned".into()))?;
        let id: i64 = row
            .get(0)
            .map_err(|e| DatabaseError::Query(format!("create_todo id: {e}")))?;

        debug!(id, "Todo created");
        Ok(id)
    }

    async fn list_todos(&self) -> Result<Vec<TodoItem>, DatabaseError> {
        self.query_todos(
            "list_todos",
            &format!("SELECT {TODO_COLUMNS} FROM todos ORDER BY id ASC"),
            (),
        )
        .await
    }

    async fn list_todos_by_status(&self, status: &str) -> Result<Vec<TodoItem>, DatabaseError> {
        self.query_todos(
            "list_todos_by_status",
            &format!("SELECT {TODO_COLUMNS} FROM todos WHERE status = ?1 ORDER BY id ASC"),
            params![status],
        )
        .await
    }

    async fn list_upcoming_todos(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<TodoItem>, DatabaseError> {
        self.query_todos(
            "list_upcoming_todos",
            &format!(
                "SELECT {TODO_COLUMNS} FROM todos WHERE due_date > ?1 ORDER BY due_date ASC, id ASC"
            ),
            params![format_datetime(&now)],
        )
        .await
    }

    async fn get_todo(&self, id: i64) -> Result<Option<TodoItem>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_todo: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_todo(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_todo row: {e}"))),
        }
    }

    async fn update_todo(&self, id: i64, draft: &TodoDraft) -> Result<bool, DatabaseError> {
        let affected = self
            .conn()
            .execute(
                "UPDATE todos SET title = ?1, description = ?2, status = ?3, due_date = ?4, updated_at = ?5 WHERE id = ?6",
                params![
                    draft.title.as_str(),
                    draft.description.as_str(),
                    draft.status.as_str(),
                    format_datetime(&draft.due_date),
                    format_datetime(&Utc::now()),
                    id,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_todo: {e}")))?;

        debug!(id, affected, "Todo update executed");
        Ok(affected > 0)
    }
}
