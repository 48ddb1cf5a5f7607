//! `Database` trait: the async storage interface the HTTP layer talks to.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DatabaseError;
use crate::todos::model::{TodoDraft, TodoItem};

/// Backend-agnostic todo storage.
///
/// Implementations own their connection handling and concurrency; callers
/// add no locking on top.
#[async_trait]
pub trait Database: Send + Sync {
    /// Create the backing schema if it is missing. Safe to call repeatedly.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    /// Insert a new todo and return its generated id.
    ///
    /// `created_at` and `updated_at` are both set to the insertion time.
    async fn create_todo(&self, draft: &TodoDraft) -> Result<i64, DatabaseError>;

    /// All todos, oldest id first.
    async fn list_todos(&self) -> Result<Vec<TodoItem>, DatabaseError>;

    /// Todos whose status equals `status` exactly (case-sensitive).
    async fn list_todos_by_status(&self, status: &str) -> Result<Vec<TodoItem>, DatabaseError>;

    /// Todos due strictly after `now`, soonest first.
    async fn list_upcoming_todos(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<TodoItem>, DatabaseError>;

    /// Get a todo by id. `Ok(None)` means no such row.
    async fn get_todo(&self, id: i64) -> Result<Option<TodoItem>, DatabaseError>;

    /// Replace the writable fields of todo `id` and refresh `updated_at`.
    ///
    /// Returns `false` when no row has that id; nothing is written then.
    async fn update_todo(&self, id: i64, draft: &TodoDraft) -> Result<bool, DatabaseError>;
}
