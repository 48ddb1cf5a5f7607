//! Todo data model: persisted items and inbound payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Storage-assigned row id.
    pub id: i64,
    /// Short title.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// Free-form status label ("pending", "done", ...).
    pub status: String,
    /// Deadline for completion.
    #[serde(rename = "duedate")]
    pub due_date: DateTime<Utc>,
    /// When the todo was inserted. Never changes.
    pub created_at: DateTime<Utc>,
    /// When the todo was last written.
    pub updated_at: DateTime<Utc>,
}

/// A todo as decoded from a request body, before validation.
///
/// Every field is optional so that missing keys and explicit `null`s decode
/// cleanly and are reported by validation rather than as a decode failure.
/// Timestamps supplied by the caller are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TodoPayload {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "duedate")]
    pub due_date: Option<DateTime<Utc>>,
}

/// The writable fields of a todo, guaranteed present and non-empty.
///
/// Only produced by [`super::validation::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoDraft {
    pub title: String,
    pub description: String,
    pub status: String,
    pub due_date: DateTime<Utc>,
}

/// Query parameters accepted by `GET /api/todo`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub status: Option<String>,
    pub doneby: Option<String>,
}

impl FromIterator<(String, String)> for ListQuery {
    /// Collect decoded query pairs. The first value of a repeated key wins;
    /// unknown keys are ignored.
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut query = ListQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "status" => &mut query.status,
                "doneby" => &mut query.doneby,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// Which storage listing a `GET /api/todo` request resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
    Status(String),
    Upcoming,
    All,
}

impl From<ListQuery> for ListFilter {
    /// A non-empty `status` wins over `doneby`; `doneby` only filters when it
    /// is exactly `upcoming`.
    fn from(query: ListQuery) -> Self {
        match query.status {
            Some(status) if !status.is_empty() => ListFilter::Status(status),
            _ if query.doneby.as_deref() == Some("upcoming") => ListFilter::Upcoming,
            _ => ListFilter::All,
        }
    }
}
