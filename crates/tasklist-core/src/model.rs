//! Wire and storage models
//!
//! All JSON uses camelCase keys (`todoId`, `createdAt`, `attachmentUrl`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TodoError, TodoResult};

/// A stored to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    /// Owner: the verified `sub` of whoever created it
    pub user_id: String,
    /// UUID v4
    pub todo_id: String,
    /// Creation time, RFC 3339
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub due_date: String,
    pub done: bool,
    /// Public URL of the uploaded attachment, once one was requested
    #[serde(default)]
    pub attachment_url: Option<String>,
}

/// Body of `POST /todos`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub name: String,
    pub due_date: String,
}

/// Body of `PATCH /todos/{todo_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    pub name: String,
    pub due_date: String,
    pub done: bool,
}

pub(crate) fn validate_name(name: &str) -> TodoResult<()> {
    if name.trim().is_empty() {
        return Err(TodoError::Validation("name must not be empty".into()));
    }
    Ok(())
}

impl CreateTodoRequest {
    /// Reject blank names
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Validation`] if `name` is empty after trimming.
    pub fn validate(&self) -> TodoResult<()> {
        validate_name(&self.name)
    }
}

impl UpdateTodoRequest {
    /// Reject blank names
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Validation`] if `name` is empty after trimming.
    pub fn validate(&self) -> TodoResult<()> {
        validate_name(&self.name)
    }
}
