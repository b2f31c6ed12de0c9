//! Error types for to-do operations

use thiserror::Error;

/// Result alias for to-do operations
pub type TodoResult<T> = Result<T, TodoError>;

/// Errors raised by [`TodoService`](crate::TodoService) and its backends
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TodoError {
    /// No item with this ID exists
    #[error("Todo not found: {todo_id}")]
    NotFound {
        /// The requested item
        todo_id: String,
    },

    /// The item exists but belongs to someone else
    #[error("User is not authorized to modify todo {todo_id}")]
    Forbidden {
        /// The requested item
        todo_id: String,
    },

    /// The request body is unusable
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The storage backend failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// An attachment URL could not be produced
    #[error("Signing error: {0}")]
    Signing(String),
}

impl TodoError {
    pub(crate) fn not_found(todo_id: &str) -> Self {
        Self::NotFound {
            todo_id: todo_id.to_string(),
        }
    }

    pub(crate) fn forbidden(todo_id: &str) -> Self {
        Self::Forbidden {
            todo_id: todo_id.to_string(),
        }
    }

    /// Whether the caller caused this error (as opposed to a backend failure)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Forbidden { .. } | Self::Validation(_)
        )
    }
}
