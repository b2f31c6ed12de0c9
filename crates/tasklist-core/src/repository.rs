//! To-do storage
//!
//! [`TodoRepository`] is keyed by `todo_id` and indexed by owner, ordered by
//! `created_at`. [`InMemoryTodoRepository`] implements it over a [`DashMap`]
//! and is what the server runs with; a table-backed implementation plugs in
//! behind the same trait.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{TodoError, TodoResult};
use crate::model::{TodoItem, UpdateTodoRequest};

/// Table and index names for the to-do store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Table holding the items, keyed by `todoId`
    pub table_name: String,
    /// Secondary index on (`userId`, `createdAt`)
    pub created_at_index: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            table_name: "Todos".to_string(),
            created_at_index: "CreatedAtIndex".to_string(),
        }
    }
}

/// Persistent store of to-do items
#[async_trait]
pub trait TodoRepository: Send + Sync + std::fmt::Debug {
    /// Look up an item by ID
    async fn get(&self, todo_id: &str) -> TodoResult<Option<TodoItem>>;

    /// All items owned by `user_id`, oldest first
    async fn list_for_user(&self, user_id: &str) -> TodoResult<Vec<TodoItem>>;

    /// Insert or replace an item
    async fn put(&self, item: TodoItem) -> TodoResult<()>;

    /// Replace name, due date and done flag, returning the updated item
    ///
    /// Fails with [`TodoError::NotFound`] if the item does not exist.
    async fn update(&self, todo_id: &str, update: &UpdateTodoRequest) -> TodoResult<TodoItem>;

    /// Remove an item; removing a missing item is not an error
    async fn delete(&self, todo_id: &str) -> TodoResult<()>;

    /// Record the public URL of an item's attachment
    ///
    /// Fails with [`TodoError::NotFound`] if the item does not exist.
    async fn set_attachment_url(&self, todo_id: &str, url: &str) -> TodoResult<()>;
}

/// [`TodoRepository`] held in process memory
#[derive(Debug, Default)]
pub struct InMemoryTodoRepository {
    config: StorageConfig,
    items: DashMap<String, TodoItem>,
}

impl InMemoryTodoRepository {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            items: DashMap::new(),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Number of stored items across all users
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn get(&self, todo_id: &str) -> TodoResult<Option<TodoItem>> {
        debug!(table = %self.config.table_name, todo_id, "Get todo by id");
        Ok(self.items.get(todo_id).map(|entry| entry.value().clone()))
    }

    async fn list_for_user(&self, user_id: &str) -> TodoResult<Vec<TodoItem>> {
        info!(
            table = %self.config.table_name,
            index = %self.config.created_at_index,
            user_id,
            "Getting all todos"
        );
        let mut items: Vec<TodoItem> = self
            .items
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.todo_id.cmp(&b.todo_id))
        });
        Ok(items)
    }

    async fn put(&self, item: TodoItem) -> TodoResult<()> {
        info!(table = %self.config.table_name, todo_id = %item.todo_id, "Create todo");
        self.items.insert(item.todo_id.clone(), item);
        Ok(())
    }

    async fn update(&self, todo_id: &str, update: &UpdateTodoRequest) -> TodoResult<TodoItem> {
        info!(table = %self.config.table_name, todo_id, "Update todo");
        let mut entry = self
            .items
            .get_mut(todo_id)
            .ok_or_else(|| TodoError::not_found(todo_id))?;
        entry.name.clone_from(&update.name);
        entry.due_date.clone_from(&update.due_date);
        entry.done = update.done;
        Ok(entry.value().clone())
    }

    async fn delete(&self, todo_id: &str) -> TodoResult<()> {
        info!(table = %self.config.table_name, todo_id, "Delete todo");
        self.items.remove(todo_id);
        Ok(())
    }

    async fn set_attachment_url(&self, todo_id: &str, url: &str) -> TodoResult<()> {
        info!(table = %self.config.table_name, todo_id, url, "Updating todo attachment url");
        let mut entry = self
            .items
            .get_mut(todo_id)
            .ok_or_else(|| TodoError::not_found(todo_id))?;
        entry.attachment_url = Some(url.to_string());
        Ok(())
    }
}
