//! Ownership-checked to-do operations
//!
//! Every operation acts on behalf of a verified `user_id`. Operations on an
//! existing item first load it and check the owner: an unknown ID is
//! [`TodoError::NotFound`], someone else's item is [`TodoError::Forbidden`].

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::attachments::AttachmentUrlProvider;
use crate::error::{TodoError, TodoResult};
use crate::model::{CreateTodoRequest, TodoItem, UpdateTodoRequest};
use crate::repository::TodoRepository;

/// Upload URL lifetime used unless configured otherwise
pub const DEFAULT_UPLOAD_EXPIRATION_SECS: u64 = 300;

/// To-do business operations
#[derive(Debug, Clone)]
pub struct TodoService {
    repository: Arc<dyn TodoRepository>,
    attachments: Arc<dyn AttachmentUrlProvider>,
    upload_expiration_secs: u64,
}

impl TodoService {
    pub fn new(
        repository: Arc<dyn TodoRepository>,
        attachments: Arc<dyn AttachmentUrlProvider>,
    ) -> Self {
        Self {
            repository,
            attachments,
            upload_expiration_secs: DEFAULT_UPLOAD_EXPIRATION_SECS,
        }
    }

    /// Lifetime of the upload URLs handed out by
    /// [`create_attachment_upload`](Self::create_attachment_upload)
    pub fn with_upload_expiration(mut self, expiry_seconds: u64) -> Self {
        self.upload_expiration_secs = expiry_seconds;
        self
    }

    pub fn upload_expiration_secs(&self) -> u64 {
        self.upload_expiration_secs
    }

    /// Create a new, not-done item owned by `user_id`
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Validation`] for a blank name, or the storage error.
    pub async fn create_todo(
        &self,
        user_id: &str,
        request: CreateTodoRequest,
    ) -> TodoResult<TodoItem> {
        request.validate()?;

        let item = TodoItem {
            user_id: user_id.to_string(),
            todo_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            name: request.name,
            due_date: request.due_date,
            done: false,
            attachment_url: None,
        };
        info!(user_id, todo_id = %item.todo_id, "Creating todo");

        self.repository.put(item.clone()).await?;
        Ok(item)
    }

    /// The caller's items, oldest first
    ///
    /// # Errors
    ///
    /// Returns the storage error.
    pub async fn list_todos(&self, user_id: &str) -> TodoResult<Vec<TodoItem>> {
        info!(user_id, "Get todos by userId");
        self.repository.list_for_user(user_id).await
    }

    /// Replace name, due date and done flag of one of the caller's items
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::NotFound`], [`TodoError::Forbidden`],
    /// [`TodoError::Validation`], or the storage error.
    pub async fn update_todo(
        &self,
        user_id: &str,
        todo_id: &str,
        request: UpdateTodoRequest,
    ) -> TodoResult<TodoItem> {
        info!(user_id, todo_id, "Updating todo");
        request.validate()?;
        self.owned_item(user_id, todo_id).await?;
        self.repository.update(todo_id, &request).await
    }

    /// Delete one of the caller's items
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::NotFound`], [`TodoError::Forbidden`], or the storage error.
    pub async fn delete_todo(&self, user_id: &str, todo_id: &str) -> TodoResult<()> {
        info!(user_id, todo_id, "Deleting todo");
        self.owned_item(user_id, todo_id).await?;
        self.repository.delete(todo_id).await
    }

    /// Start an attachment upload for one of the caller's items
    ///
    /// Records the attachment's public URL on the item and returns the
    /// presigned upload URL. A later call replaces the recorded URL.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::NotFound`], [`TodoError::Forbidden`],
    /// [`TodoError::Signing`], or the storage error.
    pub async fn create_attachment_upload(
        &self,
        user_id: &str,
        todo_id: &str,
    ) -> TodoResult<String> {
        self.owned_item(user_id, todo_id).await?;

        let attachment_id = Uuid::new_v4().to_string();
        info!(user_id, todo_id, attachment_id = %attachment_id, "Uploading attachment");

        let upload_url = self
            .attachments
            .signed_upload_url(&attachment_id, self.upload_expiration_secs)?;
        let public_url = self.attachments.public_url(&attachment_id);
        self.repository
            .set_attachment_url(todo_id, &public_url)
            .await?;
        Ok(upload_url)
    }

    async fn owned_item(&self, user_id: &str, todo_id: &str) -> TodoResult<TodoItem> {
        let item = self
            .repository
            .get(todo_id)
            .await?
            .ok_or_else(|| TodoError::not_found(todo_id))?;
        if item.user_id != user_id {
            warn!(user_id, todo_id, owner = %item.user_id, "User does not own todo");
            return Err(TodoError::forbidden(todo_id));
        }
        Ok(item)
    }
}
