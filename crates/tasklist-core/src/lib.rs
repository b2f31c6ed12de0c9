//! # Tasklist Core
//!
//! The to-do domain behind the tasklist API. Callers are identified by the
//! `sub` claim the authorizer verified; every operation on an existing item
//! checks that the caller owns it.
//!
//! - [`model`] - items and request bodies (camelCase JSON)
//! - [`repository`] - the [`TodoRepository`] seam and an in-memory store
//! - [`attachments`] - public and presigned upload URLs for attachments
//! - [`service`] - [`TodoService`], the operations the HTTP layer calls
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tasklist_core::{
//!     AttachmentConfig, AwsCredentials, CreateTodoRequest, InMemoryTodoRepository,
//!     S3AttachmentUrls, TodoService,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let attachments = S3AttachmentUrls::new(
//!     AttachmentConfig { bucket_name: "tasklist-attachments".into(), ..Default::default() },
//!     AwsCredentials::from_env()?,
//! )?;
//! let service = TodoService::new(
//!     Arc::new(InMemoryTodoRepository::default()),
//!     Arc::new(attachments),
//! )
//! .with_upload_expiration(300);
//!
//! let item = service
//!     .create_todo("auth0|alice", CreateTodoRequest { name: "Buy milk".into(), due_date: "2024-06-01".into() })
//!     .await?;
//! let upload_url = service.create_attachment_upload("auth0|alice", &item.todo_id).await?;
//! # Ok(())
//! # }
//! ```

pub mod attachments;
pub mod error;
pub mod model;
pub mod repository;
pub mod service;

pub use attachments::{AttachmentConfig, AttachmentUrlProvider, AwsCredentials, S3AttachmentUrls};
pub use error::{TodoError, TodoResult};
pub use model::{CreateTodoRequest, TodoItem, UpdateTodoRequest};
pub use repository::{InMemoryTodoRepository, StorageConfig, TodoRepository};
pub use service::{DEFAULT_UPLOAD_EXPIRATION_SECS, TodoService};
