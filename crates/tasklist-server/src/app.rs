//! Router assembly

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use tasklist_auth::Authorizer;
use tasklist_core::{AwsCredentials, InMemoryTodoRepository, S3AttachmentUrls, TodoService};

use crate::config::ServerConfig;
use crate::error::StartupError;
use crate::handlers;
use crate::middleware::require_principal;

/// Shared per-process state
#[derive(Debug, Clone)]
pub struct AppState {
    pub authorizer: Arc<Authorizer>,
    pub todos: TodoService,
}

impl AppState {
    pub fn new(authorizer: Authorizer, todos: TodoService) -> Self {
        Self {
            authorizer: Arc::new(authorizer),
            todos,
        }
    }

    /// Wire the authorizer, store and attachment signer from configuration
    ///
    /// The certificate cache starts cold; the first authenticated request
    /// fetches the signing certificate.
    ///
    /// # Errors
    ///
    /// Returns error if the JWKS HTTP client cannot be built or the
    /// attachment settings are invalid.
    pub fn from_config(
        config: &ServerConfig,
        credentials: AwsCredentials,
    ) -> Result<Self, StartupError> {
        let authorizer = config.auth.build()?;
        let attachments = S3AttachmentUrls::new(config.attachments.clone(), credentials)?;
        let repository = InMemoryTodoRepository::new(config.storage.clone());

        info!(
            jwks_url = %config.auth.jwks_url,
            table = %config.storage.table_name,
            bucket = %config.attachments.bucket_name,
            "Application state ready"
        );

        let todos = TodoService::new(Arc::new(repository), Arc::new(attachments))
            .with_upload_expiration(config.attachments.url_expiration_secs);
        Ok(Self::new(authorizer, todos))
    }
}

/// Build the HTTP router
///
/// `/health` and `/authorize` are public; every `/todos` route requires an
/// allowed bearer token.
pub fn router(state: AppState) -> Router {
    let todos = Router::new()
        .route(
            "/todos",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/todos/{todo_id}",
            patch(handlers::update_todo).delete(handlers::delete_todo),
        )
        .route(
            "/todos/{todo_id}/attachment",
            post(handlers::create_attachment_upload),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_principal,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/authorize", post(handlers::authorize))
        .merge(todos)
        .layer(TraceLayer::new_for_http())
        // Mirrors the request origin so credentialed requests are allowed
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}
