//! Bearer-token gate for the to-do routes

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use tasklist_auth::{AccessDecision, Claims};

use crate::app::AppState;
use crate::error::ApiError;

/// The verified caller, inserted into request extensions on Allow
#[derive(Debug, Clone)]
pub struct Principal {
    /// The token's `sub`
    pub user_id: String,
    pub claims: Arc<Claims>,
}

/// Run the authorizer on the `Authorization` header
///
/// Deny becomes `403 {"message": "Forbidden"}`; Allow attaches a
/// [`Principal`] and continues.
pub async fn require_principal(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request.headers().get(header::AUTHORIZATION) {
        None => None,
        Some(value) => match value.to_str() {
            Ok(value) => Some(value.to_owned()),
            Err(_) => {
                warn!("Authorization header is not valid UTF-8");
                return ApiError::Forbidden.into_response();
            }
        },
    };

    match state.authorizer.decide(auth_header.as_deref()).await {
        AccessDecision::Allow {
            principal_id,
            claims,
        } => {
            request.extensions_mut().insert(Principal {
                user_id: principal_id,
                claims: Arc::from(claims),
            });
            next.run(request).await
        }
        AccessDecision::Deny { .. } => ApiError::Forbidden.into_response(),
    }
}
