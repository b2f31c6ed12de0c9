//! Route handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use tasklist_auth::{AuthorizerEvent, AuthorizerResponse};
use tasklist_core::{CreateTodoRequest, TodoItem, UpdateTodoRequest};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::Principal;

/// `{"items": [...]}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemsResponse {
    pub items: Vec<TodoItem>,
}

/// `{"item": {...}}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemResponse {
    pub item: TodoItem,
}

/// `{"uploadUrl": "..."}`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub upload_url: String,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Gateway token-authorizer contract
pub async fn authorize(
    State(state): State<AppState>,
    Json(event): Json<AuthorizerEvent>,
) -> Json<AuthorizerResponse> {
    Json(state.authorizer.authorize(&event).await)
}

pub async fn list_todos(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ItemsResponse>, ApiError> {
    let items = state.todos.list_todos(&principal.user_id).await?;
    Ok(Json(ItemsResponse { items }))
}

pub async fn create_todo(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateTodoRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    let item = state.todos.create_todo(&principal.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(ItemResponse { item })))
}

pub async fn update_todo(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(todo_id): Path<String>,
    Json(request): Json<UpdateTodoRequest>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = state
        .todos
        .update_todo(&principal.user_id, &todo_id, request)
        .await?;
    Ok(Json(ItemResponse { item }))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(todo_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.todos.delete_todo(&principal.user_id, &todo_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_attachment_upload(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(todo_id): Path<String>,
) -> Result<Json<UploadUrlResponse>, ApiError> {
    let upload_url = state
        .todos
        .create_attachment_upload(&principal.user_id, &todo_id)
        .await?;
    Ok(Json(UploadUrlResponse { upload_url }))
}
