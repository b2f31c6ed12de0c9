//! # Tasklist Server
//!
//! HTTP front end for the tasklist API.
//!
//! ## Routes
//!
//! | Method   | Path                           | Auth   | Response                      |
//! |----------|--------------------------------|--------|-------------------------------|
//! | `GET`    | `/health`                      | none   | `200 {"status": "ok"}`        |
//! | `POST`   | `/authorize`                   | none   | gateway policy document       |
//! | `GET`    | `/todos`                       | bearer | `200 {"items": [...]}`        |
//! | `POST`   | `/todos`                       | bearer | `201 {"item": {...}}`         |
//! | `PATCH`  | `/todos/{todo_id}`             | bearer | `200 {"item": {...}}`         |
//! | `DELETE` | `/todos/{todo_id}`             | bearer | `204`                         |
//! | `POST`   | `/todos/{todo_id}/attachment`  | bearer | `200 {"uploadUrl": "..."}`    |
//!
//! A denied bearer token yields `403 {"message": "Forbidden"}`.

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;

pub use app::{AppState, router};
pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, StartupError};
pub use logging::{LoggingConfig, LoggingError, init_logging};
pub use middleware::Principal;
