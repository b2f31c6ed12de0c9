//! # Tasklist Auth - Bearer Token Authorizer
//!
//! Verifies the `Authorization: Bearer <JWT>` header of every tasklist API
//! request and turns the result into a gateway policy decision.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐   Allow { sub } / Deny
//! │     Authorizer       │ ─────────────────────────▶ gateway
//! └──────────┬───────────┘
//!            │ verify(header)
//! ┌──────────▼───────────┐
//! │    TokenVerifier     │  bearer parsing, RS256 only, exp/nbf
//! └──────────┬───────────┘
//!            │ certificate()
//! ┌──────────▼───────────┐
//! │   CertificateCache   │  one JWKS fetch per cache lifetime
//! └──────────────────────┘
//! ```
//!
//! - [`certificate`] - JWKS discovery and the process-lifetime certificate cache
//! - [`verifier`] - header parsing and RS256 signature verification
//! - [`authorizer`] - Allow/Deny decisions and the gateway policy document
//! - [`config`] - serde configuration that builds the stack above
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tasklist_auth::{AuthConfig, AuthorizerEvent};
//!
//! # tokio_test::block_on(async {
//! let authorizer = AuthConfig {
//!     jwks_url: "https://tenant.auth0.com/.well-known/jwks.json".into(),
//!     ..AuthConfig::default()
//! }
//! .build()?;
//!
//! let response = authorizer
//!     .authorize(&AuthorizerEvent::with_token("Bearer eyJhbGciOiJSUzI1NiJ9..."))
//!     .await;
//! println!("{} allowed: {}", response.principal_id, response.is_allowed());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```

pub mod authorizer;
pub mod certificate;
pub mod config;
pub mod error;
pub mod verifier;

pub use authorizer::{
    AccessDecision, Authorizer, AuthorizerEvent, AuthorizerResponse, DENY_PRINCIPAL, Effect,
    PolicyDocument, Statement,
};
pub use certificate::{CertificateCache, JsonWebKey, JsonWebKeySet, pem_from_x5c};
pub use config::AuthConfig;
pub use error::{AuthError, AuthErrorKind, AuthResult};
pub use verifier::{Claims, TokenVerifier, bearer_token};
