//! Bearer token verification
//!
//! Verification runs in a fixed order and stops at the first failure:
//!
//! 1. The header must be present and non-empty
//! 2. It must start with `bearer ` (any case) followed by a token
//! 3. The signing certificate is taken from the [`CertificateCache`]
//! 4. The token must carry a valid RS256 signature and valid `exp`/`nbf`
//!
//! RS256 is the only accepted algorithm. It is not read from the token
//! header, so a token signed with HS256 using the public certificate as the
//! secret is rejected like any other bad signature.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::certificate::CertificateCache;
use crate::error::{AuthError, AuthResult};

const BEARER_SCHEME: &str = "bearer ";

/// Claims decoded from a verified token
///
/// Only `sub` is interpreted by the rest of the system; everything else is
/// carried through for logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub) - the caller's user ID
    pub sub: String,

    /// Issuer (iss)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience (aud) - a string or an array of strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<serde_json::Value>,

    /// Expiration Time (exp) - Unix timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,

    /// Not Before (nbf) - Unix timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,

    /// Issued At (iat) - Unix timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,

    /// Provider-specific claims
    #[serde(flatten)]
    pub additional: HashMap<String, serde_json::Value>,
}

/// Extract the token from an `Authorization` header value
///
/// # Errors
///
/// - [`AuthError::MissingHeader`] if the header is absent or empty
/// - [`AuthError::MalformedHeader`] if it is not `Bearer <token>`
pub fn bearer_token(auth_header: Option<&str>) -> AuthResult<&str> {
    let header = match auth_header {
        Some(value) if !value.is_empty() => value,
        _ => return Err(AuthError::MissingHeader),
    };

    let has_scheme = header
        .get(..BEARER_SCHEME.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(BEARER_SCHEME));
    if !has_scheme {
        return Err(AuthError::MalformedHeader);
    }

    header
        .split_whitespace()
        .nth(1)
        .ok_or(AuthError::MalformedHeader)
}

/// RS256 token verifier backed by a shared [`CertificateCache`]
///
/// # Example
///
/// ```rust,no_run
/// # use tasklist_auth::{CertificateCache, TokenVerifier};
/// # use std::sync::Arc;
/// # use std::time::Duration;
/// # tokio_test::block_on(async {
/// let cache = Arc::new(CertificateCache::new(
///     "https://tenant.auth0.com/.well-known/jwks.json",
///     Duration::from_secs(10),
/// )?);
/// let verifier = TokenVerifier::new(cache);
///
/// let claims = verifier.verify(Some("Bearer eyJhbGciOiJSUzI1NiJ9...")).await?;
/// println!("caller: {}", claims.sub);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    certificates: Arc<CertificateCache>,
    /// Clock skew tolerance for `exp`/`nbf` (default: none)
    leeway: Duration,
    /// Required `aud`, if any
    audience: Option<String>,
    /// Required `iss`, if any
    issuer: Option<String>,
}

impl TokenVerifier {
    /// Create a verifier with no leeway and no audience or issuer checks
    pub fn new(certificates: Arc<CertificateCache>) -> Self {
        Self {
            certificates,
            leeway: Duration::ZERO,
            audience: None,
            issuer: None,
        }
    }

    /// Allow `exp`/`nbf` to be off by up to `leeway`
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Require the `aud` claim to contain `audience`
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Require the `iss` claim to equal `issuer`
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// The certificate cache this verifier reads from
    pub fn certificates(&self) -> &Arc<CertificateCache> {
        &self.certificates
    }

    /// Verify an `Authorization` header and return the token's claims
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - the header is missing or not a bearer header
    /// - the signing certificate cannot be obtained (cold cache fetch failed)
    /// - the certificate is not an RSA certificate
    /// - the token is malformed, badly signed, expired, not yet valid, or not RS256
    pub async fn verify(&self, auth_header: Option<&str>) -> AuthResult<Claims> {
        let token = bearer_token(auth_header)?;
        let certificate = self.certificates.certificate().await?;

        let decoding_key =
            DecodingKey::from_rsa_pem(certificate.as_bytes()).map_err(AuthError::InvalidCertificate)?;

        let token_data = decode::<Claims>(token, &decoding_key, &self.validation()).map_err(|e| {
            warn!(error = %e, "JWT verification failed");
            AuthError::SignatureInvalid(e)
        })?;

        debug!(
            subject = %token_data.claims.sub,
            issuer = ?token_data.claims.iss,
            "JWT verification successful"
        );
        Ok(token_data.claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = self.leeway.as_secs();
        validation.validate_nbf = true;
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation
    }
}
