//! Authorization error types
//!
//! Every variant is terminal for the request that produced it. The
//! [`Authorizer`](crate::Authorizer) is the only place these are caught; it
//! turns each of them into a Deny decision and logs the [`AuthErrorKind`].

use thiserror::Error;

/// Result type for authorization operations
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Errors produced while verifying a bearer token
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// No `Authorization` header, or an empty one
    #[error("No authentication header")]
    MissingHeader,

    /// Header present but not of the form `Bearer <token>`
    #[error("Invalid authentication header")]
    MalformedHeader,

    /// The discovery document contained no keys
    #[error("No keys found in JWKS response from {jwks_url}")]
    Discovery {
        /// Endpoint that returned the empty key set
        jwks_url: String,
    },

    /// No key matched `use=sig`, `kty=RSA`, `alg=RS256` with a non-empty `x5c`
    #[error("No JWKS signing keys found at {jwks_url}")]
    NoSigningKey {
        /// Endpoint whose keys were all filtered out
        jwks_url: String,
    },

    /// Signature mismatch, malformed token, expired, not yet valid, or wrong algorithm
    #[error("Token verification failed: {0}")]
    SignatureInvalid(#[source] jsonwebtoken::errors::Error),

    /// The cached certificate could not be turned into an RSA verification key
    #[error("Signing certificate is not a usable RSA certificate: {0}")]
    InvalidCertificate(#[source] jsonwebtoken::errors::Error),

    /// The discovery endpoint could not be reached or returned an unusable body
    #[error("JWKS fetch from {jwks_url} failed: {message}")]
    JwksFetch {
        /// Endpoint being fetched
        jwks_url: String,
        /// Transport, status, or decoding failure
        message: String,
    },

    /// The HTTP client for discovery could not be constructed
    #[error("Failed to build JWKS HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Stable names for each error variant, used as a structured log field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    /// See [`AuthError::MissingHeader`]
    MissingHeader,
    /// See [`AuthError::MalformedHeader`]
    MalformedHeader,
    /// See [`AuthError::Discovery`]
    Discovery,
    /// See [`AuthError::NoSigningKey`]
    NoSigningKey,
    /// See [`AuthError::SignatureInvalid`]
    SignatureInvalid,
    /// See [`AuthError::InvalidCertificate`]
    InvalidCertificate,
    /// See [`AuthError::JwksFetch`]
    JwksFetch,
    /// See [`AuthError::HttpClient`]
    HttpClient,
}

impl AuthErrorKind {
    /// Name as it appears in operator logs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingHeader => "MissingHeaderError",
            Self::MalformedHeader => "MalformedHeaderError",
            Self::Discovery => "DiscoveryError",
            Self::NoSigningKey => "NoSigningKeyError",
            Self::SignatureInvalid => "SignatureInvalidError",
            Self::InvalidCertificate => "InvalidCertificateError",
            Self::JwksFetch => "JwksFetchError",
            Self::HttpClient => "HttpClientError",
        }
    }
}

impl std::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AuthError {
    /// The variant of this error, without its payload
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::MissingHeader => AuthErrorKind::MissingHeader,
            Self::MalformedHeader => AuthErrorKind::MalformedHeader,
            Self::Discovery { .. } => AuthErrorKind::Discovery,
            Self::NoSigningKey { .. } => AuthErrorKind::NoSigningKey,
            Self::SignatureInvalid(_) => AuthErrorKind::SignatureInvalid,
            Self::InvalidCertificate(_) => AuthErrorKind::InvalidCertificate,
            Self::JwksFetch { .. } => AuthErrorKind::JwksFetch,
            Self::HttpClient(_) => AuthErrorKind::HttpClient,
        }
    }

    pub(crate) fn jwks_fetch(jwks_url: &str, message: impl Into<String>) -> Self {
        Self::JwksFetch {
            jwks_url: jwks_url.to_string(),
            message: message.into(),
        }
    }
}
