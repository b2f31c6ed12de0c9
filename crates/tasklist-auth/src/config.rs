//! Authorizer configuration

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::authorizer::Authorizer;
use crate::certificate::CertificateCache;
use crate::error::AuthResult;
use crate::verifier::TokenVerifier;

/// Settings for building an [`Authorizer`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWKS discovery endpoint, e.g. `https://tenant.auth0.com/.well-known/jwks.json`
    pub jwks_url: String,
    /// Timeout for the certificate fetch
    pub http_timeout_secs: u64,
    /// Clock skew tolerance for `exp`/`nbf`
    pub leeway_secs: u64,
    /// Required `aud` claim, if any
    pub audience: Option<String>,
    /// Required `iss` claim, if any
    pub issuer: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwks_url: String::new(),
            http_timeout_secs: 10,
            leeway_secs: 0,
            audience: None,
            issuer: None,
        }
    }
}

impl AuthConfig {
    /// Build the process-wide certificate cache and an authorizer over it
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client for the JWKS fetch cannot be built.
    pub fn build(&self) -> AuthResult<Authorizer> {
        let cache = CertificateCache::new(
            self.jwks_url.clone(),
            Duration::from_secs(self.http_timeout_secs),
        )?;
        Ok(self.build_with_cache(Arc::new(cache)))
    }

    /// Build an authorizer over an existing cache
    pub fn build_with_cache(&self, cache: Arc<CertificateCache>) -> Authorizer {
        let mut verifier =
            TokenVerifier::new(cache).with_leeway(Duration::from_secs(self.leeway_secs));
        if let Some(audience) = &self.audience {
            verifier = verifier.with_audience(audience.clone());
        }
        if let Some(issuer) = &self.issuer {
            verifier = verifier.with_issuer(issuer.clone());
        }
        Authorizer::new(verifier)
    }
}
