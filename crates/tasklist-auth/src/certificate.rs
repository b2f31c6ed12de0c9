//! Signing certificate discovery and caching
//!
//! The authorizer verifies every token against a single X.509 certificate
//! taken from the identity provider's JWKS document. The certificate is
//! fetched once and then held for the lifetime of the [`CertificateCache`]:
//!
//! - **No TTL**: the first successful fetch wins until the cache is dropped
//! - **Single flight**: concurrent first callers share one network request
//! - **Failures are not cached**: the next caller retries the fetch
//!
//! Construct one cache per process and share it by `Arc`; tests construct a
//! fresh cache each so no state leaks between them.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::error::{AuthError, AuthResult};

const PEM_LINE_WIDTH: usize = 64;
const PEM_HEADER: &str = "-----BEGIN CERTIFICATE-----";
const PEM_FOOTER: &str = "-----END CERTIFICATE-----";

/// JSON Web Key Set as served by the discovery endpoint
///
/// Only the fields the signing-key filter needs are modelled; anything else
/// in the document is ignored. Parsing is lenient: `null`, missing or
/// wrongly-typed fields read as absent, so a malformed entry is filtered out
/// rather than failing the whole document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonWebKeySet {
    /// Keys in the order the provider lists them
    #[serde(default, deserialize_with = "lenient_keys")]
    pub keys: Vec<JsonWebKey>,
}

/// One entry of a [`JsonWebKeySet`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonWebKey {
    /// Intended usage (`sig` or `enc`)
    #[serde(rename = "use", default, deserialize_with = "lenient_string")]
    pub key_use: Option<String>,
    /// Key type (`RSA`, `EC`, ...)
    #[serde(default, deserialize_with = "lenient_string")]
    pub kty: Option<String>,
    /// Algorithm the key is meant for
    #[serde(default, deserialize_with = "lenient_string")]
    pub alg: Option<String>,
    /// Key ID
    #[serde(default, deserialize_with = "lenient_string")]
    pub kid: Option<String>,
    /// X.509 certificate chain, base64 DER, leaf first
    #[serde(default, deserialize_with = "lenient_strings")]
    pub x5c: Vec<String>,
}

fn lenient_keys<'de, D>(deserializer: D) -> Result<Vec<JsonWebKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let keys = match Value::deserialize(deserializer)? {
        Value::Array(keys) => keys
            .into_iter()
            .map(|key| serde_json::from_value(key).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    };
    Ok(keys)
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(value) => Some(value),
        _ => None,
    })
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match Value::deserialize(deserializer)? {
        Value::Array(values) => values
            .into_iter()
            .filter_map(|value| match value {
                Value::String(value) => Some(value),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(values)
}

impl JsonWebKey {
    /// Whether this key can verify RS256 token signatures via its certificate
    pub fn is_rs256_signing_key(&self) -> bool {
        self.key_use.as_deref() == Some("sig")
            && self.kty.as_deref() == Some("RSA")
            && self.alg.as_deref() == Some("RS256")
            && !self.x5c.is_empty()
    }
}

impl JsonWebKeySet {
    /// First key that passes [`JsonWebKey::is_rs256_signing_key`]
    pub fn first_signing_key(&self) -> Option<&JsonWebKey> {
        self.keys.iter().find(|key| key.is_rs256_signing_key())
    }
}

/// Wrap a base64 DER certificate (one `x5c` entry) in PEM armour
///
/// The body is broken into 64-character lines, matching what `openssl x509`
/// emits, and the document ends with a newline.
pub fn pem_from_x5c(der_base64: &str) -> String {
    let body = der_base64.trim();
    let mut pem = String::with_capacity(body.len() + body.len() / PEM_LINE_WIDTH + 64);
    pem.push_str(PEM_HEADER);
    pem.push('\n');
    // base64 is ASCII, so byte chunks never split a character
    for line in body.as_bytes().chunks(PEM_LINE_WIDTH) {
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str(PEM_FOOTER);
    pem.push('\n');
    pem
}

/// Process-lifetime cache for the provider's signing certificate
///
/// # Example
///
/// ```rust,no_run
/// # use tasklist_auth::CertificateCache;
/// # use std::time::Duration;
/// # tokio_test::block_on(async {
/// let cache = CertificateCache::new(
///     "https://tenant.auth0.com/.well-known/jwks.json",
///     Duration::from_secs(10),
/// )?;
///
/// // First call fetches, every later call is served from memory
/// let pem = cache.certificate().await?;
/// assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # });
/// ```
#[derive(Debug)]
pub struct CertificateCache {
    /// JWKS discovery endpoint
    jwks_url: String,
    /// HTTP client used for the one fetch; absent for pre-seeded caches
    http_client: Option<reqwest::Client>,
    /// PEM certificate, set once
    certificate: OnceCell<Arc<str>>,
}

impl CertificateCache {
    /// Create a cache for `jwks_url` with a dedicated HTTP client
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::HttpClient`] if the TLS backend cannot be initialised.
    pub fn new(jwks_url: impl Into<String>, timeout: Duration) -> AuthResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AuthError::HttpClient)?;
        Ok(Self::with_client(jwks_url, http_client))
    }

    /// Create a cache that fetches through an existing HTTP client
    pub fn with_client(jwks_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            http_client: Some(http_client),
            certificate: OnceCell::new(),
        }
    }

    /// Create a cache that is already warm and never touches the network
    pub fn from_pem(pem: impl Into<String>) -> Self {
        let pem: Arc<str> = Arc::from(pem.into());
        Self {
            jwks_url: String::new(),
            http_client: None,
            certificate: OnceCell::new_with(Some(pem)),
        }
    }

    /// The discovery endpoint this cache reads from
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Whether a certificate has already been cached
    pub fn is_populated(&self) -> bool {
        self.certificate.initialized()
    }

    /// Return the signing certificate, fetching it on first use
    ///
    /// # Errors
    ///
    /// Returns error if the cache is cold and:
    /// - the endpoint is unreachable, answers non-2xx, or the body is not JSON
    ///   ([`AuthError::JwksFetch`])
    /// - the key set is empty ([`AuthError::Discovery`])
    /// - no key is an RS256 signing key with a certificate ([`AuthError::NoSigningKey`])
    pub async fn certificate(&self) -> AuthResult<Arc<str>> {
        if let Some(cached) = self.certificate.get() {
            debug!(jwks_url = %self.jwks_url, "Using cached signing certificate");
            return Ok(Arc::clone(cached));
        }

        let pem = self
            .certificate
            .get_or_try_init(|| self.fetch_certificate())
            .await?;
        Ok(Arc::clone(pem))
    }

    async fn fetch_certificate(&self) -> AuthResult<Arc<str>> {
        info!(jwks_url = %self.jwks_url, "Getting certificate from JWKS endpoint");

        let jwks = self.fetch_key_set().await?;

        if jwks.keys.is_empty() {
            error!(jwks_url = %self.jwks_url, "JWKS response contained no keys");
            return Err(AuthError::Discovery {
                jwks_url: self.jwks_url.clone(),
            });
        }

        let signing_key = jwks.first_signing_key().ok_or_else(|| {
            error!(
                jwks_url = %self.jwks_url,
                key_count = jwks.keys.len(),
                "No RS256 signing key with an x5c certificate"
            );
            AuthError::NoSigningKey {
                jwks_url: self.jwks_url.clone(),
            }
        })?;

        // Filter guarantees a non-empty chain
        let leaf = signing_key.x5c.first().ok_or_else(|| AuthError::NoSigningKey {
            jwks_url: self.jwks_url.clone(),
        })?;
        let pem = pem_from_x5c(leaf);

        info!(
            jwks_url = %self.jwks_url,
            kid = ?signing_key.kid,
            "Valid certificate found"
        );
        Ok(Arc::from(pem))
    }

    async fn fetch_key_set(&self) -> AuthResult<JsonWebKeySet> {
        let http_client = self
            .http_client
            .as_ref()
            .ok_or_else(|| AuthError::jwks_fetch(&self.jwks_url, "no HTTP client configured"))?;

        let response = http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                error!(jwks_url = %self.jwks_url, error = %e, "Failed to fetch JWKS");
                AuthError::jwks_fetch(&self.jwks_url, e.to_string())
            })?;

        if !response.status().is_success() {
            error!(
                jwks_url = %self.jwks_url,
                status = %response.status(),
                "JWKS endpoint returned error status"
            );
            return Err(AuthError::jwks_fetch(
                &self.jwks_url,
                format!("endpoint returned status {}", response.status()),
            ));
        }

        response.json::<JsonWebKeySet>().await.map_err(|e| {
            error!(jwks_url = %self.jwks_url, error = %e, "Failed to parse JWKS JSON");
            AuthError::jwks_fetch(&self.jwks_url, format!("invalid JWKS format: {e}"))
        })
    }
}
