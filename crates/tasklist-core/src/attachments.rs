//! Attachment URLs
//!
//! Each upload gets a fresh attachment ID. The client receives a short-lived
//! presigned `PUT` URL for it while the item records the permanent public
//! URL. Both are computed locally: presigning is AWS Signature Version 4 in
//! query-string form, so no call to the storage service is made.

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use ring::{digest, hmac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TodoError, TodoResult};

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";
/// SigV4 presigned URLs may live at most seven days
const MAX_EXPIRATION_SECS: u64 = 7 * 24 * 60 * 60;

/// RFC 3986 unreserved characters pass through, everything else is escaped
const QUERY_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Object keys keep their `/` separators
const PATH_ENCODE: &AsciiSet = &QUERY_ENCODE.remove(b'/');

/// Produces the two URLs for an attachment
pub trait AttachmentUrlProvider: Send + Sync + std::fmt::Debug {
    /// Permanent URL the attachment will be readable at
    fn public_url(&self, attachment_id: &str) -> String;

    /// URL the client uploads the attachment to, valid for `expiry_seconds`
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Signing`] if no URL can be produced.
    fn signed_upload_url(&self, attachment_id: &str, expiry_seconds: u64) -> TodoResult<String>;
}

/// Bucket settings for attachment uploads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentConfig {
    pub bucket_name: String,
    pub region: String,
    /// Lifetime of presigned upload URLs, passed to
    /// [`AttachmentUrlProvider::signed_upload_url`] by the service
    pub url_expiration_secs: u64,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            bucket_name: String::new(),
            region: "us-east-1".to_string(),
            url_expiration_secs: 300,
        }
    }
}

impl AttachmentConfig {
    /// Virtual-hosted bucket endpoint
    pub fn host(&self) -> String {
        if self.region == "us-east-1" {
            format!("{}.s3.amazonaws.com", self.bucket_name)
        } else {
            format!("{}.s3.{}.amazonaws.com", self.bucket_name, self.region)
        }
    }
}

/// Signing credentials
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: Option<SecretString>,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &self.session_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AwsCredentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: SecretString::from(secret_access_key.into()),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(SecretString::from(token.into()));
        self
    }

    /// Read `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and `AWS_SESSION_TOKEN`
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Signing`] if the key ID or secret is unset.
    pub fn from_env() -> TodoResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Signing`] if the key ID or secret is missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> TodoResult<Self> {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| TodoError::Signing(format!("{name} is not set")))
        };
        let credentials = Self::new(
            required("AWS_ACCESS_KEY_ID")?,
            required("AWS_SECRET_ACCESS_KEY")?,
        );
        Ok(match lookup("AWS_SESSION_TOKEN").filter(|token| !token.is_empty()) {
            Some(token) => credentials.with_session_token(token),
            None => credentials,
        })
    }
}

/// S3 attachment URLs with SigV4 presigned uploads
#[derive(Debug, Clone)]
pub struct S3AttachmentUrls {
    config: AttachmentConfig,
    credentials: AwsCredentials,
}

impl S3AttachmentUrls {
    /// # Errors
    ///
    /// Returns [`TodoError::Signing`] if the bucket is unnamed or the
    /// configured expiration is outside 1 second to 7 days.
    pub fn new(config: AttachmentConfig, credentials: AwsCredentials) -> TodoResult<Self> {
        if config.bucket_name.is_empty() {
            return Err(TodoError::Signing("attachment bucket is not configured".into()));
        }
        check_expiry(config.url_expiration_secs)?;
        Ok(Self {
            config,
            credentials,
        })
    }

    pub fn config(&self) -> &AttachmentConfig {
        &self.config
    }

    /// Presign `method` on `key`, valid for `expires` seconds from `now`
    fn presign(&self, method: &str, key: &str, expires: u64, now: DateTime<Utc>) -> String {
        let host = self.config.host();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let scope = format!("{date}/{}/{SERVICE}/aws4_request", self.config.region);
        let path = format!("/{}", utf8_percent_encode(key, PATH_ENCODE));

        // Already in canonical (sorted) order
        let mut params = vec![
            ("X-Amz-Algorithm", ALGORITHM.to_string()),
            (
                "X-Amz-Credential",
                format!("{}/{scope}", self.credentials.access_key_id),
            ),
            ("X-Amz-Date", amz_date.clone()),
            ("X-Amz-Expires", expires.to_string()),
        ];
        if let Some(token) = &self.credentials.session_token {
            params.push(("X-Amz-Security-Token", token.expose_secret().to_string()));
        }
        params.push(("X-Amz-SignedHeaders", "host".to_string()));

        let query = params
            .iter()
            .map(|(name, value)| format!("{name}={}", utf8_percent_encode(value, QUERY_ENCODE)))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_request =
            format!("{method}\n{path}\n{query}\nhost:{host}\n\nhost\n{UNSIGNED_PAYLOAD}");
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            hex::encode(digest::digest(&digest::SHA256, canonical_request.as_bytes()))
        );
        let signature = hex::encode(
            hmac::sign(&self.signing_key(&date), string_to_sign.as_bytes()).as_ref(),
        );

        format!("https://{host}{path}?{query}&X-Amz-Signature={signature}")
    }

    fn signing_key(&self, date: &str) -> hmac::Key {
        let secret = format!("AWS4{}", self.credentials.secret_access_key.expose_secret());
        let mut key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        for part in [date, self.config.region.as_str(), SERVICE, "aws4_request"] {
            let tag = hmac::sign(&key, part.as_bytes());
            key = hmac::Key::new(hmac::HMAC_SHA256, tag.as_ref());
        }
        key
    }
}

fn check_expiry(expiry_seconds: u64) -> TodoResult<()> {
    if !(1..=MAX_EXPIRATION_SECS).contains(&expiry_seconds) {
        return Err(TodoError::Signing(format!(
            "url expiration must be between 1 and {MAX_EXPIRATION_SECS} seconds, got {expiry_seconds}"
        )));
    }
    Ok(())
}

impl AttachmentUrlProvider for S3AttachmentUrls {
    fn public_url(&self, attachment_id: &str) -> String {
        format!(
            "https://{}/{}",
            self.config.host(),
            utf8_percent_encode(attachment_id, PATH_ENCODE)
        )
    }

    fn signed_upload_url(&self, attachment_id: &str, expiry_seconds: u64) -> TodoResult<String> {
        check_expiry(expiry_seconds)?;
        debug!(
            bucket = %self.config.bucket_name,
            attachment_id,
            expires_in = expiry_seconds,
            "Generating signed url"
        );
        Ok(self.presign("PUT", attachment_id, expiry_seconds, Utc::now()))
    }
}
