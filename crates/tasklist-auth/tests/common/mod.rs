//! Shared fixtures for authorizer integration tests
//!
//! `fixtures/` holds a 2048-bit RSA key with a self-signed certificate (the
//! "provider" key) and a second unrelated RSA key used to forge tokens.

#![allow(dead_code)]

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub const SIGNING_KEY_PEM: &str = include_str!("../fixtures/signing_key.pem");
pub const SIGNING_CERT_PEM: &str = include_str!("../fixtures/signing_cert.pem");
pub const SIGNING_CERT_X5C: &str = include_str!("../fixtures/signing_cert.x5c");
pub const ROGUE_KEY_PEM: &str = include_str!("../fixtures/rogue_key.pem");

pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Mock identity provider serving a JWKS document
pub struct MockJwksServer {
    pub server: MockServer,
    pub jwks_url: String,
}

impl MockJwksServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let jwks_url = format!("{}{}", server.uri(), JWKS_PATH);
        Self { server, jwks_url }
    }

    /// Serve `keys`, asserting the endpoint is hit exactly `expected_calls` times
    pub async fn mock_keys(&self, keys: serde_json::Value, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    /// Serve the fixture certificate as the only signing key
    pub async fn mock_signing_key(&self, expected_calls: u64) {
        self.mock_keys(json!([signing_jwk()]), expected_calls).await;
    }
}

/// JWKS entry for the fixture certificate
pub fn signing_jwk() -> serde_json::Value {
    json!({
        "alg": "RS256",
        "kty": "RSA",
        "use": "sig",
        "kid": "tasklist-test-key",
        "x5c": [SIGNING_CERT_X5C.trim()]
    })
}

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

/// Standard claims for `sub`, expiring `exp_offset_secs` from now
pub fn claims_for(sub: &str, exp_offset_secs: i64) -> serde_json::Value {
    let now = now();
    json!({
        "sub": sub,
        "iss": "https://tasklist-test.auth0.com/",
        "aud": "https://api.tasklist.dev",
        "iat": now,
        "exp": (now as i64 + exp_offset_secs) as u64,
    })
}

/// Sign `claims` with RS256 using `private_key_pem`
pub fn rs256_token(claims: &serde_json::Value, private_key_pem: &str) -> String {
    let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).expect("Invalid RSA key");
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some("tasklist-test-key".to_string());
    encode(&header, claims, &key).expect("Failed to encode test JWT")
}

/// A valid token from the provider key for `sub`
pub fn provider_token(sub: &str) -> String {
    rs256_token(&claims_for(sub, 3600), SIGNING_KEY_PEM)
}
