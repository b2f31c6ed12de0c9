//! Certificate cache lifetime tests
//!
//! The endpoint is hit at most once per cache, however many verifications
//! follow and whatever the endpoint serves afterwards.

mod common;

use common::{MockJwksServer, SIGNING_CERT_PEM, SIGNING_CERT_X5C, provider_token, signing_jwk};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tasklist_auth::{AuthError, CertificateCache, TokenVerifier, pem_from_x5c};
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{method, path},
};

fn cache_for(server: &MockJwksServer) -> Arc<CertificateCache> {
    Arc::new(
        CertificateCache::new(server.jwks_url.clone(), Duration::from_secs(5))
            .expect("HTTP client"),
    )
}

#[test]
fn test_x5c_conversion_matches_openssl_pem() {
    assert_eq!(pem_from_x5c(SIGNING_CERT_X5C), SIGNING_CERT_PEM);
}

#[tokio::test]
async fn test_fetch_happens_once_across_many_verifications() {
    let server = MockJwksServer::start().await;
    server.mock_signing_key(1).await;
    let verifier = TokenVerifier::new(cache_for(&server));

    for i in 0..10 {
        let header = format!("Bearer {}", provider_token(&format!("auth0|user-{i}")));
        let claims = verifier.verify(Some(&header)).await.unwrap();
        assert_eq!(claims.sub, format!("auth0|user-{i}"));
    }
    // MockServer verifies `.expect(1)` on drop
}

#[tokio::test]
async fn test_cached_certificate_survives_endpoint_changes() {
    let server = MockJwksServer::start().await;
    server.mock_signing_key(1).await;
    let cache = cache_for(&server);

    let first = cache.certificate().await.unwrap();
    assert_eq!(&*first, SIGNING_CERT_PEM);

    // Provider now publishes nothing usable; the cache must not notice
    server.server.reset().await;
    Mock::given(method("GET"))
        .and(path(common::JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": [] })))
        .expect(0)
        .mount(&server.server)
        .await;

    let second = cache.certificate().await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_first_signing_key_wins() {
    let server = MockJwksServer::start().await;
    let mut decoy = signing_jwk();
    decoy["kid"] = json!("decoy");
    decoy["x5c"] = json!(["QUFBQQ=="]);
    server
        .mock_keys(
            json!([
                {"use": "enc", "kty": "RSA", "alg": "RSA-OAEP", "x5c": ["ZW5j"]},
                signing_jwk(),
                decoy
            ]),
            1,
        )
        .await;

    let pem = cache_for(&server).certificate().await.unwrap();
    assert_eq!(&*pem, SIGNING_CERT_PEM);
}

#[tokio::test]
async fn test_failed_fetch_is_retried() {
    let server = MockJwksServer::start().await;
    Mock::given(method("GET"))
        .and(path(common::JWKS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server.server)
        .await;
    server.mock_signing_key(1).await;
    let cache = cache_for(&server);

    let first = cache.certificate().await;
    assert!(matches!(first, Err(AuthError::JwksFetch { .. })));
    assert!(!cache.is_populated());

    let second = cache.certificate().await.unwrap();
    assert_eq!(&*second, SIGNING_CERT_PEM);
    assert!(cache.is_populated());
}

#[tokio::test]
async fn test_invalid_json_is_fetch_error() {
    let server = MockJwksServer::start().await;
    Mock::given(method("GET"))
        .and(path(common::JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server.server)
        .await;

    let result = cache_for(&server).certificate().await;
    assert!(matches!(result, Err(AuthError::JwksFetch { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_calls_share_one_fetch() {
    let server = MockJwksServer::start().await;
    Mock::given(method("GET"))
        .and(path(common::JWKS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "keys": [signing_jwk()] }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server.server)
        .await;
    let cache = cache_for(&server);

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.certificate().await })
        })
        .collect();

    for task in tasks {
        let pem = task.await.unwrap().unwrap();
        assert_eq!(&*pem, SIGNING_CERT_PEM);
    }
}

#[tokio::test]
async fn test_null_key_list_is_discovery_error() {
    let server = MockJwksServer::start().await;
    Mock::given(method("GET"))
        .and(path(common::JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": null })))
        .expect(1)
        .mount(&server.server)
        .await;

    let result = cache_for(&server).certificate().await;
    assert!(matches!(result, Err(AuthError::Discovery { .. })));
}

#[tokio::test]
async fn test_null_certificate_chain_is_skipped() {
    let server = MockJwksServer::start().await;
    server
        .mock_keys(
            json!([
                {"use": "sig", "kty": "RSA", "alg": "RS256", "x5c": null},
                {"use": null, "kty": "RSA", "alg": 256, "x5c": ["QUFBQQ=="]},
                signing_jwk()
            ]),
            1,
        )
        .await;

    let pem = cache_for(&server).certificate().await.unwrap();
    assert_eq!(&*pem, SIGNING_CERT_PEM);
}
