//! End-to-end authorizer tests against a mock JWKS endpoint
//!
//! Each test builds its own [`CertificateCache`], so fetch counts are
//! per-test and no certificate leaks between tests.

mod common;

use common::{
    MockJwksServer, ROGUE_KEY_PEM, SIGNING_CERT_PEM, SIGNING_KEY_PEM, claims_for, now,
    provider_token, rs256_token,
};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tasklist_auth::{
    AccessDecision, AuthError, Authorizer, AuthorizerEvent, CertificateCache, Effect,
    TokenVerifier,
};

fn verifier_for(server: &MockJwksServer) -> TokenVerifier {
    let cache = CertificateCache::new(server.jwks_url.clone(), Duration::from_secs(5))
        .expect("HTTP client");
    TokenVerifier::new(Arc::new(cache))
}

#[tokio::test]
async fn test_valid_token_is_allowed_with_subject_as_principal() {
    let server = MockJwksServer::start().await;
    server.mock_signing_key(1).await;
    let authorizer = Authorizer::new(verifier_for(&server));

    let token = provider_token("auth0|alice");
    let response = authorizer
        .authorize(&AuthorizerEvent::with_token(format!("Bearer {token}")))
        .await;

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({
            "principalId": "auth0|alice",
            "policyDocument": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Action": "execute-api:Invoke",
                    "Effect": "Allow",
                    "Resource": "*"
                }]
            }
        })
    );
}

#[tokio::test]
async fn test_scheme_is_case_insensitive() {
    let server = MockJwksServer::start().await;
    server.mock_signing_key(1).await;
    let verifier = verifier_for(&server);
    let token = provider_token("auth0|bob");

    for scheme in ["Bearer", "bearer", "BEARER", "bEaReR"] {
        let claims = verifier
            .verify(Some(&format!("{scheme} {token}")))
            .await
            .unwrap_or_else(|e| panic!("{scheme} rejected: {e}"));
        assert_eq!(claims.sub, "auth0|bob");
    }
}

#[tokio::test]
async fn test_basic_scheme_is_denied_as_placeholder_user() {
    let server = MockJwksServer::start().await;
    server.mock_signing_key(0).await;
    let authorizer = Authorizer::new(verifier_for(&server));

    let response = authorizer
        .authorize(&AuthorizerEvent::with_token("Basic abc123"))
        .await;

    assert_eq!(response.principal_id, "user");
    assert_eq!(response.policy_document.effect(), Some(Effect::Deny));
    assert_eq!(response.policy_document.statement[0].action, "execute-api:Invoke");
    assert_eq!(response.policy_document.statement[0].resource, "*");
}

#[tokio::test]
async fn test_absent_header_is_missing_header_error() {
    let server = MockJwksServer::start().await;
    server.mock_signing_key(0).await;
    let verifier = verifier_for(&server);

    assert!(matches!(verifier.verify(None).await, Err(AuthError::MissingHeader)));
    assert!(matches!(verifier.verify(Some("")).await, Err(AuthError::MissingHeader)));

    let response = Authorizer::new(verifier)
        .authorize(&AuthorizerEvent::default())
        .await;
    assert!(!response.is_allowed());
    assert_eq!(response.principal_id, "user");
}

#[tokio::test]
async fn test_header_errors_never_fetch_certificate() {
    let server = MockJwksServer::start().await;
    server.mock_signing_key(0).await;
    let verifier = verifier_for(&server);

    for header in ["Basic abc123", "Bearer", "Token x.y.z", "Bearerx.y.z"] {
        assert!(
            matches!(verifier.verify(Some(header)).await, Err(AuthError::MalformedHeader)),
            "{header:?}"
        );
    }
    assert!(!verifier.certificates().is_populated());
}

#[tokio::test]
async fn test_token_signed_by_other_key_is_rejected() {
    let server = MockJwksServer::start().await;
    server.mock_signing_key(1).await;
    let verifier = verifier_for(&server);

    let forged = rs256_token(&claims_for("auth0|mallory", 3600), ROGUE_KEY_PEM);
    let result = verifier.verify(Some(&format!("Bearer {forged}"))).await;

    assert!(matches!(result, Err(AuthError::SignatureInvalid(_))));
}

#[tokio::test]
async fn test_hs256_token_keyed_with_public_certificate_is_rejected() {
    let server = MockJwksServer::start().await;
    server.mock_signing_key(1).await;
    let verifier = verifier_for(&server);

    // Classic algorithm confusion: HMAC keyed with the published certificate
    let key = EncodingKey::from_secret(SIGNING_CERT_PEM.as_bytes());
    let confused = encode(
        &Header::new(Algorithm::HS256),
        &claims_for("auth0|mallory", 3600),
        &key,
    )
    .unwrap();

    let result = verifier.verify(Some(&format!("Bearer {confused}"))).await;
    assert!(matches!(result, Err(AuthError::SignatureInvalid(_))));
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let server = MockJwksServer::start().await;
    server.mock_signing_key(1).await;
    let verifier = verifier_for(&server);

    let expired = rs256_token(&claims_for("auth0|alice", -3600), SIGNING_KEY_PEM);
    let result = verifier.verify(Some(&format!("Bearer {expired}"))).await;

    assert!(matches!(result, Err(AuthError::SignatureInvalid(_))));
}

#[tokio::test]
async fn test_not_yet_valid_token_is_rejected() {
    let server = MockJwksServer::start().await;
    server.mock_signing_key(1).await;
    let verifier = verifier_for(&server);

    let mut claims = claims_for("auth0|alice", 7200);
    claims["nbf"] = json!(now() + 3600);
    let early = rs256_token(&claims, SIGNING_KEY_PEM);

    let result = verifier.verify(Some(&format!("Bearer {early}"))).await;
    assert!(matches!(result, Err(AuthError::SignatureInvalid(_))));
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let server = MockJwksServer::start().await;
    server.mock_signing_key(1).await;
    let verifier = verifier_for(&server);

    let result = verifier.verify(Some("Bearer not-a-jwt")).await;
    assert!(matches!(result, Err(AuthError::SignatureInvalid(_))));
}

#[tokio::test]
async fn test_empty_key_set_is_discovery_error_and_deny() {
    let server = MockJwksServer::start().await;
    server.mock_keys(json!([]), 1).await;
    let verifier = verifier_for(&server);
    let header = format!("Bearer {}", provider_token("auth0|alice"));

    let result = verifier.verify(Some(&header)).await;
    assert!(matches!(result, Err(AuthError::Discovery { .. })));

    let server = MockJwksServer::start().await;
    server.mock_keys(json!([]), 1).await;
    let decision = Authorizer::new(verifier_for(&server)).decide(Some(&header)).await;
    assert!(matches!(decision, AccessDecision::Deny { .. }));
    assert_eq!(decision.principal_id(), "user");
}

#[tokio::test]
async fn test_no_matching_signing_key_is_no_signing_key_error() {
    let server = MockJwksServer::start().await;
    server
        .mock_keys(
            json!([
                {"use": "enc", "kty": "RSA", "alg": "RS256", "x5c": ["MIIB"]},
                {"use": "sig", "kty": "EC", "alg": "ES256", "x5c": ["MIIB"]},
                {"use": "sig", "kty": "RSA", "alg": "RS256", "x5c": []},
                {"use": "sig", "kty": "RSA", "alg": "RS256", "n": "abc", "e": "AQAB"}
            ]),
            1,
        )
        .await;
    let verifier = verifier_for(&server);
    let header = format!("Bearer {}", provider_token("auth0|alice"));

    let result = verifier.verify(Some(&header)).await;
    assert!(matches!(result, Err(AuthError::NoSigningKey { .. })));
    assert!(!verifier.certificates().is_populated());
}

#[tokio::test]
async fn test_pre_seeded_cache_verifies_without_network() {
    let cache = Arc::new(CertificateCache::from_pem(SIGNING_CERT_PEM));
    let authorizer = Authorizer::new(TokenVerifier::new(cache));

    let decision = authorizer
        .decide(Some(&format!("Bearer {}", provider_token("auth0|carol"))))
        .await;

    match decision {
        AccessDecision::Allow { principal_id, claims } => {
            assert_eq!(principal_id, "auth0|carol");
            assert_eq!(claims.iss.as_deref(), Some("https://tasklist-test.auth0.com/"));
        }
        AccessDecision::Deny { reason } => panic!("unexpected deny: {reason}"),
    }
}

#[tokio::test]
async fn test_configured_audience_is_enforced() {
    let cache = Arc::new(CertificateCache::from_pem(SIGNING_CERT_PEM));
    let header = format!("Bearer {}", provider_token("auth0|dave"));

    let matching = TokenVerifier::new(Arc::clone(&cache)).with_audience("https://api.tasklist.dev");
    assert!(matching.verify(Some(&header)).await.is_ok());

    let other = TokenVerifier::new(cache).with_audience("https://other.example.com");
    assert!(matches!(
        other.verify(Some(&header)).await,
        Err(AuthError::SignatureInvalid(_))
    ));
}
