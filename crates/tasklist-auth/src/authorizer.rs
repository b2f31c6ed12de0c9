//! Gateway policy decisions
//!
//! The [`Authorizer`] is the boundary between token verification and the
//! gateway. It never returns an error: every failure is logged and turned
//! into a Deny policy, so the gateway always receives a well-formed
//! [`AuthorizerResponse`].

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::AuthError;
use crate::verifier::{Claims, TokenVerifier};

/// IAM policy language version emitted in every policy document
pub const POLICY_VERSION: &str = "2012-10-17";

/// Action granted or denied by every statement
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Principal reported on Deny, in place of the caller's unverified identity
pub const DENY_PRINCIPAL: &str = "user";

/// Event sent by the gateway for a token authorizer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerEvent {
    /// Raw `Authorization` header value
    #[serde(default)]
    pub authorization_token: Option<String>,

    /// Authorizer type, normally `TOKEN`
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    /// ARN of the method being invoked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_arn: Option<String>,
}

impl AuthorizerEvent {
    /// Event carrying only a token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            authorization_token: Some(token.into()),
            ..Self::default()
        }
    }
}

/// Effect of a policy statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Invocation permitted
    Allow,
    /// Invocation refused
    Deny,
}

/// One statement of a [`PolicyDocument`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    /// Always [`INVOKE_ACTION`]
    pub action: String,
    /// Allow or Deny
    pub effect: Effect,
    /// Always `*`: no per-resource restriction
    pub resource: String,
}

/// Policy returned to the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// Always [`POLICY_VERSION`]
    pub version: String,
    /// Exactly one invoke statement
    pub statement: Vec<Statement>,
}

impl PolicyDocument {
    /// Single-statement invoke policy with the given effect on every resource
    pub fn invoke(effect: Effect) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement: vec![Statement {
                action: INVOKE_ACTION.to_string(),
                effect,
                resource: "*".to_string(),
            }],
        }
    }

    /// Effect of the first statement
    pub fn effect(&self) -> Option<Effect> {
        self.statement.first().map(|statement| statement.effect)
    }
}

/// Response document for the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerResponse {
    /// Verified subject on Allow, [`DENY_PRINCIPAL`] on Deny
    pub principal_id: String,
    /// The invoke policy
    pub policy_document: PolicyDocument,
}

impl AuthorizerResponse {
    /// Whether the policy allows invocation
    pub fn is_allowed(&self) -> bool {
        self.policy_document.effect() == Some(Effect::Allow)
    }
}

/// Outcome of authorizing one request
#[derive(Debug, Clone)]
pub enum AccessDecision {
    /// Token verified
    Allow {
        /// The token's `sub`
        principal_id: String,
        /// All decoded claims
        claims: Box<Claims>,
    },
    /// Token rejected; the reason is for operator logs only
    Deny {
        /// What went wrong
        reason: String,
    },
}

impl AccessDecision {
    /// Whether this decision allows the request
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    /// The principal to report to the gateway
    pub fn principal_id(&self) -> &str {
        match self {
            Self::Allow { principal_id, .. } => principal_id,
            Self::Deny { .. } => DENY_PRINCIPAL,
        }
    }

    /// Render the decision as a gateway policy response
    pub fn into_response(self) -> AuthorizerResponse {
        match self {
            Self::Allow { principal_id, .. } => AuthorizerResponse {
                principal_id,
                policy_document: PolicyDocument::invoke(Effect::Allow),
            },
            Self::Deny { .. } => AuthorizerResponse {
                principal_id: DENY_PRINCIPAL.to_string(),
                policy_document: PolicyDocument::invoke(Effect::Deny),
            },
        }
    }
}

impl From<AccessDecision> for AuthorizerResponse {
    fn from(decision: AccessDecision) -> Self {
        decision.into_response()
    }
}

/// Turns bearer tokens into Allow/Deny decisions
#[derive(Debug, Clone)]
pub struct Authorizer {
    verifier: TokenVerifier,
}

impl Authorizer {
    /// Wrap a verifier
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    /// The underlying verifier
    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Decide whether a raw `Authorization` header value grants access
    pub async fn decide(&self, authorization_token: Option<&str>) -> AccessDecision {
        info!(
            token_present = authorization_token.is_some_and(|t| !t.is_empty()),
            "Authorizing a user"
        );

        match self.verifier.verify(authorization_token).await {
            Ok(claims) => {
                info!(
                    principal_id = %claims.sub,
                    claims = ?claims,
                    "User was authorized"
                );
                AccessDecision::Allow {
                    principal_id: claims.sub.clone(),
                    claims: Box::new(claims),
                }
            }
            Err(e) => deny(&e),
        }
    }

    /// Authorize a gateway event and produce the policy response
    pub async fn authorize(&self, event: &AuthorizerEvent) -> AuthorizerResponse {
        self.decide(event.authorization_token.as_deref())
            .await
            .into_response()
    }
}

fn deny(error: &AuthError) -> AccessDecision {
    error!(
        error_kind = %error.kind(),
        error = %error,
        "User not authorized"
    );
    AccessDecision::Deny {
        reason: error.to_string(),
    }
}
