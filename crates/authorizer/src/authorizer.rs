//! Authorization pipeline and decision types.
//!
//! Ties extraction, verification, and the package membership check together.
//! An authenticated token that does not grant the configured package is a
//! clean deny, not an error.

use crate::auth::{JwksClient, TokenVerifier, VerifiedClaims};
use crate::config::Config;
use crate::errors::AuthError;
use crate::request::AuthRequest;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// Simple-response authorizer decision returned to API Gateway.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthDecision {
    /// Whether the request is allowed through.
    pub is_authorized: bool,

    /// Context forwarded to the backend integration.
    pub context: AuthContext,
}

/// Authorizer context attached to allowed requests.
///
/// Serializes as an empty object on deny.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthContext {
    /// Verified claims of the presented token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt: Option<VerifiedClaims>,
}

impl AuthDecision {
    /// Allow the request, exposing the verified claims downstream.
    pub fn allow(claims: VerifiedClaims) -> Self {
        Self {
            is_authorized: true,
            context: AuthContext { jwt: Some(claims) },
        }
    }

    /// Deny the request with an empty context.
    pub fn deny() -> Self {
        Self {
            is_authorized: false,
            context: AuthContext::default(),
        }
    }
}

/// Decide whether verified claims grant access to a package.
///
/// Pure function over already-verified claims; it never fails.
pub fn decide(claims: &VerifiedClaims, package: &str) -> AuthDecision {
    if claims.has_package(package) {
        tracing::debug!(target: "authorizer.decision", package = %package, "Package granted by token");
        AuthDecision::allow(claims.clone())
    } else {
        tracing::debug!(target: "authorizer.decision", package = %package, "Package not granted by token");
        AuthDecision::deny()
    }
}

/// The authorizer: verifies bearer tokens and gates on package membership.
pub struct Authorizer {
    /// Package a token must grant for the request to be allowed.
    package: String,

    /// Token verifier backed by the shared JWKS client.
    verifier: TokenVerifier,
}

impl Authorizer {
    /// Create an authorizer from configuration and a shared JWKS client.
    pub fn new(config: &Config, jwks_client: Arc<JwksClient>) -> Self {
        Self {
            package: config.package.clone(),
            verifier: TokenVerifier::new(jwks_client, config.issuer_allow_list.clone()),
        }
    }

    /// Authorize a single request.
    ///
    /// # Errors
    ///
    /// Propagates extraction and verification failures; see
    /// [`AuthError::is_unauthorized`] for how callers should map them.
    /// A verified token without the package is `Ok` with a deny decision.
    #[instrument(skip_all)]
    pub async fn authorize(&self, request: &AuthRequest) -> Result<AuthDecision, AuthError> {
        let token = request.bearer_token()?;
        let claims = self.verifier.verify(token).await?;
        Ok(decide(&claims, &self.package))
    }
}
