//! Token verification.
//!
//! Verifies RS256-signed tokens against keys resolved from JWKS, enforcing
//! expiry and, when configured, an issuer allow-list.

use crate::auth::claims::VerifiedClaims;
use crate::auth::jwks::JwksClient;
use crate::auth::jwt;
use crate::errors::AuthError;
use jsonwebtoken::{decode, Algorithm, Validation};
use std::sync::Arc;
use tracing::instrument;

/// Verifies bearer tokens end to end.
pub struct TokenVerifier {
    /// JWKS client for resolving signing keys.
    jwks_client: Arc<JwksClient>,

    /// Accepted issuers. Empty means any issuer is accepted.
    issuer_allow_list: Vec<String>,
}

impl TokenVerifier {
    /// Create a new token verifier.
    pub fn new(jwks_client: Arc<JwksClient>, issuer_allow_list: Vec<String>) -> Self {
        Self {
            jwks_client,
            issuer_allow_list,
        }
    }

    /// Verify a token and return its claims.
    ///
    /// # Checks
    ///
    /// 1. Size check - reject tokens > 8KB before parsing
    /// 2. Decode header and payload unverified; the kid selects the signing key
    /// 3. Resolve the RSA public key from JWKS
    /// 4. Verify the RS256 signature
    /// 5. Validate the exp claim (reject expired tokens)
    /// 6. Validate the iss claim against the allow-list, when configured
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SignatureVerification` with a generic message for
    /// all cryptographic and claim validation failures; key lookup failures
    /// surface as `KeyResolution` / `NoUsableKeyMaterial`.
    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> Result<VerifiedClaims, AuthError> {
        let header = jwt::decode_header(token)?;
        let kid = header.key_id()?;

        let key = self.jwks_client.resolve_key(kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        if !self.issuer_allow_list.is_empty() {
            validation.set_issuer(&self.issuer_allow_list);
        }

        let token_data =
            decode::<VerifiedClaims>(token, key.decoding_key(), &validation).map_err(|e| {
                tracing::debug!(target: "authorizer.verify", kid = %key.kid(), error = %e, "Token verification failed");
                AuthError::SignatureVerification
            })?;

        tracing::debug!(target: "authorizer.verify", "Token verified successfully");
        Ok(token_data.claims)
    }
}
