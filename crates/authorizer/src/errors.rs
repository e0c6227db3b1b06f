//! Authorizer error types.
//!
//! Errors split into two families via [`AuthError::is_unauthorized`]:
//! client-side token problems that must produce a 401 at the gateway, and
//! infrastructure problems (key resolution, bad key material) that must
//! surface as server errors. Error messages are intentionally generic to
//! avoid leaking token contents; details are logged server-side.

use thiserror::Error;

/// Package authorizer error type.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Event is not a REQUEST-type authorizer payload.
    #[error("Expected a REQUEST authorizer event")]
    MalformedRequest,

    /// No authorization header was present on the request.
    #[error("Expected 'authorization' header to be set")]
    MissingAuthorization,

    /// Authorization header does not match `Bearer <token>`.
    #[error("Authorization header does not match 'Bearer <token>'")]
    InvalidAuthorizationFormat,

    /// Token is not a well-formed JWT compact serialization.
    #[error("Invalid token")]
    UnparsableToken,

    /// Token decoded but lacks a usable `kid` header.
    #[error("Invalid token")]
    InvalidToken,

    /// Signing key could not be resolved from the JWKS endpoint.
    #[error("Key resolution failed: {0}")]
    KeyResolution(String),

    /// Resolved JWK carries no usable RSA key material.
    #[error("Signing key has no usable RSA key material")]
    NoUsableKeyMaterial,

    /// Signature, expiry, or issuer verification failed.
    #[error("Invalid token")]
    SignatureVerification,
}

impl AuthError {
    /// Whether this error denies the caller (401) rather than signalling an
    /// internal failure (500).
    ///
    /// Key resolution and key material problems are on our side of the trust
    /// boundary, so they are not the caller's fault.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            AuthError::MalformedRequest
            | AuthError::MissingAuthorization
            | AuthError::InvalidAuthorizationFormat
            | AuthError::UnparsableToken
            | AuthError::InvalidToken
            | AuthError::SignatureVerification => true,
            AuthError::KeyResolution(_) | AuthError::NoUsableKeyMaterial => false,
        }
    }
}
