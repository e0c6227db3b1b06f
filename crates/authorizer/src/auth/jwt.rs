//! Unverified JWT header inspection.
//!
//! The `kid` must be read from the token header before any signature check,
//! because it selects which JWKS key verifies the token. Nothing decoded here
//! is trusted beyond key lookup.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - The decoded header is never exposed to authorization decisions

use crate::errors::AuthError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;

/// Maximum allowed JWT size in bytes (8KB).
///
/// Oversized tokens are rejected before base64 decoding or any cryptographic
/// work. Typical JWTs are a few hundred bytes; 8KB leaves generous headroom.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// JWT header fields decoded without signature verification.
#[derive(Debug, Clone, Deserialize)]
pub struct UnverifiedHeader {
    /// Declared signing algorithm.
    #[serde(default)]
    pub alg: Option<String>,

    /// Key ID selecting the JWKS signing key.
    #[serde(default)]
    pub kid: Option<String>,
}

impl UnverifiedHeader {
    /// The key ID, if present and non-empty.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` when the header has no usable `kid`.
    pub fn key_id(&self) -> Result<&str, AuthError> {
        self.kid
            .as_deref()
            .filter(|kid| !kid.is_empty())
            .ok_or(AuthError::InvalidToken)
    }
}

/// Decode the header of a JWT without verifying the signature.
///
/// The payload segment is decoded and discarded as well, so a token that is
/// not fully well-formed fails here rather than after a key lookup.
///
/// # Errors
///
/// Returns `AuthError::UnparsableToken` when the token exceeds the size
/// limit or is not a well-formed three-segment compact serialization with
/// base64url-encoded JSON header and payload.
pub fn decode_header(token: &str) -> Result<UnverifiedHeader, AuthError> {
    // Check token size first (DoS prevention)
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "authorizer.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(AuthError::UnparsableToken);
    }

    // JWT compact serialization: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "authorizer.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(AuthError::UnparsableToken);
    }

    let header_part = parts.first().ok_or(AuthError::UnparsableToken)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "authorizer.jwt", error = %e, "Failed to decode JWT header base64");
        AuthError::UnparsableToken
    })?;

    let header: UnverifiedHeader = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "authorizer.jwt", error = %e, "Failed to parse JWT header JSON");
        AuthError::UnparsableToken
    })?;

    // The payload must decode too; its claims are only read later, after
    // signature verification.
    let payload_part = parts.get(1).ok_or(AuthError::UnparsableToken)?;
    let payload_bytes = URL_SAFE_NO_PAD.decode(payload_part).map_err(|e| {
        tracing::debug!(target: "authorizer.jwt", error = %e, "Failed to decode JWT payload base64");
        AuthError::UnparsableToken
    })?;
    serde_json::from_slice::<serde_json::Value>(&payload_bytes).map_err(|e| {
        tracing::debug!(target: "authorizer.jwt", error = %e, "Failed to parse JWT payload JSON");
        AuthError::UnparsableToken
    })?;

    Ok(header)
}
