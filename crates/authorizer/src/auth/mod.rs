//! Token authentication.
//!
//! # Components
//!
//! - `jwt` - Unverified header inspection (kid extraction, size limits)
//! - `jwks` - Signing key resolution with caching and rate limiting
//! - `claims` - Verified claim set and package membership checks
//! - `verifier` - End-to-end token verification

pub mod claims;
pub mod jwks;
pub mod jwt;
pub mod verifier;

pub use claims::VerifiedClaims;
pub use jwks::{Jwk, JwksClient, JwksResponse, SigningKey};
pub use verifier::TokenVerifier;
