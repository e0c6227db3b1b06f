//! Package Authorizer Library
//!
//! A Lambda REQUEST authorizer that gates API Gateway routes on signed
//! package grants. A caller is allowed through when it presents a valid
//! RS256-signed bearer token whose `pks` claim lists the configured package.
//!
//! # Pipeline
//!
//! ```text
//! request.rs -> auth/jwt.rs -> auth/jwks.rs -> auth/verifier.rs -> authorizer.rs
//! ```
//!
//! # Modules
//!
//! - `config` - Configuration from environment
//! - `errors` - Error types with 401/500 classification
//! - `request` - Authorizer event payload and token extraction
//! - `auth` - Key resolution and token verification
//! - `authorizer` - Decision pipeline and response types

pub mod auth;
pub mod authorizer;
pub mod config;
pub mod errors;
pub mod request;

pub use authorizer::{AuthDecision, Authorizer};
pub use config::Config;
pub use errors::AuthError;
pub use request::AuthRequest;
