//! API Gateway authorizer request payload.
//!
//! Only the fields this authorizer inspects are modelled; the REQUEST event
//! carries much more (route ARN, identity source, stage variables) that we
//! deliberately ignore.

use crate::errors::AuthError;
use serde::Deserialize;
use std::collections::HashMap;

/// Incoming REQUEST-type authorizer event.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthRequest {
    /// Event type discriminator. Must be "REQUEST".
    #[serde(rename = "type", default)]
    pub event_type: String,

    /// Request headers as delivered by API Gateway.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl AuthRequest {
    /// Extract the bearer token from the authorization header.
    ///
    /// # Errors
    ///
    /// - `MalformedRequest` - event type is not "REQUEST"
    /// - `MissingAuthorization` - no authorization header present
    /// - `InvalidAuthorizationFormat` - header is not `Bearer <token>` with a
    ///   non-empty token
    pub fn bearer_token(&self) -> Result<&str, AuthError> {
        if self.event_type != "REQUEST" {
            tracing::debug!(
                target: "authorizer.request",
                event_type = %self.event_type,
                "Rejected non-REQUEST authorizer event"
            );
            return Err(AuthError::MalformedRequest);
        }

        let header = self
            .header_value("authorization")
            .ok_or(AuthError::MissingAuthorization)?;

        // The scheme is case-sensitive and exactly one space separates it
        // from the token.
        header
            .strip_prefix("Bearer ")
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::InvalidAuthorizationFormat)
    }

    /// Look up a header by name, case-insensitively.
    ///
    /// HTTP header names are case-insensitive and API Gateway does not
    /// normalize them consistently across payload versions.
    fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
