//! Verified JWT claims.
//!
//! Claims only exist as [`VerifiedClaims`] after signature verification has
//! succeeded. The `sub` field is redacted in Debug output to prevent exposure
//! in logs; the full claim set is still serialized into the authorizer
//! context for downstream consumers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Claims extracted from a verified token.
///
/// Claims not modelled explicitly are retained in `extra` so the authorizer
/// context exposes the token payload in full.
#[derive(Clone, Serialize, Deserialize)]
pub struct VerifiedClaims {
    /// Subject - redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Token issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Package names this token grants access to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pks: Option<Vec<String>>,

    /// Any additional claims carried by the token.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Custom Debug implementation that redacts the `sub` field.
impl fmt::Debug for VerifiedClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifiedClaims")
            .field("sub", &self.sub.as_ref().map(|_| "[REDACTED]"))
            .field("iss", &self.iss)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("pks", &self.pks)
            .finish_non_exhaustive()
    }
}

impl VerifiedClaims {
    /// Check if the token grants access to a specific package.
    ///
    /// An absent or empty `pks` claim grants nothing. Matching is exact and
    /// case-sensitive.
    pub fn has_package(&self, package: &str) -> bool {
        self.pks
            .as_deref()
            .is_some_and(|pks| pks.iter().any(|p| p == package))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn claims_with_pks(pks: Option<Vec<&str>>) -> VerifiedClaims {
        VerifiedClaims {
            sub: Some("user-123".to_string()),
            iss: Some("https://issuer.example".to_string()),
            exp: 1234567890,
            iat: Some(1234567800),
            pks: pks.map(|p| p.into_iter().map(ToString::to_string).collect()),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_has_package_exact_match() {
        let claims = claims_with_pks(Some(vec!["pkg-a", "pkg-b"]));

        assert!(claims.has_package("pkg-a"));
        assert!(claims.has_package("pkg-b"));
        assert!(!claims.has_package("pkg-c"));
    }

    #[test]
    fn test_has_package_no_partial_match() {
        let claims = claims_with_pks(Some(vec!["package"]));

        assert!(!claims.has_package("pack"));
        assert!(!claims.has_package("packages"));
    }

    #[test]
    fn test_has_package_case_sensitive() {
        let claims = claims_with_pks(Some(vec!["Pkg-A"]));

        assert!(!claims.has_package("pkg-a"));
        assert!(claims.has_package("Pkg-A"));
    }

    #[test]
    fn test_has_package_absent_pks() {
        let claims = claims_with_pks(None);
        assert!(!claims.has_package("pkg-a"));
    }

    #[test]
    fn test_has_package_empty_pks() {
        let claims = claims_with_pks(Some(vec![]));
        assert!(!claims.has_package("pkg-a"));
    }

    #[test]
    fn test_debug_redacts_sub() {
        let claims = claims_with_pks(Some(vec!["pkg-a"]));
        let debug_str = format!("{:?}", claims);

        assert!(
            !debug_str.contains("user-123"),
            "Debug output should not contain actual sub value"
        );
        assert!(
            debug_str.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
    }

    #[test]
    fn test_extra_claims_preserved() {
        let json = r#"{
            "sub": "user-123",
            "exp": 1234567890,
            "pks": ["pkg-a"],
            "tenant": "acme",
            "roles": ["admin", "viewer"]
        }"#;

        let claims: VerifiedClaims = serde_json::from_str(json).unwrap();

        assert_eq!(
            claims.extra.get("tenant"),
            Some(&serde_json::json!("acme"))
        );
        assert_eq!(
            claims.extra.get("roles"),
            Some(&serde_json::json!(["admin", "viewer"]))
        );

        // And they survive re-serialization into the authorizer context
        let round_trip = serde_json::to_value(&claims).unwrap();
        assert_eq!(round_trip.get("tenant"), Some(&serde_json::json!("acme")));
    }

    #[test]
    fn test_absent_optional_claims_omitted_from_serialization() {
        let claims = VerifiedClaims {
            sub: None,
            iss: None,
            exp: 1234567890,
            iat: None,
            pks: None,
            extra: serde_json::Map::new(),
        };

        let json = serde_json::to_string(&claims).unwrap();
        assert!(!json.contains("pks"));
        assert!(!json.contains("iss"));
        assert!(!json.contains("sub"));
        assert!(!json.contains("iat"));
    }
}
