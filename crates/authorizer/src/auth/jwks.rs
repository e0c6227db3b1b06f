//! JWKS client for fetching and caching RSA signing keys.
//!
//! Fetches the key set from the configured JWKS endpoint and caches it with
//! a configurable TTL. Upstream fetches are additionally rate limited with a
//! sliding one-minute window so a flood of tokens with unknown key IDs
//! cannot hammer the identity provider.
//!
//! # Security
//!
//! - Keys are cached to reduce upstream load and improve latency
//! - Cache is invalidated on TTL expiry to pick up key rotations
//! - An unknown `kid` within a fresh cache fails without a refetch

use crate::errors::AuthError;
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

/// Sliding window over which upstream fetches are counted.
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Upper bound on the cache TTL (24 hours).
///
/// Longer TTLs would defeat key rotation, and an unbounded TTL overflows
/// the cache expiry arithmetic.
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(86_400);

/// JSON Web Key from the JWKS endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type (expected "RSA").
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,

    /// Algorithm (should be "RS256").
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
}

/// JWKS response document.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    /// List of JSON Web Keys.
    pub keys: Vec<Jwk>,
}

/// A resolved RSA verification key.
pub struct SigningKey {
    kid: String,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("decoding_key", &"<redacted>")
            .finish()
    }
}

impl SigningKey {
    /// Build a verification key from a JWK's RSA components.
    ///
    /// # Errors
    ///
    /// - `NoUsableKeyMaterial` - key is not RSA or lacks `n`/`e` components
    /// - `KeyResolution` - components are present but not valid base64url
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, AuthError> {
        if jwk.kty != "RSA" {
            tracing::warn!(target: "authorizer.jwks", kty = %jwk.kty, kid = %jwk.kid, "Unexpected JWK key type");
            return Err(AuthError::NoUsableKeyMaterial);
        }

        let (n, e) = match (jwk.n.as_deref(), jwk.e.as_deref()) {
            (Some(n), Some(e)) if !n.is_empty() && !e.is_empty() => (n, e),
            _ => {
                tracing::error!(target: "authorizer.jwks", kid = %jwk.kid, "JWK missing RSA components");
                return Err(AuthError::NoUsableKeyMaterial);
            }
        };

        let decoding_key = DecodingKey::from_rsa_components(n, e).map_err(|err| {
            tracing::error!(target: "authorizer.jwks", kid = %jwk.kid, error = %err, "Invalid RSA key encoding");
            AuthError::KeyResolution("invalid key material encoding".to_string())
        })?;

        Ok(SigningKey {
            kid: jwk.kid.clone(),
            decoding_key,
        })
    }

    /// The key ID this key was resolved for.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// The decoding key for signature verification.
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

/// Cached JWKS data with expiry time.
struct CachedJwks {
    /// Map of key ID to JWK.
    keys: HashMap<String, Jwk>,

    /// When this cache entry expires.
    expires_at: Instant,
}

/// JWKS client for fetching and caching signing keys.
///
/// Thread-safe; a single instance is shared across concurrent invocations.
pub struct JwksClient {
    /// URL to the JWKS endpoint.
    jwks_uri: String,

    /// HTTP client for fetching JWKS.
    http_client: reqwest::Client,

    /// Cached JWKS data.
    cache: Arc<RwLock<Option<CachedJwks>>>,

    /// Cache TTL duration.
    cache_ttl: Duration,

    /// Timestamps of recent upstream fetch attempts, oldest first.
    fetch_log: Mutex<VecDeque<Instant>>,

    /// Upstream fetch budget per sliding window.
    requests_per_minute: u32,
}

impl JwksClient {
    /// Create a new JWKS client.
    ///
    /// # Arguments
    ///
    /// * `jwks_uri` - URL to the JWKS endpoint
    /// * `cache_ttl` - How long to cache the key set before refreshing,
    ///   clamped to [`MAX_CACHE_TTL`]
    /// * `requests_per_minute` - Upstream fetch budget per sliding minute
    pub fn new(jwks_uri: String, cache_ttl: Duration, requests_per_minute: u32) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "authorizer.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_uri,
            http_client,
            cache: Arc::new(RwLock::new(None)),
            cache_ttl: cache_ttl.min(MAX_CACHE_TTL),
            fetch_log: Mutex::new(VecDeque::new()),
            requests_per_minute,
        }
    }

    /// Resolve a verification key by key ID.
    ///
    /// Serves from cache when fresh, otherwise fetches the key set from
    /// upstream (subject to the rate limit) and retries the lookup.
    ///
    /// # Errors
    ///
    /// - `KeyResolution` - fetch failed, rate limit exhausted, or the key ID
    ///   is not present in the key set
    /// - `NoUsableKeyMaterial` - key found but carries no RSA components
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn resolve_key(&self, kid: &str) -> Result<SigningKey, AuthError> {
        // Check cache first
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Instant::now() {
                    if let Some(jwk) = cached.keys.get(kid) {
                        tracing::debug!(target: "authorizer.jwks", kid = %kid, "JWKS cache hit");
                        return SigningKey::from_jwk(jwk);
                    }
                    // Unknown kid in a fresh cache fails without a refetch
                    tracing::debug!(target: "authorizer.jwks", kid = %kid, "Key not found in JWKS cache");
                    return Err(AuthError::KeyResolution(format!(
                        "no signing key for kid '{}'",
                        kid
                    )));
                }
            }
        }

        // Cache miss or expired - fetch fresh JWKS
        self.refresh_cache().await?;

        // Try the lookup against the refreshed cache
        let cache = self.cache.read().await;
        if let Some(cached) = cache.as_ref() {
            if let Some(jwk) = cached.keys.get(kid) {
                return SigningKey::from_jwk(jwk);
            }
        }

        tracing::warn!(target: "authorizer.jwks", kid = %kid, "Key not found in JWKS after refresh");
        Err(AuthError::KeyResolution(format!(
            "no signing key for kid '{}'",
            kid
        )))
    }

    /// Refresh the JWKS cache from upstream.
    #[instrument(skip(self))]
    async fn refresh_cache(&self) -> Result<(), AuthError> {
        self.record_fetch_attempt().await?;

        tracing::debug!(target: "authorizer.jwks", url = %self.jwks_uri, "Fetching JWKS");

        let response = self
            .http_client
            .get(&self.jwks_uri)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "authorizer.jwks", error = %e, "Failed to fetch JWKS");
                AuthError::KeyResolution("JWKS endpoint unreachable".to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "authorizer.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(AuthError::KeyResolution(
                "JWKS endpoint returned an error".to_string(),
            ));
        }

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            tracing::error!(target: "authorizer.jwks", error = %e, "Failed to parse JWKS response");
            AuthError::KeyResolution("JWKS response was not valid".to_string())
        })?;

        let keys: HashMap<String, Jwk> = jwks
            .keys
            .into_iter()
            .map(|key| (key.kid.clone(), key))
            .collect();

        tracing::info!(
            target: "authorizer.jwks",
            key_count = keys.len(),
            "JWKS cache refreshed"
        );

        let mut cache = self.cache.write().await;
        *cache = Some(CachedJwks {
            keys,
            expires_at: Instant::now() + self.cache_ttl,
        });

        Ok(())
    }

    /// Record an upstream fetch attempt against the sliding-window budget.
    ///
    /// Attempts are counted whether or not the fetch succeeds, so a failing
    /// upstream cannot be retried without bound.
    async fn record_fetch_attempt(&self) -> Result<(), AuthError> {
        let now = Instant::now();
        let mut fetch_log = self.fetch_log.lock().await;

        while let Some(oldest) = fetch_log.front() {
            if now.duration_since(*oldest) > RATE_LIMIT_WINDOW {
                fetch_log.pop_front();
            } else {
                break;
            }
        }

        if fetch_log.len() >= self.requests_per_minute as usize {
            tracing::warn!(
                target: "authorizer.jwks",
                limit = self.requests_per_minute,
                "JWKS fetch rate limit exhausted"
            );
            return Err(AuthError::KeyResolution(
                "JWKS fetch rate limit exceeded".to_string(),
            ));
        }

        fetch_log.push_back(now);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    // Valid base64url RSA components (2048-bit modulus)
    const TEST_N: &str = "4XiixTgUH4mdn3fEZo7Q7EI-lcj4Qv84A2bvN7neLCL_ebUgvtsntfbDAQndw0jqRr6oSZ39WBnjlqRG5683nMq5OVtWT8FcJ5GgjEudC7ZtLkOS-stqP6J9tRjvVezUvQZTO8PN6TJs-3WQBUuQcODiMY0_Q_2SbNSk0tW41FwJMLFj24vzCElNdCmgSPlKGbrzk1xD0YequyWw2crRmxwaSQ4QPUKqCOLYjoB42fl7CLsNJXOyBsB8asdunfB7BchvdLq0NNE0cfCoUtaPaKCRkMSp-ytiVUwmScxcNBduxUyvaxwY_KRNwG_dJXTjxPvsAQoRilcpgHuLQ0JgvQ";
    const TEST_E: &str = "AQAB";

    fn rsa_jwk(kid: &str) -> Jwk {
        Jwk {
            kty: "RSA".to_string(),
            kid: kid.to_string(),
            n: Some(TEST_N.to_string()),
            e: Some(TEST_E.to_string()),
            alg: Some("RS256".to_string()),
            key_use: Some("sig".to_string()),
        }
    }

    #[test]
    fn test_jwk_deserialization() {
        let json = format!(
            r#"{{
                "kty": "RSA",
                "kid": "test-key-01",
                "n": "{}",
                "e": "{}",
                "alg": "RS256",
                "use": "sig"
            }}"#,
            TEST_N, TEST_E
        );

        let jwk: Jwk = serde_json::from_str(&json).unwrap();

        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.kid, "test-key-01");
        assert_eq!(jwk.n.as_deref(), Some(TEST_N));
        assert_eq!(jwk.e.as_deref(), Some(TEST_E));
        assert_eq!(jwk.alg, Some("RS256".to_string()));
        assert_eq!(jwk.key_use, Some("sig".to_string()));
    }

    #[test]
    fn test_jwk_deserialization_minimal() {
        // Only required fields
        let json = r#"{
            "kty": "RSA",
            "kid": "test-key-02"
        }"#;

        let jwk: Jwk = serde_json::from_str(json).unwrap();

        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.kid, "test-key-02");
        assert!(jwk.n.is_none());
        assert!(jwk.e.is_none());
        assert!(jwk.alg.is_none());
        assert!(jwk.key_use.is_none());
    }

    #[test]
    fn test_jwks_response_deserialization() {
        let json = r#"{
            "keys": [
                {"kty": "RSA", "kid": "key-1"},
                {"kty": "RSA", "kid": "key-2"}
            ]
        }"#;

        let jwks: JwksResponse = serde_json::from_str(json).unwrap();

        assert_eq!(jwks.keys.len(), 2);
        assert_eq!(jwks.keys.first().unwrap().kid, "key-1");
        assert_eq!(jwks.keys.get(1).unwrap().kid, "key-2");
    }

    #[test]
    fn test_signing_key_from_valid_jwk() {
        let key = SigningKey::from_jwk(&rsa_jwk("test-key-01")).unwrap();
        assert_eq!(key.kid(), "test-key-01");
    }

    #[test]
    fn test_signing_key_rejects_non_rsa_key_type() {
        let mut jwk = rsa_jwk("test-key");
        jwk.kty = "OKP".to_string();

        let result = SigningKey::from_jwk(&jwk);
        assert!(matches!(result, Err(AuthError::NoUsableKeyMaterial)));
    }

    #[test]
    fn test_signing_key_rejects_missing_modulus() {
        let mut jwk = rsa_jwk("test-key");
        jwk.n = None;

        let result = SigningKey::from_jwk(&jwk);
        assert!(matches!(result, Err(AuthError::NoUsableKeyMaterial)));
    }

    #[test]
    fn test_signing_key_rejects_missing_exponent() {
        let mut jwk = rsa_jwk("test-key");
        jwk.e = None;

        let result = SigningKey::from_jwk(&jwk);
        assert!(matches!(result, Err(AuthError::NoUsableKeyMaterial)));
    }

    #[test]
    fn test_signing_key_rejects_empty_components() {
        let mut jwk = rsa_jwk("test-key");
        jwk.n = Some(String::new());

        let result = SigningKey::from_jwk(&jwk);
        assert!(matches!(result, Err(AuthError::NoUsableKeyMaterial)));
    }

    #[test]
    fn test_signing_key_rejects_invalid_base64_modulus() {
        let mut jwk = rsa_jwk("test-key");
        jwk.n = Some("!!!not-base64url!!!".to_string());

        let result = SigningKey::from_jwk(&jwk);
        assert!(matches!(result, Err(AuthError::KeyResolution(_))));
    }

    #[test]
    fn test_jwks_client_creation() {
        let client = JwksClient::new(
            "https://issuer.example/.well-known/jwks.json".to_string(),
            Duration::from_secs(600),
            10,
        );
        assert_eq!(
            client.jwks_uri,
            "https://issuer.example/.well-known/jwks.json"
        );
        assert_eq!(client.cache_ttl, Duration::from_secs(600));
        assert_eq!(client.requests_per_minute, 10);
    }

    #[test]
    fn test_jwks_client_clamps_excessive_ttl() {
        // A TTL beyond the cap must not overflow cache expiry arithmetic
        let client = JwksClient::new(
            "https://issuer.example/.well-known/jwks.json".to_string(),
            Duration::from_secs(u64::MAX),
            10,
        );
        assert_eq!(client.cache_ttl, MAX_CACHE_TTL);
    }

    #[tokio::test]
    async fn test_fetch_attempts_exhaust_budget() {
        let client = JwksClient::new(
            "https://issuer.example/.well-known/jwks.json".to_string(),
            Duration::from_secs(600),
            3,
        );

        for _ in 0..3 {
            client.record_fetch_attempt().await.unwrap();
        }

        let result = client.record_fetch_attempt().await;
        assert!(matches!(result, Err(AuthError::KeyResolution(_))));
    }
}
