//! Package Authorizer
//!
//! Lambda entry point. Configuration and the JWKS client are built once at
//! cold start and shared across invocations, so the key cache and fetch
//! rate limit span the lifetime of the execution environment.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use package_authorizer::auth::JwksClient;
use package_authorizer::authorizer::Authorizer;
use package_authorizer::config::Config;
use package_authorizer::request::AuthRequest;
use package_authorizer::AuthDecision;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing; CloudWatch supplies timestamps and does not
    // understand ANSI escapes.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("package_authorizer=info")),
        )
        .json()
        .with_ansi(false)
        .without_time()
        .init();

    info!("Starting package authorizer");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        package = %config.package,
        jwks_uri = %config.jwks_uri,
        issuers = config.issuer_allow_list.len(),
        "Configuration loaded"
    );

    let jwks_client = Arc::new(JwksClient::new(
        config.jwks_uri.clone(),
        config.jwks_cache_ttl,
        config.jwks_requests_per_minute,
    ));
    let authorizer = Authorizer::new(&config, jwks_client);
    let authorizer_ref = &authorizer;

    run(service_fn(move |event: LambdaEvent<AuthRequest>| async move {
        handle(authorizer_ref, event).await
    }))
    .await
}

/// Handle a single authorizer invocation.
///
/// Token problems surface as the literal "Unauthorized" error, which API
/// Gateway maps to a 401. Infrastructure failures propagate as-is and
/// produce a 500.
async fn handle(
    authorizer: &Authorizer,
    event: LambdaEvent<AuthRequest>,
) -> Result<AuthDecision, Error> {
    match authorizer.authorize(&event.payload).await {
        Ok(decision) => {
            info!(
                target: "authorizer",
                authorized = decision.is_authorized,
                "Authorization decision"
            );
            Ok(decision)
        }
        Err(e) if e.is_unauthorized() => {
            warn!(target: "authorizer", error = %e, "Request rejected");
            Err(Error::from("Unauthorized"))
        }
        Err(e) => {
            error!(target: "authorizer", error = %e, "Authorization failed");
            Err(Error::from(e))
        }
    }
}
