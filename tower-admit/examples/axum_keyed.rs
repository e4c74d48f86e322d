use std::sync::Arc;
use std::time::Duration;

use admit_limit::SlidingWindowConfig;
use admit_limit::SlidingWindowLimiter;
use admit_limit::TokenBucketConfig;
use admit_limit::TokenBucketLimiter;
use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::response::IntoResponse;
use axum::routing::get;
use tower::BoxError;
use tower::ServiceBuilder;
use tower_admit::AdmitError;
use tower_admit::AdmitLayer;
use tower_admit::ForwardedFor;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    // 1. Per-client quota: 5 requests per 10s, keyed by X-Forwarded-For
    let config = SlidingWindowConfig::new(5, Duration::from_secs(10))
        .with_ttl(Duration::from_secs(60))
        .with_max_keys(10_000);
    let per_client = Arc::new(SlidingWindowLimiter::<String>::new(config)?);

    // 2. Global quota protecting the backend: 20 req/s, bursts of 40
    let global = Arc::new(TokenBucketLimiter::new(TokenBucketConfig::new(20.0, 40))?);

    // 3. Build the Router
    let app = Router::new()
        .route("/", get(|| async { "Hello, Admit!" }))
        .layer(
            ServiceBuilder::new()
                // 1. The outermost layer: catches BoxError and returns Response
                .layer(HandleErrorLayer::new(handle_admit_error))
                // 2. Per-client check first, so one noisy client can't drain the bucket
                .layer(AdmitLayer::keyed(per_client, ForwardedFor))
                .layer(AdmitLayer::new(global))
                // 3. Converts the Route's Infallible to BoxError
                .map_err(BoxError::from),
        );

    // 4. Serve
    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("listening on http://127.0.0.1:3000");
    tracing::info!("try: curl -H 'X-Forwarded-For: 203.0.113.7' http://127.0.0.1:3000/");

    axum::serve(listener, app).await?;
    Ok(())
}

/// The signature must match BoxError -> IntoResponse
async fn handle_admit_error(err: BoxError) -> impl IntoResponse {
    AdmitError::from_boxed(err)
}
