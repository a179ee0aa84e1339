//! # ClinicSlot API
//!
//! The HTTP surface of the clinic slot reservation service. Providers publish
//! slots, patients claim them, and any party to a booking may cancel it.
//!
//! ## Architecture
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Extract the request, call one core operation, shape the response
//! - **Middleware**: Caller identity and error mapping
//! - **Config**: Environment configuration
//!
//! Handlers never talk to the database directly. They go through the
//! [`ReservationStore`] held in [`ApiState`], so the same router runs on
//! PostgreSQL in production and on the in-memory store in tests.

/// Configuration module for API settings
pub mod config;
pub mod handlers;
/// Caller identity extraction and error mapping
pub mod middleware;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    Router,
};
use clinicslot_core::store::ReservationStore;
use eyre::Result;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use middleware::auth::{CALLER_ID_HEADER, CALLER_ROLE_HEADER};

/// Shared application state that is accessible to all request handlers
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use clinicslot_api::{app, ApiState};
/// use clinicslot_db::MemoryStore;
///
/// let state = Arc::new(ApiState { store: Arc::new(MemoryStore::new()) });
/// let router = app(state);
/// ```
pub struct ApiState {
    pub store: Arc<dyn ReservationStore>,
}

/// Builds the application router with every route and the shared state attached.
pub fn app(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::slots::routes())
        .merge(routes::bookings::routes())
        .merge(routes::availability::routes())
        .merge(routes::reminders::routes())
        .with_state(state)
}

/// Installs the global tracing subscriber.
pub fn init_tracing(level: Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(CALLER_ID_HEADER),
            HeaderName::from_static(CALLER_ROLE_HEADER),
        ])
        .allow_origin(AllowOrigin::list(allowed))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}

/// Serves the API until Ctrl-C, then drains in-flight requests and returns.
///
/// The caller owns the store's underlying resources and closes them after
/// this returns.
pub async fn start_server(
    config: config::ApiConfig,
    store: Arc<dyn ReservationStore>,
) -> Result<()> {
    let state = Arc::new(ApiState { store });

    let app = app(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::custom(middleware::error_handling::panic_response))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout))),
    );

    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)),
        None => app,
    };

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
