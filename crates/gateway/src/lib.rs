//! # atelier-gateway - Platform Request Pipeline
//!
//! This crate implements the request-processing pipeline that every API
//! endpoint of the Atelier platform runs through. Route authors declare a
//! [`policy::Policy`], optional [`input::DeclaredInput`] schemas, optional
//! multipart [`upload::FileFieldConfig`]s, and a handler; the pipeline does
//! the rest:
//!
//! - **Policy enforcement**: authentication level, role checks, IP
//!   allowlists, organization membership and management requirements
//! - **Tenant resolution**: organization context derived from the request
//!   subdomain, with a platform-owner override via route parameter
//! - **Input validation**: declared parts validated together, every
//!   violation reported in one response
//! - **Lazy services**: request-scoped domain services constructed on first
//!   access over one shared data handle
//! - **Uniform envelopes**: `{ "data": ... }` on success, structured error
//!   bodies on failure, mapped in exactly one place
//! - **Guaranteed cleanup**: teardown callbacks run exactly once per
//!   request, scheduled off the response path
//!
//! ## Pipeline Order
//!
//! Policy enforcement completes before anything else: no domain service is
//! constructed and no handler code runs for a rejected request. Any error
//! thrown by any stage is caught once, at the top, and turned into a
//! response; cleanup is scheduled on every exit path.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use atelier_gateway::{GatewayConfig, PlatformState, ServiceCatalog, init_logging};
//! use atelier_gateway::pipeline::Endpoint;
//! use atelier_gateway::policy::Policy;
//! use atelier_core::types::UserRole;
//! use axum::{Router, routing::post};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = GatewayConfig::from_env();
//!     init_logging(&config.log_level);
//!
//!     let state = PlatformState::new(sessions, directory, resources,
//!         ServiceCatalog::new(), config);
//!
//!     let publish = Endpoint::new(
//!         Policy::new().roles([UserRole::Creator]).require_org_membership(),
//!         |ctx| async move { Ok(serde_json::json!({ "ok": true })) },
//!     );
//!
//!     let app = Router::new()
//!         .route("/content", post(publish.into_handler(state.clone())));
//!     let app = atelier_gateway::apply_platform_layers(app, state.config());
//!
//!     let listener = tokio::net::TcpListener::bind(state.config().socket_addr()).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Response Envelopes
//!
//! | Outcome | Status | Body |
//! |---------|--------|------|
//! | success | 200/201 | `{ "data": <handler result> }` |
//! | success (no content) | 204 | empty |
//! | failure | per error | `{ "error": { "code", "message", "details"? } }` |
//!
//! ## Error Mapping
//!
//! | HTTP Status | Code | Description |
//! |-------------|------|-------------|
//! | 401 | UNAUTHORIZED | No or invalid session, failed worker auth |
//! | 403 | FORBIDDEN | Role mismatch, non-member, IP not allowed |
//! | 400 | VALIDATION_ERROR | Schema violations (all fields listed) |
//! | 400 | INVALID_JSON | Body not parseable as JSON |
//! | 400 | MISSING_FILE / FILE_TOO_LARGE / INVALID_FILE_TYPE | Multipart failures |
//! | 404 | NOT_FOUND | Domain entity absent |
//! | 500 | CONFIGURATION_ERROR / INTERNAL_ERROR | Never leak internals |
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`config`] - Gateway configuration
//! - [`error`] - Error types and the single response-mapping point
//! - [`state`] - Injected collaborators and configuration
//! - [`policy`] - Policy declaration, enforcement, worker verification
//! - [`tenant`] - Subdomain tenant resolution
//! - [`input`] - Declared-input validation
//! - [`services`] - The per-request service registry
//! - [`pipeline`] - The orchestrator
//! - [`upload`] - Multipart file extraction
//! - [`context`] - The handler-facing request context
//! - [`health`] - Probe endpoints outside the pipeline

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod context;
pub mod error;
pub mod health;
pub mod input;
pub mod pipeline;
pub mod policy;
pub mod response;
pub mod services;
pub mod state;
pub mod tenant;
pub mod upload;

// Re-export commonly used types
pub use config::GatewayConfig;
pub use context::{RequestContext, ValidatedInput};
pub use error::{GatewayError, GatewayResult};
pub use health::health_routes;
pub use pipeline::Endpoint;
pub use policy::{AuthLevel, Policy};
pub use services::{ServiceBuild, ServiceCatalog, ServiceRegistry};
pub use state::PlatformState;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Applies the platform middleware stack to a router.
///
/// Adds tracing, a request timeout, request-id propagation, and (when
/// enabled) CORS, all driven by configuration.
pub fn apply_platform_layers(router: Router, config: &GatewayConfig) -> Router {
    info!(
        environment = %config.environment,
        "applying platform layers"
    );

    let service_builder = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(
            pipeline::X_REQUEST_ID.clone(),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(pipeline::X_REQUEST_ID.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(config.request_timeout),
        ));

    let router = if config.enable_cors {
        router.layer(build_cors_layer(config))
    } else {
        router
    };

    router.layer(service_builder)
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &GatewayConfig) -> CorsLayer {
    let mut cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    cors
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("atelier_gateway={},tower_http=debug", level)));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
