//! Pipeline test harness.
//!
//! Wires a [`PlatformState`] over the in-memory fixtures and provides
//! request helpers. Suites build their own routers from [`Endpoint`]s and
//! hand them to [`TestPlatform::server`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;

use atelier_gateway::{GatewayConfig, GatewayError, PlatformState, ServiceBuild, ServiceCatalog};

use super::fixtures::{ContentService, CountingResources, MemoryDirectory, MemorySessions};

/// The tenant apex domain used in tests.
pub const TEST_DOMAIN: &str = "atelier.studio";

/// A fully wired test platform.
pub struct TestPlatform {
    /// Session store.
    pub sessions: Arc<MemorySessions>,
    /// Organization directory.
    pub directory: Arc<MemoryDirectory>,
    /// Resource provider with acquisition/release counters.
    pub resources: Arc<CountingResources>,
    /// How many domain services have been constructed.
    pub constructions: Arc<AtomicUsize>,
    state: PlatformState,
}

impl TestPlatform {
    /// Creates a platform with the default test catalog.
    ///
    /// The catalog registers a `content` service and a `billing` service;
    /// `billing` fails with a configuration error because the test config
    /// carries no payment key.
    pub fn new() -> Self {
        Self::with_config(GatewayConfig::for_testing())
    }

    /// Creates a platform with a custom configuration.
    pub fn with_config(config: GatewayConfig) -> Self {
        let sessions = Arc::new(MemorySessions::default());
        let directory = Arc::new(MemoryDirectory::default());
        let resources = Arc::new(CountingResources::default());
        let constructions = Arc::new(AtomicUsize::new(0));

        let constructions_in_factory = Arc::clone(&constructions);
        let payment_api_key = config.payment_api_key.clone();
        let catalog = ServiceCatalog::new()
            .register("content", move |ctx| {
                constructions_in_factory.fetch_add(1, Ordering::SeqCst);
                Ok(ServiceBuild::service(Arc::new(ContentService {
                    organization_id: ctx.organization_id,
                    environment: ctx.environment.clone(),
                })))
            })
            .register("billing", move |ctx| {
                let Some(_key) = payment_api_key.as_deref() else {
                    return Err(GatewayError::Configuration {
                        message: "payment-processor key not configured".to_string(),
                    });
                };
                Ok(ServiceBuild::service(Arc::new(ContentService {
                    organization_id: ctx.organization_id,
                    environment: ctx.environment.clone(),
                })))
            });

        let state = PlatformState::new(
            Arc::clone(&sessions) as _,
            Arc::clone(&directory) as _,
            Arc::clone(&resources) as _,
            catalog,
            config,
        );

        Self {
            sessions,
            directory,
            resources,
            constructions,
            state,
        }
    }

    /// Returns a clone of the platform state.
    pub fn state(&self) -> PlatformState {
        self.state.clone()
    }

    /// Starts a test server over the given router.
    pub fn server(&self, router: Router) -> TestServer {
        TestServer::new(router).expect("Failed to create test server")
    }

    /// Number of domain services constructed so far.
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }
}

/// Returns a Host header for a tenant subdomain.
pub fn tenant_host(slug: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("host"),
        HeaderValue::from_str(&format!("{slug}.{TEST_DOMAIN}")).unwrap(),
    )
}

/// Returns an Authorization header for a bearer token.
pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    )
}

/// Polls until the condition holds, or panics after ~2 seconds.
///
/// Cleanup runs as a background task; tests use this to wait for it.
pub async fn wait_until(description: &str, condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for: {description}");
}
