//! Platform state for the request pipeline.
//!
//! This module defines the shared state available to every endpoint: the
//! injected collaborator implementations, the domain service catalog, and
//! the gateway configuration. Collaborators are injected as trait objects so
//! the pipeline crate never depends on concrete session stores or database
//! clients.

use std::sync::Arc;

use atelier_core::auth::{SessionResolver, WorkerVerifier};
use atelier_core::directory::OrganizationDirectory;
use atelier_core::resource::ResourceProvider;

use crate::config::GatewayConfig;
use crate::policy::worker::SharedSecretVerifier;
use crate::services::ServiceCatalog;

/// Shared state for the request pipeline.
///
/// Created once at startup and cloned into every endpoint; all fields are
/// reference-counted and immutable for the life of the process.
///
/// # Example
///
/// ```rust,ignore
/// use atelier_gateway::{GatewayConfig, PlatformState, ServiceCatalog};
///
/// let state = PlatformState::new(
///     sessions,
///     directory,
///     resources,
///     ServiceCatalog::new(),
///     GatewayConfig::from_env(),
/// );
/// ```
pub struct PlatformState {
    /// Session resolution collaborator.
    sessions: Arc<dyn SessionResolver>,

    /// Organization and membership lookup collaborator.
    directory: Arc<dyn OrganizationDirectory>,

    /// Shared data resource provider.
    resources: Arc<dyn ResourceProvider>,

    /// Worker credential verifier.
    workers: Arc<dyn WorkerVerifier>,

    /// Domain service factories.
    catalog: Arc<ServiceCatalog>,

    /// Gateway configuration.
    config: Arc<GatewayConfig>,
}

// Manually implement Clone: the trait objects are behind Arcs and do not
// need to be Clone themselves.
impl Clone for PlatformState {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            directory: Arc::clone(&self.directory),
            resources: Arc::clone(&self.resources),
            workers: Arc::clone(&self.workers),
            catalog: Arc::clone(&self.catalog),
            config: Arc::clone(&self.config),
        }
    }
}

impl PlatformState {
    /// Creates a new PlatformState with the given collaborators.
    ///
    /// The worker verifier defaults to [`SharedSecretVerifier`] over the
    /// configured worker secret; override it with
    /// [`PlatformState::with_worker_verifier`].
    pub fn new(
        sessions: Arc<dyn SessionResolver>,
        directory: Arc<dyn OrganizationDirectory>,
        resources: Arc<dyn ResourceProvider>,
        catalog: ServiceCatalog,
        config: GatewayConfig,
    ) -> Self {
        let workers = Arc::new(SharedSecretVerifier::new(config.worker_secret.clone()));
        Self {
            sessions,
            directory,
            resources,
            workers,
            catalog: Arc::new(catalog),
            config: Arc::new(config),
        }
    }

    /// Replaces the worker verifier.
    pub fn with_worker_verifier(mut self, workers: Arc<dyn WorkerVerifier>) -> Self {
        self.workers = workers;
        self
    }

    /// Returns the session resolver.
    pub fn sessions(&self) -> &dyn SessionResolver {
        self.sessions.as_ref()
    }

    /// Returns the organization directory.
    pub fn directory(&self) -> &dyn OrganizationDirectory {
        self.directory.as_ref()
    }

    /// Returns a clone of the organization directory Arc.
    pub fn directory_arc(&self) -> Arc<dyn OrganizationDirectory> {
        Arc::clone(&self.directory)
    }

    /// Returns a clone of the resource provider Arc.
    pub fn resources_arc(&self) -> Arc<dyn ResourceProvider> {
        Arc::clone(&self.resources)
    }

    /// Returns the worker verifier.
    pub fn workers(&self) -> &dyn WorkerVerifier {
        self.workers.as_ref()
    }

    /// Returns a clone of the service catalog Arc.
    pub fn catalog_arc(&self) -> Arc<ServiceCatalog> {
        Arc::clone(&self.catalog)
    }

    /// Returns the gateway configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Returns the deployment environment name.
    pub fn environment(&self) -> &str {
        &self.config.environment
    }
}
