//! Per-request domain service registry.
//!
//! Domain services (content, purchases, analytics, billing, ...) are
//! expensive to build and most endpoints use one or two of them, so the
//! registry is lazy: a service is constructed on first access, memoized for
//! the rest of the request, and every service shares one underlying
//! [`DataHandle`] acquired at most once per request.
//!
//! The registry also tracks teardown callbacks. The orchestrator calls
//! [`ServiceRegistry::cleanup`] exactly once per request, on every exit
//! path, as a background task; teardowns run concurrently and the shared
//! handle's release is registered the moment the handle is first acquired.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use atelier_core::resource::{DataHandle, DomainService, ResourceProvider, ServiceContext};
use atelier_core::types::OrgId;

use crate::error::{GatewayError, GatewayResult};

/// A boxed teardown future.
pub type TeardownFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A teardown callback, invoked once during request cleanup.
pub type Teardown = Box<dyn FnOnce() -> TeardownFuture + Send>;

/// What a service factory produces: the service, and optionally a teardown
/// to run when the request ends.
pub struct ServiceBuild {
    /// The constructed service.
    pub service: Arc<dyn DomainService>,
    /// Teardown registered alongside the service, if any.
    pub teardown: Option<Teardown>,
}

impl ServiceBuild {
    /// A build with no teardown of its own.
    pub fn service(service: Arc<dyn DomainService>) -> Self {
        Self {
            service,
            teardown: None,
        }
    }

    /// A build with a teardown callback.
    pub fn with_teardown(service: Arc<dyn DomainService>, teardown: Teardown) -> Self {
        Self {
            service,
            teardown: Some(teardown),
        }
    }
}

type Factory = Box<dyn Fn(&ServiceContext) -> GatewayResult<ServiceBuild> + Send + Sync>;

/// The table of service factories, built once at startup.
///
/// Factories capture their own configuration; one that requires
/// non-negotiable configuration (a payment-processor key, say) returns a
/// configuration error from the factory, so the failure surfaces at first
/// access rather than at startup or registry construction.
#[derive(Default)]
pub struct ServiceCatalog {
    factories: HashMap<&'static str, Factory>,
}

impl ServiceCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under a service name.
    pub fn register<F>(mut self, name: &'static str, factory: F) -> Self
    where
        F: Fn(&ServiceContext) -> GatewayResult<ServiceBuild> + Send + Sync + 'static,
    {
        self.factories.insert(name, Box::new(factory));
        self
    }

    /// Returns the registered service names.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    fn entry(&self, name: &str) -> Option<(&'static str, &Factory)> {
        self.factories.get_key_value(name).map(|(k, v)| (*k, v))
    }
}

/// The per-request, lazily-populated service container.
///
/// Created fresh for every request after policy enforcement succeeds, and
/// discarded after cleanup. Never shared across requests.
pub struct ServiceRegistry {
    catalog: Arc<ServiceCatalog>,
    provider: Arc<dyn ResourceProvider>,
    environment: String,
    organization_id: Option<OrgId>,
    shared: OnceCell<Arc<dyn DataHandle>>,
    built: Mutex<HashMap<&'static str, Arc<dyn DomainService>>>,
    teardowns: Mutex<Vec<Teardown>>,
}

impl ServiceRegistry {
    /// Creates a registry for one request.
    pub fn new(
        catalog: Arc<ServiceCatalog>,
        provider: Arc<dyn ResourceProvider>,
        environment: String,
        organization_id: Option<OrgId>,
    ) -> Self {
        Self {
            catalog,
            provider,
            environment,
            organization_id,
            shared: OnceCell::new(),
            built: Mutex::new(HashMap::new()),
            teardowns: Mutex::new(Vec::new()),
        }
    }

    /// Returns the organization scope the registry was created with.
    pub fn organization_id(&self) -> Option<OrgId> {
        self.organization_id
    }

    /// Returns the shared data handle, acquiring it on first use.
    ///
    /// The handle's release is registered as a teardown exactly once, at
    /// acquisition.
    pub async fn shared_handle(&self) -> GatewayResult<Arc<dyn DataHandle>> {
        let handle = self
            .shared
            .get_or_try_init(|| async {
                let handle = self.provider.acquire().await?;
                let release = Arc::clone(&handle);
                self.register_teardown(move || {
                    Box::pin(async move { release.release().await }) as TeardownFuture
                });
                debug!("acquired shared data handle");
                Ok::<_, GatewayError>(handle)
            })
            .await?;
        Ok(Arc::clone(handle))
    }

    /// Returns the named service, constructing it on first access.
    ///
    /// Construction happens at most once per request per service; repeated
    /// accessors return the memoized instance.
    pub async fn get(&self, name: &str) -> GatewayResult<Arc<dyn DomainService>> {
        if let Some(existing) = self.built.lock().expect("registry lock").get(name) {
            return Ok(Arc::clone(existing));
        }

        let Some((key, factory)) = self.catalog.entry(name) else {
            return Err(GatewayError::Internal {
                message: format!("unknown service '{name}'"),
            });
        };

        let handle = self.shared_handle().await?;
        let context = ServiceContext {
            handle,
            environment: self.environment.clone(),
            organization_id: self.organization_id,
        };

        let build = factory(&context)?;
        if let Some(teardown) = build.teardown {
            self.register_teardown_boxed(teardown);
        }

        let mut built = self.built.lock().expect("registry lock");
        let service = built.entry(key).or_insert(build.service);
        debug!(service = name, "constructed domain service");
        Ok(Arc::clone(service))
    }

    /// Returns the named service downcast to its concrete type.
    pub async fn get_as<T: Send + Sync + 'static>(&self, name: &str) -> GatewayResult<Arc<T>> {
        let service = self.get(name).await?;
        service
            .into_any_arc()
            .downcast::<T>()
            .map_err(|_| GatewayError::Internal {
                message: format!("service '{name}' has an unexpected type"),
            })
    }

    /// Registers a teardown callback to run during cleanup.
    pub fn register_teardown<F>(&self, teardown: F)
    where
        F: FnOnce() -> TeardownFuture + Send + 'static,
    {
        self.register_teardown_boxed(Box::new(teardown));
    }

    fn register_teardown_boxed(&self, teardown: Teardown) {
        self.teardowns.lock().expect("registry lock").push(teardown);
    }

    /// Runs every registered teardown callback, concurrently.
    ///
    /// The teardown list is drained first, so a second call is a no-op; the
    /// orchestrator schedules cleanup exactly once per request regardless of
    /// outcome.
    pub async fn cleanup(&self) {
        let teardowns: Vec<Teardown> = {
            let mut guard = self.teardowns.lock().expect("registry lock");
            std::mem::take(&mut *guard)
        };

        if teardowns.is_empty() {
            return;
        }

        debug!(count = teardowns.len(), "running request teardowns");
        let mut set = JoinSet::new();
        for teardown in teardowns {
            set.spawn(teardown());
        }
        while let Some(result) = set.join_next().await {
            if let Err(err) = result {
                warn!(error = %err, "teardown task failed");
            }
        }
    }
}
