//! Shared data resource and domain service contracts.
//!
//! Every domain service built for a request shares one connection-like
//! handle, acquired lazily from a [`ResourceProvider`] and released exactly
//! once during request cleanup. The pipeline never inspects service
//! internals; it only constructs them and hands them to handlers.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::OrgId;

/// Errors surfaced when acquiring or releasing the shared resource.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The underlying resource could not be acquired.
    #[error("resource acquisition failed: {message}")]
    Acquire {
        /// Description of the acquisition failure.
        message: String,
    },
}

/// A connection-like handle shared by every service within one request.
///
/// Handles are never reused across requests and never shared concurrently
/// between requests; each request owns an isolated instance.
#[async_trait]
pub trait DataHandle: Send + Sync {
    /// Releases the handle. Called once, during request cleanup.
    async fn release(&self);
}

/// Produces per-request [`DataHandle`]s.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Acquires a fresh handle for one request.
    async fn acquire(&self) -> Result<Arc<dyn DataHandle>, ResourceError>;
}

/// Marker trait for request-scoped domain services.
///
/// Handlers downcast to the concrete service type via [`DomainService::as_any`]
/// or, for shared ownership, [`DomainService::into_any_arc`].
pub trait DomainService: Send + Sync {
    /// Upcasts to [`Any`] for downcasting in handlers.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts a shared service to [`Any`] for owned downcasting.
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Everything a domain service constructor receives.
#[derive(Clone)]
pub struct ServiceContext {
    /// The shared per-request data handle.
    pub handle: Arc<dyn DataHandle>,
    /// Deployment environment name ("development", "production", ...).
    pub environment: String,
    /// Organization scope, when the request has one.
    pub organization_id: Option<OrgId>,
}
