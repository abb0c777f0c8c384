//! Per-route security policy.
//!
//! This module provides the declarative policy surface route authors use:
//!
//! - [`Policy`] - per-route configuration (auth level, roles, org
//!   requirements, rate-limit tier, IP allowlist)
//! - [`AuthLevel`] - what kind of caller the route accepts
//! - [`enforce`] - the decision procedure run before anything else
//! - [`worker`] - shared-secret verification for worker callbacks
//!
//! # Example
//!
//! ```rust
//! use atelier_gateway::policy::Policy;
//! use atelier_core::types::UserRole;
//!
//! let policy = Policy::new()
//!     .roles([UserRole::Creator])
//!     .require_org_membership();
//! ```

pub mod enforce;
pub mod worker;

pub use enforce::{Enforcement, PolicyEnforcer, resolve_client_ip};
pub use worker::{SharedSecretVerifier, WorkerAuthenticated, X_SIGNATURE};

use std::collections::HashSet;
use std::net::IpAddr;

use atelier_core::types::UserRole;

/// What kind of caller a route accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthLevel {
    /// No authentication; the handler runs for anyone.
    None,
    /// Session resolved if present, but never required.
    Optional,
    /// A valid session is required.
    #[default]
    Required,
    /// Only trusted workers, verified by signature; never touches sessions.
    Worker,
    /// A session whose user holds the platform-owner role.
    PlatformOwner,
}

/// Rate-limit tier attached to a route.
///
/// Carried as declarative data for the edge rate limiter; the pipeline does
/// not enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateLimitTier {
    /// Default tier.
    #[default]
    Standard,
    /// Higher allowance for interactive endpoints.
    Elevated,
    /// No limiting (worker and internal endpoints).
    Unlimited,
}

/// Immutable per-route security configuration.
///
/// Built once per route and shared; merged with defaults, so a bare
/// `Policy::new()` means "authenticated user, no further requirements".
#[derive(Debug, Clone, Default)]
pub struct Policy {
    /// Required authentication level. Defaults to [`AuthLevel::Required`].
    pub auth: AuthLevel,
    /// Platform roles allowed to call the route; empty means any role.
    pub roles: HashSet<UserRole>,
    /// Require an active membership in the resolved organization.
    pub require_org_membership: bool,
    /// Additionally require an owner or admin role in the organization.
    pub require_org_management: bool,
    /// Rate-limit tier.
    pub rate_limit: RateLimitTier,
    /// Client IPs allowed to call the route; empty means any.
    pub allowed_ips: HashSet<IpAddr>,
}

impl Policy {
    /// Creates a policy with defaults (`auth = Required`, no restrictions).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the authentication level.
    pub fn auth(mut self, level: AuthLevel) -> Self {
        self.auth = level;
        self
    }

    /// Restricts the route to the given platform roles.
    pub fn roles(mut self, roles: impl IntoIterator<Item = UserRole>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    /// Requires an active membership in the request's organization.
    pub fn require_org_membership(mut self) -> Self {
        self.require_org_membership = true;
        self
    }

    /// Requires an owner or admin role in the request's organization.
    ///
    /// Implies membership.
    pub fn require_org_management(mut self) -> Self {
        self.require_org_membership = true;
        self.require_org_management = true;
        self
    }

    /// Sets the rate-limit tier.
    pub fn rate_limit(mut self, tier: RateLimitTier) -> Self {
        self.rate_limit = tier;
        self
    }

    /// Restricts the route to the given client IPs.
    pub fn allowed_ips(mut self, ips: impl IntoIterator<Item = IpAddr>) -> Self {
        self.allowed_ips = ips.into_iter().collect();
        self
    }

    /// Returns true if this policy needs an organization context.
    pub fn needs_org(&self) -> bool {
        self.require_org_membership || self.require_org_management
    }
}
