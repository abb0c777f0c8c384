//! Tenant resolution from the request hostname.
//!
//! Organizations are served from their own subdomain
//! (`{slug}.atelier.studio`). The resolver derives an organization id from
//! a hostname by treating the first label as an organization slug and
//! looking it up in the directory.
//!
//! The contract is deliberately soft: this function never fails. Local
//! hosts, bare domains, reserved infrastructure labels, unknown slugs, and
//! directory errors all yield `None`. Callers that need a tenant treat
//! `None` as "no organization context", whatever the cause.

use std::sync::Arc;

use tracing::{debug, warn};

use atelier_core::directory::OrganizationDirectory;
use atelier_core::types::OrgId;

/// First labels that are infrastructure, never organization slugs.
const RESERVED_SUBDOMAINS: &[&str] = &[
    "www", "api", "app", "admin", "cdn", "assets", "uploads", "status", "staging",
];

/// Hostnames used in local development, never tenant hosts.
const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "::1"];

/// Resolves organization context from request hostnames.
pub struct TenantResolver {
    directory: Arc<dyn OrganizationDirectory>,
}

impl TenantResolver {
    /// Creates a resolver over the organization directory.
    pub fn new(directory: Arc<dyn OrganizationDirectory>) -> Self {
        Self { directory }
    }

    /// Derives an organization id from a hostname, if it names a tenant.
    ///
    /// Never fails: directory errors are logged and collapse to `None`,
    /// indistinguishable from "not a tenant host".
    pub async fn resolve_org_from_host(&self, hostname: &str) -> Option<OrgId> {
        let slug = candidate_slug(hostname)?;

        match self.directory.org_by_slug(slug).await {
            Ok(Some(org)) => {
                debug!(slug = %slug, org_id = %org.id, "resolved tenant from hostname");
                Some(org.id)
            }
            Ok(None) => {
                debug!(slug = %slug, "no organization for subdomain");
                None
            }
            Err(err) => {
                warn!(slug = %slug, error = %err, "tenant lookup failed");
                None
            }
        }
    }
}

/// Extracts the slug candidate from a hostname, if any.
///
/// Local hosts and hostnames with fewer than three labels have no tenant
/// context; reserved infrastructure labels are not slugs.
fn candidate_slug(hostname: &str) -> Option<&str> {
    // The Host header may carry a port.
    let host = hostname.split(':').next().unwrap_or(hostname);

    if host.is_empty() || LOCAL_HOSTS.contains(&host) {
        return None;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 3 {
        return None;
    }

    let first = labels[0];
    if RESERVED_SUBDOMAINS.contains(&first) {
        return None;
    }

    if !is_valid_slug(first) {
        return None;
    }

    Some(first)
}

/// Validates that a label is a plausible organization slug.
fn is_valid_slug(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 64
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use atelier_core::directory::DirectoryError;
    use atelier_core::types::{Membership, Organization, UserId};

    struct StubDirectory {
        org: Option<Organization>,
        fail: bool,
    }

    #[async_trait]
    impl OrganizationDirectory for StubDirectory {
        async fn org_by_slug(&self, slug: &str) -> Result<Option<Organization>, DirectoryError> {
            if self.fail {
                return Err(DirectoryError::Unavailable {
                    message: "stub outage".to_string(),
                });
            }
            Ok(self.org.clone().filter(|o| o.slug == slug))
        }

        async fn membership(
            &self,
            _org_id: OrgId,
            _user_id: UserId,
        ) -> Result<Option<Membership>, DirectoryError> {
            Ok(None)
        }

        async fn primary_membership(
            &self,
            _user_id: UserId,
        ) -> Result<Option<(OrgId, Membership)>, DirectoryError> {
            Ok(None)
        }
    }

    fn resolver_with(org: Option<Organization>, fail: bool) -> TenantResolver {
        TenantResolver::new(Arc::new(StubDirectory { org, fail }))
    }

    fn acme() -> Organization {
        Organization {
            id: OrgId::random(),
            slug: "acme".to_string(),
            name: "Acme Studio".to_string(),
        }
    }

    #[tokio::test]
    async fn test_resolves_known_slug() {
        let org = acme();
        let resolver = resolver_with(Some(org.clone()), false);
        let resolved = resolver.resolve_org_from_host("acme.atelier.studio").await;
        assert_eq!(resolved, Some(org.id));
    }

    #[tokio::test]
    async fn test_unknown_slug_is_none() {
        let resolver = resolver_with(Some(acme()), false);
        assert_eq!(resolver.resolve_org_from_host("ghost.atelier.studio").await, None);
    }

    #[tokio::test]
    async fn test_lookup_failure_degrades_to_none() {
        let resolver = resolver_with(Some(acme()), true);
        assert_eq!(resolver.resolve_org_from_host("acme.atelier.studio").await, None);
    }

    #[tokio::test]
    async fn test_reserved_subdomains() {
        let resolver = resolver_with(Some(acme()), false);
        assert_eq!(resolver.resolve_org_from_host("www.atelier.studio").await, None);
        assert_eq!(resolver.resolve_org_from_host("api.atelier.studio").await, None);
    }

    #[test]
    fn test_candidate_slug_local_hosts() {
        assert_eq!(candidate_slug("localhost"), None);
        assert_eq!(candidate_slug("localhost:3000"), None);
        assert_eq!(candidate_slug("127.0.0.1"), None);
    }

    #[test]
    fn test_candidate_slug_needs_three_labels() {
        assert_eq!(candidate_slug("atelier.studio"), None);
        assert_eq!(candidate_slug("acme.atelier.studio"), Some("acme"));
        assert_eq!(candidate_slug("acme.atelier.studio:8080"), Some("acme"));
    }

    #[test]
    fn test_candidate_slug_rejects_invalid_labels() {
        assert_eq!(candidate_slug("we%rd.atelier.studio"), None);
        let long = format!("{}.atelier.studio", "a".repeat(80));
        assert_eq!(candidate_slug(&long), None);
    }
}
