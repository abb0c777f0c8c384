//! Policy enforcement.
//!
//! Runs the authentication/authorization decision procedure for one request,
//! strictly before any domain service is constructed or any handler code
//! runs. The checks run in a fixed order:
//!
//! 1. IP allowlist
//! 2. `AuthLevel::None` short-circuit
//! 3. Worker signature verification
//! 4. Session resolution
//! 5. Platform-owner role and home-organization adoption
//! 6. Role check
//! 7. Organization membership / management

use std::collections::HashMap;

use axum::http::{header, request::Parts};
use tracing::{debug, warn};

use atelier_core::auth::AuthenticatedSession;
use atelier_core::types::{OrgId, OrgRole, UserRole};

use crate::error::{GatewayError, GatewayResult};
use crate::policy::worker::WorkerAuthenticated;
use crate::policy::{AuthLevel, Policy};
use crate::state::PlatformState;
use crate::tenant::TenantResolver;

/// Trusted edge header set by the CDN in front of the platform.
pub const EDGE_IP_HEADER: &str = "cf-connecting-ip";

/// Standard proxy header, consulted when the edge header is absent.
pub const PROXY_IP_HEADER: &str = "x-forwarded-for";

/// Route parameters that may carry an explicit organization target.
const ORG_PARAM_NAMES: &[&str] = &["organization_id", "org_id", "id"];

/// Resolves the client IP from request headers.
///
/// Prefers the trusted edge header, then the first entry of the proxy
/// header, then `"unknown"`.
pub fn resolve_client_ip(parts: &Parts) -> String {
    if let Some(ip) = parts
        .headers
        .get(EDGE_IP_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        return ip.trim().to_string();
    }

    if let Some(forwarded) = parts
        .headers
        .get(PROXY_IP_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    "unknown".to_string()
}

/// Returns the hostname the request was addressed to, without the port.
fn request_host(parts: &Parts) -> Option<String> {
    let raw = parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| parts.uri.host().map(str::to_string))?;

    Some(raw.split(':').next().unwrap_or(&raw).to_string())
}

/// Finds a UUID-shaped organization id among the route parameters.
fn explicit_org_param(path_params: &HashMap<String, String>) -> Option<OrgId> {
    ORG_PARAM_NAMES
        .iter()
        .find_map(|name| path_params.get(*name).and_then(|v| OrgId::parse(v)))
}

/// What policy enforcement established about the request.
#[derive(Debug, Default)]
pub struct Enforcement {
    /// The resolved session, when one was required or present.
    pub session: Option<AuthenticatedSession>,
    /// The organization context, when the policy established one.
    pub organization_id: Option<OrgId>,
    /// The caller's role within that organization.
    pub organization_role: Option<OrgRole>,
}

/// Executes the authorization decision procedure against one request.
pub struct PolicyEnforcer<'a> {
    state: &'a PlatformState,
}

impl<'a> PolicyEnforcer<'a> {
    /// Creates an enforcer over the platform state.
    pub fn new(state: &'a PlatformState) -> Self {
        Self { state }
    }

    /// Runs the decision procedure.
    ///
    /// Returns what was established about the caller, or the first typed
    /// error in check order. `body` is the raw request body, needed only
    /// for worker signature verification.
    pub async fn enforce(
        &self,
        policy: &Policy,
        parts: &Parts,
        path_params: &HashMap<String, String>,
        body: &[u8],
    ) -> GatewayResult<Enforcement> {
        // 1. IP allowlist.
        if !policy.allowed_ips.is_empty() {
            let client_ip = resolve_client_ip(parts);
            let allowed = client_ip
                .parse()
                .map(|ip| policy.allowed_ips.contains(&ip))
                .unwrap_or(false);
            if !allowed {
                warn!(client_ip = %client_ip, "request from non-allowlisted address");
                return Err(GatewayError::Forbidden {
                    message: "Address not allowed".to_string(),
                });
            }
        }

        // 2. Unauthenticated routes skip everything else.
        if policy.auth == AuthLevel::None {
            return Ok(Enforcement::default());
        }

        // 3. Worker routes verify a body signature and never touch sessions.
        if policy.auth == AuthLevel::Worker {
            if parts.extensions.get::<WorkerAuthenticated>().is_some() {
                debug!("request already worker-authenticated upstream");
                return Ok(Enforcement::default());
            }
            if self.state.workers().verify(&parts.headers, body) {
                return Ok(Enforcement::default());
            }
            return Err(GatewayError::Unauthorized {
                message: "Invalid worker credentials".to_string(),
            });
        }

        // 4. Session resolution.
        let session = self.state.sessions().resolve(&parts.headers).await?;

        if policy.auth == AuthLevel::Optional {
            // Optional routes proceed with or without a caller, and perform
            // no further checks.
            return Ok(Enforcement {
                session,
                ..Enforcement::default()
            });
        }

        let Some(resolved) = session else {
            return Err(GatewayError::Unauthorized {
                message: "Authentication required".to_string(),
            });
        };

        let user = resolved.user.clone();
        let mut enforcement = Enforcement {
            session: Some(resolved),
            organization_id: None,
            organization_role: None,
        };

        // 5. Platform-owner routes: role check, then organization context.
        // An explicit target wins; otherwise the owner defaults to their
        // home organization, when they have one.
        if policy.auth == AuthLevel::PlatformOwner {
            if user.role != UserRole::PlatformOwner {
                return Err(GatewayError::Forbidden {
                    message: "Platform owner access required".to_string(),
                });
            }

            if let Some(org_id) = explicit_org_param(path_params) {
                enforcement.organization_id = Some(org_id);
                enforcement.organization_role = Some(OrgRole::PlatformOwner);
            } else if let Some((org_id, _membership)) =
                self.state.directory().primary_membership(user.id).await?
            {
                debug!(org_id = %org_id, "platform owner adopting home organization");
                enforcement.organization_id = Some(org_id);
                enforcement.organization_role = Some(OrgRole::PlatformOwner);
            }
        }

        // 6. Role check.
        if !policy.roles.is_empty() && !policy.roles.contains(&user.role) {
            debug!(role = %user.role, "role not permitted for route");
            return Err(GatewayError::Forbidden {
                message: "Insufficient role".to_string(),
            });
        }

        // 7. Organization membership / management.
        if policy.needs_org() && enforcement.organization_id.is_none() {
            if let Some(org_id) = explicit_org_param(path_params) {
                // Administrative override: platform owners may target any
                // organization directly, bypassing membership verification.
                if user.role != UserRole::PlatformOwner {
                    return Err(GatewayError::Forbidden {
                        message: "Organization override not permitted".to_string(),
                    });
                }
                enforcement.organization_id = Some(org_id);
                enforcement.organization_role = Some(OrgRole::PlatformOwner);
            } else {
                let resolver = TenantResolver::new(self.state.directory_arc());
                let org_id = match request_host(parts) {
                    Some(host) => resolver.resolve_org_from_host(&host).await,
                    None => None,
                };
                let Some(org_id) = org_id else {
                    return Err(GatewayError::validation("Organization context required"));
                };

                let membership = self.state.directory().membership(org_id, user.id).await?;
                let Some(membership) = membership.filter(|m| m.is_active()) else {
                    return Err(GatewayError::Forbidden {
                        message: "Not a member of this organization".to_string(),
                    });
                };
                if policy.require_org_management && !membership.role.can_manage() {
                    return Err(GatewayError::Forbidden {
                        message: "Organization management role required".to_string(),
                    });
                }

                enforcement.organization_id = Some(org_id);
                enforcement.organization_role = Some(membership.role);
            }
        }

        Ok(enforcement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request, Uri};

    fn make_parts(path: &str, headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri(Uri::try_from(path).unwrap());
        for (name, value) in headers {
            builder = builder.header(*name, HeaderValue::from_str(value).unwrap());
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_client_ip_prefers_edge_header() {
        let parts = make_parts(
            "/content",
            &[
                (EDGE_IP_HEADER, "203.0.113.9"),
                (PROXY_IP_HEADER, "198.51.100.1, 10.0.0.1"),
            ],
        );
        assert_eq!(resolve_client_ip(&parts), "203.0.113.9");
    }

    #[test]
    fn test_client_ip_falls_back_to_proxy_header() {
        let parts = make_parts("/content", &[(PROXY_IP_HEADER, "198.51.100.1, 10.0.0.1")]);
        assert_eq!(resolve_client_ip(&parts), "198.51.100.1");
    }

    #[test]
    fn test_client_ip_unknown() {
        let parts = make_parts("/content", &[]);
        assert_eq!(resolve_client_ip(&parts), "unknown");
    }

    #[test]
    fn test_request_host_strips_port() {
        let parts = make_parts("/content", &[("host", "acme.atelier.studio:8443")]);
        assert_eq!(request_host(&parts).as_deref(), Some("acme.atelier.studio"));
    }

    #[test]
    fn test_explicit_org_param() {
        let org = OrgId::random();
        let mut params = HashMap::new();
        params.insert("id".to_string(), org.to_string());
        assert_eq!(explicit_org_param(&params), Some(org));

        let mut params = HashMap::new();
        params.insert("id".to_string(), "slug-not-uuid".to_string());
        assert_eq!(explicit_org_param(&params), None);
    }

    #[test]
    fn test_explicit_org_param_prefers_organization_id() {
        let org_a = OrgId::random();
        let org_b = OrgId::random();
        let mut params = HashMap::new();
        params.insert("organization_id".to_string(), org_a.to_string());
        params.insert("id".to_string(), org_b.to_string());
        assert_eq!(explicit_org_param(&params), Some(org_a));
    }
}
