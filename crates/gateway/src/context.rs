//! Request context handed to endpoint handlers.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use atelier_core::types::{OrgId, OrgRole, Session, User};

use crate::services::ServiceRegistry;
use crate::upload::FileField;

/// The validated, declared parts of the request.
///
/// Each part is present only when the route declared a schema for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedInput {
    /// Validated route parameters.
    pub params: Option<Value>,
    /// Validated query parameters.
    pub query: Option<Value>,
    /// Validated, parsed request body.
    pub body: Option<Value>,
}

/// Everything a handler receives about the request.
///
/// Field presence depends on the route's policy: `user` and `session` are
/// absent for unauthenticated and worker routes, and `organization_id` is
/// guaranteed present only when the policy required an organization (org
/// membership, or platform-owner auth). Handlers check, rather than assume.
pub struct RequestContext {
    /// The authenticated user, when the policy resolved one.
    pub user: Option<User>,
    /// The session backing that user.
    pub session: Option<Session>,
    /// The validated input parts.
    pub input: ValidatedInput,
    /// Request correlation id (incoming `x-request-id`, or freshly minted).
    pub request_id: String,
    /// Best-effort client IP ("unknown" when undeterminable).
    pub client_ip: String,
    /// The caller's User-Agent header, if present.
    pub user_agent: Option<String>,
    /// Organization context established by policy enforcement.
    pub organization_id: Option<OrgId>,
    /// The caller's role within that organization.
    pub organization_role: Option<OrgRole>,
    /// Extracted multipart file fields (multipart routes only).
    pub files: HashMap<String, FileField>,
    /// The per-request domain service registry.
    pub services: Arc<ServiceRegistry>,
}

impl RequestContext {
    /// Returns the authenticated user, or an internal error.
    ///
    /// For use by handlers whose policy guarantees a session; the error is
    /// a 500, not a 401, because reaching the handler without a user means
    /// the route's policy was declared wrong.
    pub fn expect_user(&self) -> Result<&User, crate::error::GatewayError> {
        self.user.as_ref().ok_or_else(|| crate::error::GatewayError::Internal {
            message: "handler requires a user but the policy does not guarantee one".to_string(),
        })
    }

    /// Returns the organization context, or an internal error.
    ///
    /// Same contract as [`RequestContext::expect_user`].
    pub fn expect_org(&self) -> Result<OrgId, crate::error::GatewayError> {
        self.organization_id.ok_or_else(|| crate::error::GatewayError::Internal {
            message: "handler requires an organization but the policy does not guarantee one"
                .to_string(),
        })
    }
}
