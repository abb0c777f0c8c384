//! Organization directory contract.
//!
//! Lookup of organizations and memberships. Implementations are expected to
//! be backed by the platform database; the pipeline only depends on this
//! narrow read-side interface.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Membership, OrgId, Organization, UserId};

/// Errors surfaced by the organization directory.
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// The directory backend could not be reached or failed mid-query.
    #[error("directory unavailable: {message}")]
    Unavailable {
        /// Description of the backend failure.
        message: String,
    },
}

/// Read-side lookup of organizations and memberships.
#[async_trait]
pub trait OrganizationDirectory: Send + Sync {
    /// Looks up an organization by its subdomain slug.
    async fn org_by_slug(&self, slug: &str) -> Result<Option<Organization>, DirectoryError>;

    /// Looks up one user's membership in one organization.
    async fn membership(
        &self,
        org_id: OrgId,
        user_id: UserId,
    ) -> Result<Option<Membership>, DirectoryError>;

    /// Returns the user's own (home) membership row, if any.
    ///
    /// Used when a platform owner calls an org-scoped endpoint without an
    /// explicit target organization.
    async fn primary_membership(
        &self,
        user_id: UserId,
    ) -> Result<Option<(OrgId, Membership)>, DirectoryError>;
}
