//! Core identity and tenancy types.
//!
//! These types model the platform's multi-tenancy boundary: users hold a
//! platform-wide role, organizations are the tenant boundary, and
//! memberships tie one user to one organization with an organization-level
//! role.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a platform user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Creates a new random user identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for an organization (the multi-tenancy boundary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(pub Uuid);

impl OrgId {
    /// Creates a new random organization identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an organization id from a string, if it is UUID-shaped.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform-wide role attached to a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Ordinary consumer account.
    User,
    /// Account allowed to publish content.
    Creator,
    /// Cross-tenant administrative role with org-override capability.
    PlatformOwner,
}

impl UserRole {
    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Creator => "creator",
            UserRole::PlatformOwner => "platform_owner",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role a member holds inside one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgRole {
    /// Organization owner.
    Owner,
    /// Organization administrator.
    Admin,
    /// Regular member.
    Member,
    /// Synthetic role recorded when a platform owner adopts an organization
    /// context without an explicit membership check.
    PlatformOwner,
}

impl OrgRole {
    /// Returns true for roles that may manage the organization.
    pub fn can_manage(&self) -> bool {
        matches!(self, OrgRole::Owner | OrgRole::Admin)
    }

    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgRole::Owner => "owner",
            OrgRole::Admin => "admin",
            OrgRole::Member => "member",
            OrgRole::PlatformOwner => "platform_owner",
        }
    }
}

impl fmt::Display for OrgRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Membership grants access.
    Active,
    /// Invitation sent, not yet accepted.
    Invited,
    /// Membership revoked or suspended.
    Revoked,
}

/// A platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Primary email address.
    pub email: String,
    /// Platform-wide role.
    pub role: UserRole,
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session identifier.
    pub id: String,
    /// User the session belongs to.
    pub user_id: UserId,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
}

/// An organization (tenant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Unique organization identifier.
    pub id: OrgId,
    /// URL-safe slug used as the tenant subdomain.
    pub slug: String,
    /// Display name.
    pub name: String,
}

/// The relationship between one user and one organization.
///
/// Only memberships with [`MembershipStatus::Active`] grant access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// Role held inside the organization.
    pub role: OrgRole,
    /// Lifecycle state.
    pub status: MembershipStatus,
    /// When the membership was created.
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    /// Returns true if this membership currently grants access.
    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }
}
