//! # atelier-core - Shared Platform Contracts
//!
//! This crate defines the domain types and collaborator contracts shared by
//! the Atelier request pipeline and the services that plug into it. It is
//! deliberately thin: concrete session stores, organization directories, and
//! data backends live elsewhere and are injected through the traits defined
//! here, so the pipeline crate and the implementation crates never need to
//! import each other.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`types`] - Identifiers, users, sessions, organizations, memberships
//! - [`auth`] - Session resolution and worker verification contracts
//! - [`directory`] - Organization and membership lookup contract
//! - [`resource`] - Shared data resource and domain service contracts
//! - [`schema`] - Input schema contract and field violations
//!
//! # Example
//!
//! ```rust,ignore
//! use atelier_core::directory::OrganizationDirectory;
//! use atelier_core::types::{OrgId, UserId};
//!
//! async fn is_member(
//!     directory: &dyn OrganizationDirectory,
//!     org: OrgId,
//!     user: UserId,
//! ) -> bool {
//!     matches!(directory.membership(org, user).await, Ok(Some(m)) if m.is_active())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod auth;
pub mod directory;
pub mod resource;
pub mod schema;
pub mod types;

pub use auth::{AuthError, AuthenticatedSession, SessionResolver, WorkerVerifier};
pub use directory::{DirectoryError, OrganizationDirectory};
pub use resource::{DataHandle, DomainService, ResourceError, ResourceProvider, ServiceContext};
pub use schema::{InputSchema, Violation};
pub use types::{
    Membership, MembershipStatus, OrgId, OrgRole, Organization, Session, User, UserId, UserRole,
};
