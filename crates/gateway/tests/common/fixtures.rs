//! In-memory collaborator implementations for pipeline tests.
//!
//! These stand in for the real session store, organization directory, and
//! data backend. Each keeps counters so tests can assert what the pipeline
//! did (and did not) touch.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use uuid::Uuid;

use atelier_core::auth::{AuthError, AuthenticatedSession, SessionResolver};
use atelier_core::directory::{DirectoryError, OrganizationDirectory};
use atelier_core::resource::{DataHandle, DomainService, ResourceError, ResourceProvider};
use atelier_core::types::{
    Membership, MembershipStatus, OrgId, OrgRole, Organization, Session, User, UserId, UserRole,
};

/// Builds a user with the given role.
pub fn user_with_role(role: UserRole) -> User {
    User {
        id: UserId::random(),
        email: format!("{}@example.com", Uuid::new_v4()),
        role,
    }
}

/// Token-keyed in-memory session store.
#[derive(Default)]
pub struct MemorySessions {
    sessions: Mutex<HashMap<String, AuthenticatedSession>>,
}

impl MemorySessions {
    /// Issues a bearer token for the user and stores the session.
    pub fn issue(&self, user: &User) -> String {
        let token = format!("tok-{}", Uuid::new_v4());
        let session = Session {
            id: format!("sess-{}", Uuid::new_v4()),
            user_id: user.id,
            expires_at: Utc::now() + Duration::hours(1),
        };
        self.sessions.lock().unwrap().insert(
            token.clone(),
            AuthenticatedSession {
                user: user.clone(),
                session,
            },
        );
        token
    }
}

#[async_trait]
impl SessionResolver for MemorySessions {
    async fn resolve(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<AuthenticatedSession>, AuthError> {
        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "));
        let Some(token) = token else {
            return Ok(None);
        };
        Ok(self.sessions.lock().unwrap().get(token).cloned())
    }
}

/// In-memory organization directory with failure injection.
#[derive(Default)]
pub struct MemoryDirectory {
    orgs: Mutex<Vec<Organization>>,
    memberships: Mutex<Vec<(OrgId, UserId, Membership)>>,
    fail_lookups: AtomicBool,
}

impl MemoryDirectory {
    /// Registers an organization under a slug.
    pub fn add_org(&self, slug: &str) -> Organization {
        let org = Organization {
            id: OrgId::random(),
            slug: slug.to_string(),
            name: format!("{slug} studio"),
        };
        self.orgs.lock().unwrap().push(org.clone());
        org
    }

    /// Registers a membership.
    pub fn add_membership(
        &self,
        org_id: OrgId,
        user_id: UserId,
        role: OrgRole,
        status: MembershipStatus,
    ) {
        self.memberships.lock().unwrap().push((
            org_id,
            user_id,
            Membership {
                role,
                status,
                joined_at: Utc::now(),
            },
        ));
    }

    /// Makes every subsequent lookup fail.
    pub fn fail_lookups(&self) {
        self.fail_lookups.store(true, Ordering::SeqCst);
    }

    fn check_failure(&self) -> Result<(), DirectoryError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable {
                message: "injected outage".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl OrganizationDirectory for MemoryDirectory {
    async fn org_by_slug(&self, slug: &str) -> Result<Option<Organization>, DirectoryError> {
        self.check_failure()?;
        Ok(self
            .orgs
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.slug == slug)
            .cloned())
    }

    async fn membership(
        &self,
        org_id: OrgId,
        user_id: UserId,
    ) -> Result<Option<Membership>, DirectoryError> {
        self.check_failure()?;
        Ok(self
            .memberships
            .lock()
            .unwrap()
            .iter()
            .find(|(o, u, _)| *o == org_id && *u == user_id)
            .map(|(_, _, m)| m.clone()))
    }

    async fn primary_membership(
        &self,
        user_id: UserId,
    ) -> Result<Option<(OrgId, Membership)>, DirectoryError> {
        self.check_failure()?;
        Ok(self
            .memberships
            .lock()
            .unwrap()
            .iter()
            .find(|(_, u, _)| *u == user_id)
            .map(|(o, _, m)| (*o, m.clone())))
    }
}

/// Data handle that counts releases.
pub struct CountingHandle {
    released: Arc<AtomicUsize>,
}

#[async_trait]
impl DataHandle for CountingHandle {
    async fn release(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Resource provider that counts acquisitions and releases.
#[derive(Default)]
pub struct CountingResources {
    acquired: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl CountingResources {
    /// Number of handles acquired so far.
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Number of handles released so far.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceProvider for CountingResources {
    async fn acquire(&self) -> Result<Arc<dyn DataHandle>, ResourceError> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(CountingHandle {
            released: Arc::clone(&self.released),
        }))
    }
}

/// Minimal domain service used by test catalogs.
pub struct ContentService {
    /// The organization scope the service was constructed with.
    pub organization_id: Option<OrgId>,
    /// The environment name passed to the constructor.
    pub environment: String,
}

impl DomainService for ContentService {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
