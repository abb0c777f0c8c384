//! Authentication collaborator contracts.
//!
//! The pipeline never issues or parses credentials itself. Session
//! resolution and worker verification are supplied by implementations of
//! the traits below, injected through the gateway's platform state.

use async_trait::async_trait;
use http::HeaderMap;
use thiserror::Error;

use crate::types::{Session, User};

/// A resolved session together with its user.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    /// The authenticated user.
    pub user: User,
    /// The session that authenticated them.
    pub session: Session,
}

/// Errors surfaced by authentication collaborators.
///
/// "No session" is not an error: [`SessionResolver::resolve`] returns
/// `Ok(None)` for it. Errors are reserved for transport failures.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The session store could not be reached.
    #[error("session store unavailable: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },
}

/// Resolves a session from request headers.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Attempts to resolve the session presented by the request.
    ///
    /// Returns `Ok(None)` when no valid session is present; `Err` only for
    /// transport failure.
    async fn resolve(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<AuthenticatedSession>, AuthError>;
}

/// Verifies that a request originates from a trusted worker.
pub trait WorkerVerifier: Send + Sync {
    /// Returns true if the request carries a valid worker credential for
    /// the given raw body.
    fn verify(&self, headers: &HeaderMap, body: &[u8]) -> bool;
}
