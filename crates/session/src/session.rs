//! The process-wide session value.

use serde::{Deserialize, Serialize};

use slatecrm_auth::Principal;
use slatecrm_core::SessionStatus;

/// Snapshot of the authenticated state.
///
/// Exactly one lives in the [`crate::SessionStore`]; everything else holds
/// clones. Only the session manager writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Session {
    pub principal: Option<Principal>,
    pub token: Option<String>,
    pub status: SessionStatus,
}

impl Session {
    /// The initial (and terminal-reachable) state.
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    /// A token exists but roles are not yet authoritative.
    pub fn roles_pending(token: impl Into<String>, principal: Option<Principal>) -> Self {
        Self {
            principal,
            token: Some(token.into()),
            status: SessionStatus::RolesPending,
        }
    }

    /// Fully resolved session.
    pub fn ready(principal: Principal, token: impl Into<String>) -> Self {
        Self {
            principal: Some(principal),
            token: Some(token.into()),
            status: SessionStatus::Ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status.is_ready()
    }
}
