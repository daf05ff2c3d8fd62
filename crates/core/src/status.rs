//! Session lifecycle status.

use serde::{Deserialize, Serialize};

/// Lifecycle state of the process-wide session.
///
/// # State machine
/// ```text
/// Unauthenticated --login success-----> RolesPending --roles fetched--> Ready
/// Unauthenticated --hydrated token----> RolesPending
/// RolesPending    --fetch unauthorized-> Unauthenticated
/// Ready           --refresh unauthorized-> Unauthenticated
/// Ready | RolesPending --logout-------> Unauthenticated
/// ```
/// `Unauthenticated` is both the initial state and the only terminal-reachable
/// one; the process oscillates between `Unauthenticated` and `Ready`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No token; nothing is authorized.
    #[default]
    Unauthenticated,
    /// A token exists but the authoritative role set has not arrived yet.
    /// Guards must treat this as *not decidable*, never as allowed.
    RolesPending,
    /// Principal and roles are resolved; guards may decide.
    Ready,
    /// The persisted record or token was rejected; awaiting logout/cleanup.
    Invalid,
}

impl SessionStatus {
    /// True only for `Ready`; the single predicate guards consult.
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionStatus::Ready)
    }
}

impl core::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SessionStatus::Unauthenticated => write!(f, "unauthenticated"),
            SessionStatus::RolesPending => write!(f, "roles_pending"),
            SessionStatus::Ready => write!(f, "ready"),
            SessionStatus::Invalid => write!(f, "invalid"),
        }
    }
}
