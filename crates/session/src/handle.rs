//! The surface the CRUD screens call into.
//!
//! Screens never touch the store or manager directly: they hold a cheap-clone
//! [`SessionHandle`] for "who am I / may I?" questions, and wrap protected
//! render paths in [`Guarded`].

use std::sync::Arc;

use slatecrm_auth::{AccessDecision, AccessGuard, EntityContext, Principal};
use slatecrm_core::SessionStatus;

use crate::store::{SessionStore, Subscription};

/// What a screen sees of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub principal: Option<Principal>,
    pub status: SessionStatus,
}

/// Read-only accessor over the session plus the access guard.
#[derive(Clone)]
pub struct SessionHandle {
    store: Arc<SessionStore>,
    guard: Arc<AccessGuard>,
}

impl SessionHandle {
    pub fn new(store: Arc<SessionStore>, guard: Arc<AccessGuard>) -> Self {
        Self { store, guard }
    }

    /// Current principal and status.
    pub fn current(&self) -> SessionSnapshot {
        let session = self.store.get();
        SessionSnapshot {
            principal: session.principal,
            status: session.status,
        }
    }

    /// Decide a navigation/action attempt against the current session.
    pub fn can_access(
        &self,
        route_key: &str,
        entity: Option<&EntityContext>,
    ) -> AccessDecision {
        let session = self.store.get();
        self.guard
            .decide(route_key, session.status, session.principal.as_ref(), entity)
    }

    /// Re-evaluate on every session change (synchronous, see
    /// [`SessionStore::subscribe`]).
    pub fn on_change(
        &self,
        callback: impl Fn(SessionSnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        self.store.subscribe(move |session| {
            callback(SessionSnapshot {
                principal: session.principal.clone(),
                status: session.status,
            })
        })
    }
}

/// Result of a guarded render attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome<T> {
    /// The guard allowed; the render closure ran.
    Rendered(T),
    /// Navigate to the login screen.
    RedirectLogin,
    /// Navigate to the dedicated "not permitted" view (not an error page).
    RedirectUnauthorized,
}

/// Wrapper that renders its content only when the guard allows.
pub struct Guarded;

impl Guarded {
    /// Run `render` iff access is allowed; otherwise report the redirect.
    pub fn evaluate<T>(
        handle: &SessionHandle,
        route_key: &str,
        entity: Option<&EntityContext>,
        render: impl FnOnce() -> T,
    ) -> GuardOutcome<T> {
        match handle.can_access(route_key, entity) {
            AccessDecision::Allow => GuardOutcome::Rendered(render()),
            AccessDecision::RedirectLogin => GuardOutcome::RedirectLogin,
            AccessDecision::RedirectUnauthorized => GuardOutcome::RedirectUnauthorized,
        }
    }
}
