//! Session lifecycle error taxonomy.

use thiserror::Error;

/// Errors surfaced by the session manager.
///
/// Lifecycle errors always resolve to a definite session status before the
/// error is returned; callers never observe a session stuck in
/// `RolesPending`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Login failed. Deliberately generic: bad identifier, bad password and
    /// network trouble during login all collapse here so the UI cannot leak
    /// which part of the check failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The token was rejected during a role refresh; the session has been
    /// cleared. The UI redirects to login silently.
    #[error("session expired")]
    SessionExpired,

    /// The persisted record could not be parsed at hydrate time. Never shown
    /// to the user; hydration degrades to an unauthenticated session.
    #[error("malformed persisted session")]
    MalformedPersistedSession,

    /// A fetch failed for transport reasons outside login/startup; the
    /// session is left unchanged and the call site may retry.
    #[error("network error: {0}")]
    Network(String),
}
