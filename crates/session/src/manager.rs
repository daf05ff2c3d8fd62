//! Login, logout, and role refresh against the auth API.
//!
//! The manager is the only writer of the [`SessionStore`]. Every operation
//! leaves the session in a definite state; in particular no path exits with
//! the session still `RolesPending`.

use std::sync::{Arc, Mutex};

use slatecrm_auth::{Principal, RoleSet};
use slatecrm_core::SessionStatus;

use crate::client::{AuthApi, AuthApiError, HttpAuthApi, UserPayload};
use crate::config::SessionConfig;
use crate::error::AuthError;
use crate::persist::{ChangeWatch, FileSessionPersistence, PersistError};
use crate::session::Session;
use crate::store::SessionStore;

/// Orchestrates the session lifecycle.
pub struct SessionManager {
    store: Arc<SessionStore>,
    api: Arc<dyn AuthApi>,
    external_watch: Mutex<Option<ChangeWatch>>,
}

impl SessionManager {
    pub fn new(store: Arc<SessionStore>, api: Arc<dyn AuthApi>) -> Self {
        Self {
            store,
            api,
            external_watch: Mutex::new(None),
        }
    }

    /// Wire up the default collaborators: file persistence under the OS data
    /// dir and the HTTP auth client.
    pub fn from_config(config: &SessionConfig) -> Result<Self, PersistError> {
        let persistence = FileSessionPersistence::new(&config.storage_namespace)?;
        let store = Arc::new(SessionStore::new(Arc::new(persistence)));
        let api = Arc::new(HttpAuthApi::new(config.api_base_url.clone()));
        Ok(Self::new(store, api))
    }

    pub fn store(&self) -> Arc<SessionStore> {
        Arc::clone(&self.store)
    }

    /// Authenticate and resolve the authoritative role set.
    ///
    /// The role fetch is not optional: a principal with unresolved roles is
    /// never `Ready`. Every failure — bad credentials, network trouble on
    /// either call — collapses to [`AuthError::InvalidCredentials`] so the UI
    /// cannot leak which part of the check failed; the underlying cause is
    /// logged at debug.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<Principal, AuthError> {
        let outcome = match self.api.login(identifier, password).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!(error = %e, "login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let preliminary = principal_from_payload(&outcome.user);
        self.store
            .set(Session::roles_pending(outcome.token.clone(), Some(preliminary)));

        match self.api.fetch_roles(&outcome.token).await {
            Ok(labels) => {
                let principal =
                    principal_from_payload(&outcome.user).with_roles(RoleSet::from_labels(labels));
                tracing::info!(user = %principal.user_id, "login complete");
                self.store
                    .set(Session::ready(principal.clone(), outcome.token));
                Ok(principal)
            }
            Err(e) => {
                tracing::debug!(error = %e, "post-login role fetch failed");
                self.store.set(Session::unauthenticated());
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Clear the session and the persisted record.
    ///
    /// Callable with or without an active session.
    pub fn logout(&self) {
        tracing::info!("logout");
        self.store.set(Session::unauthenticated());
    }

    /// Re-fetch the role set for the current token.
    ///
    /// - No token: roles become the empty set, `Ok`.
    /// - Token rejected: fatal; the session is cleared — a revoked token is
    ///   never retried silently.
    /// - Other network failure: the session is left unchanged, except while
    ///   still `RolesPending` (startup revalidation), where the session is
    ///   cleared so it cannot stick in the pending state.
    pub async fn refresh_roles(&self) -> Result<(), AuthError> {
        let current = self.store.get();
        let Some(token) = current.token.clone() else {
            if let Some(principal) = current.principal {
                self.store.set(Session {
                    principal: Some(principal.with_roles(RoleSet::empty())),
                    token: None,
                    status: current.status,
                });
            }
            return Ok(());
        };

        match self.api.fetch_roles(&token).await {
            Ok(labels) => {
                let Some(principal) = current.principal else {
                    // A token without an identity cannot become Ready.
                    tracing::warn!("token present without principal, clearing session");
                    self.store.set(Session::unauthenticated());
                    return Err(AuthError::SessionExpired);
                };
                let principal = principal.with_roles(RoleSet::from_labels(labels));
                self.store.set(Session::ready(principal, token));
                Ok(())
            }
            Err(AuthApiError::Unauthorized) => {
                tracing::info!("token rejected during role refresh, clearing session");
                self.store.set(Session::unauthenticated());
                Err(AuthError::SessionExpired)
            }
            Err(e) => {
                if current.status == SessionStatus::RolesPending {
                    tracing::warn!(error = %e, "startup role refresh failed, clearing session");
                    self.store.set(Session::unauthenticated());
                    Err(AuthError::SessionExpired)
                } else {
                    tracing::warn!(error = %e, "role refresh failed, session unchanged");
                    Err(AuthError::Network(e.to_string()))
                }
            }
        }
    }

    /// Process-start sequence: hydrate, register the cross-context change
    /// subscription, and revalidate a recovered token before anything is
    /// considered `Ready`.
    pub async fn start(&self) -> Result<(), AuthError> {
        let hydrated = self.store.hydrate();

        let watch = self.store().watch_external();
        *self
            .external_watch
            .lock()
            .expect("watch lock poisoned") = Some(watch);

        if hydrated.token.is_some() {
            self.refresh_roles().await?;
        }
        Ok(())
    }

    /// Tear down the cross-context change subscription.
    pub fn shutdown(&self) {
        *self
            .external_watch
            .lock()
            .expect("watch lock poisoned") = None;
    }
}

fn principal_from_payload(user: &UserPayload) -> Principal {
    let mut principal = Principal::new(user.id, user.display_name.clone())
        .with_teammates(user.team_member_ids.iter().copied());
    principal.owned = user.owned_entity_ids.clone();
    principal
}
