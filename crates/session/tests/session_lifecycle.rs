//! End-to-end session lifecycle: login, persistence round-trip, cross-context
//! convergence, and guard decisions over live session state.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use slatecrm_auth::{AccessDecision, AccessGuard, EntityContext, RoleSet};
use slatecrm_core::{EntityKind, RecordId, SessionStatus, UserId};
use slatecrm_session::{
    AuthApi, AuthApiError, LoginOutcome, MemorySessionPersistence, SessionHandle, SessionManager,
    SessionStore, UserPayload,
};

struct StubAuth {
    token: String,
    roles: Vec<String>,
}

#[async_trait]
impl AuthApi for StubAuth {
    async fn login(&self, identifier: &str, _password: &str) -> Result<LoginOutcome, AuthApiError> {
        if identifier != "grace" {
            return Err(AuthApiError::Unauthorized);
        }
        let mut owned = std::collections::HashMap::new();
        owned.insert(
            EntityKind::Account,
            BTreeSet::from([RecordId::new(7), RecordId::new(9)]),
        );
        Ok(LoginOutcome {
            token: self.token.clone(),
            user: UserPayload {
                id: UserId::new(7),
                display_name: "Grace Vance".to_string(),
                owned_entity_ids: owned,
                team_member_ids: Default::default(),
            },
        })
    }

    async fn fetch_roles(&self, token: &str) -> Result<Vec<String>, AuthApiError> {
        if token != self.token {
            return Err(AuthApiError::Unauthorized);
        }
        Ok(self.roles.clone())
    }
}

fn stub_api() -> Arc<StubAuth> {
    slatecrm_observability::init();
    Arc::new(StubAuth {
        token: "tok-e2e".to_string(),
        roles: vec!["Sales Representative".to_string()],
    })
}

#[tokio::test]
async fn login_persist_hydrate_reproduces_role_set() {
    let persistence = MemorySessionPersistence::new();
    let store = Arc::new(SessionStore::new(Arc::new(persistence.clone())));
    let manager = SessionManager::new(store, stub_api());

    let principal = manager.login("grace", "pw").await.unwrap();

    // A later process start over the same persisted record.
    let fresh_store = Arc::new(SessionStore::new(Arc::new(persistence.another_context())));
    let fresh_manager = SessionManager::new(Arc::clone(&fresh_store), stub_api());
    fresh_manager.start().await.unwrap();

    let restored = fresh_store.get();
    assert_eq!(restored.status, SessionStatus::Ready);
    assert_eq!(restored.principal.unwrap().roles, principal.roles);
    fresh_manager.shutdown();
}

#[tokio::test]
async fn ownership_scoped_detail_navigation() {
    let store = Arc::new(SessionStore::new(Arc::new(MemorySessionPersistence::new())));
    let manager = SessionManager::new(Arc::clone(&store), stub_api());
    manager.login("grace", "pw").await.unwrap();

    let handle = SessionHandle::new(store, Arc::new(AccessGuard::stock()));

    let foreign = EntityContext::new(EntityKind::Account, RecordId::new(42));
    assert_eq!(
        handle.can_access("accounts.detail", Some(&foreign)),
        AccessDecision::RedirectUnauthorized
    );

    let owned = EntityContext::new(EntityKind::Account, RecordId::new(9));
    assert_eq!(
        handle.can_access("accounts.detail", Some(&owned)),
        AccessDecision::Allow
    );
}

#[tokio::test]
async fn logout_in_one_context_reaches_the_other() {
    let tab_a = MemorySessionPersistence::new();
    let tab_b = tab_a.another_context();

    let store_a = Arc::new(SessionStore::new(Arc::new(tab_a)));
    let manager_a = SessionManager::new(Arc::clone(&store_a), stub_api());
    manager_a.login("grace", "pw").await.unwrap();

    let store_b = Arc::new(SessionStore::new(Arc::new(tab_b)));
    let manager_b = SessionManager::new(Arc::clone(&store_b), stub_api());
    manager_b.start().await.unwrap();
    assert_eq!(store_b.get().status, SessionStatus::Ready);

    manager_a.logout();
    assert_eq!(store_b.get().status, SessionStatus::Unauthenticated);

    let handle_b = SessionHandle::new(store_b, Arc::new(AccessGuard::stock()));
    assert_eq!(
        handle_b.can_access("dashboard", None),
        AccessDecision::RedirectLogin
    );
    manager_b.shutdown();
}

#[tokio::test]
async fn bad_credentials_leave_no_trace() {
    let persistence = MemorySessionPersistence::new();
    let store = Arc::new(SessionStore::new(Arc::new(persistence.clone())));
    let manager = SessionManager::new(Arc::clone(&store), stub_api());

    assert!(manager.login("mallory", "pw").await.is_err());
    assert_eq!(store.get().status, SessionStatus::Unauthenticated);
    assert!(store.get().principal.is_none());

    // Roles on a missing principal stay an empty set, not an absent one.
    let roles = store
        .get()
        .principal
        .map(|p| p.roles)
        .unwrap_or_else(RoleSet::empty);
    assert!(roles.is_empty());
}
