//! The single mutable, shared piece of state in the core.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use slatecrm_core::SessionStatus;

use crate::persist::{ChangeWatch, PersistedSession, SessionPersistence};
use crate::session::Session;

type SubscriberCallback = Box<dyn Fn(&Session) + Send + Sync>;

struct Subscriber {
    id: u64,
    callback: SubscriberCallback,
}

/// Subscription handle; drop to unsubscribe.
pub struct Subscription {
    id: u64,
    subscribers: Weak<Mutex<Vec<Subscriber>>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers
                .lock()
                .expect("subscriber lock poisoned")
                .retain(|s| s.id != self.id);
        }
    }
}

/// Holds the process-wide [`Session`].
///
/// `set` persists the serializable subset through the persistence
/// collaborator and then notifies subscribers synchronously (no batching), so
/// route guards re-evaluate on the mutating call. Only the session manager
/// writes; everything else reads via [`Self::get`] or subscribes.
pub struct SessionStore {
    session: Mutex<Session>,
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
    next_subscriber: AtomicU64,
    persistence: Arc<dyn SessionPersistence>,
}

impl SessionStore {
    pub fn new(persistence: Arc<dyn SessionPersistence>) -> Self {
        Self {
            session: Mutex::new(Session::unauthenticated()),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_subscriber: AtomicU64::new(0),
            persistence,
        }
    }

    /// Snapshot of the current session.
    pub fn get(&self) -> Session {
        self.session.lock().expect("session lock poisoned").clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.session.lock().expect("session lock poisoned").status
    }

    /// Replace the session, persist it, and notify subscribers.
    ///
    /// Persistence failures are logged and do not fail the call: the
    /// in-memory session is authoritative for this context, and the server
    /// remains the real boundary.
    pub fn set(&self, session: Session) {
        {
            let mut current = self.session.lock().expect("session lock poisoned");
            *current = session.clone();
        }

        match (&session.token, &session.principal) {
            (Some(token), Some(principal)) => {
                let record = PersistedSession::from_parts(token, principal);
                if let Err(e) = self.persistence.save(&record) {
                    tracing::error!(error = %e, "failed to persist session record");
                }
            }
            _ => {
                if let Err(e) = self.persistence.clear() {
                    tracing::error!(error = %e, "failed to clear persisted session record");
                }
            }
        }

        self.notify(&session);
    }

    /// Subscribe to every `set`; the callback runs synchronously on the
    /// mutating call, on the mutating thread.
    pub fn subscribe(&self, callback: impl Fn(&Session) + Send + Sync + 'static) -> Subscription {
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .push(Subscriber {
                id,
                callback: Box::new(callback),
            });
        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Load the persisted record at process start.
    ///
    /// A recovered token yields a `RolesPending` session: the record's role
    /// set is stale until the manager re-validates it. Malformed or missing
    /// records yield the unauthenticated session; hydration never fails the
    /// caller.
    pub fn hydrate(&self) -> Session {
        let session = match self.persistence.load() {
            Ok(Some(record)) => {
                Session::roles_pending(record.token.clone(), Some(record.to_principal()))
            }
            Ok(None) => Session::unauthenticated(),
            Err(e) => {
                tracing::warn!(error = %e, "persisted session unreadable, starting unauthenticated");
                Session::unauthenticated()
            }
        };
        self.apply(session.clone());
        session
    }

    /// Re-read the persisted record after another context changed it.
    ///
    /// Unlike startup hydration the record is taken as-is: the writing
    /// context already resolved the roles, so a present record maps to
    /// `Ready` and an absent one to `Unauthenticated`.
    pub fn rehydrate_external(&self) {
        let session = match self.persistence.load() {
            Ok(Some(record)) => {
                let principal = record.to_principal();
                Session::ready(principal, record.token)
            }
            Ok(None) => Session::unauthenticated(),
            Err(e) => {
                tracing::warn!(error = %e, "external session record unreadable, clearing");
                Session::unauthenticated()
            }
        };
        tracing::debug!(status = %session.status, "re-hydrated session from external change");
        self.apply(session);
    }

    /// Register the cross-context change subscription.
    pub fn watch_external(self: &Arc<Self>) -> ChangeWatch {
        let weak = Arc::downgrade(self);
        self.persistence.watch(Box::new(move || {
            if let Some(store) = weak.upgrade() {
                store.rehydrate_external();
            }
        }))
    }

    /// Write to memory and notify without writing back to persistence.
    /// Used by hydration paths, where persistence is the source.
    fn apply(&self, session: Session) {
        {
            let mut current = self.session.lock().expect("session lock poisoned");
            *current = session.clone();
        }
        self.notify(&session);
    }

    fn notify(&self, session: &Session) {
        // Callbacks run under the subscriber lock; they must not subscribe
        // or mutate the store re-entrantly.
        let subscribers = self.subscribers.lock().expect("subscriber lock poisoned");
        for subscriber in subscribers.iter() {
            (subscriber.callback)(session);
        }
    }
}

impl core::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &self.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{
        put_raw_memory_record, raw_memory_record, MemorySessionPersistence, PersistedSession,
    };
    use slatecrm_auth::{Principal, RoleSet};
    use slatecrm_core::UserId;

    fn ready_session() -> Session {
        let principal = Principal::new(UserId::new(1), "Ada")
            .with_roles(RoleSet::from_labels(["Sales Representative"]));
        Session::ready(principal, "tok-1")
    }

    #[test]
    fn set_persists_and_notifies_synchronously() {
        let persistence = MemorySessionPersistence::new();
        let store = SessionStore::new(Arc::new(persistence.clone()));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in = Arc::clone(&seen);
        let _sub = store.subscribe(move |s| {
            seen_in.lock().unwrap().push(s.status);
        });

        store.set(ready_session());

        assert_eq!(*seen.lock().unwrap(), vec![SessionStatus::Ready]);
        let raw = raw_memory_record(&persistence).unwrap();
        assert!(raw.contains("RoleNames"));
        assert!(raw.contains("tok-1"));
    }

    #[test]
    fn clearing_session_clears_persistence() {
        let persistence = MemorySessionPersistence::new();
        let store = SessionStore::new(Arc::new(persistence.clone()));

        store.set(ready_session());
        assert!(raw_memory_record(&persistence).is_some());

        store.set(Session::unauthenticated());
        assert!(raw_memory_record(&persistence).is_none());
    }

    #[test]
    fn dropped_subscription_stops_receiving() {
        let store = SessionStore::new(Arc::new(MemorySessionPersistence::new()));

        let seen = Arc::new(Mutex::new(0_usize));
        let seen_in = Arc::clone(&seen);
        let sub = store.subscribe(move |_| {
            *seen_in.lock().unwrap() += 1;
        });

        store.set(ready_session());
        drop(sub);
        store.set(Session::unauthenticated());

        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn hydrate_missing_record_is_unauthenticated() {
        let store = SessionStore::new(Arc::new(MemorySessionPersistence::new()));
        let session = store.hydrate();
        assert_eq!(session, Session::unauthenticated());
        assert_eq!(store.get(), Session::unauthenticated());
    }

    #[test]
    fn hydrate_malformed_record_is_unauthenticated_not_error() {
        let persistence = MemorySessionPersistence::new();
        put_raw_memory_record(&persistence, "][ definitely not json");
        let store = SessionStore::new(Arc::new(persistence));

        let session = store.hydrate();
        assert_eq!(session.status, SessionStatus::Unauthenticated);
    }

    #[test]
    fn hydrate_with_token_is_roles_pending() {
        let persistence = MemorySessionPersistence::new();
        let principal = Principal::new(UserId::new(4), "Ng")
            .with_roles(RoleSet::from_labels(["Sales Manager"]));
        persistence
            .save(&PersistedSession::from_parts("tok-h", &principal))
            .unwrap();

        let store = SessionStore::new(Arc::new(persistence));
        let session = store.hydrate();

        assert_eq!(session.status, SessionStatus::RolesPending);
        assert_eq!(session.token.as_deref(), Some("tok-h"));
        // The stale role set is carried along but is not authoritative yet.
        assert!(session.principal.unwrap().roles.contains_label("sales manager"));
    }

    #[test]
    fn external_change_rehydrates_other_context_store() {
        let tab_a = MemorySessionPersistence::new();
        let tab_b = tab_a.another_context();

        let store_a = Arc::new(SessionStore::new(Arc::new(tab_a)));
        let store_b = Arc::new(SessionStore::new(Arc::new(tab_b)));

        let _watch_b = store_b.watch_external();

        // Tab A logs in; tab B converges to Ready via the change watch.
        store_a.set(ready_session());
        assert_eq!(store_b.get().status, SessionStatus::Ready);

        // Tab A logs out; tab B converges back.
        store_a.set(Session::unauthenticated());
        assert_eq!(store_b.get().status, SessionStatus::Unauthenticated);
    }
}
