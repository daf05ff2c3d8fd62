//! Persisted session record and the persistence collaborator.
//!
//! The record survives reloads and is the cross-context source of truth for
//! tabs/windows sharing one profile. Two implementations ship: a file-backed
//! store under the OS data directory, and a shared in-memory store whose
//! cloned contexts model multiple tabs in tests.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use slatecrm_auth::{Principal, RoleSet};
use slatecrm_core::{EntityKind, RecordId, UserId};

/// User half of the persisted record.
///
/// `role_names` (`RoleNames` on the wire) is a comma-joined duplicate of
/// `roles` kept for older consumers of the same record; it is rewritten on
/// every save so the two can never drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedUser {
    pub id: UserId,
    pub display_name: String,
    #[serde(default)]
    pub owned_entity_ids: HashMap<EntityKind, BTreeSet<RecordId>>,
    #[serde(default)]
    pub team_member_ids: HashSet<UserId>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(rename = "RoleNames", default)]
    pub role_names: String,
}

/// The serializable subset of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub token: String,
    pub user: PersistedUser,
}

impl PersistedSession {
    pub fn from_parts(token: &str, principal: &Principal) -> Self {
        let roles = principal.roles.labels();
        let role_names = roles.join(",");
        Self {
            token: token.to_string(),
            user: PersistedUser {
                id: principal.user_id,
                display_name: principal.display_name.clone(),
                owned_entity_ids: principal.owned.clone(),
                team_member_ids: principal.teammates.clone(),
                roles,
                role_names,
            },
        }
    }

    /// Rebuild the principal from the record.
    ///
    /// `roles` is authoritative; records written by older consumers that only
    /// carried `RoleNames` are still readable through the comma-joined field.
    pub fn to_principal(&self) -> Principal {
        let labels: Vec<String> = if self.user.roles.is_empty() && !self.user.role_names.is_empty()
        {
            self.user
                .role_names
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        } else {
            self.user.roles.clone()
        };

        let mut principal = Principal::new(self.user.id, self.user.display_name.clone())
            .with_roles(RoleSet::from_labels(labels))
            .with_teammates(self.user.team_member_ids.iter().copied());
        principal.owned = self.user.owned_entity_ids.clone();
        principal
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistError {
    /// The stored record exists but cannot be parsed. Hydration treats this
    /// as "no session", it is never surfaced to the user.
    #[error("malformed persisted session: {0}")]
    Malformed(String),

    #[error("session persistence io: {0}")]
    Io(String),
}

/// Callback invoked when another context changed the persisted record.
pub type ChangeCallback = Box<dyn Fn() + Send + Sync>;

/// Handle for a registered change subscription; drop to tear it down.
pub struct ChangeWatch {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl ChangeWatch {
    pub(crate) fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for ChangeWatch {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl core::fmt::Debug for ChangeWatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChangeWatch").finish_non_exhaustive()
    }
}

/// External persistence collaborator for the session record.
///
/// `watch` registers a change subscription for writes made by *other*
/// contexts; a context is never notified about its own saves.
pub trait SessionPersistence: Send + Sync {
    fn load(&self) -> Result<Option<PersistedSession>, PersistError>;
    fn save(&self, record: &PersistedSession) -> Result<(), PersistError>;
    fn clear(&self) -> Result<(), PersistError>;
    fn watch(&self, on_change: ChangeCallback) -> ChangeWatch;
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory implementation (shared handle = shared origin storage)
// ─────────────────────────────────────────────────────────────────────────────

struct MemoryWatcher {
    id: u64,
    context: u64,
    callback: ChangeCallback,
}

#[derive(Default)]
struct MemoryShared {
    record: Mutex<Option<String>>,
    watchers: Mutex<Vec<MemoryWatcher>>,
    next_id: AtomicU64,
}

/// In-memory persistence; cloning via [`Self::another_context`] models a
/// second tab on the same origin. Watchers fire for writes from other
/// contexts only, mirroring browser storage-event semantics.
#[derive(Clone)]
pub struct MemorySessionPersistence {
    shared: Arc<MemoryShared>,
    context: u64,
}

impl MemorySessionPersistence {
    pub fn new() -> Self {
        let shared = Arc::new(MemoryShared::default());
        let context = shared.next_id.fetch_add(1, Ordering::Relaxed);
        Self { shared, context }
    }

    /// A handle over the same storage acting as a different context.
    pub fn another_context(&self) -> Self {
        let context = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        Self {
            shared: Arc::clone(&self.shared),
            context,
        }
    }

    fn notify_others(&self) {
        let watchers = self.shared.watchers.lock().expect("watcher lock poisoned");
        for watcher in watchers.iter() {
            if watcher.context != self.context {
                (watcher.callback)();
            }
        }
    }
}

impl Default for MemorySessionPersistence {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionPersistence for MemorySessionPersistence {
    fn load(&self) -> Result<Option<PersistedSession>, PersistError> {
        let record = self.shared.record.lock().expect("record lock poisoned");
        match record.as_deref() {
            None => Ok(None),
            Some(json) => serde_json::from_str(json)
                .map(Some)
                .map_err(|e| PersistError::Malformed(e.to_string())),
        }
    }

    fn save(&self, record: &PersistedSession) -> Result<(), PersistError> {
        let json = serde_json::to_string(record).map_err(|e| PersistError::Io(e.to_string()))?;
        {
            let mut slot = self.shared.record.lock().expect("record lock poisoned");
            *slot = Some(json);
        }
        self.notify_others();
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistError> {
        let had_record = {
            let mut slot = self.shared.record.lock().expect("record lock poisoned");
            slot.take().is_some()
        };
        if had_record {
            self.notify_others();
        }
        Ok(())
    }

    fn watch(&self, on_change: ChangeCallback) -> ChangeWatch {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared
            .watchers
            .lock()
            .expect("watcher lock poisoned")
            .push(MemoryWatcher {
                id,
                context: self.context,
                callback: on_change,
            });

        let shared = Arc::clone(&self.shared);
        ChangeWatch::new(move || {
            shared
                .watchers
                .lock()
                .expect("watcher lock poisoned")
                .retain(|w| w.id != id);
        })
    }
}

#[cfg(test)]
pub(crate) fn raw_memory_record(persistence: &MemorySessionPersistence) -> Option<String> {
    persistence
        .shared
        .record
        .lock()
        .expect("record lock poisoned")
        .clone()
}

#[cfg(test)]
pub(crate) fn put_raw_memory_record(persistence: &MemorySessionPersistence, raw: &str) {
    let mut slot = persistence
        .shared
        .record
        .lock()
        .expect("record lock poisoned");
    *slot = Some(raw.to_string());
}

// ─────────────────────────────────────────────────────────────────────────────
// File-backed implementation
// ─────────────────────────────────────────────────────────────────────────────

/// File-backed persistence under `{app_data_dir}/{namespace}/session.json`.
///
/// External changes are detected by polling the file contents on a background
/// thread; own writes update the baseline first so they never echo back as a
/// change notification.
pub struct FileSessionPersistence {
    path: PathBuf,
    poll_interval: Duration,
    /// Last contents this context wrote or observed.
    last_seen: Arc<Mutex<Option<String>>>,
}

impl FileSessionPersistence {
    pub fn new(namespace: &str) -> Result<Self, PersistError> {
        let path = session_file_path(namespace)?;
        Ok(Self::at_path(path))
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self {
            path,
            poll_interval: Duration::from_millis(500),
            last_seen: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn read_raw(&self) -> Result<Option<String>, PersistError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistError::Io(e.to_string())),
        }
    }
}

impl SessionPersistence for FileSessionPersistence {
    fn load(&self) -> Result<Option<PersistedSession>, PersistError> {
        let Some(raw) = self.read_raw()? else {
            return Ok(None);
        };
        *self.last_seen.lock().expect("baseline lock poisoned") = Some(raw.clone());
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| PersistError::Malformed(e.to_string()))
    }

    fn save(&self, record: &PersistedSession) -> Result<(), PersistError> {
        let json =
            serde_json::to_string_pretty(record).map_err(|e| PersistError::Io(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PersistError::Io(e.to_string()))?;
        }

        // Write-then-rename so other contexts never read a torn record.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|e| PersistError::Io(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| PersistError::Io(e.to_string()))?;

        *self.last_seen.lock().expect("baseline lock poisoned") = Some(json);
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(PersistError::Io(e.to_string())),
        }
        *self.last_seen.lock().expect("baseline lock poisoned") = None;
        Ok(())
    }

    fn watch(&self, on_change: ChangeCallback) -> ChangeWatch {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let path = self.path.clone();
        let last_seen = Arc::clone(&self.last_seen);
        let interval = self.poll_interval;

        let handle = std::thread::spawn(move || {
            while !stop_flag.load(Ordering::Relaxed) {
                std::thread::sleep(interval);
                let current = std::fs::read_to_string(&path).ok();
                let mut baseline = last_seen.lock().expect("baseline lock poisoned");
                if *baseline != current {
                    *baseline = current;
                    drop(baseline);
                    on_change();
                }
            }
        });

        ChangeWatch::new(move || {
            stop.store(true, Ordering::Relaxed);
            let _ = handle.join();
        })
    }
}

/// Resolve `{app_data_dir}/{namespace}/session.json`.
fn session_file_path(namespace: &str) -> Result<PathBuf, PersistError> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .ok_or_else(|| PersistError::Io("failed to resolve OS app data directory".to_string()))?;

    let mut path = base;
    path.push(namespace);
    path.push("session.json");
    Ok(path)
}
