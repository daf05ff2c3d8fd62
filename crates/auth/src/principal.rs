//! The authenticated principal used for authorization decisions.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use slatecrm_core::{EntityKind, RecordId, UserId};

use crate::role::RoleSet;

/// A fully resolved principal for authorization decisions.
///
/// Construction is decoupled from transport: the session layer builds this
/// from the login response plus the authoritative role fetch.
///
/// # Invariants
/// - `roles` is never absent; a failed fetch yields the empty set.
/// - `owned` holds the record ids the backend reported as owned by this user,
///   keyed by record kind. An absent kind means ownership is unknown for that
///   kind, not that nothing is owned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub display_name: String,
    pub roles: RoleSet,
    #[serde(default)]
    pub owned: HashMap<EntityKind, BTreeSet<RecordId>>,
    #[serde(default)]
    pub teammates: HashSet<UserId>,
}

impl Principal {
    pub fn new(user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            roles: RoleSet::empty(),
            owned: HashMap::new(),
            teammates: HashSet::new(),
        }
    }

    pub fn with_roles(mut self, roles: RoleSet) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_owned(mut self, kind: EntityKind, ids: impl IntoIterator<Item = RecordId>) -> Self {
        self.owned.insert(kind, ids.into_iter().collect());
        self
    }

    pub fn with_teammates(mut self, ids: impl IntoIterator<Item = UserId>) -> Self {
        self.teammates = ids.into_iter().collect();
        self
    }

    /// The recorded owned-id set for a kind, if the backend reported one.
    pub fn owned_ids(&self, kind: EntityKind) -> Option<&BTreeSet<RecordId>> {
        self.owned.get(&kind)
    }

    /// True iff `id` is in the recorded owned set for `kind`.
    pub fn owns(&self, kind: EntityKind, id: RecordId) -> bool {
        self.owned
            .get(&kind)
            .is_some_and(|ids| ids.contains(&id))
    }

    pub fn is_teammate(&self, user: UserId) -> bool {
        self.teammates.contains(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_ids_distinguish_absent_from_empty() {
        let p = Principal::new(UserId::new(1), "Alice")
            .with_owned(EntityKind::Account, [RecordId::new(7), RecordId::new(9)]);

        assert!(p.owns(EntityKind::Account, RecordId::new(9)));
        assert!(!p.owns(EntityKind::Account, RecordId::new(42)));
        // No recorded set for contacts at all.
        assert!(p.owned_ids(EntityKind::Contact).is_none());
    }
}
