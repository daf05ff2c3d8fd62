//! Per-role declaration of which ownership tiers a role may see in lists.
//!
//! This filtering is advisory for UX; the server remains the authority on
//! what data leaves it. Nothing in this module errors: missing information
//! degrades to the most conservative answer instead of blocking rendering.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use slatecrm_core::UserId;

use crate::ownership::{classify, OwnershipTier};
use crate::principal::Principal;
use crate::role::{normalize, Role, RoleSet};

/// One grant in the visibility table: a concrete tier, or everything.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityScope {
    Tier(OwnershipTier),
    All,
}

impl VisibilityScope {
    fn covers(&self, tier: OwnershipTier) -> bool {
        match self {
            VisibilityScope::All => true,
            VisibilityScope::Tier(t) => *t == tier,
        }
    }
}

/// Role -> complete set of tiers that role may view.
///
/// A role not present in the table has no implicit access. Keys are stored
/// normalized so lookups cannot miss on spelling case.
#[derive(Debug, Clone, Default)]
pub struct VisibilityTable {
    grants: HashMap<String, Vec<VisibilityScope>>,
}

impl VisibilityTable {
    pub fn from_grants<I, S>(grants: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<VisibilityScope>)>,
        S: AsRef<str>,
    {
        Self {
            grants: grants
                .into_iter()
                .map(|(role, scopes)| (normalize(role.as_ref()), scopes))
                .collect(),
        }
    }

    pub fn scopes_for(&self, role: &Role) -> Option<&[VisibilityScope]> {
        self.grants.get(&role.normalized()).map(|v| v.as_slice())
    }

    /// The per-role tier grants the CRM ships with.
    pub fn stock() -> Self {
        use OwnershipTier::*;
        use VisibilityScope::{All, Tier};

        Self::from_grants([
            ("Administrator", vec![All]),
            ("Admin", vec![All]),
            ("C-level", vec![All]),
            ("Clevel", vec![All]),
            (
                "Sales Manager",
                vec![Tier(Owned), Tier(TeamOwned), Tier(Unowned)],
            ),
            ("Sales Representative", vec![Tier(Owned), Tier(Unowned)]),
            ("Support Agent", vec![Tier(Owned), Tier(Unowned)]),
        ])
    }
}

/// True iff `role` may see records in `tier`.
pub fn is_visible(tier: OwnershipTier, role: &Role, table: &VisibilityTable) -> bool {
    table
        .scopes_for(role)
        .is_some_and(|scopes| scopes.iter().any(|s| s.covers(tier)))
}

/// True iff *any* of the principal's roles grants the tier (union, not
/// intersection).
pub fn visible_to_any(tier: OwnershipTier, roles: &RoleSet, table: &VisibilityTable) -> bool {
    roles.iter().any(|role| is_visible(tier, role, table))
}

/// Filter a raw collection for a list screen.
///
/// `items` pairs each record with its owner field. Classification uses the
/// principal's teammate set; when that set is empty (e.g. the team lookup
/// failed), team-owned records classify as `Other` and fall out, which is the
/// documented degradation: only `Owned`/`Unowned` remain visible.
pub fn filter_visible<T>(
    items: Vec<(Option<UserId>, T)>,
    principal: &Principal,
    table: &VisibilityTable,
) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|(owner, item)| {
            let tier = classify(owner, principal.user_id, &principal.teammates);
            visible_to_any(tier, &principal.roles, table).then_some(item)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sales_rep_sees_owned_but_not_team_owned() {
        let table = VisibilityTable::stock();
        let rep = Role::new("Sales Representative");
        assert!(is_visible(OwnershipTier::Owned, &rep, &table));
        assert!(is_visible(OwnershipTier::Unowned, &rep, &table));
        assert!(!is_visible(OwnershipTier::TeamOwned, &rep, &table));
        assert!(!is_visible(OwnershipTier::Other, &rep, &table));
    }

    #[test]
    fn sales_manager_sees_team_owned() {
        let table = VisibilityTable::stock();
        let mgr = Role::new("sales manager");
        assert!(is_visible(OwnershipTier::TeamOwned, &mgr, &table));
        assert!(!is_visible(OwnershipTier::Other, &mgr, &table));
    }

    #[test]
    fn wildcard_covers_every_tier() {
        let table = VisibilityTable::stock();
        let admin = Role::new("Administrator");
        for tier in [
            OwnershipTier::Unowned,
            OwnershipTier::Owned,
            OwnershipTier::TeamOwned,
            OwnershipTier::Other,
        ] {
            assert!(is_visible(tier, &admin, &table));
        }
    }

    #[test]
    fn unknown_role_grants_nothing() {
        let table = VisibilityTable::stock();
        let intern = Role::new("Intern");
        assert!(!is_visible(OwnershipTier::Owned, &intern, &table));
    }

    #[test]
    fn multiple_roles_union_their_grants() {
        let table = VisibilityTable::stock();
        let roles = RoleSet::from_labels(["Sales Representative", "Sales Manager"]);
        assert!(visible_to_any(OwnershipTier::TeamOwned, &roles, &table));
        assert!(!visible_to_any(OwnershipTier::Other, &roles, &table));
    }

    #[test]
    fn filter_degrades_without_teammates() {
        use slatecrm_core::EntityKind;
        use slatecrm_core::RecordId;

        let me = UserId::new(1);
        let teammate = UserId::new(2);
        // Teammate set unavailable: left empty on the principal.
        let principal = Principal::new(me, "Rep")
            .with_roles(RoleSet::from_labels(["Sales Manager"]))
            .with_owned(EntityKind::Account, [RecordId::new(10)]);

        let items = vec![
            (Some(me), "mine"),
            (Some(teammate), "teammates"),
            (None, "unowned"),
        ];
        let visible = filter_visible(items, &principal, &VisibilityTable::stock());
        assert_eq!(visible, vec!["mine", "unowned"]);
    }
}
