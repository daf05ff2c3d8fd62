//! Ownership classification of a record relative to a viewer.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use slatecrm_core::UserId;

/// How a record relates to the current user.
///
/// Computed on demand, never stored.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipTier {
    /// The record has no owner field set.
    Unowned,
    /// The owner is the viewer.
    Owned,
    /// The owner is one of the viewer's known teammates.
    TeamOwned,
    /// Owned by someone outside the viewer's team.
    Other,
}

impl core::fmt::Display for OwnershipTier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            OwnershipTier::Unowned => write!(f, "unowned"),
            OwnershipTier::Owned => write!(f, "owned"),
            OwnershipTier::TeamOwned => write!(f, "team_owned"),
            OwnershipTier::Other => write!(f, "other"),
        }
    }
}

/// Classify a record's owner relative to `viewer`.
///
/// Never errors: an unknown teammate set is simply the empty set, which
/// degrades `TeamOwned` to `Other` (the most conservative tier).
pub fn classify(
    owner: Option<UserId>,
    viewer: UserId,
    teammates: &HashSet<UserId>,
) -> OwnershipTier {
    match owner {
        None => OwnershipTier::Unowned,
        Some(owner) if owner == viewer => OwnershipTier::Owned,
        Some(owner) if teammates.contains(&owner) => OwnershipTier::TeamOwned,
        Some(_) => OwnershipTier::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(ids: &[i64]) -> HashSet<UserId> {
        ids.iter().copied().map(UserId::new).collect()
    }

    #[test]
    fn no_owner_is_unowned_for_everyone() {
        let viewer = UserId::new(1);
        assert_eq!(classify(None, viewer, &team(&[])), OwnershipTier::Unowned);
        assert_eq!(classify(None, viewer, &team(&[2, 3])), OwnershipTier::Unowned);
    }

    #[test]
    fn own_record_beats_team_membership() {
        // Viewer appearing in their own teammate list must still be Owned.
        let viewer = UserId::new(1);
        assert_eq!(
            classify(Some(viewer), viewer, &team(&[1, 2])),
            OwnershipTier::Owned
        );
    }

    #[test]
    fn teammate_owner_is_team_owned() {
        let viewer = UserId::new(1);
        assert_eq!(
            classify(Some(UserId::new(2)), viewer, &team(&[2, 3])),
            OwnershipTier::TeamOwned
        );
    }

    #[test]
    fn unknown_teammates_degrade_to_other() {
        let viewer = UserId::new(1);
        assert_eq!(
            classify(Some(UserId::new(2)), viewer, &team(&[])),
            OwnershipTier::Other
        );
    }
}
