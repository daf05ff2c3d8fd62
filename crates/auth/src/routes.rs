//! Static route/action access table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::role::Role;

/// One protected navigation target or action.
///
/// An empty `allowed_roles` means "any authenticated user". Roles are stored
/// with their original spelling; matching is normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteAccessEntry {
    pub route_key: String,
    pub allowed_roles: Vec<Role>,
}

impl RouteAccessEntry {
    pub fn new(route_key: impl Into<String>, allowed_roles: Vec<Role>) -> Self {
        Self {
            route_key: route_key.into(),
            allowed_roles,
        }
    }

    /// Any authenticated user may use this route.
    pub fn open(route_key: impl Into<String>) -> Self {
        Self::new(route_key, Vec::new())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("duplicate route key: {0}")]
    DuplicateRouteKey(String),
}

/// Immutable route-key -> allowed-roles table, built once at startup.
///
/// Lookup is O(1). A key with no entry is *not* an error at this layer; the
/// guard treats unmapped routes as any-authenticated (deliberate fail-open,
/// see [`crate::guard`]).
#[derive(Debug, Clone, Default)]
pub struct RouteAccessTable {
    entries: HashMap<String, RouteAccessEntry>,
}

impl RouteAccessTable {
    /// Build a table, rejecting duplicate route keys.
    pub fn from_entries(
        entries: impl IntoIterator<Item = RouteAccessEntry>,
    ) -> Result<Self, RouteTableError> {
        let mut map = HashMap::new();
        for entry in entries {
            let key = entry.route_key.clone();
            if map.insert(key.clone(), entry).is_some() {
                return Err(RouteTableError::DuplicateRouteKey(key));
            }
        }
        Ok(Self { entries: map })
    }

    pub fn lookup(&self, route_key: &str) -> Option<&RouteAccessEntry> {
        self.entries.get(route_key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The route map the CRM screens ship with.
    ///
    /// Role spellings are the historical ones the backend emits; where the
    /// backend used two spellings for the same audience, both are listed
    /// rather than guessed into one (normalization collapses case only).
    pub fn stock() -> Self {
        let entries = vec![
            RouteAccessEntry::open("dashboard"),
            RouteAccessEntry::open("accounts"),
            RouteAccessEntry::open("accounts.detail"),
            RouteAccessEntry::open("contacts"),
            RouteAccessEntry::open("contacts.detail"),
            RouteAccessEntry::open("leads"),
            RouteAccessEntry::open("leads.detail"),
            RouteAccessEntry::open("opportunities"),
            RouteAccessEntry::open("opportunities.detail"),
            RouteAccessEntry::open("cases"),
            RouteAccessEntry::open("tasks"),
            RouteAccessEntry::new(
                "reports",
                vec![
                    Role::new("C-level"),
                    Role::new("Clevel"),
                    Role::new("Sales Manager"),
                ],
            ),
            RouteAccessEntry::new(
                "admin.users",
                vec![Role::new("Administrator"), Role::new("Admin")],
            ),
            RouteAccessEntry::new(
                "admin.settings",
                vec![Role::new("Administrator"), Role::new("Admin")],
            ),
        ];

        Self::from_entries(entries).expect("stock route table has unique keys")
    }
}
