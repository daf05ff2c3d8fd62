//! Closed set of CRM record types the client knows about.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Kind of CRM record an ownership check or entity-scoped route refers to.
///
/// The set is closed on purpose: owned-id sets in the session are keyed by
/// kind, and an unknown kind would silently bypass ownership enforcement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Account,
    Contact,
    Lead,
    Opportunity,
    Case,
    Task,
}

impl EntityKind {
    /// Stable wire name (matches the API's collection segment).
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Account => "account",
            EntityKind::Contact => "contact",
            EntityKind::Lead => "lead",
            EntityKind::Opportunity => "opportunity",
            EntityKind::Case => "case",
            EntityKind::Task => "task",
        }
    }

    pub const ALL: [EntityKind; 6] = [
        EntityKind::Account,
        EntityKind::Contact,
        EntityKind::Lead,
        EntityKind::Opportunity,
        EntityKind::Case,
        EntityKind::Task,
    ];
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "account" | "accounts" => Ok(EntityKind::Account),
            "contact" | "contacts" => Ok(EntityKind::Contact),
            "lead" | "leads" => Ok(EntityKind::Lead),
            "opportunity" | "opportunities" => Ok(EntityKind::Opportunity),
            "case" | "cases" => Ok(EntityKind::Case),
            "task" | "tasks" => Ok(EntityKind::Task),
            other => Err(DomainError::invalid_id(format!(
                "unknown entity kind: {other}"
            ))),
        }
    }
}
