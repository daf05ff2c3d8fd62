//! Role labels and their canonical comparable form.
//!
//! The backend is not consistent about role spelling ("Admin" vs
//! "Administrator", "C-level" vs "Clevel"), and labels arrive with stray
//! whitespace. Every comparison in this crate therefore goes through
//! [`normalize`]; nothing compares raw label strings.

use std::borrow::Cow;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Canonical comparable form of a role label: trimmed and lowercased.
///
/// Idempotent: `normalize(normalize(x)) == normalize(x)`. This collapses
/// case and whitespace only; it does not alias synonyms ("Clevel" and
/// "C-level" stay distinct labels).
pub fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Role label used for route and visibility gating.
///
/// The original spelling is preserved for display and persistence, but
/// `PartialEq`/`Hash` are defined over the normalized form so two labels that
/// differ only in case or padding are the same role everywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Self(label.into())
    }

    /// The label as it was received (original case and spacing).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The canonical comparable form.
    pub fn normalized(&self) -> String {
        normalize(&self.0)
    }

    /// Case/whitespace-insensitive comparison against a raw label.
    pub fn matches_label(&self, label: &str) -> bool {
        self.normalized() == normalize(label)
    }
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Role {}

// Hash must agree with Eq, so it also runs over the normalized form.
impl Hash for Role {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Role {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// The set of roles granted to a principal.
///
/// Never absent: a failed or empty role fetch yields `RoleSet::empty()`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(HashSet<Role>);

impl RoleSet {
    pub fn empty() -> Self {
        Self(HashSet::new())
    }

    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(labels.into_iter().map(|l| Role::from(l.into())).collect())
    }

    pub fn insert(&mut self, role: Role) {
        self.0.insert(role);
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.0.contains(role)
    }

    pub fn contains_label(&self, label: &str) -> bool {
        let wanted = normalize(label);
        self.0.iter().any(|r| r.normalized() == wanted)
    }

    /// True iff any held role matches any of `allowed` (normalized).
    pub fn matches_any(&self, allowed: &[Role]) -> bool {
        allowed.iter().any(|a| self.contains(a))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Original labels, sorted, for persistence and display.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.0.iter().map(|r| r.as_str().to_string()).collect();
        labels.sort();
        labels
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
