//! `slatecrm-auth` — pure client-side authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it decides,
//! it never fetches. Session state lives in `slatecrm-session` and is handed
//! in by value/reference.

pub mod guard;
pub mod ownership;
pub mod principal;
pub mod role;
pub mod routes;
pub mod visibility;

pub use guard::{AccessDecision, AccessGuard, EntityContext};
pub use ownership::{classify, OwnershipTier};
pub use principal::Principal;
pub use role::{normalize, Role, RoleSet};
pub use routes::{RouteAccessEntry, RouteAccessTable, RouteTableError};
pub use visibility::{filter_visible, is_visible, visible_to_any, VisibilityScope, VisibilityTable};
