//! `slatecrm-core` — shared kernel for the client authorization core.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod status;

pub use entity::EntityKind;
pub use error::{DomainError, DomainResult};
pub use id::{RecordId, UserId};
pub use status::SessionStatus;
