//! `slatecrm-session` — session lifecycle for the client authorization core.
//!
//! The only stateful crate: it owns the process-wide [`Session`], persists it
//! across reloads, keeps it consistent across contexts (tabs/windows of the
//! same profile), and drives login/logout/role refresh against the auth API.
//! All *decisions* live in `slatecrm-auth`; this crate only supplies state.

pub mod client;
pub mod config;
pub mod error;
pub mod handle;
pub mod manager;
pub mod persist;
pub mod session;
pub mod store;

pub use client::{AuthApi, AuthApiError, HttpAuthApi, LoginOutcome, UserPayload};
pub use config::SessionConfig;
pub use error::AuthError;
pub use handle::{Guarded, GuardOutcome, SessionHandle, SessionSnapshot};
pub use manager::SessionManager;
pub use persist::{
    ChangeWatch, FileSessionPersistence, MemorySessionPersistence, PersistError,
    PersistedSession, PersistedUser, SessionPersistence,
};
pub use session::Session;
pub use store::{SessionStore, Subscription};
