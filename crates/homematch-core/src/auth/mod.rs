//! Authentication module: session state machine and durable role storage.
//!
//! This module provides:
//! - `SessionStore`: process-wide session state with watch-based observers
//! - `RoleStore`: durable storage for the last-chosen role
//!
//! Access tokens live in memory only; on each start they are rebuilt from
//! the HttpOnly refresh cookie via the token refresh exchange.

pub mod role;
pub mod store;

pub use role::{Role, RoleStore};
pub use store::{SessionState, SessionStore};
