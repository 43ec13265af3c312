//! API layer for the homematch backend.
//!
//! `ApiGateway` attaches the session's bearer token to outgoing calls and
//! recovers from a single 401 by refreshing the token and retrying once.
//! Typed endpoint wrappers (recommendations, tenant requests, chat) live
//! in sibling modules and all route through the gateway.
//!
//! `AuthTransport` is the seam between protocol logic and the wire;
//! `HttpClient` is its production `reqwest` implementation.

mod chat;
pub mod client;
pub mod error;
pub mod gateway;
mod listings;
mod tenant_requests;
pub mod transport;

pub use client::HttpClient;
pub use error::ApiError;
pub use gateway::ApiGateway;
pub use transport::{ApiRequest, ApiResponse, AuthTransport, DynAuthTransport};
