//! Request/response primitives and the transport seam.
//!
//! All outgoing traffic funnels through `AuthTransport`. The production
//! implementation wraps `reqwest` with a shared cookie jar so the HttpOnly
//! refresh token travels with every call without ever being readable by
//! application code. Tests substitute scripted fakes at this seam.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::Role;

use super::ApiError;

pub type DynAuthTransport = Arc<dyn AuthTransport + Send + Sync>;

/// An outgoing API call. `path` is resolved against the configured backend
/// origin; a full URL is used as-is.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A completed API call: status plus the raw body. Deserialization is the
/// caller's decision, so a failure body can still be read as text.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait AuthTransport {
    /// Issue a request, attaching `bearer` as the authorization credential
    /// when present. Cookie transport is implicit and unconditional.
    async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, ApiError>;

    /// Exchange the cookie-borne refresh token for a new access token.
    /// Resolves to `None` on any failure; never errors.
    async fn request_access_token(&self) -> Option<String>;

    /// Ask the backend to invalidate the refresh token, then expire the
    /// local cookie regardless of the outcome.
    async fn server_logout(&self);

    /// Browser entry point for the OAuth login flow.
    fn google_login_url(&self, role: Role) -> String;
}
