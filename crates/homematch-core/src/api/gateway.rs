//! Authenticated request gateway.
//!
//! Wraps outgoing calls with bearer attachment and one-shot
//! refresh-and-retry recovery. Typed endpoint wrappers (recommendations,
//! tenant requests, chat) hang off `ApiGateway` in sibling modules.

use std::sync::Arc;

use reqwest::StatusCode;
use tokio::sync::Mutex;
use tracing::debug;

use crate::auth::SessionStore;
use crate::models::Listing;

use super::transport::{ApiRequest, ApiResponse, DynAuthTransport};
use super::ApiError;

pub struct ApiGateway {
    store: Arc<SessionStore>,
    transport: DynAuthTransport,
    /// Most recent recommendation results, kept for by-id lookups.
    pub(crate) recent_listings: Mutex<Vec<Listing>>,
}

impl ApiGateway {
    pub fn new(store: Arc<SessionStore>, transport: DynAuthTransport) -> Self {
        Self {
            store,
            transport,
            recent_listings: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Issue `request` with the current access token attached.
    ///
    /// A 401 triggers the refresh protocol exactly once: renew the token,
    /// reissue the original request with it, and hand back whatever comes
    /// out. A request is never retried more than once no matter how often
    /// 401 recurs; when recovery fails the session is logged out and the
    /// call fails with `ApiError::Unauthenticated`.
    ///
    /// Because of that recovery path, any call may mutate session state as
    /// a side effect - callers must be prepared for role and auth state to
    /// change across an `auth_fetch`.
    pub async fn auth_fetch(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let token = self.store.state().access_token;
        let response = self.transport.execute(&request, token.as_deref()).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(path = %request.path, "request rejected; renewing access token");
        let Some(renewed) = self.store.refresh_access_token().await else {
            self.store.logout().await;
            return Err(ApiError::Unauthenticated);
        };

        let response = self.transport.execute(&request, Some(&renewed)).await?;
        if response.status == StatusCode::UNAUTHORIZED {
            self.store.logout().await;
            return Err(ApiError::Unauthenticated);
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use crate::auth::{Role, RoleStore};
    use crate::testutil::ScriptedTransport;

    use super::*;

    struct Fixture {
        transport: Arc<ScriptedTransport>,
        gateway: ApiGateway,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        let store = Arc::new(SessionStore::new(
            transport.clone(),
            RoleStore::new(dir.path().to_path_buf()),
        ));
        let gateway = ApiGateway::new(store, transport.clone());
        Fixture {
            transport,
            gateway,
            _dir: dir,
        }
    }

    /// Seed the store with an access token via a scripted refresh.
    async fn seed_token(fixture: &Fixture, token: &str) {
        fixture.transport.push_refresh(Some(token));
        fixture.gateway.store().refresh_access_token().await;
    }

    #[tokio::test]
    async fn non_401_responses_pass_through_untouched() {
        let f = fixture();
        f.transport.push_response(500, "boom");

        let response = f.gateway.auth_fetch(ApiRequest::get("/x")).await.unwrap();

        assert_eq!(response.status.as_u16(), 500);
        assert_eq!(response.text(), "boom");
        assert_eq!(f.transport.refresh_calls(), 0);
        // No token yet, so the request went out bare
        assert_eq!(f.transport.sent.lock().unwrap()[0], ("/x".to_string(), None));
    }

    #[tokio::test]
    async fn renews_token_and_retries_once() {
        let f = fixture();
        seed_token(&f, "abc").await;
        f.transport.push_response(401, "");
        f.transport.push_refresh(Some("def"));
        f.transport.push_response(200, r#"{"ok":true}"#);

        let response = f.gateway.auth_fetch(ApiRequest::get("/x")).await.unwrap();

        assert_eq!(response.status.as_u16(), 200);
        let sent = f.transport.sent.lock().unwrap().clone();
        assert_eq!(sent[0], ("/x".to_string(), Some("abc".to_string())));
        assert_eq!(sent[1], ("/x".to_string(), Some("def".to_string())));
        assert_eq!(
            f.gateway.store().state().access_token.as_deref(),
            Some("def")
        );
    }

    #[tokio::test]
    async fn gives_up_after_second_rejection() {
        let f = fixture();
        seed_token(&f, "abc").await;
        f.gateway.store().login(Role::Tenant);
        f.transport.push_response(401, "");
        f.transport.push_refresh(Some("def"));
        f.transport.push_response(401, "");

        let err = f.gateway.auth_fetch(ApiRequest::get("/x")).await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthenticated));
        // One seed exchange plus exactly one recovery exchange
        assert_eq!(f.transport.refresh_calls(), 2);
        assert_eq!(f.transport.sent.lock().unwrap().len(), 2);
        assert_eq!(f.transport.logout_calls(), 1);
        let state = f.gateway.store().state();
        assert_eq!(state.role, None);
        assert_eq!(state.access_token, None);
    }

    #[tokio::test]
    async fn failed_renewal_logs_out() {
        let f = fixture();
        seed_token(&f, "abc").await;
        f.transport.push_response(401, "");
        f.transport.push_refresh(None);

        let err = f.gateway.auth_fetch(ApiRequest::get("/x")).await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthenticated));
        assert_eq!(f.transport.sent.lock().unwrap().len(), 1);
        assert_eq!(f.transport.logout_calls(), 1);
        let state = f.gateway.store().state();
        assert_eq!(state.access_token, None);
        assert!(!state.is_authenticated);
    }
}
