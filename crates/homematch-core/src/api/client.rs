//! Production transport backed by `reqwest`.
//!
//! The refresh token is an HttpOnly cookie scoped to `/authentication`;
//! it lives exclusively in the client-wide cookie jar and is shipped with
//! every request. Application code never reads it - the only write is the
//! expiry pushed into the jar on logout.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::Role;
use crate::config::Config;

use super::transport::{ApiRequest, ApiResponse, AuthTransport};
use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Refresh-token exchange endpoint (refresh cookie implicit)
const TOKEN_REFRESH_PATH: &str = "/authentication/token/refresh";

/// Logout notification endpoint (best effort)
const LOGOUT_PATH: &str = "/authentication/logout";

/// OAuth entry point; the backend redirects into the Google flow
const GOOGLE_LOGIN_PATH: &str = "/authentication/google";

/// Cookie expiry pushed into the local jar on logout. Blocks new token
/// issuance even when the backend call fails.
const REFRESH_COOKIE_EXPIRY: &str = "refresh_token=; Path=/authentication; Max-Age=0";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// HTTP transport for the homematch backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    jar: Arc<Jar>,
    base_url: String,
}

impl HttpClient {
    pub fn new(config: &Config) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .cookie_provider(jar.clone())
            .build()?;

        Ok(Self {
            client,
            jar,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a request path against the backend origin. Full URLs pass
    /// through untouched.
    fn with_api_base(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AuthTransport for HttpClient {
    async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.with_api_base(&request.path);
        let mut builder = self.client.request(request.method.clone(), url);
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        Ok(ApiResponse::new(status, body))
    }

    async fn request_access_token(&self) -> Option<String> {
        let url = self.with_api_base(TOKEN_REFRESH_PATH);
        let response = match self.client.post(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "failed to reach token refresh endpoint");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(status = %response.status(), "token refresh rejected");
            return None;
        }

        match response.json::<TokenResponse>().await {
            Ok(token) => Some(token.access_token),
            Err(e) => {
                warn!(error = %e, "malformed token refresh response");
                None
            }
        }
    }

    async fn server_logout(&self) {
        let url = self.with_api_base(LOGOUT_PATH);
        if let Err(e) = self.client.post(url).send().await {
            // Local session clearing already happened; nothing to surface.
            warn!(error = %e, "failed to notify backend of logout");
        }

        if let Ok(origin) = Url::parse(&self.base_url) {
            self.jar.add_cookie_str(REFRESH_COOKIE_EXPIRY, &origin);
        }
    }

    fn google_login_url(&self, role: Role) -> String {
        format!("{}?user_type={}", self.with_api_base(GOOGLE_LOGIN_PATH), role)
    }
}
