//! Scripted transport fake for exercising the session protocol without a
//! network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::watch;

use crate::api::transport::{ApiRequest, ApiResponse, AuthTransport};
use crate::api::ApiError;
use crate::auth::{Role, SessionState};

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    /// Outcomes handed to successive refresh exchanges, in order.
    refresh_results: Mutex<VecDeque<Option<String>>>,
    /// Responses handed to successive `execute` calls, in order.
    responses: Mutex<VecDeque<ApiResponse>>,
    refresh_count: AtomicUsize,
    logout_count: AtomicUsize,
    /// (path, bearer) pairs for every executed request.
    pub sent: Mutex<Vec<(String, Option<String>)>>,
    /// Session snapshot at the moment the logout notification fires.
    pub state_at_logout: Mutex<Option<SessionState>>,
    session_probe: Mutex<Option<watch::Receiver<SessionState>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_refresh(&self, result: Option<&str>) {
        self.refresh_results
            .lock()
            .unwrap()
            .push_back(result.map(str::to_string));
    }

    pub fn push_response(&self, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back(ApiResponse::new(
            StatusCode::from_u16(status).unwrap(),
            body.as_bytes().to_vec(),
        ));
    }

    /// Lets `server_logout` record the session snapshot it observes.
    pub fn attach_probe(&self, receiver: watch::Receiver<SessionState>) {
        *self.session_probe.lock().unwrap() = Some(receiver);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_count.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthTransport for ScriptedTransport {
    async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        self.sent
            .lock()
            .unwrap()
            .push((request.path.clone(), bearer.map(str::to_string)));
        let scripted = self.responses.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or_else(|| ApiResponse::new(StatusCode::OK, Vec::new())))
    }

    async fn request_access_token(&self) -> Option<String> {
        self.refresh_count.fetch_add(1, Ordering::SeqCst);
        // Suspend so logically concurrent callers can pile up on the lock
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.refresh_results.lock().unwrap().pop_front().flatten()
    }

    async fn server_logout(&self) {
        self.logout_count.fetch_add(1, Ordering::SeqCst);
        if let Some(receiver) = self.session_probe.lock().unwrap().as_ref() {
            *self.state_at_logout.lock().unwrap() = Some(receiver.borrow().clone());
        }
    }

    fn google_login_url(&self, role: Role) -> String {
        format!("http://localhost:33333/authentication/google?user_type={role}")
    }
}
