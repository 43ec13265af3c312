//! Session state machine.
//!
//! `SessionStore` is the single source of truth for authentication state.
//! Consumers hold an `Arc<SessionStore>`, read immutable snapshots, and
//! watch for changes; the login/logout/refresh transitions all run here.
//!
//! The access token only ever exists in this process. Restoring a session
//! after a restart means replaying the refresh exchange, which rides on an
//! HttpOnly cookie the application never sees.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::api::transport::DynAuthTransport;

use super::role::{Role, RoleStore};

/// Immutable snapshot of the authenticated-session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub role: Option<Role>,
    /// Short-lived bearer credential, memory only.
    pub access_token: Option<String>,
    /// Derived: true iff `access_token` is present.
    pub is_authenticated: bool,
    /// True while a refresh exchange is in flight.
    pub is_refreshing: bool,
    /// Set once the initial bootstrap completes; never reset afterwards.
    pub is_ready: bool,
}

pub struct SessionStore {
    transport: DynAuthTransport,
    roles: RoleStore,
    state: watch::Sender<SessionState>,
    /// Serializes refresh exchanges so concurrent 401 handlers share one.
    refresh_lock: Mutex<()>,
    /// Bumped after every completed exchange; lets a waiter detect that
    /// the exchange it queued behind already renewed (or tore down) the
    /// session.
    refresh_seq: AtomicU64,
}

impl SessionStore {
    pub fn new(transport: DynAuthTransport, roles: RoleStore) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            transport,
            roles,
            state,
            refresh_lock: Mutex::new(()),
            refresh_seq: AtomicU64::new(0),
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Watch for state changes. Observers should act on the snapshot they
    /// receive rather than captured state; there is no ordering guarantee
    /// between receivers.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Apply a mutation and publish the new snapshot. The derived
    /// `is_authenticated` flag is recomputed on every transition.
    fn update(&self, mutate: impl FnOnce(&mut SessionState)) {
        self.state.send_modify(|state| {
            mutate(state);
            state.is_authenticated = state.access_token.is_some();
        });
    }

    /// Record the chosen role and persist it for the next start. No
    /// network traffic; the access token is untouched.
    pub fn login(&self, role: Role) {
        if let Err(e) = self.roles.save(role) {
            warn!(error = %e, "failed to persist role");
        }
        self.update(|state| state.role = Some(role));
    }

    /// Drop the session. Local state is cleared before the backend hears
    /// about it, so observers never see an authenticated session during a
    /// slow logout; the backend notification is best effort.
    pub async fn logout(&self) {
        self.update(|state| {
            state.role = None;
            state.access_token = None;
            state.is_refreshing = false;
        });
        if let Err(e) = self.roles.clear() {
            warn!(error = %e, "failed to clear persisted role");
        }
        self.transport.server_logout().await;
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Failure is not an error: an unrefreshable session resolves to the
    /// logged-out state and `None`, so guarded pages stop hammering the
    /// backend with 401s. Concurrent callers are coalesced into a single
    /// exchange.
    pub async fn refresh_access_token(&self) -> Option<String> {
        let observed = self.refresh_seq.load(Ordering::Acquire);
        let _guard = self.refresh_lock.lock().await;
        if self.refresh_seq.load(Ordering::Acquire) != observed {
            // The exchange we queued behind finished; reuse its outcome.
            return self.state().access_token;
        }

        self.update(|state| state.is_refreshing = true);
        let token = self.transport.request_access_token().await;
        match token {
            Some(ref token) => {
                self.update(|state| {
                    state.access_token = Some(token.clone());
                    state.is_refreshing = false;
                    state.is_ready = true;
                });
            }
            None => {
                debug!("token refresh failed; clearing session");
                self.update(|state| {
                    state.access_token = None;
                    state.role = None;
                    state.is_refreshing = false;
                    state.is_ready = true;
                });
                if let Err(e) = self.roles.clear() {
                    warn!(error = %e, "failed to clear persisted role");
                }
            }
        }
        self.refresh_seq.fetch_add(1, Ordering::Release);
        token
    }

    /// One-time bootstrap. Re-establishes the persisted role and rebuilds
    /// the access token from the refresh cookie; a user who never logged
    /// in becomes ready immediately, without network traffic.
    pub async fn init(&self) {
        {
            let state = self.state.borrow();
            if state.is_ready || state.is_refreshing {
                return;
            }
        }

        if let Some(role) = self.roles.load() {
            self.update(|state| state.role = Some(role));
            self.refresh_access_token().await;
        }
        self.update(|state| state.is_ready = true);
    }

    /// Record the role and hand back the OAuth entry URL. The backend
    /// redirects into the external Google flow and eventually returns
    /// control to the application out of band.
    pub fn begin_google_login(&self, role: Role) -> String {
        self.login(role);
        self.transport.google_login_url(role)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::testutil::ScriptedTransport;

    use super::*;

    fn store_with(transport: Arc<ScriptedTransport>, dir: &TempDir) -> SessionStore {
        SessionStore::new(transport, RoleStore::new(dir.path().to_path_buf()))
    }

    #[test]
    fn login_records_and_persists_role() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        let store = store_with(transport, &dir);
        let mut events = store.subscribe();

        store.login(Role::Tenant);

        let state = store.state();
        assert_eq!(state.role, Some(Role::Tenant));
        assert!(!state.is_authenticated);
        assert!(events.has_changed().unwrap());
        assert_eq!(events.borrow_and_update().role, Some(Role::Tenant));
        assert_eq!(
            RoleStore::new(dir.path().to_path_buf()).load(),
            Some(Role::Tenant)
        );
    }

    #[tokio::test]
    async fn bootstrap_restores_persisted_role_and_token() {
        let dir = tempfile::tempdir().unwrap();
        RoleStore::new(dir.path().to_path_buf())
            .save(Role::Tenant)
            .unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_refresh(Some("abc"));
        let store = store_with(transport.clone(), &dir);

        store.init().await;

        let state = store.state();
        assert_eq!(state.role, Some(Role::Tenant));
        assert_eq!(state.access_token.as_deref(), Some("abc"));
        assert!(state.is_authenticated);
        assert!(state.is_ready);
        assert!(!state.is_refreshing);
        assert_eq!(transport.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn bootstrap_without_stored_role_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        let store = store_with(transport.clone(), &dir);

        store.init().await;

        let state = store.state();
        assert!(state.is_ready);
        assert_eq!(state.role, None);
        assert_eq!(state.access_token, None);
        assert!(!state.is_authenticated);
        assert_eq!(transport.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn failed_refresh_resolves_to_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        RoleStore::new(dir.path().to_path_buf())
            .save(Role::Landlord)
            .unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_refresh(None);
        let store = store_with(transport.clone(), &dir);

        store.init().await;

        let state = store.state();
        assert_eq!(state.role, None);
        assert_eq!(state.access_token, None);
        assert!(!state.is_authenticated);
        assert!(state.is_ready);
        assert!(RoleStore::new(dir.path().to_path_buf()).load().is_none());

        // Readiness is monotonic: a later failed refresh keeps it set.
        store.refresh_access_token().await;
        assert!(store.state().is_ready);
    }

    #[tokio::test]
    async fn logout_clears_state_before_backend_call() {
        let dir = tempfile::tempdir().unwrap();
        RoleStore::new(dir.path().to_path_buf())
            .save(Role::Tenant)
            .unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_refresh(Some("abc"));
        let store = store_with(transport.clone(), &dir);
        store.init().await;
        transport.attach_probe(store.subscribe());

        store.logout().await;

        assert_eq!(transport.logout_calls(), 1);
        let observed = transport
            .state_at_logout
            .lock()
            .unwrap()
            .clone()
            .expect("logout notification never fired");
        assert_eq!(observed.role, None);
        assert_eq!(observed.access_token, None);
        assert!(!observed.is_authenticated);
        assert!(RoleStore::new(dir.path().to_path_buf()).load().is_none());
    }

    #[tokio::test]
    async fn concurrent_refreshes_share_one_exchange() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_refresh(Some("fresh"));
        let store = store_with(transport.clone(), &dir);

        let (a, b) = tokio::join!(store.refresh_access_token(), store.refresh_access_token());

        assert_eq!(a.as_deref(), Some("fresh"));
        assert_eq!(b.as_deref(), Some("fresh"));
        assert_eq!(transport.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn bootstrap_runs_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        let store = store_with(transport.clone(), &dir);

        store.init().await;
        // A role appearing later must not re-trigger the bootstrap path.
        RoleStore::new(dir.path().to_path_buf())
            .save(Role::Tenant)
            .unwrap();
        store.init().await;

        assert_eq!(transport.refresh_calls(), 0);
        assert_eq!(store.state().role, None);
    }

    #[test]
    fn begin_google_login_records_role_and_builds_url() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        let store = store_with(transport, &dir);

        let url = store.begin_google_login(Role::Landlord);

        assert!(url.ends_with("/authentication/google?user_type=landlord"));
        assert_eq!(store.state().role, Some(Role::Landlord));
    }
}
