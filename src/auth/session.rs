//! Session Lifecycle
//!
//! [`SessionHandle`] is the explicitly passed session context: it owns the
//! token, the derived user, persistence and redirects. Every
//! [`ResourceRequest`](crate::http::ResourceRequest) reads the token from it
//! at call time and may ask it to log out, but never writes the token.
//!
//! [`SessionManager`] adds the login endpoint on top of a handle.
//!
//! ```text
//! Unverified --restore()--> Anonymous | Authenticated
//! Anonymous  --login()----> Authenticated   (expired/undecodable token: stays Anonymous)
//! Authenticated --logout()-> Anonymous
//! ```

use std::sync::Arc;
use chrono::Utc;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::jwt;
use crate::auth::models::{LoginRequest, Session, SessionPhase, TokenClaims, TokenResponse, UserIdentity};
use crate::auth::navigation::{Navigator, Route};
use crate::auth::storage::TokenStore;
use crate::http::client::Transport;
use crate::http::error::RequestError;
use crate::http::request::{RequestMethod, ResourceRequest};
use crate::resources::paths;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Token could not be decoded")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,
}

#[derive(Default)]
struct SessionCell {
    session: Session,
    /// Set by logout; a stored token is not restored afterwards
    logged_out: bool,
}

struct SessionInner {
    cell: RwLock<SessionCell>,
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
}

#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

impl SessionHandle {
    pub fn new(store: Arc<dyn TokenStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                cell: RwLock::new(SessionCell::default()),
                store,
                navigator,
            }),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.inner.cell.read().session.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.cell.read().session.phase()
    }

    pub fn auth_token(&self) -> Option<String> {
        self.inner.cell.read().session.token.clone()
    }

    pub fn user(&self) -> Option<UserIdentity> {
        self.inner.cell.read().session.user.clone()
    }

    pub fn has_verified_token(&self) -> bool {
        self.inner.cell.read().session.verified
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase() == SessionPhase::Authenticated
    }

    pub fn current_route(&self) -> Route {
        self.inner.navigator.current()
    }

    /// Startup check: adopt the persisted token if it is still usable.
    ///
    /// Runs once per handle; later calls only report the phase.
    pub fn restore(&self) -> SessionPhase {
        if self.has_verified_token() {
            return self.phase();
        }

        let logged_out = self.inner.cell.read().logged_out;
        let stored = match self.inner.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!("Failed to read stored token: {}", e);
                None
            }
        };

        match stored {
            Some(token) if !logged_out => {
                debug!("Found stored token, verifying");
                if let Err(e) = self.accept_token(&token) {
                    info!("Stored token discarded: {}", e);
                }
            }
            _ => {
                debug!("No stored token");
                self.inner.navigator.navigate(Route::Login);
            }
        }

        self.inner.cell.write().session.verified = true;
        let phase = self.phase();
        info!("Session restored as {:?}", phase);
        phase
    }

    /// Adopt a freshly issued or stored token.
    ///
    /// Undecodable or expired tokens end the session instead. A valid token
    /// is persisted, its user becomes current, and a caller sitting on the
    /// login view is sent to the home page for its role.
    pub fn accept_token(&self, token: &str) -> Result<UserIdentity, SessionError> {
        let claims = match jwt::decode(token).and_then(|decoded| decoded.claims::<TokenClaims>()) {
            Some(claims) => claims,
            None => {
                warn!("Received a token that could not be decoded");
                self.logout();
                return Err(SessionError::InvalidToken);
            }
        };

        let now = Utc::now().timestamp_millis() as f64 / 1000.0;
        if claims.is_expired_at(now) {
            warn!("Token for {} expired at {:?}", claims.user.email, claims.exp);
            self.logout();
            return Err(SessionError::ExpiredToken);
        }

        if let Err(e) = self.inner.store.save(token) {
            warn!("Failed to persist token: {}", e);
        }

        let user = claims.user;
        {
            let mut cell = self.inner.cell.write();
            cell.logged_out = false;
            cell.session.token = Some(token.to_string());
            cell.session.user = Some(user.clone());
        }
        info!("Authenticated {} as {}", user.email, user.role.as_str());

        if self.inner.navigator.current() == Route::Login {
            self.inner.navigator.navigate(Route::home_for(&user.role));
        }

        Ok(user)
    }

    /// Drop the token everywhere and go to the login view. Safe to repeat.
    pub fn logout(&self) {
        let was_authenticated = {
            let mut cell = self.inner.cell.write();
            let had_token = cell.session.token.take().is_some();
            cell.session.user = None;
            cell.logged_out = true;
            had_token
        };

        if let Err(e) = self.inner.store.clear() {
            warn!("Failed to remove stored token: {}", e);
        }

        if was_authenticated {
            info!("Logged out");
        }
        self.inner.navigator.navigate(Route::Login);
    }
}

/// Session handle plus the login endpoint
#[derive(Clone)]
pub struct SessionManager {
    session: SessionHandle,
    login_request: ResourceRequest<TokenResponse>,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn Transport>, session: SessionHandle) -> Self {
        let login_request = ResourceRequest::new(paths::LOGIN, transport, session.clone());
        Self {
            session,
            login_request,
        }
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.session
    }

    pub fn restore(&self) -> SessionPhase {
        self.session.restore()
    }

    /// Exchange credentials for a token and adopt it
    pub async fn login(&self, email: &str, password: &str) -> Result<UserIdentity, SessionError> {
        info!("Logging in {}", email);
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self.login_request.fetch(RequestMethod::post(&body)?).await?;
        self.session.accept_token(&response.access_token)
    }

    pub fn logout(&self) {
        self.session.logout();
    }

    pub fn auth_token(&self) -> Option<String> {
        self.session.auth_token()
    }

    pub fn has_verified_token(&self) -> bool {
        self.session.has_verified_token()
    }

    pub fn user(&self) -> Option<UserIdentity> {
        self.session.user()
    }

    pub fn is_login_loading(&self) -> bool {
        self.login_request.loading()
    }

    pub fn has_login_error(&self) -> bool {
        self.login_request.has_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;
    use crate::auth::navigation::RouteTracker;
    use crate::auth::storage::MemoryTokenStore;
    use crate::http::client::Verb;
    use crate::http::testing::{
        ScriptedTransport, expired_token, future_token, mint_token, student_claims, teacher_claims,
        test_session,
    };
    use serde_json::json;

    fn session_with_store(token: Option<String>, at: Route) -> (SessionHandle, Arc<MemoryTokenStore>, Arc<RouteTracker>) {
        let store = Arc::new(match token {
            Some(token) => MemoryTokenStore::with_token(token),
            None => MemoryTokenStore::default(),
        });
        let routes = Arc::new(RouteTracker::new(at));
        let session = SessionHandle::new(store.clone(), routes.clone());
        (session, store, routes)
    }

    #[test]
    fn logout_is_idempotent() {
        let (session, routes) = test_session();
        session.logout();
        session.logout();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.token, None);
        assert_eq!(snapshot.user, None);
        assert_eq!(routes.current(), Route::Login);
    }

    #[test]
    fn repeated_logout_redirects_once() {
        let (session, routes) = test_session();
        session.accept_token(&future_token(teacher_claims())).unwrap();
        for _ in 0..10 {
            session.logout();
        }

        assert_eq!(routes.history(), vec![Route::ManagementHome, Route::Login]);
    }

    #[test]
    fn restore_without_token_is_anonymous() {
        let (session, _store, routes) = session_with_store(None, Route::Other("/management/classroom".into()));
        assert_eq!(session.phase(), SessionPhase::Unverified);

        assert_eq!(session.restore(), SessionPhase::Anonymous);
        assert!(session.has_verified_token());
        assert_eq!(routes.current(), Route::Login);
    }

    #[test]
    fn restore_with_valid_token_keeps_deep_link() {
        let token = future_token(student_claims());
        let (session, _store, routes) = session_with_store(Some(token.clone()), Route::Other("/student/materials".into()));

        assert_eq!(session.restore(), SessionPhase::Authenticated);
        assert_eq!(session.auth_token(), Some(token));
        assert_eq!(routes.current(), Route::Other("/student/materials".into()));
        assert!(routes.history().is_empty());
    }

    #[test]
    fn restore_with_expired_token_clears_it() {
        let (session, store, routes) = session_with_store(Some(expired_token(teacher_claims())), Route::Login);

        assert_eq!(session.restore(), SessionPhase::Anonymous);
        assert_eq!(session.auth_token(), None);
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(routes.current(), Route::Login);
    }

    #[test]
    fn restore_runs_once() {
        let (session, store, _routes) = session_with_store(None, Route::Login);
        session.restore();
        store.save(&future_token(teacher_claims())).unwrap();

        assert_eq!(session.restore(), SessionPhase::Anonymous);
    }

    #[test]
    fn stored_token_is_ignored_after_logout() {
        let (session, store, _routes) = session_with_store(None, Route::Login);
        session.logout();
        store.save(&future_token(teacher_claims())).unwrap();

        assert_eq!(session.restore(), SessionPhase::Anonymous);
    }

    #[test]
    fn expired_token_is_refused() {
        let (session, routes) = test_session();
        let err = session.accept_token(&expired_token(teacher_claims())).unwrap_err();

        assert_eq!(err, SessionError::ExpiredToken);
        assert_eq!(session.auth_token(), None);
        assert_eq!(session.user(), None);
        assert_eq!(routes.current(), Route::Login);
    }

    #[test]
    fn token_without_exp_is_accepted() {
        let (session, routes) = test_session();
        let token = mint_token(&teacher_claims());

        let user = session.accept_token(&token).unwrap();

        assert_eq!(user.role, Role::Teacher { manager: true });
        assert_eq!(session.auth_token(), Some(token));
        assert_eq!(session.phase(), SessionPhase::Authenticated);
        assert_eq!(routes.current(), Route::ManagementHome);
    }

    #[test]
    fn undecodable_token_is_treated_as_no_session() {
        let (session, _routes) = test_session();
        assert_eq!(session.accept_token("garbage").unwrap_err(), SessionError::InvalidToken);

        let mut claims = teacher_claims();
        claims["exp"] = json!(4_102_444_800_i64);
        claims["role"] = json!("JANITOR");
        assert_eq!(session.accept_token(&mint_token(&claims)).unwrap_err(), SessionError::InvalidToken);
        assert_eq!(session.phase(), SessionPhase::Unverified);
        assert_eq!(session.auth_token(), None);
    }

    #[test]
    fn redirect_only_from_login_view() {
        let (session, routes) = test_session();
        routes.set_current(Route::Other("/student/activities".into()));

        session.accept_token(&future_token(student_claims())).unwrap();

        assert_eq!(routes.current(), Route::Other("/student/activities".into()));
    }

    #[test]
    fn student_lands_on_student_home() {
        let (session, routes) = test_session();
        let user = session.accept_token(&future_token(student_claims())).unwrap();

        assert_eq!(user.role, Role::Student { code: "ST-0042".into(), classroom_id: "c-3".into() });
        assert_eq!(routes.current(), Route::StudentHome);
    }

    #[test]
    fn new_token_replaces_identity_wholesale() {
        let (session, _routes) = test_session();
        session.accept_token(&future_token(teacher_claims())).unwrap();
        let student = session.accept_token(&future_token(student_claims())).unwrap();

        assert_eq!(session.user(), Some(student));
    }

    #[tokio::test]
    async fn teacher_login_end_to_end() {
        let transport = ScriptedTransport::new();
        let token = future_token(teacher_claims());
        transport.reply_ok(json!({"access_token": token}));
        let (session, store, routes) = session_with_store(None, Route::Login);
        let manager = SessionManager::new(transport.clone(), session);

        let user = manager.login("a@b.com", "x").await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls[0].verb, Verb::Post);
        assert_eq!(calls[0].path, "/login");
        assert_eq!(calls[0].body, Some(json!({"email": "a@b.com", "password": "x"})));

        assert_eq!(user.role.as_str(), "TEACHER");
        assert_eq!(manager.user(), Some(user));
        assert_eq!(manager.auth_token(), Some(token.clone()));
        assert_eq!(store.load().unwrap(), Some(token));
        assert_eq!(routes.current(), Route::ManagementHome);
        assert!(!manager.is_login_loading());
        assert!(!manager.has_login_error());
    }

    #[tokio::test]
    async fn rejected_credentials_surface_to_caller() {
        let transport = ScriptedTransport::new();
        transport.reply_err(RequestError::Status { status: 401, message: "Invalid credentials".into() });
        let (session, routes) = test_session();
        let manager = SessionManager::new(transport, session);

        let err = manager.login("a@b.com", "wrong").await.unwrap_err();

        assert!(matches!(err, SessionError::Request(RequestError::Status { status: 401, .. })));
        assert!(manager.has_login_error());
        assert!(manager.user().is_none());
        assert!(routes.history().is_empty());
    }

    #[tokio::test]
    async fn login_with_expired_token_logs_out() {
        let transport = ScriptedTransport::new();
        transport.reply_ok(json!({"access_token": expired_token(teacher_claims())}));
        let (session, routes) = test_session();
        let manager = SessionManager::new(transport, session);

        assert_eq!(manager.login("a@b.com", "x").await.unwrap_err(), SessionError::ExpiredToken);
        assert_eq!(manager.auth_token(), None);
        assert_eq!(routes.current(), Route::Login);
        assert!(!manager.has_login_error());
    }
}
