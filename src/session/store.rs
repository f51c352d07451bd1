use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::state::{AuthState, Session, SessionContext, User};
use crate::api::{ApiGateway, LoginCredentials, RegisterData};
use crate::utils::SessionError;

/// Who is logged in: login, registration, logout and startup restore.
///
/// The store never talks HTTP itself; every call goes through the gateway,
/// which shares the same [`SessionContext`] and so sees token changes
/// immediately.
pub struct SessionStore {
    gateway: Arc<ApiGateway>,
}

impl SessionStore {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<ApiGateway> {
        &self.gateway
    }

    fn context(&self) -> &SessionContext {
        self.gateway.session()
    }

    /// Restore the persisted session and verify it against the server.
    ///
    /// The stored user is visible as soon as it is read; `is_loading` stays
    /// true until the profile check finishes. Any verification failure,
    /// network failure included, leaves the store anonymous.
    pub async fn initialize(&self) -> Result<AuthState, SessionError> {
        let context = self.context();
        let Some(version) = context.restore()? else {
            debug!("No persisted session");
            return Ok(context.state());
        };

        match self.gateway.current_user().await {
            Ok(user) => match context.establish(version, user) {
                Ok(()) => {
                    info!("Session restored");
                    Ok(AuthState::Authenticated)
                }
                // Login or logout finished first; theirs stands
                Err(SessionError::Superseded) => Ok(context.state()),
                Err(e) => Err(e),
            },
            Err(e) => {
                warn!("Stored session could not be verified: {}", e);
                context.clear_if_current(version)?;
                Ok(context.state())
            }
        }
    }

    /// Run [`initialize`](Self::initialize) in the background
    pub fn spawn_initialize(self: &Arc<Self>) -> JoinHandle<Result<AuthState, SessionError>> {
        let store = Arc::clone(self);
        tokio::spawn(async move { store.initialize().await })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let context = self.context();
        context.ensure_live()?;
        let started = context.version();

        let credentials = LoginCredentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let token = self
            .gateway
            .login(&credentials)
            .await
            .map_err(SessionError::Auth)?;

        let staged = context.stage_token(started, &token.access_token)?;

        match self.gateway.current_user().await {
            Ok(user) => {
                context.establish(staged, user.clone())?;
                info!(user_id = user.id, "Logged in as {}", user.username);
                Ok(user)
            }
            Err(e) => {
                // Never leave a token behind without its user
                context.clear_if_current(staged)?;
                Err(SessionError::Auth(e))
            }
        }
    }

    /// Create the account, then log in with the same credentials. Registration
    /// alone never yields a session.
    pub async fn register(&self, data: &RegisterData) -> Result<User, SessionError> {
        self.context().ensure_live()?;

        let created = self
            .gateway
            .register(data)
            .await
            .map_err(SessionError::Registration)?;
        debug!(user_id = created.id, "Account created, logging in");

        self.login(&data.email, &data.password)
            .await
            .map_err(|e| match e {
                SessionError::Auth(api) => SessionError::Registration(api),
                other => other,
            })
    }

    /// Best-effort server logout, then an unconditional local clear
    pub async fn logout(&self) -> Result<(), SessionError> {
        let context = self.context();
        context.ensure_live()?;

        if context.token().is_some() {
            if let Err(e) = self.gateway.logout().await {
                debug!("Server logout failed, clearing locally anyway: {}", e);
            }
        }

        context.clear()?;
        info!("Logged out");
        Ok(())
    }

    /// Release the in-memory session. Persisted slots stay for the next run.
    pub fn dispose(&self) {
        self.context().dispose();
    }

    pub fn state(&self) -> AuthState {
        self.context().state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.context().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.context().is_loading()
    }

    pub fn user(&self) -> Option<User> {
        self.context().user()
    }

    pub fn token(&self) -> Option<String> {
        self.context().token()
    }

    pub fn session(&self) -> Option<Session> {
        self.context().session()
    }
}
