use anyhow::{Context, Result};
use std::sync::Arc;

use crate::api::ApiGateway;
use crate::app::Config;
use crate::session::{FileStorage, Navigator, SessionContext, SessionStore};

/// Everything a command needs: configuration, the session store and the
/// gateway it shares
pub struct AppState {
    pub config: Config,
    pub store: Arc<SessionStore>,
}

impl AppState {
    /// Wire file-backed session storage and the HTTP gateway from `config`
    pub fn new(config: Config, navigator: impl Navigator + 'static) -> Result<Self> {
        let storage = match &config.session.storage_dir {
            Some(dir) => FileStorage::new(dir),
            None => FileStorage::default_location(),
        }
        .context("Failed to open session storage")?;

        let session = Arc::new(
            SessionContext::new(storage, navigator)
                .with_login_route(config.session.login_route.clone()),
        );
        let gateway = ApiGateway::from_config(&config, session)?;

        Ok(Self {
            config,
            store: Arc::new(SessionStore::new(Arc::new(gateway))),
        })
    }

    pub fn api(&self) -> &ApiGateway {
        self.store.gateway()
    }

    /// Default language for generation requests
    pub fn language(&self) -> &str {
        &self.config.preferences.language
    }
}
