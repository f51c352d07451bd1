use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::{
    app::{load_config, AppState, Config},
    cli::{handle_command, handle_config, Cli, Commands},
    session::{AuthState, LoginPrompt},
};

/// Main runtime orchestrator
pub struct Orchestrator {
    cli: Cli,
    config: Config,
}

impl Orchestrator {
    /// Create a new orchestrator from CLI args
    pub fn new(cli: Cli) -> Result<Self> {
        let mut config = load_config(cli.config.as_deref())?;

        // --base-url beats every config layer
        if let Some(base_url) = &cli.base_url {
            config.api.base_url = base_url.clone();
        }

        Ok(Self { cli, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the orchestrator
    pub async fn run(self) -> Result<()> {
        let Self { cli, config } = self;
        let json = cli.json;

        // Config commands never touch the session or the network
        if let Commands::Config { action } = cli.command {
            return handle_config(&config, action, json);
        }

        let state = AppState::new(config, LoginPrompt)?;
        let result = Self::dispatch(&state, cli.command, json).await;
        state.store.dispose();
        result
    }

    async fn dispatch(state: &AppState, command: Commands, json: bool) -> Result<()> {
        if command.needs_session() {
            let restored = state
                .store
                .spawn_initialize()
                .await
                .context("Session restore task failed")?;

            match restored {
                Ok(auth) => debug!("Session restored: {}", auth),
                Err(e) => warn!("Could not restore session: {}", e),
            }
        }

        if command.requires_auth() && state.store.state() != AuthState::Authenticated {
            anyhow::bail!("Not logged in. Run `pantrypal login` first.");
        }

        handle_command(state, command, json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_config(dir: &Path) -> String {
        let path = dir.join("config.toml");
        let storage = dir.join("session");
        std::fs::write(
            &path,
            format!(
                "[api]\nbase_url = \"http://127.0.0.1:9\"\n\n[session]\nstorage_dir = {:?}\nlogin_route = \"/login\"\n",
                storage.display().to_string()
            ),
        )
        .unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_base_url_flag_overrides_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(temp_dir.path());

        let cli = Cli::try_parse_from([
            "pantrypal",
            "-c",
            &config_path,
            "--base-url",
            "https://pantry.example.com",
            "stats",
        ])
        .unwrap();

        let orchestrator = Orchestrator::new(cli).unwrap();
        assert_eq!(orchestrator.config().api.base_url, "https://pantry.example.com");
    }

    #[tokio::test]
    async fn test_protected_command_without_session_is_refused() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(temp_dir.path());

        let cli = Cli::try_parse_from(["pantrypal", "-c", &config_path, "pantry", "list"]).unwrap();
        let err = Orchestrator::new(cli).unwrap().run().await.unwrap_err();
        assert!(err.to_string().contains("Not logged in"));
    }

    #[tokio::test]
    async fn test_logout_without_session_succeeds_offline() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(temp_dir.path());

        let cli = Cli::try_parse_from(["pantrypal", "-c", &config_path, "logout"]).unwrap();
        Orchestrator::new(cli).unwrap().run().await.unwrap();
    }
}
