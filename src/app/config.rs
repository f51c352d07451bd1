use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    APP_NAME, DEFAULT_API_BASE_URL, DEFAULT_LANGUAGE, ENV_PREFIX, HTTP_REQUEST_TIMEOUT_SECS,
    LOCAL_CONFIG_PATH, LOGIN_ROUTE,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection
    #[serde(default)]
    pub api: ApiConfig,

    /// Session persistence
    #[serde(default)]
    pub session: SessionConfig,

    /// Defaults for generation requests
    #[serde(default)]
    pub preferences: PreferencesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Origin of the REST backend, without a trailing path
    pub base_url: String,
    /// Whole-request timeout; unset means the HTTP client's own default
    pub request_timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: Some(HTTP_REQUEST_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Where the token and user slots live (defaults to the platform data dir)
    pub storage_dir: Option<PathBuf>,
    /// Route reported to the navigator when the server rejects the token
    pub login_route: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            login_route: LOGIN_ROUTE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferencesConfig {
    /// Language for generated recipes and transformations
    pub language: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Load configuration from multiple sources
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if let Some(path) = explicit {
        // An explicit file must exist
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        figment = figment.merge(Toml::file(path));
    } else {
        let global_config = get_config_dir()?.join("config.toml");
        let local_config = PathBuf::from(LOCAL_CONFIG_PATH);

        if global_config.exists() {
            figment = figment.merge(Toml::file(&global_config));
        }
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }
    }

    // PANTRYPAL_API__BASE_URL=... style overrides
    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

    figment.extract().context("Failed to load configuration")
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", APP_NAME) {
        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;
        Ok(config_dir.to_path_buf())
    } else {
        // Fallback to home directory
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        let config_dir = PathBuf::from(home).join(".config").join(APP_NAME);
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<PathBuf> {
    let path = if let Some(p) = path {
        p
    } else {
        get_config_dir()?.join("config.toml")
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(path)
}

/// Create a default configuration file if it doesn't exist. Returns the path
/// when a file was written.
pub fn init_config() -> Result<Option<PathBuf>> {
    let config_file = get_config_dir()?.join("config.toml");
    if config_file.exists() {
        return Ok(None);
    }
    save_config(&Config::default(), Some(config_file)).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[api]\nbase_url = \"https://recipes.example.com\"\n\n[preferences]\nlanguage = \"de\"\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.api.base_url, "https://recipes.example.com");
        assert_eq!(config.api.request_timeout_secs, Some(HTTP_REQUEST_TIMEOUT_SECS));
        assert_eq!(config.preferences.language, "de");
        assert_eq!(config.session.login_route, "/login");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_config(Some(&temp_dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_save_round_trips_through_load() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.session.storage_dir = Some(temp_dir.path().join("session"));

        let path = save_config(&config, Some(temp_dir.path().join("nested/config.toml"))).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), config);
    }
}
