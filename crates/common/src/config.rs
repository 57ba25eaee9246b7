use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::platform::get_config_path;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub account: AccountConfig,
    pub http: HttpConfig,
}

/// Application and credentials used for authorization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub app_id: Option<u64>,
    pub login: Option<String>,
    pub password: Option<String>,
    /// `"all"`, a numeric mask, a comma separated string or a list of names
    pub scope: Option<toml::Value>,
    /// Set to request community tokens instead of a user token
    pub group_ids: Vec<u64>,
}

/// Transport settings. Unset values fall back to the protocol defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
    pub oauth_url: Option<String>,
    pub api_url: Option<String>,
    pub user_agent: Option<String>,
}

impl Config {
    /// Loads a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Loads the platform config file, or defaults when it does not exist
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match get_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
            [account]
            app_id = 6121396
            login = "user@example.com"
            password = "hunter2"
            scope = ["friends", "photos"]

            [http]
            timeout_secs = 10
            oauth_url = "http://127.0.0.1:9000"
            "#,
        );

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.account.app_id, Some(6121396));
        assert_eq!(config.account.login.as_deref(), Some("user@example.com"));
        assert!(config.account.scope.as_ref().unwrap().is_array());
        assert!(config.account.group_ids.is_empty());
        assert_eq!(config.http.timeout_secs, Some(10));
        assert_eq!(config.http.api_url, None);
    }

    #[test]
    fn test_load_empty_config() {
        let file = write_config("");
        let config = Config::load(file.path()).unwrap();
        assert!(config.account.app_id.is_none());
        assert!(config.account.scope.is_none());
    }

    #[test]
    fn test_load_errors() {
        let err = Config::load(Path::new("/nonexistent/vk-auth.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        let file = write_config("[account]\napp_id = \"not a number\"");
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
