//! Configuration file handling
//!
//! Loads and saves ~/.config/git-issue-tracker/config.yaml.

use super::git_services::GitServices;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outbound HTTP settings shared by both adapters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Value of the User-Agent header (GitHub rejects requests without one)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Transport-level timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_user_agent() -> String {
    "GitIssueTracker/1.0".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Dispatch server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub git_services: GitServices,

    #[serde(default)]
    pub http: HttpSettings,

    #[serde(default)]
    pub server: ServerSettings,
}

impl TrackerConfig {
    /// Create a configuration with defaults only (tokens come from the environment)
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the default file if it exists, otherwise fall back to defaults
    pub fn load_or_default() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::TrackerError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading tracker configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content)?
        };

        tracing::debug!(
            bind = %config.server.bind,
            timeout_secs = config.http.timeout_secs,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving tracker configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/git-issue-tracker/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("git-issue-tracker");
        path.push("config.yaml");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::Provider;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::new();
        assert_eq!(config.http.user_agent, "GitIssueTracker/1.0");
        assert_eq!(config.http.timeout(), Duration::from_secs(30));
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert!(config.git_services.github.token.is_none());
    }

    #[test]
    fn test_load_partial_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(
            &path,
            r#"
git_services:
  github:
    token: ghp_test
  gitlab:
    token_env: MY_GITLAB_TOKEN
    api_url: https://gitlab.example.com/api/v4
http:
  timeout_secs: 5
"#,
        )
        .unwrap();

        let config = TrackerConfig::load(&path).unwrap();
        assert_eq!(config.git_services.github.token.as_deref(), Some("ghp_test"));
        assert_eq!(
            config.git_services.gitlab.token_env.as_deref(),
            Some("MY_GITLAB_TOKEN")
        );
        assert_eq!(
            config
                .git_services
                .for_provider(Provider::GitLab)
                .resolve_api_url(Provider::GitLab),
            "https://gitlab.example.com/api/v4"
        );
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.http.user_agent, "GitIssueTracker/1.0");
        assert_eq!(config.server, ServerSettings::default());
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = TrackerConfig::load(temp_dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, crate::TrackerError::Config(_)));
    }

    #[test]
    fn test_load_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "").unwrap();

        let config = TrackerConfig::load(&path).unwrap();
        assert_eq!(config, TrackerConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");

        let mut config = TrackerConfig::new();
        config.git_services.gitlab.token_env = Some("GL".to_string());
        config.server.bind = "0.0.0.0:9000".to_string();
        config.save(&path).unwrap();

        let loaded = TrackerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
