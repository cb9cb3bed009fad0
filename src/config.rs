use crate::error::ConfigError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "jelai-admin.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Public URL of the dashboard service, e.g.
    /// `https://hub.example.org/services/learn-dashboard`.
    pub base_url: String,
    /// Hub OAuth token forwarded as `Authorization: token ...`.
    pub token: Option<String>,
    /// Transport timeout for a single request. `None` leaves requests unbounded.
    pub request_timeout_secs: Option<u64>,
    pub notification_secs: u64,
    /// Globs skipped when a whole folder is added to an upload selection.
    pub exclude_patterns: Vec<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/services/learn-dashboard".to_string(),
            token: None,
            request_timeout_secs: None,
            notification_secs: 5,
            exclude_patterns: vec![
                "**/.ipynb_checkpoints/**".to_string(),
                "**/.DS_Store".to_string(),
                "**/__pycache__/**".to_string(),
            ],
        }
    }
}

impl AdminConfig {
    /// Reads `path` if it exists, otherwise falls back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn with_overrides(mut self, base_url: Option<String>, token: Option<String>) -> Self {
        if let Some(base_url) = base_url {
            self.base_url = base_url;
        }
        if token.is_some() {
            self.token = token;
        }
        self
    }

    pub fn proxy_base(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl {
                url: self.base_url.clone(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let config = AdminConfig::from_toml(
            r#"
            base_url = "https://hub.example.org/services/learn-dashboard"
            token = "abc123"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.base_url,
            "https://hub.example.org/services/learn-dashboard"
        );
        assert_eq!(config.token.as_deref(), Some("abc123"));
        assert_eq!(config.notification_secs, 5);
        assert_eq!(config.request_timeout(), None);
        assert!(!config.exclude_patterns.is_empty());
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AdminConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AdminConfig::default());
    }

    #[test]
    fn malformed_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "notification_secs = \"soon\"").unwrap();

        let err = AdminConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn cli_overrides_win_over_file_values() {
        let config = AdminConfig {
            token: Some("from-file".into()),
            ..AdminConfig::default()
        }
        .with_overrides(Some("https://other.example.org/dash".into()), None);

        assert_eq!(config.base_url, "https://other.example.org/dash");
        assert_eq!(config.token.as_deref(), Some("from-file"));
    }

    #[test]
    fn proxy_base_rejects_non_base_urls() {
        let config = AdminConfig {
            base_url: "mailto:admin@example.org".into(),
            ..AdminConfig::default()
        };
        assert!(matches!(
            config.proxy_base(),
            Err(ConfigError::InvalidUrl { .. })
        ));

        let config = AdminConfig {
            base_url: "not a url".into(),
            ..AdminConfig::default()
        };
        assert!(config.proxy_base().is_err());
    }
}
