//! Configuration management for shutter.
//!
//! Loads configuration from ${SHUTTER_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub mod paths {
    //! Path resolution for shutter configuration and data directories.
    //!
    //! SHUTTER_HOME resolution order:
    //! 1. SHUTTER_HOME environment variable (if set)
    //! 2. ~/.config/shutter (default)

    use std::path::PathBuf;

    /// Returns the shutter home directory.
    ///
    /// Checks SHUTTER_HOME env var first, falls back to ~/.config/shutter
    pub fn shutter_home() -> PathBuf {
        if let Ok(home) = std::env::var("SHUTTER_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("shutter"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        shutter_home().join("config.toml")
    }

    /// Returns the path to the stored credentials file.
    pub fn credentials_path() -> PathBuf {
        shutter_home().join("credentials.json")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application access key (OAuth client id). Falls back to
    /// UNSPLASH_ACCESS_KEY when unset.
    pub access_key: Option<String>,

    /// Application secret key (OAuth client secret). Falls back to
    /// UNSPLASH_SECRET_KEY when unset.
    pub secret_key: Option<String>,

    /// Base URL for authenticated API calls (for proxies/mocks).
    pub api_base_url: Option<String>,

    /// Base URL of the OAuth host (authorize page and token exchange).
    pub oauth_base_url: Option<String>,

    /// Redirect URI registered for the application.
    pub redirect_uri: String,

    /// Requested access scopes, space-separated. Form encoding turns the
    /// spaces into `+` on the wire.
    pub scope: String,

    /// When true, stored credentials are wiped during session bootstrap.
    /// Used by UI test runs; SHUTTER_RESET_LOGIN=1 forces it on.
    pub reset_login: bool,
}

impl Config {
    pub const DEFAULT_API_BASE_URL: &str = "https://api.unsplash.com";
    pub const DEFAULT_OAUTH_BASE_URL: &str = "https://unsplash.com";
    const DEFAULT_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";
    const DEFAULT_SCOPE: &str = "public read_user write_likes";

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Returns the configured access key if set and non-empty.
    pub fn effective_access_key(&self) -> Option<&str> {
        self.access_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Returns the configured secret key if set and non-empty.
    pub fn effective_secret_key(&self) -> Option<&str> {
        self.secret_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_key: None,
            secret_key: None,
            api_base_url: None,
            oauth_base_url: None,
            redirect_uri: Self::DEFAULT_REDIRECT_URI.to_string(),
            scope: Self::DEFAULT_SCOPE.to_string(),
            reset_login: false,
        }
    }
}

/// Resolves the access key with precedence: config > env.
///
/// # Errors
/// Returns an error if neither the config file nor the environment
/// provides a key.
pub fn resolve_access_key(config: &Config) -> Result<String> {
    resolve_key(
        config.effective_access_key(),
        "UNSPLASH_ACCESS_KEY",
        "access_key",
    )
}

/// Resolves the secret key with precedence: config > env.
///
/// # Errors
/// Returns an error if neither the config file nor the environment
/// provides a key.
pub fn resolve_secret_key(config: &Config) -> Result<String> {
    resolve_key(
        config.effective_secret_key(),
        "UNSPLASH_SECRET_KEY",
        "secret_key",
    )
}

fn resolve_key(configured: Option<&str>, env_var: &str, config_key: &str) -> Result<String> {
    if let Some(key) = configured {
        return Ok(key.to_string());
    }

    std::env::var(env_var).context(format!(
        "No application key available. Set {env_var} or {config_key} in config.toml."
    ))
}

/// Resolves the API base URL with precedence: env > config > default.
///
/// # Errors
/// Returns an error if the chosen value is not a well-formed URL.
pub fn resolve_api_base_url(config: &Config) -> Result<String> {
    resolve_base_url(
        config.api_base_url.as_deref(),
        "UNSPLASH_API_BASE_URL",
        Config::DEFAULT_API_BASE_URL,
        "API",
    )
}

/// Resolves the OAuth base URL with precedence: env > config > default.
///
/// # Errors
/// Returns an error if the chosen value is not a well-formed URL.
pub fn resolve_oauth_base_url(config: &Config) -> Result<String> {
    resolve_base_url(
        config.oauth_base_url.as_deref(),
        "UNSPLASH_OAUTH_BASE_URL",
        Config::DEFAULT_OAUTH_BASE_URL,
        "OAuth",
    )
}

fn resolve_base_url(
    config_base_url: Option<&str>,
    env_var: &str,
    default_url: &str,
    host_name: &str,
) -> Result<String> {
    // Try env var first
    if let Ok(env_url) = std::env::var(env_var) {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, host_name)?;
            return Ok(trimmed.to_string());
        }
    }

    // Try config value
    if let Some(config_url) = config_base_url {
        let trimmed = config_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, host_name)?;
            return Ok(trimmed.to_string());
        }
    }

    // Default
    Ok(default_url.to_string())
}

/// Validates that a URL is well-formed.
fn validate_url(url: &str, host_name: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid {host_name} base URL: {url}"))?;
    Ok(())
}

/// Whether session bootstrap should wipe stored credentials first.
/// SHUTTER_RESET_LOGIN=1 overrides the config value.
pub fn resolve_reset_login(config: &Config) -> bool {
    if std::env::var("SHUTTER_RESET_LOGIN").is_ok_and(|v| v == "1") {
        return true;
    }
    config.reset_login
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    /// Config loading: missing file returns defaults.
    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.access_key, None);
        assert_eq!(config.redirect_uri, "urn:ietf:wg:oauth:2.0:oob");
        assert_eq!(config.scope, "public read_user write_likes");
        assert!(!config.reset_login);
    }

    /// Config loading: partial config merges with defaults.
    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "access_key = \"ak_test\"\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.effective_access_key(), Some("ak_test"));
        assert_eq!(config.redirect_uri, "urn:ietf:wg:oauth:2.0:oob");
    }

    /// Config loading: malformed TOML is an error, not silent defaults.
    #[test]
    fn test_load_malformed_config_fails() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "access_key = [not toml").unwrap();

        assert!(Config::load_from(&config_path).is_err());
    }

    /// Keys: empty/whitespace values are treated as unset.
    #[test]
    fn test_effective_keys_empty_is_none() {
        let config = Config {
            access_key: Some("   ".to_string()),
            secret_key: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(config.effective_access_key(), None);
        assert_eq!(config.effective_secret_key(), None);
    }

    /// Base URL: config value wins over the default.
    #[test]
    fn test_resolve_api_base_url_from_config() {
        let config = Config {
            api_base_url: Some("https://proxy.example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_api_base_url(&config).unwrap(),
            "https://proxy.example.com"
        );
    }

    /// Base URL: unset resolves to the production default.
    #[test]
    fn test_resolve_api_base_url_default() {
        let config = Config::default();
        assert_eq!(
            resolve_api_base_url(&config).unwrap(),
            "https://api.unsplash.com"
        );
        assert_eq!(
            resolve_oauth_base_url(&config).unwrap(),
            "https://unsplash.com"
        );
    }

    /// Base URL: a malformed config value is rejected.
    #[test]
    fn test_resolve_base_url_rejects_invalid() {
        let config = Config {
            api_base_url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(resolve_api_base_url(&config).is_err());
    }

    /// Keys: the config value wins and is trimmed.
    #[test]
    fn test_resolve_access_key() {
        let config = Config {
            access_key: Some(" ak_configured ".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_access_key(&config).unwrap(), "ak_configured");
    }

    /// Reset flag: comes from the config file.
    #[test]
    fn test_reset_login_from_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "reset_login = true\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert!(resolve_reset_login(&config));
    }
}
