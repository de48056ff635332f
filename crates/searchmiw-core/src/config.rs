//! Configuration management for SearchMIW.
//!
//! Loads configuration from ${SEARCHMIW_HOME}/config.toml with sensible defaults.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable overriding the configured base URL.
pub const BASE_URL_ENV: &str = "SEARCHMIW_BASE_URL";

/// How search requests reach the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchTransport {
    /// `search(query, language)` on the aggregator's GraphQL endpoint (default)
    #[default]
    Graphql,
    /// `GET /api/search` through the gateway
    Rest,
}

/// Search configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub transport: SearchTransport,
}

pub mod paths {
    //! Path resolution for SearchMIW configuration and session data.
    //!
    //! SEARCHMIW_HOME resolution order:
    //! 1. SEARCHMIW_HOME environment variable (if set)
    //! 2. ~/.config/searchmiw (default)

    use std::path::PathBuf;

    /// Returns the SearchMIW home directory.
    pub fn searchmiw_home() -> PathBuf {
        if let Ok(home) = std::env::var("SEARCHMIW_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".searchmiw"),
            |h| h.join(".config").join("searchmiw"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        searchmiw_home().join("config.toml")
    }

    /// Returns the path to the persisted session.
    pub fn session_path() -> PathBuf {
        searchmiw_home().join("session.json")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the API gateway
    pub base_url: String,
    /// Path of the GraphQL endpoint relative to `base_url`
    pub graphql_path: String,
    /// Absolute GraphQL endpoint on another host; overrides `graphql_path`
    pub graphql_url: Option<String>,
    /// Language used for searches when the caller gives none
    pub default_language: String,
    /// Optional log file (stderr when unset)
    pub log_file: Option<String>,
    pub search: SearchConfig,
}

impl Config {
    pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
    pub const DEFAULT_GRAPHQL_PATH: &str = "/api/graphql";
    pub const DEFAULT_LANGUAGE: &str = "en";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
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

    /// Creates a config file from the default template.
    ///
    /// # Errors
    /// Fails if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        write_atomic(path, default_config_template().as_bytes())
    }

    /// Sets `base_url` in the config file at `path`, keeping everything else.
    ///
    /// An existing file is edited in place, comments and unknown keys
    /// included; a missing one starts from the commented template.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the file cannot be updated.
    pub fn save_base_url_to(path: &Path, base_url: &str) -> Result<()> {
        let base_url = base_url.trim();
        validate_url(base_url)?;

        let current = if path.exists() {
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?
        } else {
            default_config_template().to_string()
        };
        let mut doc: toml_edit::DocumentMut = current
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        doc["base_url"] = toml_edit::value(base_url);
        write_atomic(path, doc.to_string().as_bytes())
    }

    /// Returns the base URL to use, with precedence: env > config > default.
    ///
    /// # Errors
    /// Returns an error if the selected URL is not a valid absolute URL.
    pub fn effective_base_url(&self) -> Result<String> {
        let env_url = std::env::var(BASE_URL_ENV).ok();
        resolve_base_url(env_url.as_deref(), Some(&self.base_url))
    }

    /// Returns the configured GraphQL endpoint override, if any.
    ///
    /// # Errors
    /// Returns an error if the value is not a valid absolute URL.
    pub fn graphql_url(&self) -> Result<Option<String>> {
        let Some(url) = self
            .graphql_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
        else {
            return Ok(None);
        };
        url::Url::parse(url).with_context(|| format!("Invalid graphql_url: {url}"))?;
        Ok(Some(url.to_string()))
    }

    /// Returns the search language, falling back to the built-in default.
    pub fn effective_language(&self) -> &str {
        let trimmed = self.default_language.trim();
        if trimmed.is_empty() {
            Self::DEFAULT_LANGUAGE
        } else {
            trimmed
        }
    }

    /// Returns the configured log file path, if any.
    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.log_file
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            graphql_path: Self::DEFAULT_GRAPHQL_PATH.to_string(),
            graphql_url: None,
            default_language: Self::DEFAULT_LANGUAGE.to_string(),
            log_file: None,
            search: SearchConfig::default(),
        }
    }
}

/// Resolves a base URL with precedence: env > config > default.
///
/// Empty or whitespace-only values count as unset. The result never ends
/// in a slash so endpoint paths can be appended directly.
///
/// # Errors
/// Returns an error if the chosen value is not a valid URL.
pub fn resolve_base_url(env_value: Option<&str>, config_value: Option<&str>) -> Result<String> {
    let chosen = [env_value, config_value]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty());

    match chosen {
        Some(url) => {
            validate_url(url)?;
            Ok(url.trim_end_matches('/').to_string())
        }
        None => Ok(Config::DEFAULT_BASE_URL.to_string()),
    }
}

/// Validates that a URL is well-formed.
fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid base URL: {url}"))?;
    Ok(())
}

/// Returns the default config template with comments.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Writes `contents` to `path` through a temp file in the same directory.
///
/// The temp file is created 0600 on unix and renamed into place, so readers
/// never see a partial file.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(contents)
        .with_context(|| format!("Failed to write {}", tmp.path().display()))?;
    tmp.persist(path)
        .with_context(|| format!("Failed to move file into {}", path.display()))?;
    Ok(())
}
