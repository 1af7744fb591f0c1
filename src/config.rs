//! Configuration file parser for ~/.config/feedmerge/config.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos. Environment overrides are applied on top with
//! [`Config::apply_overrides`], then [`Config::validate`] checks the result.
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::feed::{ChannelInfo, FetchOptions, Source, DEFAULT_MAX_FEED_SIZE};
use crate::util::validate_url;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration shared by `serve` and `watch`.
///
/// All sections use `#[serde(default)]` so any subset of keys can be
/// specified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub channel: ChannelInfo,
    pub fetch: FetchConfig,
    pub client: ClientConfig,
    pub sources: Vec<Source>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            channel: ChannelInfo::default(),
            fetch: FetchConfig::default(),
            client: ClientConfig::default(),
            sources: default_sources(),
        }
    }
}

fn default_sources() -> Vec<Source> {
    vec![
        Source::new("Punch", "https://punchng.com/feed/"),
        Source::new("Vanguard", "https://www.vanguardngr.com/feed/"),
        Source::new("The Nation", "https://thenationonlineng.net/feed/"),
        Source::new("Guardian", "https://guardian.ng/feed/"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Exact allowed origin. `None` or `"*"` allows any origin.
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origin: None,
        }
    }
}

impl ServerConfig {
    /// The configured origin, or `None` when any origin is allowed.
    pub fn allowed_origin(&self) -> Option<&str> {
        self.cors_origin
            .as_deref()
            .map(str::trim)
            .filter(|origin| !origin.is_empty() && *origin != "*")
    }
}

/// Upstream fetch settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-source request timeout in seconds. 0 = HTTP client default.
    pub timeout_secs: u64,
    pub max_feed_bytes: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_feed_bytes: DEFAULT_MAX_FEED_SIZE,
            user_agent: default_user_agent(),
        }
    }
}

impl FetchConfig {
    pub fn options(&self) -> FetchOptions {
        FetchOptions {
            timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
            max_bytes: self.max_feed_bytes,
        }
    }
}

/// Terminal client settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_url: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Cap on items kept in memory (0 = unlimited).
    pub max_items: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000/api/feed".to_string(),
            poll_interval_secs: 300,
            request_timeout_secs: 8,
            max_items: 1000,
        }
    }
}

pub fn default_user_agent() -> String {
    format!("feedmerge/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Known keys per section, used only for typo warnings.
    const KNOWN_KEYS: &'static [(&'static str, &'static [&'static str])] = &[
        ("server", &["host", "port", "cors_origin"]),
        ("channel", &["title", "description", "link"]),
        ("fetch", &["timeout_secs", "max_feed_bytes", "user_agent"]),
        (
            "client",
            &["api_url", "poll_interval_secs", "request_timeout_secs", "max_items"],
        ),
        ("sources", &["name", "url"]),
    ];

    /// `$HOME/.config/feedmerge/config.toml`, if `HOME` is set.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("feedmerge")
                .join("config.toml")
        })
    }

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check size before reading so a huge file is never pulled into memory.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            warn_unknown_keys(&raw);
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            sources = config.sources.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Applies `PORT`, `FEEDMERGE_HOST`, `FEEDMERGE_CORS_ORIGIN` and
    /// `FEEDMERGE_API_URL` from `lookup`. Empty values are ignored.
    ///
    /// Pass `|k| std::env::var(k).ok()` for the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT is not a valid port: {port}")))?;
        }
        if let Some(host) = get("FEEDMERGE_HOST") {
            self.server.host = host;
        }
        if let Some(origin) = get("FEEDMERGE_CORS_ORIGIN") {
            self.server.cors_origin = Some(origin);
        }
        if let Some(api_url) = get("FEEDMERGE_API_URL") {
            self.client.api_url = api_url;
        }
        Ok(())
    }

    /// Rejects configurations that would misbehave at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "source with URL {} has an empty name",
                    source.url
                )));
            }
            if !names.insert(source.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate source name: {}",
                    source.name
                )));
            }
            validate_url(&source.url).map_err(|e| {
                ConfigError::Invalid(format!("source {}: {}", source.name, e))
            })?;
        }

        if self.client.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "client.poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.client.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "client.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.fetch.max_feed_bytes == 0 {
            return Err(ConfigError::Invalid(
                "fetch.max_feed_bytes must be greater than 0".to_string(),
            ));
        }
        validate_url(&self.client.api_url)
            .map_err(|e| ConfigError::Invalid(format!("client.api_url: {e}")))?;

        Ok(())
    }
}

fn warn_unknown_keys(raw: &toml::Table) {
    for (key, value) in raw {
        let Some((_, known)) = Config::KNOWN_KEYS.iter().find(|(section, _)| section == key) else {
            tracing::warn!(key = %key, "Unknown key in config file, ignoring");
            continue;
        };
        let tables: Vec<&toml::Table> = match value {
            toml::Value::Table(t) => vec![t],
            toml::Value::Array(entries) => entries.iter().filter_map(|v| v.as_table()).collect(),
            _ => Vec::new(),
        };
        for table in tables {
            for inner in table.keys() {
                if !known.contains(&inner.as_str()) {
                    tracing::warn!(key = %format!("{key}.{inner}"), "Unknown key in config file, ignoring");
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
