//! Configuration loading for Melody services
//!
//! Settings sources, highest priority first:
//!
//! 1. Command-line arguments (applied by the binary after loading)
//! 2. Environment variables (`SPOTIFY_*`, `LLMPROXY_*`, `MELODY_LOG_LEVEL`)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! A missing TOML file is not fatal: the service logs a warning and starts
//! from defaults plus environment. Mandatory credentials are checked by
//! [`TomlConfig::validate`] once every source has been applied.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "MELODY_CONFIG";

/// Complete service configuration as read from `config.toml`
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Text-generation provider
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Music catalog (Spotify Web API) credentials and playlist owner
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Timeout applied to every outbound HTTP call, in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Default: 5001
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stdout if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Text-generation provider settings
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Full URL of the generation endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Sent as `x-api-key`
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Number of prior exchanges the provider keeps in context per session
    #[serde(default = "default_lastk")]
    pub lastk: u32,

    #[serde(default)]
    pub rag_usage: bool,

    #[serde(default = "default_rag_threshold")]
    pub rag_threshold: f32,

    #[serde(default = "default_rag_k")]
    pub rag_k: u32,
}

/// Music catalog settings
///
/// Every playlist is created under `owner_user_id`, whoever is chatting.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,

    /// OAuth redirect URI registered for the app; must point at `/callback`
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Catalog account that owns every generated playlist
    #[serde(default)]
    pub owner_user_id: Option<String>,

    /// Long-lived refresh token for the owner account.
    /// May be absent at startup and installed later through `/callback`.
    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_accounts_base_url")]
    pub accounts_base_url: String,

    #[serde(default = "default_playlist_description")]
    pub playlist_description: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_http_timeout_secs() -> u64 {
    15
}

fn default_model() -> String {
    "4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_lastk() -> u32 {
    10
}

fn default_rag_threshold() -> f32 {
    0.5
}

fn default_rag_k() -> u32 {
    5
}

fn default_redirect_uri() -> String {
    "http://localhost:8888/callback".to_string()
}

fn default_api_base_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_accounts_base_url() -> String {
    "https://accounts.spotify.com".to_string()
}

fn default_playlist_description() -> String {
    "A custom playlist generated by Melody 🎶".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            lastk: default_lastk(),
            rag_usage: false,
            rag_threshold: default_rag_threshold(),
            rag_k: default_rag_k(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: default_redirect_uri(),
            owner_user_id: None,
            refresh_token: None,
            api_base_url: default_api_base_url(),
            accounts_base_url: default_accounts_base_url(),
            playlist_description: default_playlist_description(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            generation: GenerationConfig::default(),
            catalog: CatalogConfig::default(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl TomlConfig {
    /// Load configuration from every source except the command line
    ///
    /// `explicit_path` is the `--config` argument (or `MELODY_CONFIG`, which
    /// clap folds into the same argument). An explicit path that cannot be
    /// read is an error; a missing default-location file is not.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(path)?
            }
            None => match default_config_file() {
                Some(path) => Self::from_file(&path)?,
                None => {
                    warn!("No config file found, using built-in defaults and environment");
                    Self::default()
                }
            },
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded config file: {}", path.display());
        Ok(config)
    }

    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay environment variables onto the file values
    ///
    /// Blank values are ignored so an empty `.env` entry cannot erase a
    /// value from the config file.
    pub fn apply_env_overrides(&mut self) {
        let catalog = &mut self.catalog;
        override_opt(&mut catalog.client_id, "SPOTIFY_CLIENT_ID");
        override_opt(&mut catalog.client_secret, "SPOTIFY_CLIENT_SECRET");
        override_opt(&mut catalog.owner_user_id, "SPOTIFY_USER_ID");
        override_opt(&mut catalog.refresh_token, "SPOTIFY_REFRESH_TOKEN");
        if let Some(uri) = env_value("SPOTIFY_REDIRECT_URI") {
            catalog.redirect_uri = uri;
        }

        override_opt(&mut self.generation.endpoint, "LLMPROXY_ENDPOINT");
        override_opt(&mut self.generation.api_key, "LLMPROXY_API_KEY");

        if let Some(level) = env_value("MELODY_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Check that everything needed to serve requests is present
    ///
    /// Reports all missing keys in one error.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();

        if !is_set(&self.generation.endpoint) {
            missing.push("generation.endpoint (LLMPROXY_ENDPOINT)");
        }
        if !is_set(&self.generation.api_key) {
            missing.push("generation.api_key (LLMPROXY_API_KEY)");
        }
        if !is_set(&self.catalog.client_id) {
            missing.push("catalog.client_id (SPOTIFY_CLIENT_ID)");
        }
        if !is_set(&self.catalog.client_secret) {
            missing.push("catalog.client_secret (SPOTIFY_CLIENT_SECRET)");
        }
        if !is_set(&self.catalog.owner_user_id) {
            missing.push("catalog.owner_user_id (SPOTIFY_USER_ID)");
        }

        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "Missing required settings: {}",
                missing.join(", ")
            )));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(Error::InvalidInput(format!(
                "generation.temperature must be within 0.0..=2.0, got {}",
                self.generation.temperature
            )));
        }

        if self.http_timeout_secs == 0 {
            return Err(Error::InvalidInput(
                "http_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Outbound HTTP timeout as a Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Locate a config file in the platform default locations
///
/// Linux: `~/.config/melody/config.toml`, then `/etc/melody/config.toml`.
/// Other platforms: the user config directory only.
pub fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("melody").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/melody/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn override_opt(slot: &mut Option<String>, name: &str) {
    if let Some(value) = env_value(name) {
        *slot = Some(value);
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}
