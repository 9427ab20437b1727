//! Configuration management
//!
//! Settings are read in this order of precedence:
//! 1. Environment variables
//! 2. `rota.toml`
//! 3. Defaults
//!
//! `${VAR_NAME}` inside the TOML file is replaced by the variable's value.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, RotaError};
use crate::models::{User, UserId};
use crate::page::PageSettings;
use crate::requirement::{RequirementThresholds, DEFAULT_WEEKDAY_MINIMUM, DEFAULT_WEEKEND_MINIMUM};

/// Default config file looked up in the working directory
pub const CONFIG_FILE: &str = "rota.toml";

/// Availability backend connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://duty.example.com/api`
    pub base_url: String,

    /// Bearer token sent with every request (optional)
    pub api_token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Who is looking at the page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            id: 1,
            name: "Staff".to_string(),
            email: String::new(),
            is_admin: false,
        }
    }
}

/// Calendar editing rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Allow editing days before today
    pub allow_past_edits: bool,
    pub weekday_minimum: u32,
    pub weekend_minimum: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            allow_past_edits: false,
            weekday_minimum: DEFAULT_WEEKDAY_MINIMUM,
            weekend_minimum: DEFAULT_WEEKEND_MINIMUM,
        }
    }
}

/// Dashboard listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub viewer: ViewerConfig,
    pub calendar: CalendarConfig,
    pub dashboard: ServerConfig,
}

impl Config {
    /// Replace `${VAR_NAME}` with the variable's value. Unset variables
    /// expand to an empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(start) = rest.find("${") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let name = &after[..end];
                    if !name.is_empty() {
                        result.push_str(&std::env::var(name).unwrap_or_default());
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    // Unterminated reference, keep it verbatim
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
        result
    }

    /// Load from a TOML file, then apply environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RotaError::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;

        let mut cfg = Self::from_toml_str(&content)?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Parse TOML text without looking at the environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let expanded = Self::expand_env_vars(content);
        let toml: TomlConfig =
            toml::from_str(&expanded).map_err(|e| RotaError::Config(format!("Failed to parse TOML: {}", e)))?;
        Ok(Self::from_toml_config(toml))
    }

    /// Load `rota.toml` from the working directory, or the environment
    /// alone when it does not exist
    pub fn load() -> Result<Self> {
        if Path::new(CONFIG_FILE).exists() {
            return Self::from_toml_file(CONFIG_FILE);
        }
        Ok(Self::from_env())
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg
    }

    fn from_toml_config(toml: TomlConfig) -> Self {
        let backend = toml.backend.unwrap_or_default();
        let viewer = toml.viewer.unwrap_or_default();
        let calendar = toml.calendar.unwrap_or_default();
        let dashboard = toml.dashboard.unwrap_or_default();
        let defaults = ViewerConfig::default();

        Config {
            backend: BackendConfig {
                base_url: backend.base_url.unwrap_or_else(default_base_url),
                api_token: backend.api_token.filter(|t| !t.is_empty()),
                timeout_secs: backend.timeout_secs.unwrap_or_else(default_timeout_secs),
            },
            viewer: ViewerConfig {
                id: viewer.id.unwrap_or(defaults.id),
                name: viewer.name.unwrap_or(defaults.name),
                email: viewer.email.unwrap_or(defaults.email),
                is_admin: viewer.is_admin.unwrap_or(false),
            },
            calendar: CalendarConfig {
                allow_past_edits: calendar.allow_past_edits.unwrap_or(false),
                weekday_minimum: calendar.weekday_minimum.unwrap_or(DEFAULT_WEEKDAY_MINIMUM),
                weekend_minimum: calendar.weekend_minimum.unwrap_or(DEFAULT_WEEKEND_MINIMUM),
            },
            dashboard: ServerConfig {
                host: dashboard.host.unwrap_or_else(default_host),
                port: dashboard.port.unwrap_or_else(default_port),
            },
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Some(url) = env_non_empty("ROTA_BACKEND_URL") {
            self.backend.base_url = url;
        }
        if let Some(token) = env_non_empty("ROTA_API_TOKEN") {
            self.backend.api_token = Some(token);
        }
        if let Some(secs) = env_non_empty("ROTA_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.backend.timeout_secs = secs;
        }

        if let Some(id) = env_non_empty("ROTA_USER_ID").and_then(|s| s.parse().ok()) {
            self.viewer.id = id;
        }
        if let Some(name) = env_non_empty("ROTA_USER_NAME") {
            self.viewer.name = name;
        }
        if let Some(email) = env_non_empty("ROTA_USER_EMAIL") {
            self.viewer.email = email;
        }
        if let Some(admin) = env_non_empty("ROTA_USER_ADMIN") {
            self.viewer.is_admin = parse_flag(&admin);
        }

        if let Some(allow) = env_non_empty("ROTA_ALLOW_PAST_EDITS") {
            self.calendar.allow_past_edits = parse_flag(&allow);
        }

        if let Some(host) = env_non_empty("ROTA_HOST") {
            self.dashboard.host = host;
        }
        if let Some(port) = env_non_empty("ROTA_PORT").and_then(|s| s.parse().ok()) {
            self.dashboard.port = port;
        }
    }

    /// The viewer as a [`User`]
    pub fn viewer_user(&self) -> User {
        User {
            id: self.viewer.id,
            name: self.viewer.name.clone(),
            email: self.viewer.email.clone(),
            is_admin: self.viewer.is_admin,
        }
    }

    pub fn page_settings(&self) -> PageSettings {
        PageSettings {
            allow_past_edits: self.calendar.allow_past_edits,
            thresholds: RequirementThresholds {
                weekday_minimum: self.calendar.weekday_minimum,
                weekend_minimum: self.calendar.weekend_minimum,
            },
        }
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

// ============================================================================
// TOML file layout (every key optional)
// ============================================================================

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    backend: Option<TomlBackendConfig>,
    viewer: Option<TomlViewerConfig>,
    calendar: Option<TomlCalendarConfig>,
    dashboard: Option<TomlServerConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlBackendConfig {
    base_url: Option<String>,
    api_token: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlViewerConfig {
    id: Option<UserId>,
    name: Option<String>,
    email: Option<String>,
    is_admin: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlCalendarConfig {
    allow_past_edits: Option<bool>,
    weekday_minimum: Option<u32>,
    weekend_minimum: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlServerConfig {
    host: Option<String>,
    port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend.base_url, "http://localhost:8000/api");
        assert_eq!(config.backend.timeout_secs, 30);
        assert!(!config.calendar.allow_past_edits);
        assert_eq!(config.calendar.weekday_minimum, 3);
        assert_eq!(config.calendar.weekend_minimum, 2);
        assert_eq!(config.dashboard.port, 3000);
    }

    #[test]
    fn test_expand_env_vars() {
        unsafe {
            std::env::set_var("ROTA_TEST_EXPAND", "secret");
        }
        assert_eq!(Config::expand_env_vars("a_${ROTA_TEST_EXPAND}_b"), "a_secret_b");
        assert_eq!(Config::expand_env_vars("a_${ROTA_TEST_UNSET_VAR}_b"), "a__b");
        assert_eq!(Config::expand_env_vars("${}_x"), "_x");
        assert_eq!(Config::expand_env_vars("no vars"), "no vars");
        assert_eq!(Config::expand_env_vars("broken ${REF"), "broken ${REF");
        unsafe {
            std::env::remove_var("ROTA_TEST_EXPAND");
        }
    }

    #[test]
    fn test_toml_parsing() {
        let toml = r#"
[backend]
base_url = "https://duty.example.com/api"
timeout_secs = 5

[viewer]
id = 42
name = "Dana"
email = "dana@example.com"
is_admin = true

[calendar]
allow_past_edits = true
weekday_minimum = 4

[dashboard]
port = 8080
"#;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.backend.base_url, "https://duty.example.com/api");
        assert_eq!(config.backend.timeout_secs, 5);
        assert!(config.backend.api_token.is_none());
        assert_eq!(config.viewer.id, 42);
        assert!(config.viewer_user().is_admin);
        assert!(config.calendar.allow_past_edits);
        assert_eq!(config.page_settings().thresholds.weekday_minimum, 4);
        assert_eq!(config.page_settings().thresholds.weekend_minimum, 2);
        assert_eq!(config.dashboard.host, "127.0.0.1");
        assert_eq!(config.dashboard.port, 8080);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml_str("[backend\nbase_url = 1").unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[viewer]\nname = \"Eli\"").unwrap();
        let config = Config::from_toml_file(file.path()).unwrap();
        assert_eq!(config.viewer.name, "Eli");
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::from_toml_file("/nonexistent/rota.toml").is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("nope"));
    }
}
