//! Configuration management
//!
//! This module provides YAML-based configuration management with support for:
//! - Environment variable overrides
//! - Multiple configuration file locations
//! - Default values for all settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on the time spent handling a single request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Origins allowed to call the JSON API from a browser; empty means any
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://./data/laser-beam.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

/// Authentication and session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Organization whose API keys and global admins may access every tenant
    #[serde(default = "default_global_organization_id")]
    pub global_organization_id: i64,
    /// Idle time after which a login session expires
    #[serde(default = "default_session_ttl")]
    pub session_ttl_minutes: u64,
    #[serde(default = "default_session_cookie_name")]
    pub session_cookie_name: String,
    /// Mark the session cookie `Secure` (requires HTTPS in front of the server)
    #[serde(default)]
    pub cookie_secure: bool,
    /// Development only: treat every web request as signed in as this user
    #[serde(default)]
    pub auto_login_user: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            global_organization_id: default_global_organization_id(),
            session_ttl_minutes: default_session_ttl(),
            session_cookie_name: default_session_cookie_name(),
            cookie_secure: false,
            auto_login_user: None,
        }
    }
}

/// Upper bound for `session_ttl_minutes`: one year
pub const MAX_SESSION_TTL_MINUTES: u64 = 60 * 24 * 365;

impl AuthConfig {
    /// Session lifetime, clamped to [`MAX_SESSION_TTL_MINUTES`]
    pub fn session_ttl(&self) -> chrono::Duration {
        let minutes = self.session_ttl_minutes.min(MAX_SESSION_TTL_MINUTES);
        chrono::Duration::minutes(minutes as i64)
    }
}

fn default_global_organization_id() -> i64 {
    1
}

fn default_session_ttl() -> u64 {
    480
}

fn default_session_cookie_name() -> String {
    "session_key".to_string()
}

/// Input validation rules for account changes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidationConfig {
    #[serde(default = "default_name_min_length")]
    pub name_min_length: usize,
    #[serde(default = "default_password_min_length")]
    pub password_min_length: usize,
    #[serde(default = "default_password_max_length")]
    pub password_max_length: usize,
    /// ISO 3166 region used to interpret phone numbers without a country code
    #[serde(default = "default_phone_region")]
    pub default_phone_region: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            name_min_length: default_name_min_length(),
            password_min_length: default_password_min_length(),
            password_max_length: default_password_max_length(),
            default_phone_region: default_phone_region(),
        }
    }
}

impl ValidationConfig {
    pub fn phone_region(&self) -> Result<phonenumber::country::Id> {
        self.default_phone_region
            .to_uppercase()
            .parse()
            .map_err(|_| anyhow::anyhow!("Unknown phone region: {}", self.default_phone_region))
    }
}

fn default_name_min_length() -> usize {
    3
}

fn default_password_min_length() -> usize {
    4
}

fn default_password_max_length() -> usize {
    64
}

fn default_phone_region() -> String {
    "US".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    /// Log output target (console or file)
    #[serde(default)]
    pub target: LogTarget,
    /// Directory for log files (used when target is "file" or "both")
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,
    #[serde(default = "default_log_rotation")]
    pub daily_rotation: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            target: LogTarget::default(),
            log_dir: default_log_dir(),
            log_prefix: default_log_prefix(),
            daily_rotation: default_log_rotation(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// Log output target
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    #[default]
    Console,
    File,
    Both,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_log_prefix() -> String {
    "laser-beam".to_string()
}

fn default_log_rotation() -> bool {
    true
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values
    /// 2. Configuration file (YAML)
    /// 3. Environment variables (prefixed with LASER_BEAM_)
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let config_path = std::env::var("LASER_BEAM_CONFIG")
            .map(PathBuf::from)
            .ok()
            .or_else(Self::find_config_file);

        let mut config = match config_path {
            Some(ref path) if path.exists() => {
                eprintln!("[CONFIG] Loading configuration from: {:?}", path);
                Self::from_file(path)?
            }
            Some(ref path) => {
                eprintln!("[CONFIG] Config file not found: {:?}, using defaults", path);
                AppConfig::default()
            }
            None => {
                eprintln!("[CONFIG] No config file found, using defaults");
                AppConfig::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_norway::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Find the configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            PathBuf::from("config.yaml"),
            PathBuf::from("config/config.yaml"),
            PathBuf::from("/etc/laser-beam/config.yaml"),
            dirs::config_dir()
                .map(|p| p.join("laser-beam/config.yaml"))
                .unwrap_or_default(),
        ];

        paths.into_iter().find(|p| p.exists())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("LASER_BEAM_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("LASER_BEAM_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        if let Ok(url) = std::env::var("LASER_BEAM_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(id) = std::env::var("LASER_BEAM_GLOBAL_ORG_ID") {
            if let Ok(id) = id.parse() {
                self.auth.global_organization_id = id;
            }
        }
        if let Ok(ttl) = std::env::var("LASER_BEAM_SESSION_TTL_MINUTES") {
            if let Ok(ttl) = ttl.parse() {
                self.auth.session_ttl_minutes = ttl;
            }
        }
        if let Ok(secure) = std::env::var("LASER_BEAM_COOKIE_SECURE") {
            self.auth.cookie_secure = matches!(secure.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        if let Ok(username) = std::env::var("LASER_BEAM_AUTO_LOGIN_USER") {
            self.auth.auto_login_user = Some(username).filter(|u| !u.is_empty());
        }

        if let Ok(level) = std::env::var("LASER_BEAM_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LASER_BEAM_LOG_FORMAT") {
            self.logging.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "compact" => LogFormat::Compact,
                _ => LogFormat::Pretty,
            };
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.auth.global_organization_id < 1 {
            anyhow::bail!("Global organization id must be a positive id");
        }
        if self.auth.session_ttl_minutes == 0 {
            anyhow::bail!("Session TTL must be at least one minute");
        }
        if self.auth.session_ttl_minutes > MAX_SESSION_TTL_MINUTES {
            anyhow::bail!(
                "Session TTL ({} minutes) exceeds the maximum of {} minutes",
                self.auth.session_ttl_minutes,
                MAX_SESSION_TTL_MINUTES
            );
        }
        if self.auth.session_cookie_name.is_empty() {
            anyhow::bail!("Session cookie name cannot be empty");
        }

        let validation = &self.validation;
        if validation.password_min_length == 0 {
            anyhow::bail!("Minimum password length must be at least 1");
        }
        if validation.password_min_length > validation.password_max_length {
            anyhow::bail!(
                "Minimum password length ({}) exceeds maximum ({})",
                validation.password_min_length,
                validation.password_max_length
            );
        }
        validation.phone_region()?;

        Ok(())
    }
}
