//! Configuration management for the CareFinder skill
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::CareFinderError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the CareFinder skill
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CareFinderConfig {
    /// Skill identity
    #[serde(default)]
    pub skill: SkillConfig,
    /// Geocoding provider configuration
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    /// ER wait-time feed configuration
    #[serde(default)]
    pub feed: FeedConfig,
    /// Device Address API configuration
    #[serde(default)]
    pub device_address: DeviceAddressConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Skill identity settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillConfig {
    /// Expected application id; requests for other skills are rejected when set
    pub application_id: Option<String>,
    /// Maximum age of a request timestamp in seconds; 0 disables the check
    #[serde(default = "default_timestamp_tolerance")]
    pub timestamp_tolerance_seconds: u32,
}

/// Geocoding provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Provider API key
    pub api_key: Option<String>,
    /// Base URL of the geocoding endpoint
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// ER wait-time feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// URL scheme used to reach the feed host
    #[serde(default = "default_feed_scheme")]
    pub scheme: String,
    #[serde(default = "default_feed_hostname")]
    pub hostname: String,
    #[serde(default = "default_feed_path")]
    pub path: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Device Address API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceAddressConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// PEM certificate chain; HTTPS is served when both paths are set
    pub tls_cert_path: Option<PathBuf>,
    /// PEM private key
    pub tls_key_path: Option<PathBuf>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_timestamp_tolerance() -> u32 {
    150
}

fn default_geocoding_base_url() -> String {
    "https://maps.googleapis.com/maps/api/geocode/json".to_string()
}

fn default_timeout() -> u32 {
    10
}

fn default_feed_scheme() -> String {
    "https".to_string()
}

fn default_feed_hostname() -> String {
    "hcafeeds.medcity.net".to_string()
}

fn default_feed_path() -> String {
    "/rss/er/wfl_rss_feed.json".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            application_id: None,
            timestamp_tolerance_seconds: default_timestamp_tolerance(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_geocoding_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            scheme: default_feed_scheme(),
            hostname: default_feed_hostname(),
            path: default_feed_path(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for DeviceAddressConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl GeocodingConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl FeedConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl DeviceAddressConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl ServerConfig {
    /// `host:port` to bind
    #[must_use]
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl CareFinderConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(std::env::var_os("CAREFINDER_CONFIG").map(PathBuf::from))
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Add environment variable overrides, e.g. CAREFINDER_GEOCODING__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("CAREFINDER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: CareFinderConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("carefinder").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.geocoding.timeout_seconds == 0 {
            self.geocoding.timeout_seconds = default_timeout();
        }
        if self.feed.scheme.is_empty() {
            self.feed.scheme = default_feed_scheme();
        }
        if self.feed.hostname.is_empty() {
            self.feed.hostname = default_feed_hostname();
        }
        if self.feed.path.is_empty() {
            self.feed.path = default_feed_path();
        }
        if self.feed.timeout_seconds == 0 {
            self.feed.timeout_seconds = default_timeout();
        }
        if self.device_address.timeout_seconds == 0 {
            self.device_address.timeout_seconds = default_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        if let Some(api_key) = &self.geocoding.api_key {
            if api_key.trim().is_empty() {
                return Err(CareFinderError::config(
                    "Geocoding API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }
        }

        if let Some(application_id) = &self.skill.application_id {
            if application_id.trim().is_empty() {
                return Err(
                    CareFinderError::config("Skill application id cannot be empty if provided").into(),
                );
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            ("Geocoding", self.geocoding.timeout_seconds),
            ("Feed", self.feed.timeout_seconds),
            ("Device address", self.device_address.timeout_seconds),
        ];
        if self.skill.timestamp_tolerance_seconds > 3600 {
            return Err(CareFinderError::config(
                "Request timestamp tolerance cannot exceed 3600 seconds",
            )
            .into());
        }

        for (name, seconds) in timeouts {
            if seconds > 60 {
                return Err(CareFinderError::config(format!(
                    "{name} timeout cannot exceed 60 seconds"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(CareFinderError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(CareFinderError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.geocoding.base_url.starts_with("http://")
            && !self.geocoding.base_url.starts_with("https://")
        {
            return Err(CareFinderError::config(
                "Geocoding base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        if !matches!(self.feed.scheme.as_str(), "http" | "https") {
            return Err(CareFinderError::config("Feed scheme must be http or https").into());
        }

        if !self.feed.path.starts_with('/') {
            return Err(CareFinderError::config("Feed path must start with '/'").into());
        }

        if self.server.tls_cert_path.is_some() != self.server.tls_key_path.is_some() {
            return Err(CareFinderError::config(
                "TLS requires both tls_cert_path and tls_key_path",
            )
            .into());
        }

        Ok(())
    }
}
