//! Configuration management for the weather records service
//!
//! Handles loading configuration from an optional file, environment variables
//! and `.env` files, and validates the loaded settings. API keys are optional
//! at load time; operations that need one fail when they run without it.

use crate::WeatherRecordError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Weather and geocoding provider configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Map embed configuration
    #[serde(default)]
    pub maps: MapsConfig,
    /// Record store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed by CORS
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Weather API key, also used for geocoding
    pub api_key: Option<String>,
    /// Base URL for current weather and forecast
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Base URL for the geocoding API
    #[serde(default = "default_geo_base_url")]
    pub geo_base_url: String,
    /// Unit system passed to the provider (standard, metric, imperial)
    #[serde(default = "default_units")]
    pub units: String,
    /// Request timeout in seconds, unset keeps the HTTP client default
    pub timeout_seconds: Option<u32>,
}

/// Map embed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_maps_embed_base_url")]
    pub embed_base_url: String,
}

/// Record store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Location of the embedded document store
    #[serde(default = "default_store_uri")]
    pub uri: String,
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
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_geo_base_url() -> String {
    "https://api.openweathermap.org/geo/1.0".to_string()
}

fn default_units() -> String {
    "imperial".to_string()
}

fn default_maps_embed_base_url() -> String {
    "https://www.google.com/maps/embed/v1".to_string()
}

fn default_store_uri() -> String {
    "./data/weather_records".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            geo_base_url: default_geo_base_url(),
            units: default_units(),
            timeout_seconds: None,
        }
    }
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            embed_base_url: default_maps_embed_base_url(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: default_store_uri(),
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

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            weather: WeatherConfig::default(),
            maps: MapsConfig::default(),
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env` files, an optional config file and the environment
    pub fn load() -> Result<Self> {
        // Later files never override values already set
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::dotenv();

        let config_path = std::env::var("WEATHER_RECORDS_CONFIG").ok().map(PathBuf::from);
        Self::load_from_path(config_path)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| PathBuf::from("config.toml"));
        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // WEATHER_RECORDS_WEATHER__API_KEY style overrides
        builder = builder.add_source(
            Environment::with_prefix("WEATHER_RECORDS")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.allowed_origins")
                .try_parsing(true),
        );

        // Flat variable names used by existing deployments
        builder = builder
            .set_override_option("weather.api_key", non_empty_env("OPENWEATHERMAP_API_KEY"))
            .with_context(|| "Failed to apply OPENWEATHERMAP_API_KEY")?
            .set_override_option("maps.api_key", non_empty_env("GOOGLE_MAPS_API_KEY"))
            .with_context(|| "Failed to apply GOOGLE_MAPS_API_KEY")?
            .set_override_option("store.uri", non_empty_env("DATASTORE_URI"))
            .with_context(|| "Failed to apply DATASTORE_URI")?;

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Apply default values to fields that were set but left empty
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.geo_base_url.is_empty() {
            self.weather.geo_base_url = default_geo_base_url();
        }
        if self.weather.units.is_empty() {
            self.weather.units = default_units();
        }
        if self.maps.embed_base_url.is_empty() {
            self.maps.embed_base_url = default_maps_embed_base_url();
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
        self.validate_string_values()?;
        Ok(())
    }

    /// Keys are optional, but a key that is present must not be blank
    pub fn validate_api_keys(&self) -> Result<()> {
        let keys = [
            ("Weather", self.weather.api_key.as_deref()),
            ("Maps", self.maps.api_key.as_deref()),
        ];
        for (name, key) in keys {
            if key.is_some_and(|k| k.trim().is_empty()) {
                return Err(WeatherRecordError::config(format!(
                    "{name} API key cannot be empty if provided. Either remove it or provide a valid key."
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
            return Err(WeatherRecordError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherRecordError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let valid_units = ["standard", "metric", "imperial"];
        if !valid_units.contains(&self.weather.units.as_str()) {
            return Err(WeatherRecordError::config(format!(
                "Invalid units '{}'. Must be one of: {}",
                self.weather.units,
                valid_units.join(", ")
            ))
            .into());
        }

        let urls = [
            ("Weather API base URL", &self.weather.base_url),
            ("Geocoding API base URL", &self.weather.geo_base_url),
            ("Maps embed base URL", &self.maps.embed_base_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WeatherRecordError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.store.uri.trim().is_empty() {
            return Err(WeatherRecordError::config("Store URI cannot be empty").into());
        }

        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.weather.base_url, "https://api.openweathermap.org/data/2.5");
        assert_eq!(config.weather.units, "imperial");
        assert!(config.weather.api_key.is_none());
        assert!(config.maps.api_key.is_none());
        assert!(config.weather.timeout_seconds.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_api_keys_are_not_a_load_error() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_api_key_is_rejected() {
        let mut config = AppConfig::default();
        config.weather.api_key = Some("  ".to_string());
        let result = config.validate_api_keys();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Weather API key"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_invalid_units() {
        let mut config = AppConfig::default();
        config.weather.units = "kelvin".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid units"));
    }

    #[test]
    fn test_config_validation_base_url() {
        let mut config = AppConfig::default();
        config.weather.geo_base_url = "ftp://example.com".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Geocoding API base URL"));
    }

    #[test]
    fn test_apply_defaults_fills_empty_strings() {
        let mut config = AppConfig::default();
        config.weather.units = String::new();
        config.logging.format = String::new();
        config.apply_defaults();
        assert_eq!(config.weather.units, "imperial");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    #[serial]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9000

[weather]
units = "metric"

[store]
uri = "/tmp/weather-records-test"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_path(Some(path)).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.weather.units, "metric");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[weather]\nunits = \"standard\"\n").unwrap();

        let vars = [
            ("WEATHER_RECORDS_WEATHER__UNITS", "metric"),
            ("WEATHER_RECORDS_SERVER__PORT", "9100"),
            ("WEATHER_RECORDS_SERVER__ALLOWED_ORIGINS", "http://a.example,http://b.example"),
            ("OPENWEATHERMAP_API_KEY", "weather-from-env"),
            ("GOOGLE_MAPS_API_KEY", "maps-from-env"),
            ("DATASTORE_URI", "/tmp/weather-records-env"),
        ];
        // SAFETY: serialised with the other loader tests
        unsafe {
            for (name, value) in vars {
                std::env::set_var(name, value);
            }
        }

        let result = AppConfig::load_from_path(Some(path));

        // SAFETY: test cleanup
        unsafe {
            for (name, _) in vars {
                std::env::remove_var(name);
            }
        }

        let config = result.unwrap();
        assert_eq!(config.weather.units, "metric");
        assert_eq!(config.server.port, 9100);
        assert_eq!(
            config.server.allowed_origins,
            vec!["http://a.example", "http://b.example"]
        );
        assert_eq!(config.weather.api_key.as_deref(), Some("weather-from-env"));
        assert_eq!(config.maps.api_key.as_deref(), Some("maps-from-env"));
        assert_eq!(config.store.uri, "/tmp/weather-records-env");
    }
}
