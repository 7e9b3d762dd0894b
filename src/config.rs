//! Handles application configuration loading and management.
//!
//! This module defines the `AppConfig` struct which holds the webhook
//! endpoint, the retry policy and the playback timing. Settings are read
//! from the `[settings]` section of an INI file.

use configparser::ini::Ini;
use super::errors::ConfigError;
use log::{info, debug, warn, error};
use std::time::Duration;
use url::Url;

/// Endpoint the shop's slides are published on.
pub const DEFAULT_ENDPOINT_URL: &str = "https://webhook.brxlabs.com.br/webhook/slides/loterica";

const SECTION: &str = "settings";

/// Holds the application's configuration parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub endpoint_url: Url,
    /// Extra attempts after the first failed one.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on every following one.
    pub retry_base_delay: Duration,
    pub auto_advance_interval: Duration,
    /// A request running longer than this is aborted (and retried).
    pub request_timeout: Duration,
    pub shuffle_slides: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint_url: Url::parse(DEFAULT_ENDPOINT_URL).expect("default endpoint is a valid URL"),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(2000),
            auto_advance_interval: Duration::from_millis(15000),
            request_timeout: Duration::from_millis(10000),
            shuffle_slides: true,
        }
    }
}

/// Loads application configuration from the specified INI file path.
///
/// # Errors
/// Returns `ConfigError` if the file cannot be read, is malformed,
/// lacks `endpoint_url`, or holds a value that cannot be parsed.
#[must_use = "loading configuration can fail, the Result must be handled"]
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    info!("Attempting to load config from: {}", path);
    let contents = std::fs::read_to_string(path).map_err(|e| {
        error!("Error reading config file '{}': {}", path, e);
        ConfigError::Io(e)
    })?;
    let app_config = parse_config(&contents)?;
    info!("Configuration loaded successfully from {}: {:?}", path, app_config);
    Ok(app_config)
}

/// Like [`load_config`], but falls back to the built-in defaults when the
/// file does not exist. Any other failure is still an error.
#[must_use = "loading configuration can fail, the Result must be handled"]
pub fn load_config_or_default(path: &str) -> Result<AppConfig, ConfigError> {
    match load_config(path) {
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Config file '{}' not found, using built-in defaults.", path);
            Ok(AppConfig::default())
        }
        other => other,
    }
}

/// Parses INI text into an `AppConfig`. Only `endpoint_url` is mandatory.
pub fn parse_config(contents: &str) -> Result<AppConfig, ConfigError> {
    let mut config_parser = Ini::new();
    config_parser.read(contents.to_string()).map_err(ConfigError::Parse)?;
    let defaults = AppConfig::default();

    let raw_endpoint = config_parser.get(SECTION, "endpoint_url").ok_or_else(|| {
        error!("Missing configuration key 'endpoint_url' in section '[{}]'", SECTION);
        ConfigError::MissingKey("endpoint_url".to_string())
    })?;
    let endpoint_url = Url::parse(raw_endpoint.trim()).map_err(|e| invalid("endpoint_url", e))?;
    debug!("Loaded config value for key 'endpoint_url': {}", endpoint_url);

    let max_retries = match config_parser.getuint(SECTION, "max_retries").map_err(|e| invalid("max_retries", e))? {
        Some(value) => u32::try_from(value).map_err(|e| invalid("max_retries", e))?,
        None => defaults.max_retries,
    };
    let retry_base_delay = millis_or(&config_parser, "retry_base_delay_ms", defaults.retry_base_delay)?;
    let auto_advance_interval = millis_or(&config_parser, "auto_advance_interval_ms", defaults.auto_advance_interval)?;
    if auto_advance_interval.is_zero() {
        return Err(invalid("auto_advance_interval_ms", "must be greater than zero"));
    }
    let request_timeout = millis_or(&config_parser, "request_timeout_ms", defaults.request_timeout)?;
    let shuffle_slides = config_parser
        .getbool(SECTION, "shuffle_slides")
        .map_err(|e| invalid("shuffle_slides", e))?
        .unwrap_or(defaults.shuffle_slides);

    Ok(AppConfig {
        endpoint_url,
        max_retries,
        retry_base_delay,
        auto_advance_interval,
        request_timeout,
        shuffle_slides,
    })
}

fn millis_or(config_parser: &Ini, key: &str, default: Duration) -> Result<Duration, ConfigError> {
    let value = config_parser.getuint(SECTION, key).map_err(|e| invalid(key, e))?;
    let duration = value.map(Duration::from_millis).unwrap_or(default);
    debug!("Loaded config value for key '{}': {:?}", key, duration);
    Ok(duration)
}

fn invalid(key: &str, message: impl ToString) -> ConfigError {
    let message = message.to_string();
    error!("Invalid value for configuration key '{}': {}", key, message);
    ConfigError::InvalidValue { key: key.to_string(), message }
}
