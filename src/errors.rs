//! Defines the custom error types used throughout the `loterica_slides` application.
//!
//! Configuration problems, slide fetch failures and the top-level `AppError`
//! each get their own enum. Every type implements `Debug`, `Display` and
//! `std::error::Error`, with `From` conversions for the underlying errors.

use std::error::Error as StdError;
use std::fmt;

// --- ConfigError ---
/// Errors related to application configuration loading and parsing.
#[must_use = "a configuration error should be handled or propagated"]
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O error occurred while trying to read the configuration file.
    Io(std::io::Error),
    /// The configuration file is not valid INI.
    Parse(String),
    /// A required configuration key was missing from the file.
    MissingKey(String),
    /// A key is present but its value cannot be used.
    InvalidValue { key: String, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {}", e),
            ConfigError::Parse(e) => write!(f, "Configuration parse error: {}", e),
            ConfigError::MissingKey(key) => write!(f, "Missing configuration key: '{}'", key),
            ConfigError::InvalidValue { key, message } => {
                write!(f, "Invalid value for configuration key '{}': {}", key, message)
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

// --- FetchError ---
/// Errors raised while fetching slides from the webhook.
#[must_use = "a fetch error should be handled or propagated"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The endpoint answered with a non-success HTTP status.
    Api { status: u16, status_text: String },
    /// The response body was not a JSON array.
    Format(String),
    /// The request could not reach the endpoint.
    Connectivity(String),
    /// The request was aborted before it completed (request timeout).
    Aborted,
    /// A newer request cancelled this one.
    Superseded,
}

impl FetchError {
    /// Failures worth another attempt under the retry policy.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Connectivity(_) | FetchError::Aborted)
    }

    /// Whether the failure comes from the network rather than the endpoint's answer.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, FetchError::Connectivity(_) | FetchError::Aborted)
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Api { status: 404, .. } => write!(f, "Slides not found"),
            FetchError::Api { status, status_text } => write!(f, "Error {}: {}", status, status_text),
            FetchError::Format(detail) => write!(f, "Invalid data format: {}", detail),
            FetchError::Connectivity(detail) => write!(f, "Connection failed: {}", detail),
            FetchError::Aborted => write!(f, "Request aborted before completion"),
            FetchError::Superseded => write!(f, "Request superseded by a newer one"),
        }
    }
}

impl StdError for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Aborted
        } else {
            FetchError::Connectivity(err.to_string())
        }
    }
}

// --- AppError (Top-level error enum) ---
/// A top-level error type returned from `main`.
#[must_use = "an application error should be handled or propagated"]
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Ui(eframe::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "Application Configuration Error: {}", e),
            AppError::Ui(e) => write!(f, "Application UI Error: {}", e),
        }
    }
}

impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::Ui(e) => Some(e),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self { AppError::Config(err) }
}
impl From<eframe::Error> for AppError {
    fn from(err: eframe::Error) -> Self { AppError::Ui(err) }
}
