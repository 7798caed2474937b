use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("overflow_path cannot be empty")]
    EmptyOverflowPath,
}

/// Webhook endpoint configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for incoming webhook requests
    pub listener: Listener,
    /// Shared secret expected in the X-Vapi-Secret header; unset disables
    /// the check
    #[serde(default)]
    pub secret_token: Option<String>,
    /// JSON file that failed deliveries are appended to
    #[serde(default = "default_overflow_path")]
    pub overflow_path: PathBuf,
}

fn default_overflow_path() -> PathBuf {
    PathBuf::from(".tmp/sheets_failures.json")
}

impl Config {
    /// Validates the endpoint configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        if self.overflow_path.as_os_str().is_empty() {
            return Err(ValidationError::EmptyOverflowPath);
        }
        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    /// Validates the listener configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}
