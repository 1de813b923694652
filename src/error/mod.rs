//! Error handling module

use thiserror::Error;

use crate::transport::TransportError;

/// Errors surfaced by configuration loading and by a single poll cycle.
///
/// Only `ConfigError` is fatal. Every other kind is contained to the cycle
/// that produced it.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Read error: {0}")]
    ReadError(String),

    #[error("Action error: {0}")]
    ActionError(String),

    #[error("Write error: {0}")]
    WriteError(String),
}

impl AppError {
    /// Short kind label used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ConfigError(_) => "config",
            AppError::AuthError(_) => "auth",
            AppError::ReadError(_) => "read",
            AppError::ActionError(_) => "action",
            AppError::WriteError(_) => "write",
        }
    }

    pub fn read(call: &str, e: TransportError) -> Self {
        AppError::ReadError(format!("{} failed: {}", call, e))
    }

    pub fn action(call: &str, e: TransportError) -> Self {
        AppError::ActionError(format!("{} failed: {}", call, e))
    }

    pub fn write(call: &str, e: TransportError) -> Self {
        AppError::WriteError(format!("{} failed: {}", call, e))
    }
}
