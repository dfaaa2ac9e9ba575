//! Error types for the WiFi provisioning service

use std::{num::ParseIntError, path::PathBuf};

use thiserror::Error;

use super::types::HandoverState;

/// Result type for WiFi backend operations
pub type WifiResult<T> = Result<T, WifiError>;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type for persisted configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors related to WiFi backend operations
#[derive(Error, Debug, Clone)]
pub enum WifiError {
    #[error("WiFi scan failed: {0}")]
    ScanFailed(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Invalid SSID: {0}")]
    InvalidSsid(String),

    #[error("Invalid PSK: expected 8..=63 printable ASCII characters or 64 hex digits, got {0} bytes")]
    InvalidPsk(usize),

    #[error("Access point error: {0}")]
    AccessPointError(String),

    #[error("wpa_supplicant error: {0}")]
    WpaSupplicantError(String),
}

/// Errors related to the persisted flag file and the wifi config source
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("flag `{name}` has non-numeric value `{value}`: {source}")]
    Parse {
        name: String,
        value: String,
        source: ParseIntError,
    },

    #[error("line `{line}` matches flag `{name}` but has no `=` separator")]
    MissingSeparator { name: String, line: String },

    #[error("invalid wifi config {}: {source}", .path.display())]
    WifiConfig {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Errors related to core service operations
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Handover already in progress")]
    HandoverInProgress,

    #[error("Handover already completed, device is in {0:?} state")]
    HandoverCompleted(HandoverState),

    #[error("A previous command has not been consumed yet")]
    CommandPending,

    #[error("Command channel closed")]
    CommandChannelClosed,

    #[error("Backend error: {0}")]
    Backend(#[from] WifiError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors related to the HTTP transport layer
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
