//! WiFi Provisioning Service
//!
//! Brings a headless device onto a WiFi network:
//! - an access point plus HTTP control API while the reconfiguration flag is set
//! - station connect, flag persistence and a timed AP to STA handover

pub mod backend;
pub mod config;
pub mod core;
pub mod protocol;
pub mod transport;

pub use core::{
    error::{ConfigError, ServiceError, TransportError, WifiError},
    types::{ConnectionState, ConnectionStatus, HandoverState, WifiCredentials, WifiNetwork},
};
