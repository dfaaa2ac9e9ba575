//! Wifi config source (interfaces and control sockets)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::error::{ConfigError, ConfigResult};

/// Radio configuration loaded from a JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WifiConfig {
    pub station: StationConfig,
    pub access_point: AccessPointConfig,
}

/// Station side, driven through `wpa_supplicant`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StationConfig {
    pub interface: String,
    pub ctrl_dir: PathBuf,
}

/// Provisioning access point side, driven through `hostapd`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AccessPointConfig {
    pub interface: String,
    pub ctrl_dir: PathBuf,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            interface: "wlan0".to_string(),
            ctrl_dir: PathBuf::from("/var/run/wpa_supplicant"),
        }
    }
}

impl Default for AccessPointConfig {
    fn default() -> Self {
        Self {
            interface: "uap0".to_string(),
            ctrl_dir: PathBuf::from("/var/run/hostapd"),
        }
    }
}

impl StationConfig {
    pub fn ctrl_socket(&self) -> PathBuf {
        self.ctrl_dir.join(&self.interface)
    }
}

impl AccessPointConfig {
    pub fn ctrl_socket(&self) -> PathBuf {
        self.ctrl_dir.join(&self.interface)
    }
}

impl WifiConfig {
    /// Load the config from `path`, falling back to defaults if it does not exist
    pub async fn load(path: &Path) -> ConfigResult<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "wifi config not found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| ConfigError::WifiConfig {
            path: path.to_path_buf(),
            source,
        })
    }
}
