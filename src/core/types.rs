//! Domain types for WiFi provisioning

use serde::{Deserialize, Serialize};

use crate::core::error::{WifiError, WifiResult};

/// Maximum SSID length in bytes per IEEE 802.11
pub const MAX_SSID_LEN: usize = 32;

/// Represents a discovered WiFi network
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WifiNetwork {
    /// Network SSID
    pub ssid: String,
    /// MAC address (BSSID)
    pub mac: String,
    /// Channel number
    pub channel: u16,
    /// Signal strength in dBm
    pub rssi: i16,
}

/// Station connection states as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Failed,
}

/// Connection status with optional IP address
///
/// Returned both as the status snapshot and as the result of a connect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// Current connection state
    pub state: ConnectionState,
    /// Connected network SSID (if connected)
    pub ssid: Option<String>,
    /// Assigned IP address (if connected)
    pub ip_address: Option<String>,
}

/// Credentials submitted by the provisioning client
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: String,
    /// Passphrase, raw 64 hex digit PSK, or empty for an open network
    #[serde(default)]
    pub psk: String,
}

impl WifiCredentials {
    pub fn new(ssid: impl Into<String>, psk: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            psk: psk.into(),
        }
    }

    /// Check SSID and PSK lengths before anything reaches the radio
    pub fn validate(&self) -> WifiResult<()> {
        if self.ssid.is_empty() || self.ssid.len() > MAX_SSID_LEN {
            return Err(WifiError::InvalidSsid(format!(
                "length must be 1..={MAX_SSID_LEN} bytes, got {}",
                self.ssid.len()
            )));
        }

        let len = self.psk.len();
        let is_passphrase =
            (8..=63).contains(&len) && self.psk.bytes().all(|b| (0x20..=0x7e).contains(&b));
        if len == 0 || is_passphrase || self.is_raw_psk() {
            Ok(())
        } else {
            Err(WifiError::InvalidPsk(len))
        }
    }

    pub fn is_open(&self) -> bool {
        self.psk.is_empty()
    }

    /// 64 hex digits, passed to the supplicant unquoted
    pub fn is_raw_psk(&self) -> bool {
        self.psk.len() == 64 && self.psk.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl std::fmt::Debug for WifiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WifiCredentials")
            .field("ssid", &self.ssid)
            .field("psk", &"<redacted>")
            .finish()
    }
}

/// AP to STA handover states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoverState {
    /// Provisioning access point is up, waiting for credentials
    ApActive,
    /// Station connect succeeded, AP disablement pending
    Connecting,
    /// AP disabled, device runs as a station only
    StaActive,
}

impl HandoverState {
    /// Initial state derived from the persisted reconfiguration flag
    pub fn from_flag(flag: i64) -> Self {
        if flag == 1 {
            HandoverState::ApActive
        } else {
            HandoverState::StaActive
        }
    }
}

/// Radio mode the wireless run loop starts in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiMode {
    AccessPoint,
    Station,
}

impl From<HandoverState> for WifiMode {
    fn from(state: HandoverState) -> Self {
        match state {
            HandoverState::ApActive | HandoverState::Connecting => WifiMode::AccessPoint,
            HandoverState::StaActive => WifiMode::Station,
        }
    }
}

/// Commands understood by the wireless run loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Terminate the run loop and with it the process
    Kill,
}

/// Identifier attached to each HTTP request in the logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(uuid::Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
