//! WiFi backend trait definition

use trait_variant::make;

use crate::core::error::WifiResult;
use crate::core::types::{ConnectionStatus, WifiCredentials, WifiNetwork};

/// Abstraction over the wireless control interface
/// (`wpa_supplicant` for the station, `hostapd` for the access point)
///
/// This trait enables testing by allowing mock implementations
/// while providing a standard interface for WiFi operations.
#[make(Send)]
pub trait WifiBackend: Send + Sync + 'static {
    /// Scan for available WiFi networks
    ///
    /// This triggers a scan and returns the discovered networks.
    /// The scan operation may take several seconds.
    async fn scan(&self) -> WifiResult<Vec<WifiNetwork>>;

    /// Connect the station interface and wait until the association completes
    ///
    /// Returns the resulting connection status, including the IP address if
    /// one was assigned in time.
    async fn connect(&self, credentials: &WifiCredentials) -> WifiResult<ConnectionStatus>;

    /// Get current station connection status
    async fn status(&self) -> WifiResult<ConnectionStatus>;

    /// Bring the provisioning access point up
    async fn enable_ap(&self) -> WifiResult<()>;

    /// Take the provisioning access point down
    async fn disable_ap(&self) -> WifiResult<()>;
}
