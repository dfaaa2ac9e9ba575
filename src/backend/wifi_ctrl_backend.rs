//! wifi-ctrl backend implementation

use std::time::Duration;

use tokio::process::Command;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use wifi_ctrl::{ap, sta};

use crate::{
    backend::WifiBackend,
    config::WifiConfig,
    core::{
        error::{WifiError, WifiResult},
        types::{ConnectionState, ConnectionStatus, WifiCredentials, WifiNetwork},
    },
};

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);
const BROADCAST_RECV_TIMEOUT: Duration = Duration::from_secs(1);
const IP_POLL_INTERVAL: Duration = Duration::from_millis(200);
const IP_POLL_RETRIES: usize = 30; // 30 * 200ms = 6 seconds

/// Backend driving `wpa_supplicant` (station) and `hostapd` (access point)
pub struct WifiCtrlBackend {
    interface: String,
    client: sta::RequestClient,
    broadcast_receiver: sta::BroadcastReceiver,
    ap_client: ap::RequestClient,
}

impl WifiCtrlBackend {
    pub async fn new(config: &WifiConfig) -> WifiResult<Self> {
        let mut setup =
            sta::WifiSetup::new().map_err(|e| WifiError::WpaSupplicantError(e.to_string()))?;
        setup.set_socket_path(config.station.ctrl_socket().to_string_lossy().into_owned());

        let client = setup.get_request_client();
        let broadcast_receiver = setup.get_broadcast_receiver();
        let station = setup.complete();

        tokio::spawn(async move {
            if let Err(e) = station.run().await {
                error!("WifiStation runtime error: {}", e);
            }
        });

        let mut ap_setup =
            ap::WifiSetup::new().map_err(|e| WifiError::AccessPointError(e.to_string()))?;
        ap_setup.set_socket_path(
            config
                .access_point
                .ctrl_socket()
                .to_string_lossy()
                .into_owned(),
        );

        let ap_client = ap_setup.get_request_client();
        let access_point = ap_setup.complete();

        tokio::spawn(async move {
            if let Err(e) = access_point.run().await {
                error!("WifiAp runtime error: {}", e);
            }
        });

        info!(
            station = %config.station.interface,
            access_point = %config.access_point.interface,
            "wifi-ctrl backend initialized"
        );

        Ok(Self {
            interface: config.station.interface.clone(),
            client,
            broadcast_receiver,
            ap_client,
        })
    }

    /// Convert frequency (MHz) to channel number, 0 if unknown
    fn frequency_to_channel(freq_str: &str) -> u16 {
        match freq_str.parse::<u16>().unwrap_or(0) {
            2484 => 14,
            freq @ 2412..=2472 => (freq - 2407) / 5,
            freq @ 5160..=5885 => (freq - 5000) / 5,
            _ => 0,
        }
    }

    /// Signal level in dBm, out-of-range values map to the weakest level
    fn signal_to_rssi<T>(signal: T) -> i16
    where
        i16: TryFrom<T>,
    {
        i16::try_from(signal).unwrap_or(i16::MIN)
    }

    /// Get IPv4 address of the station interface using the ip command
    async fn get_ip_address(&self) -> Option<String> {
        let output = Command::new("ip")
            .args(["-4", "addr", "show", &self.interface])
            .output()
            .await
            .ok()?;

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .find_map(|line| line.strip_prefix("inet "))
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|cidr| cidr.split('/').next())
            .map(str::to_string)
    }

    /// Add, configure and select a network without waiting for the result
    async fn start_connect(&self, credentials: &WifiCredentials) -> WifiResult<()> {
        debug!("Connecting to network: {}", credentials.ssid);

        let network_id =
            self.client.add_network().await.map_err(|e| {
                WifiError::WpaSupplicantError(format!("Failed to add network: {}", e))
            })?;

        // wifi-ctrl handles quoting internally via conf_escape
        self.client
            .set_network_ssid(network_id, credentials.ssid.clone())
            .await
            .map_err(|e| WifiError::WpaSupplicantError(format!("Failed to set SSID: {}", e)))?;

        if credentials.is_open() {
            self.client
                .send_custom(format!("SET_NETWORK {network_id} key_mgmt NONE"))
                .await
                .map_err(|e| {
                    WifiError::WpaSupplicantError(format!("Failed to set key_mgmt: {}", e))
                })?;
        } else if credentials.is_raw_psk() {
            // raw PSK must not be quoted
            self.client
                .send_custom(format!("SET_NETWORK {network_id} psk {}", credentials.psk))
                .await
                .map_err(|e| {
                    WifiError::WpaSupplicantError(format!("Failed to set PSK: {}", e))
                })?;
        } else {
            self.client
                .set_network_psk(network_id, credentials.psk.clone())
                .await
                .map_err(|e| {
                    WifiError::WpaSupplicantError(format!("Failed to set PSK: {}", e))
                })?;
        }

        self.client.select_network(network_id).await.map_err(|e| {
            WifiError::WpaSupplicantError(format!("Failed to select network: {}", e))
        })?;

        debug!("Connection initiated");
        Ok(())
    }

    async fn wait_for_ip(&self, ssid: &str) -> ConnectionStatus {
        for _ in 0..IP_POLL_RETRIES {
            if let Some(ip) = self.get_ip_address().await {
                return ConnectionStatus {
                    state: ConnectionState::Connected,
                    ssid: Some(ssid.to_string()),
                    ip_address: Some(ip),
                };
            }
            tokio::time::sleep(IP_POLL_INTERVAL).await;
        }

        warn!("Connected to {} but no IP address assigned yet", ssid);
        ConnectionStatus {
            state: ConnectionState::Connected,
            ssid: Some(ssid.to_string()),
            ip_address: None,
        }
    }
}

impl WifiBackend for WifiCtrlBackend {
    async fn scan(&self) -> WifiResult<Vec<WifiNetwork>> {
        debug!("Starting WiFi scan on interface: {}", self.interface);

        let results = self
            .client
            .get_scan()
            .await
            .map_err(|e| WifiError::ScanFailed(e.to_string()))?;

        let networks: Vec<WifiNetwork> = results
            .iter()
            .map(|res| WifiNetwork {
                ssid: res.name.clone(),
                mac: res.mac.clone(),
                channel: Self::frequency_to_channel(&res.frequency),
                rssi: Self::signal_to_rssi(res.signal),
            })
            .collect();

        debug!("Scan complete, found {} networks", networks.len());
        Ok(networks)
    }

    async fn connect(&self, credentials: &WifiCredentials) -> WifiResult<ConnectionStatus> {
        // Start listening to events BEFORE connecting to avoid race condition
        let mut receiver = self.broadcast_receiver.resubscribe();

        self.start_connect(credentials).await?;

        debug!("Waiting for connection event...");
        let start = std::time::Instant::now();

        loop {
            if start.elapsed() > CONNECTION_TIMEOUT {
                return Err(WifiError::ConnectionFailed(
                    "Connection timeout".to_string(),
                ));
            }

            match tokio::time::timeout(BROADCAST_RECV_TIMEOUT, receiver.recv()).await {
                Ok(Ok(sta::Broadcast::Connected)) => {
                    debug!("Connected! Saving configuration and waiting for IP...");

                    // Persist the network so the station reconnects after reboot
                    if let Err(e) = self.client.save_config().await {
                        warn!("Failed to save wpa_supplicant config: {}", e);
                    }

                    return Ok(self.wait_for_ip(&credentials.ssid).await);
                }
                Ok(Ok(sta::Broadcast::WrongPsk)) => {
                    return Err(WifiError::ConnectionFailed("Wrong Password".to_string()));
                }
                Ok(Ok(sta::Broadcast::NetworkNotFound)) => {
                    return Err(WifiError::ConnectionFailed(
                        "Network not found".to_string(),
                    ));
                }
                Ok(Ok(event)) => {
                    // Disconnected shows up before the new association, keep waiting
                    debug!("Received broadcast event: {:?}", event);
                }
                Ok(Err(broadcast::error::RecvError::Lagged(_))) => {
                    warn!("Broadcast receiver lagged");
                }
                Ok(Err(broadcast::error::RecvError::Closed)) => {
                    return Err(WifiError::WpaSupplicantError(
                        "Broadcast channel closed".to_string(),
                    ));
                }
                Err(_) => {}
            }
        }
    }

    async fn status(&self) -> WifiResult<ConnectionStatus> {
        let status =
            self.client.get_status().await.map_err(|e| {
                WifiError::WpaSupplicantError(format!("Failed to get status: {}", e))
            })?;

        let state = match status.get("wpa_state").map(|s| s.as_str()) {
            Some("COMPLETED") => ConnectionState::Connected,
            Some("ASSOCIATING" | "ASSOCIATED" | "AUTHENTICATING" | "4WAY_HANDSHAKE"
            | "GROUP_HANDSHAKE") => ConnectionState::Connecting,
            _ => ConnectionState::Idle,
        };

        let ip_address = match status.get("ip_address").cloned() {
            Some(ip) => Some(ip),
            None if state == ConnectionState::Connected => self.get_ip_address().await,
            None => None,
        };

        Ok(ConnectionStatus {
            state,
            ssid: status.get("ssid").cloned(),
            ip_address,
        })
    }

    async fn enable_ap(&self) -> WifiResult<()> {
        debug!("Enabling access point");
        self.ap_client.enable().await.map_err(|e| {
            WifiError::AccessPointError(format!("Failed to enable access point: {}", e))
        })
    }

    async fn disable_ap(&self) -> WifiResult<()> {
        debug!("Disabling access point");
        self.ap_client.disable().await.map_err(|e| {
            WifiError::AccessPointError(format!("Failed to disable access point: {}", e))
        })
    }
}
