//! Mock WiFi backend for testing

use std::sync::Arc;
use tokio::{sync::Mutex, time::Instant};

use crate::backend::WifiBackend;
use crate::core::error::{WifiError, WifiResult};
use crate::core::types::{ConnectionState, ConnectionStatus, WifiCredentials, WifiNetwork};

/// Internal state for the mock backend
#[derive(Debug, Clone)]
struct MockState {
    scan_results: Vec<WifiNetwork>,
    should_fail_scan: bool,
    should_fail_connect: bool,
    should_fail_status: bool,
    should_fail_disable_ap: bool,
    connected_ssid: Option<String>,
    connection_state: ConnectionState,
    ip_address: Option<String>,
    ap_enabled: bool,
    connect_calls: usize,
    disable_ap_calls: usize,
    ap_disabled_at: Option<Instant>,
}

/// Mock WiFi backend for testing
///
/// Allows configuring behavior for tests without requiring actual hardware.
#[derive(Debug, Clone)]
pub struct MockWifiBackend {
    inner: Arc<Mutex<MockState>>,
}

impl MockWifiBackend {
    /// Create a new mock backend with default state
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState {
                scan_results: vec![],
                should_fail_scan: false,
                should_fail_connect: false,
                should_fail_status: false,
                should_fail_disable_ap: false,
                connected_ssid: None,
                connection_state: ConnectionState::Idle,
                ip_address: None,
                ap_enabled: false,
                connect_calls: 0,
                disable_ap_calls: 0,
                ap_disabled_at: None,
            })),
        }
    }

    /// Configure mock to return specific networks on scan
    pub async fn set_scan_results(&self, networks: Vec<WifiNetwork>) {
        self.inner.lock().await.scan_results = networks;
    }

    /// Configure mock to fail scan operations
    pub async fn set_scan_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail_scan = should_fail;
    }

    /// Configure mock to fail connect operations
    pub async fn set_connect_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail_connect = should_fail;
    }

    /// Configure mock to fail status queries
    pub async fn set_status_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail_status = should_fail;
    }

    /// Configure mock to fail disabling the access point
    pub async fn set_disable_ap_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail_disable_ap = should_fail;
    }

    pub async fn ap_enabled(&self) -> bool {
        self.inner.lock().await.ap_enabled
    }

    pub async fn connect_calls(&self) -> usize {
        self.inner.lock().await.connect_calls
    }

    pub async fn disable_ap_calls(&self) -> usize {
        self.inner.lock().await.disable_ap_calls
    }

    /// Instant of the most recent disable-AP call
    pub async fn ap_disabled_at(&self) -> Option<Instant> {
        self.inner.lock().await.ap_disabled_at
    }
}

impl Default for MockWifiBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiBackend for MockWifiBackend {
    async fn scan(&self) -> WifiResult<Vec<WifiNetwork>> {
        let state = self.inner.lock().await;
        if state.should_fail_scan {
            Err(WifiError::ScanFailed("Mock scan failure".into()))
        } else {
            Ok(state.scan_results.clone())
        }
    }

    async fn connect(&self, credentials: &WifiCredentials) -> WifiResult<ConnectionStatus> {
        let mut state = self.inner.lock().await;
        state.connect_calls += 1;
        if state.should_fail_connect {
            state.connection_state = ConnectionState::Failed;
            return Err(WifiError::ConnectionFailed("Mock connect failure".into()));
        }

        state.connected_ssid = Some(credentials.ssid.clone());
        state.connection_state = ConnectionState::Connected;
        state.ip_address = Some("192.168.1.100".to_string());

        Ok(ConnectionStatus {
            state: state.connection_state,
            ssid: state.connected_ssid.clone(),
            ip_address: state.ip_address.clone(),
        })
    }

    async fn status(&self) -> WifiResult<ConnectionStatus> {
        let state = self.inner.lock().await;
        if state.should_fail_status {
            return Err(WifiError::WpaSupplicantError("Mock status failure".into()));
        }

        Ok(ConnectionStatus {
            state: state.connection_state,
            ssid: state.connected_ssid.clone(),
            ip_address: state.ip_address.clone(),
        })
    }

    async fn enable_ap(&self) -> WifiResult<()> {
        self.inner.lock().await.ap_enabled = true;
        Ok(())
    }

    async fn disable_ap(&self) -> WifiResult<()> {
        let mut state = self.inner.lock().await;
        state.disable_ap_calls += 1;
        state.ap_disabled_at = Some(Instant::now());
        if state.should_fail_disable_ap {
            return Err(WifiError::AccessPointError("Mock disable failure".into()));
        }

        state.ap_enabled = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_backend_scan() {
        let backend = MockWifiBackend::new();

        // Initially empty
        let results = backend.scan().await.unwrap();
        assert_eq!(results.len(), 0);

        backend
            .set_scan_results(vec![WifiNetwork {
                ssid: "TestNetwork".into(),
                mac: "aa:bb:cc:dd:ee:ff".into(),
                channel: 6,
                rssi: -65,
            }])
            .await;

        let results = backend.scan().await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ssid, "TestNetwork");
    }

    #[tokio::test]
    async fn test_mock_backend_scan_failure() {
        let backend = MockWifiBackend::new();
        backend.set_scan_failure(true).await;

        assert!(backend.scan().await.is_err());
    }

    #[tokio::test]
    async fn test_mock_backend_connect() {
        let backend = MockWifiBackend::new();

        let result = backend
            .connect(&WifiCredentials::new("MyNetwork", "secret123"))
            .await
            .unwrap();
        assert_eq!(result.state, ConnectionState::Connected);

        let status = backend.status().await.unwrap();
        assert_eq!(status.ssid, Some("MyNetwork".into()));
        assert_eq!(status.ip_address, Some("192.168.1.100".into()));
        assert_eq!(backend.connect_calls().await, 1);
    }

    #[tokio::test]
    async fn test_mock_backend_access_point() {
        let backend = MockWifiBackend::new();

        backend.enable_ap().await.unwrap();
        assert!(backend.ap_enabled().await);

        backend.disable_ap().await.unwrap();
        assert!(!backend.ap_enabled().await);
        assert_eq!(backend.disable_ap_calls().await, 1);
        assert!(backend.ap_disabled_at().await.is_some());
    }
}
