//! Main WiFi provisioning service facade

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{error, info};

use crate::{
    backend::WifiBackend,
    core::{
        error::{ServiceError, ServiceResult},
        flag_store::FlagStore,
        handover::HandoverOrchestrator,
        types::{Command, ConnectionStatus, HandoverState, WifiCredentials, WifiNetwork},
    },
};

/// Main WiFi provisioning service facade
///
/// Ties the backend, the persisted reconfiguration flag, the handover
/// orchestrator and the command channel together. Transports only talk to
/// this type and never change handover state themselves.
pub struct ProvisioningService<B: WifiBackend> {
    backend: Arc<B>,
    flag_store: Arc<FlagStore>,
    flag_name: String,
    orchestrator: HandoverOrchestrator<B>,
    commands: mpsc::Sender<Command>,
    connect_lock: Mutex<()>,
}

impl<B: WifiBackend> ProvisioningService<B> {
    pub fn new(
        backend: Arc<B>,
        flag_store: Arc<FlagStore>,
        flag_name: impl Into<String>,
        orchestrator: HandoverOrchestrator<B>,
        commands: mpsc::Sender<Command>,
    ) -> Self {
        Self {
            backend,
            flag_store,
            flag_name: flag_name.into(),
            orchestrator,
            commands,
            connect_lock: Mutex::new(()),
        }
    }

    pub fn orchestrator(&self) -> &HandoverOrchestrator<B> {
        &self.orchestrator
    }

    pub async fn handover_state(&self) -> HandoverState {
        self.orchestrator.state().await
    }

    /// Get station connection status
    pub async fn status(&self) -> ServiceResult<ConnectionStatus> {
        Ok(self.backend.status().await?)
    }

    /// Scan for networks
    pub async fn scan(&self) -> ServiceResult<Vec<WifiNetwork>> {
        Ok(self.backend.scan().await?)
    }

    /// Connect to the given network and start the handover
    ///
    /// The reconfiguration flag is cleared before the handover is signaled.
    /// If persisting fails the handover is aborted and the AP stays up.
    pub async fn connect(&self, credentials: WifiCredentials) -> ServiceResult<ConnectionStatus> {
        credentials.validate()?;

        let _guard = self.connect_lock.lock().await;
        self.orchestrator.ensure_accepting().await?;

        info!(ssid = %credentials.ssid, "connecting station");
        let result = self.backend.connect(&credentials).await?;
        info!(ssid = %credentials.ssid, ip = ?result.ip_address, "station connected");

        let handle = self.orchestrator.begin_handover().await?;

        if let Err(e) = self
            .flag_store
            .write_flags(&[(self.flag_name.as_str(), "0")])
            .await
        {
            error!("failed to persist reconfiguration flag: {}", e);
            self.orchestrator.abort_handover(handle).await;
            return Err(e.into());
        }

        handle.signal();
        Ok(result)
    }

    /// Ask the wireless run loop to terminate
    pub fn kill(&self) -> ServiceResult<()> {
        self.commands.try_send(Command::Kill).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ServiceError::CommandPending,
            mpsc::error::TrySendError::Closed(_) => ServiceError::CommandChannelClosed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::MockWifiBackend,
        core::{
            error::{ConfigError, WifiError},
            handover::HandoverTiming,
            runner::command_channel,
            types::ConnectionState,
        },
    };
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    struct Fixture {
        _dir: TempDir,
        backend: Arc<MockWifiBackend>,
        flag_store: Arc<FlagStore>,
        service: ProvisioningService<MockWifiBackend>,
        commands: mpsc::Receiver<Command>,
    }

    fn fixture(content: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".app_config");
        std::fs::write(&path, content).unwrap();

        let backend = Arc::new(MockWifiBackend::new());
        let flag_store = Arc::new(FlagStore::new(path));
        let timing = HandoverTiming {
            ap_grace: Duration::from_millis(5),
            ap_settle: Duration::from_millis(2),
        };
        let orchestrator =
            HandoverOrchestrator::new(backend.clone(), 1, timing, CancellationToken::new());
        let (tx, rx) = command_channel();
        let service = ProvisioningService::new(
            backend.clone(),
            flag_store.clone(),
            "reconfiguration",
            orchestrator,
            tx,
        );

        Fixture {
            _dir: dir,
            backend,
            flag_store,
            service,
            commands: rx,
        }
    }

    #[tokio::test]
    async fn test_connect_persists_flag_and_hands_over() {
        let f = fixture("hostname=iot\nreconfiguration=1\n");

        let result = f
            .service
            .connect(WifiCredentials::new("Foo", "secret123"))
            .await
            .unwrap();
        assert_eq!(result.state, ConnectionState::Connected);
        assert_eq!(f.flag_store.read_flag("reconfiguration").await.unwrap(), 0);

        let mut rx = f.service.orchestrator().subscribe();
        rx.wait_for(|s| *s == HandoverState::StaActive).await.unwrap();
        assert_eq!(f.backend.disable_ap_calls().await, 1);
    }

    #[tokio::test]
    async fn test_connect_rejected_after_handover_started() {
        let f = fixture("reconfiguration=1\n");

        f.service
            .connect(WifiCredentials::new("Foo", "secret123"))
            .await
            .unwrap();
        let second = f
            .service
            .connect(WifiCredentials::new("Bar", "secret123"))
            .await;

        assert!(matches!(
            second,
            Err(ServiceError::HandoverInProgress | ServiceError::HandoverCompleted(_))
        ));
        assert_eq!(f.backend.connect_calls().await, 1);
    }

    #[tokio::test]
    async fn test_connect_failure_keeps_flag() {
        let f = fixture("reconfiguration=1\n");
        f.backend.set_connect_failure(true).await;

        let err = f
            .service
            .connect(WifiCredentials::new("Foo", "secret123"))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Backend(WifiError::ConnectionFailed(_))));
        assert_eq!(f.flag_store.read_flag("reconfiguration").await.unwrap(), 1);
        assert_eq!(f.service.handover_state().await, HandoverState::ApActive);
    }

    #[tokio::test]
    async fn test_invalid_credentials_never_reach_backend() {
        let f = fixture("reconfiguration=1\n");

        let err = f
            .service
            .connect(WifiCredentials::new("Foo", "short"))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Backend(WifiError::InvalidPsk(5))));
        assert_eq!(f.backend.connect_calls().await, 0);
    }

    #[tokio::test]
    async fn test_persist_failure_aborts_handover() {
        let f = fixture("reconfiguration=1\n");
        std::fs::remove_file(f.flag_store.path()).unwrap();

        let err = f
            .service
            .connect(WifiCredentials::new("Foo", "secret123"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Config(ConfigError::Read { .. })));

        let mut rx = f.service.orchestrator().subscribe();
        rx.wait_for(|s| *s == HandoverState::ApActive).await.unwrap();
        assert_eq!(f.backend.disable_ap_calls().await, 0);
    }

    #[tokio::test]
    async fn test_connect_retry_after_persist_failure() {
        let f = fixture("reconfiguration=1\n");
        std::fs::remove_file(f.flag_store.path()).unwrap();

        assert!(
            f.service
                .connect(WifiCredentials::new("Foo", "secret123"))
                .await
                .is_err()
        );
        assert_eq!(f.service.handover_state().await, HandoverState::ApActive);

        std::fs::write(f.flag_store.path(), "reconfiguration=1\n").unwrap();
        let result = f
            .service
            .connect(WifiCredentials::new("Foo", "secret123"))
            .await
            .unwrap();
        assert_eq!(result.state, ConnectionState::Connected);
        assert_eq!(f.flag_store.read_flag("reconfiguration").await.unwrap(), 0);

        let mut rx = f.service.orchestrator().subscribe();
        rx.wait_for(|s| *s == HandoverState::StaActive).await.unwrap();
        assert_eq!(f.backend.disable_ap_calls().await, 1);
    }

    #[tokio::test]
    async fn test_kill_sends_single_command() {
        let mut f = fixture("reconfiguration=1\n");

        tokio_test::assert_ok!(f.service.kill());
        assert!(matches!(f.service.kill(), Err(ServiceError::CommandPending)));

        assert_eq!(f.commands.recv().await, Some(Command::Kill));
        assert!(f.commands.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_kill_after_run_loop_gone() {
        let f = fixture("reconfiguration=1\n");
        drop(f.commands);

        assert!(matches!(
            f.service.kill(),
            Err(ServiceError::CommandChannelClosed)
        ));
    }

    #[tokio::test]
    async fn test_scan_and_status_pass_through() {
        let f = fixture("reconfiguration=1\n");
        f.backend.set_scan_failure(true).await;

        assert!(f.service.scan().await.is_err());
        let status = f.service.status().await.unwrap();
        assert_eq!(status.state, ConnectionState::Idle);
    }
}
