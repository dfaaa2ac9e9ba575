//! AP to STA handover orchestration
//!
//! A handover starts once a station connect has succeeded. The caller gets a
//! [`HandoverHandle`] and signals it after the connect-side persistence is
//! done. A background task then waits a grace period, disables the access
//! point, waits a settling period and marks the device as station only.

use std::{sync::Arc, time::Duration};

use tokio::sync::{RwLock, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    backend::WifiBackend,
    core::{
        error::{ServiceError, ServiceResult},
        types::HandoverState,
    },
};

/// Delays around disabling the access point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoverTiming {
    /// Wait after the completion signal before the AP goes down
    pub ap_grace: Duration,
    /// Wait after the AP went down before the handover counts as done
    pub ap_settle: Duration,
}

impl Default for HandoverTiming {
    fn default() -> Self {
        Self {
            ap_grace: Duration::from_secs(5),
            ap_settle: Duration::from_secs(2),
        }
    }
}

/// Handover state machine
#[derive(Debug)]
struct HandoverStateMachine {
    state: HandoverState,
    /// Incremented on every begun handover
    epoch: u64,
}

impl HandoverStateMachine {
    fn new(state: HandoverState) -> Self {
        Self { state, epoch: 0 }
    }

    /// Check that a handover could start now
    fn ensure_accepting(&self) -> ServiceResult<()> {
        match self.state {
            HandoverState::ApActive => Ok(()),
            HandoverState::Connecting => Err(ServiceError::HandoverInProgress),
            HandoverState::StaActive => Err(ServiceError::HandoverCompleted(self.state)),
        }
    }

    fn begin(&mut self) -> ServiceResult<u64> {
        self.ensure_accepting()?;
        self.state = HandoverState::Connecting;
        self.epoch += 1;
        Ok(self.epoch)
    }

    /// Give up before the AP was touched; stale epochs are ignored
    fn abort(&mut self, epoch: u64) -> bool {
        if self.epoch == epoch && self.state == HandoverState::Connecting {
            self.state = HandoverState::ApActive;
            return true;
        }
        false
    }

    fn complete(&mut self, epoch: u64) -> bool {
        if self.epoch == epoch && self.state == HandoverState::Connecting {
            self.state = HandoverState::StaActive;
            return true;
        }
        false
    }

    fn state(&self) -> HandoverState {
        self.state
    }
}

/// Signal side of a begun handover
///
/// Consumed by [`HandoverHandle::signal`], so it fires at most once.
/// Dropping it without signaling aborts the handover and keeps the AP up.
#[derive(Debug)]
#[must_use = "dropping a handover handle aborts the handover"]
pub struct HandoverHandle {
    epoch: u64,
    tx: oneshot::Sender<()>,
}

impl HandoverHandle {
    /// Report that all connect-side persistence is complete
    pub fn signal(self) {
        if self.tx.send(()).is_err() {
            debug!("handover finalizer already gone, signal dropped");
        }
    }
}

/// Owns the handover state and sequences AP disablement
pub struct HandoverOrchestrator<B: WifiBackend> {
    backend: Arc<B>,
    provision: bool,
    timing: HandoverTiming,
    state_machine: Arc<RwLock<HandoverStateMachine>>,
    transitions: Arc<watch::Sender<HandoverState>>,
    shutdown: CancellationToken,
}

impl<B: WifiBackend> Clone for HandoverOrchestrator<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            provision: self.provision,
            timing: self.timing,
            state_machine: self.state_machine.clone(),
            transitions: self.transitions.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<B: WifiBackend> HandoverOrchestrator<B> {
    /// Create an orchestrator from the reconfiguration flag read at startup
    pub fn new(
        backend: Arc<B>,
        flag: i64,
        timing: HandoverTiming,
        shutdown: CancellationToken,
    ) -> Self {
        let state = HandoverState::from_flag(flag);
        let (transitions, _) = watch::channel(state);

        Self {
            backend,
            provision: flag == 1,
            timing,
            state_machine: Arc::new(RwLock::new(HandoverStateMachine::new(state))),
            transitions: Arc::new(transitions),
            shutdown,
        }
    }

    /// Whether the provisioning API should be exposed at all
    pub fn should_provision(&self) -> bool {
        self.provision
    }

    pub async fn state(&self) -> HandoverState {
        self.state_machine.read().await.state()
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> watch::Receiver<HandoverState> {
        self.transitions.subscribe()
    }

    /// Fail fast if a handover could not start right now
    pub async fn ensure_accepting(&self) -> ServiceResult<()> {
        self.state_machine.read().await.ensure_accepting()
    }

    /// Start a handover after a successful station connect
    ///
    /// Rejects the call while another handover is in flight or after one has
    /// completed. The finalize task is spawned immediately and waits for the
    /// returned handle to be signaled.
    pub async fn begin_handover(&self) -> ServiceResult<HandoverHandle> {
        let epoch = {
            let mut sm = self.state_machine.write().await;
            let epoch = sm.begin()?;
            self.transitions.send_replace(sm.state());
            epoch
        };
        info!(epoch, "handover started");

        let (tx, rx) = oneshot::channel();
        let orchestrator = self.clone();
        tokio::spawn(async move { orchestrator.await_and_finalize(epoch, rx).await });

        Ok(HandoverHandle { epoch, tx })
    }

    /// Abort a begun handover and return to `ApActive` before returning
    ///
    /// A new handover can begin as soon as this resolves.
    pub async fn abort_handover(&self, handle: HandoverHandle) {
        let HandoverHandle { epoch, tx } = handle;
        if self.abort(epoch).await {
            info!(epoch, "handover aborted, access point stays up");
        }
        drop(tx);
    }

    async fn await_and_finalize(self, epoch: u64, completion: oneshot::Receiver<()>) {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                info!("shutdown before handover completion, keeping access point up");
                self.abort(epoch).await;
                return;
            }
            signaled = completion => {
                if signaled.is_err() {
                    if self.abort(epoch).await {
                        warn!("handover handle dropped before completion, keeping access point up");
                    }
                    return;
                }
            }
        }

        info!(
            grace = ?self.timing.ap_grace,
            "configuration done, disabling access point after grace period"
        );
        if !self.pause(self.timing.ap_grace).await {
            info!("shutdown during grace period, keeping access point up");
            self.abort(epoch).await;
            return;
        }

        // no retry: a second attempt could leave the radio in a mixed AP/STA state
        match self.backend.disable_ap().await {
            Ok(()) => info!("access point disabled"),
            Err(e) => error!("failed to disable access point: {}", e),
        }

        if !self.pause(self.timing.ap_settle).await {
            debug!("shutdown during settling period");
        }

        self.complete(epoch).await;
    }

    /// Sleep unless shutdown is requested first; returns false on shutdown
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    async fn abort(&self, epoch: u64) -> bool {
        let mut sm = self.state_machine.write().await;
        let aborted = sm.abort(epoch);
        if aborted {
            self.transitions.send_replace(sm.state());
        }
        aborted
    }

    async fn complete(&self, epoch: u64) {
        let mut sm = self.state_machine.write().await;
        if sm.complete(epoch) {
            self.transitions.send_replace(sm.state());
            info!("handover complete, station mode active");
        }
    }
}
