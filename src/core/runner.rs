//! Long-lived wireless run loop

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    backend::WifiBackend,
    core::types::{Command, WifiMode},
};

/// Capacity of the command channel; a full channel means a command is pending
pub const COMMAND_CHANNEL_CAPACITY: usize = 1;

/// Create the bounded command channel consumed by [`WifiRunner::run`]
pub fn command_channel() -> (mpsc::Sender<Command>, mpsc::Receiver<Command>) {
    mpsc::channel(COMMAND_CHANNEL_CAPACITY)
}

/// Applies the initial radio mode and executes commands until killed
pub struct WifiRunner<B: WifiBackend> {
    backend: Arc<B>,
    mode: WifiMode,
}

impl<B: WifiBackend> WifiRunner<B> {
    pub fn new(backend: Arc<B>, mode: WifiMode) -> Self {
        Self { backend, mode }
    }

    /// Run until a kill command arrives, the channel closes or `shutdown` fires
    ///
    /// A kill command cancels `shutdown` so every other task observing the
    /// token winds down too.
    pub async fn run(self, mut commands: mpsc::Receiver<Command>, shutdown: CancellationToken) {
        info!(mode = ?self.mode, "wifi run loop started");

        match self.mode {
            WifiMode::AccessPoint => {
                if let Err(e) = self.backend.enable_ap().await {
                    warn!("failed to enable provisioning access point: {}", e);
                }
            }
            WifiMode::Station => debug!("station mode, access point left alone"),
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("wifi run loop shutting down");
                    break;
                }
                command = commands.recv() => match command {
                    Some(Command::Kill) => {
                        info!("kill command received");
                        shutdown.cancel();
                        break;
                    }
                    None => {
                        debug!("command channel closed");
                        break;
                    }
                }
            }
        }

        info!("wifi run loop stopped");
    }
}
