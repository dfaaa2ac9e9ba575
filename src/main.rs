//! WiFi Provisioning Service - Main Entry Point

use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wifi_provisioning_service::{
    backend::WifiCtrlBackend,
    config::{CliArgs, Settings, WifiConfig},
    core::{
        flag_store::FlagStore,
        handover::HandoverOrchestrator,
        runner::{WifiRunner, command_channel},
        service::ProvisioningService,
        types::{HandoverState, WifiMode},
    },
    transport::http::HttpApiServer,
};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wifi_provisioning_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI arguments
    let args = CliArgs::parse();
    info!(?args, "Starting WiFi provisioning service");
    let settings = Settings::from(args);

    let wifi_config = WifiConfig::load(&settings.wifi_config).await?;

    let flag_store = Arc::new(FlagStore::new(settings.flag_file.clone()));
    let flag = flag_store.read_flag(&settings.flag_name).await?;
    let initial = HandoverState::from_flag(flag);
    info!(flag, ?initial, "reconfiguration flag read");

    let backend = Arc::new(WifiCtrlBackend::new(&wifi_config).await?);

    let shutdown = CancellationToken::new();
    let (commands, command_rx) = command_channel();

    let runner = WifiRunner::new(backend.clone(), WifiMode::from(initial));
    let runner_task = tokio::spawn(runner.run(command_rx, shutdown.clone()));

    let orchestrator =
        HandoverOrchestrator::new(backend.clone(), flag, settings.timing, shutdown.clone());

    let server = if orchestrator.should_provision() {
        let service = ProvisioningService::new(
            backend,
            flag_store,
            settings.flag_name.clone(),
            orchestrator,
            commands.clone(),
        );
        let server =
            HttpApiServer::new(service, settings.bind_address.clone(), settings.port).start()?;
        info!("HTTP control API started");
        Some(server)
    } else {
        info!("reconfiguration not requested, HTTP control API disabled");
        None
    };

    #[cfg(feature = "systemd")]
    if let Err(e) = sd_notify::notify(false, &[sd_notify::NotifyState::Ready]) {
        warn!("failed to notify systemd: {}", e);
    }

    info!("Service started successfully");

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully");
        }
        _ = shutdown_signal() => {
            info!("Received SIGTERM, shutting down gracefully");
        }
        _ = shutdown.cancelled() => {
            info!("Kill command received, shutting down");
        }
    }

    info!("Shutting down...");
    shutdown.cancel();
    drop(commands);

    if let Some(server) = server {
        server.stop().await;
    }
    if let Err(e) = runner_task.await {
        warn!("wifi run loop task failed: {}", e);
    }

    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    // On non-Unix platforms, just wait forever
    std::future::pending::<()>().await
}
