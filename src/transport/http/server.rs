//! HTTP server hosting the provisioning API

use actix_cors::Cors;
use actix_web::{App, HttpServer, dev::ServerHandle, http::header, web};
use listenfd::ListenFd;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::{
    backend::WifiBackend,
    core::{error::TransportResult, service::ProvisioningService},
    transport::http::{handler, middleware::RequestLog},
};

/// Allow any origin with the methods and headers browser clients send
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "HEAD", "POST", "PUT", "OPTIONS", "DELETE"])
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::CONTENT_LENGTH,
            header::HeaderName::from_static("x-requested-with"),
            header::ACCEPT,
            header::ORIGIN,
        ])
}

/// HTTP control API server
pub struct HttpApiServer<B: WifiBackend> {
    service: web::Data<ProvisioningService<B>>,
    bind_address: String,
    port: u16,
}

/// Handle to a running server
pub struct RunningServer {
    pub handle: ServerHandle,
    pub task: JoinHandle<()>,
}

impl RunningServer {
    /// Stop accepting requests and wait for the server task
    pub async fn stop(self) {
        self.handle.stop(false).await;
        if let Err(e) = self.task.await {
            error!("HTTP server task failed: {}", e);
        }
    }
}

impl<B: WifiBackend> HttpApiServer<B> {
    pub fn new(service: ProvisioningService<B>, bind_address: impl Into<String>, port: u16) -> Self {
        Self {
            service: web::Data::new(service),
            bind_address: bind_address.into(),
            port,
        }
    }

    /// Bind (or take over an inherited socket) and start serving
    pub fn start(self) -> TransportResult<RunningServer> {
        let service = self.service.clone();

        let server = HttpServer::new(move || {
            App::new()
                .wrap(cors())
                .wrap(RequestLog)
                .app_data(service.clone())
                .configure(handler::configure::<B>)
        })
        .disable_signals();

        let mut listenfd = ListenFd::from_env();
        let server = match listenfd.take_tcp_listener(0)? {
            Some(listener) => {
                info!("serving on inherited socket {:?}", listener.local_addr()?);
                server.listen(listener)?
            }
            None => {
                info!("serving on {}:{}", self.bind_address, self.port);
                server.bind((self.bind_address.as_str(), self.port))?
            }
        }
        .run();

        let handle = server.handle();
        let task = tokio::spawn(async move {
            if let Err(e) = server.await {
                error!("HTTP server error: {}", e);
            }
        });

        Ok(RunningServer { handle, task })
    }
}
