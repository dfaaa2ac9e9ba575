//! Route handlers translating HTTP requests into service calls

use actix_web::{
    HttpRequest, HttpResponse, error::InternalError, error::JsonPayloadError, http::header,
    web,
};
use tracing::{error, info};

use crate::{
    backend::WifiBackend,
    core::{service::ProvisioningService, types::WifiCredentials},
    protocol::ApiResponse,
};

/// Register all routes of the provisioning API
pub fn configure<B: WifiBackend>(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/status", web::route().to(status::<B>))
        .service(web::resource("/connect").route(web::post().to(connect::<B>)))
        .route("/scan", web::route().to(scan::<B>))
        .route("/kill", web::route().to(kill::<B>));
}

/// Undecodable bodies answer with the raw error text and a 500,
/// bypassing the envelope
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .content_type_required(false)
        .error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
            error!("failed to decode request body: {}", err);
            let response = HttpResponse::InternalServerError()
                .insert_header((header::CONTENT_TYPE, "text/plain; charset=utf-8"))
                .body(err.to_string());
            InternalError::from_response(err, response).into()
        })
}

pub async fn status<B: WifiBackend>(service: web::Data<ProvisioningService<B>>) -> HttpResponse {
    match service.status().await {
        Ok(status) => HttpResponse::Ok().json(ApiResponse::ok("status", status)),
        Err(e) => {
            error!("status failed: {}", e);
            HttpResponse::Ok().json(ApiResponse::fail(e.to_string()))
        }
    }
}

pub async fn connect<B: WifiBackend>(
    service: web::Data<ProvisioningService<B>>,
    credentials: web::Json<WifiCredentials>,
) -> HttpResponse {
    let credentials = credentials.into_inner();
    info!(ssid = %credentials.ssid, "connect requested");

    match service.connect(credentials).await {
        Ok(result) => HttpResponse::Ok().json(ApiResponse::ok("Connection", result)),
        Err(e) => {
            error!("connect failed: {}", e);
            HttpResponse::Ok().json(ApiResponse::fail(e.to_string()))
        }
    }
}

pub async fn scan<B: WifiBackend>(service: web::Data<ProvisioningService<B>>) -> HttpResponse {
    info!("scan requested");

    match service.scan().await {
        Ok(networks) => HttpResponse::Ok().json(ApiResponse::ok("Networks", networks)),
        Err(e) => {
            error!("scan failed: {}", e);
            HttpResponse::Ok().json(ApiResponse::fail(e.to_string()))
        }
    }
}

pub async fn kill<B: WifiBackend>(service: web::Data<ProvisioningService<B>>) -> HttpResponse {
    match service.kill() {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::ok_message("Killing service.")),
        Err(e) => {
            error!("kill failed: {}", e);
            HttpResponse::Ok().json(ApiResponse::fail(e.to_string()))
        }
    }
}
