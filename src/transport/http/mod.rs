//! HTTP control API transport

pub mod handler;
pub mod middleware;
pub mod server;

pub use {
    middleware::RequestLog,
    server::{HttpApiServer, RunningServer},
};
