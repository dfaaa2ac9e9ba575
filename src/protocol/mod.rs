//! Protocol message definitions

pub mod response;

pub use response::{ApiResponse, ApiStatus};
