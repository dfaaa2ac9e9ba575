//! Configuration module

pub mod cli;
pub mod settings;
pub mod wifi;

pub use cli::CliArgs;
pub use settings::Settings;
pub use wifi::WifiConfig;
