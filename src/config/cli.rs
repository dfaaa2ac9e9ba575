//! Command-line argument parsing

use std::path::PathBuf;

use clap::{Parser, builder::NonEmptyStringValueParser};

#[derive(Parser, Debug, Clone)]
#[clap(name = "wifi-provisioning", version, author)]
#[clap(about = "WiFi provisioning service with an HTTP control API and AP to STA handover")]
pub struct CliArgs {
    /// Key/value file holding the reconfiguration flag
    #[clap(long, env = "IOTWIFI_APP_CONFIG", default_value = "cfg/.app_config")]
    pub flag_file: PathBuf,

    /// Name of the reconfiguration flag, matched as a substring of each line
    #[clap(
        long,
        default_value = "reconfiguration",
        value_parser = NonEmptyStringValueParser::new()
    )]
    pub flag_name: String,

    /// JSON file describing the station and access point interfaces
    #[clap(long, env = "IOTWIFI_CFG", default_value = "cfg/wificfg.json")]
    pub wifi_config: PathBuf,

    /// Address the HTTP control API binds to
    #[clap(long, default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Port of the HTTP control API
    #[clap(short, long, env = "IOTWIFI_PORT", default_value = "8080")]
    pub port: u16,

    /// Seconds the access point stays up after a successful connect
    #[clap(long, default_value = "5")]
    pub ap_grace_secs: u64,

    /// Seconds to wait after the access point went down
    #[clap(long, default_value = "2")]
    pub ap_settle_secs: u64,
}
