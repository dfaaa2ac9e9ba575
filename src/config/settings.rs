//! Runtime settings

use std::{path::PathBuf, time::Duration};

use crate::{config::CliArgs, core::handover::HandoverTiming};

/// Runtime configuration settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub flag_file: PathBuf,
    pub flag_name: String,
    pub wifi_config: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub timing: HandoverTiming,
}

impl From<CliArgs> for Settings {
    fn from(args: CliArgs) -> Self {
        Settings {
            flag_file: args.flag_file,
            flag_name: args.flag_name,
            wifi_config: args.wifi_config,
            bind_address: args.bind_address,
            port: args.port,
            timing: HandoverTiming {
                ap_grace: Duration::from_secs(args.ap_grace_secs),
                ap_settle: Duration::from_secs(args.ap_settle_secs),
            },
        }
    }
}
