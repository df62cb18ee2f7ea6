use crate::config::FixtureSettings;
use crate::utils::error::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "ldap-fixture")]
#[command(about = "Start a disposable embedded directory service seeded with test data")]
pub struct CliConfig {
    #[arg(long, help = "TOML settings file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Address the service binds to")]
    pub host: Option<String>,

    #[arg(long, help = "Lowest port to consider")]
    pub port_floor: Option<u16>,

    #[arg(long, help = "Working directory, deleted on start and stop")]
    pub working_directory: Option<String>,

    #[arg(long, help = "LDIF file loaded after startup")]
    pub seed: Option<String>,

    #[arg(long, help = "Environment variable receiving the port")]
    pub port_key: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, help = "Print the status line as JSON")]
    pub json: bool,

    #[arg(long, help = "Stop again right after a successful start")]
    pub exit_after_start: bool,
}

impl CliConfig {
    /// 先讀取設定檔，再以命令列參數覆蓋
    pub fn to_settings(&self) -> Result<FixtureSettings> {
        let mut settings = match &self.config {
            Some(path) => FixtureSettings::from_file(path)?,
            None => FixtureSettings::default(),
        };

        if let Some(host) = &self.host {
            settings.server.host = host.clone();
        }
        if let Some(floor) = self.port_floor {
            settings.server.port_floor = floor;
        }
        if let Some(dir) = &self.working_directory {
            settings.server.working_directory = dir.clone();
        }
        if let Some(seed) = &self.seed {
            settings.seed.file = seed.clone();
        }
        if let Some(key) = &self.port_key {
            settings.publish.port_key = key.clone();
        }

        Ok(settings)
    }
}
