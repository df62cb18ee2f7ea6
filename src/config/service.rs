use crate::config::DEFAULT_WORKING_DIRECTORY;
use crate::domain::model::{Environment, PartitionSpec};
use crate::utils::error::{FixtureError, Result};
use std::path::{Path, PathBuf};

/// Names of the parameters understood by the directory service.
pub mod keys {
    pub const OPERATION: &str = "server.operation";
    pub const WORKING_DIRECTORY: &str = "server.working_directory";
    pub const LDAP_PORT: &str = "server.ldap_port";
    pub const SHUTDOWN_HOOK_ENABLED: &str = "server.shutdown_hook_enabled";
    pub const PARTITIONS: &str = "server.partitions";

    pub const PROVIDER_URL: &str = "provider.url";
    pub const SERVICE_FACTORY: &str = "service.factory";
    pub const PRINCIPAL: &str = "security.principal";
    pub const CREDENTIALS: &str = "security.credentials";
    pub const AUTHENTICATION: &str = "security.authentication";

    pub const OPERATION_STARTUP: &str = "startup";
    pub const OPERATION_SHUTDOWN: &str = "shutdown";

    pub fn partition_suffix(name: &str) -> String {
        format!("partition.{}.suffix", name)
    }

    pub fn partition_indexed_attributes(name: &str) -> String {
        format!("partition.{}.indexed_attributes", name)
    }

    pub fn partition_root_entry(name: &str) -> String {
        format!("partition.{}.root_entry", name)
    }
}

/// Startup configuration of one service run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub partitions: Vec<PartitionSpec>,
    pub working_directory: PathBuf,
    pub port: Option<u16>,
    pub shutdown_hook_enabled: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            partitions: Vec::new(),
            working_directory: PathBuf::from(DEFAULT_WORKING_DIRECTORY),
            port: None,
            shutdown_hook_enabled: true,
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_partitions(mut self, partitions: Vec<PartitionSpec>) -> Result<Self> {
        for (i, partition) in partitions.iter().enumerate() {
            if partitions[..i].iter().any(|p| p.name == partition.name) {
                return Err(FixtureError::ConfigValidationError {
                    field: "partitions".to_string(),
                    message: format!("Duplicate partition name '{}'", partition.name),
                });
            }
        }
        self.partitions = partitions;
        Ok(self)
    }

    pub fn with_working_directory(mut self, path: impl AsRef<Path>) -> Self {
        self.working_directory = path.as_ref().to_path_buf();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_shutdown_hook(mut self, enabled: bool) -> Self {
        self.shutdown_hook_enabled = enabled;
        self
    }

    /// Renders the configuration into the service's startup parameters.
    pub fn to_environment(&self) -> Result<Environment> {
        let mut env = Environment::new();
        env.insert(keys::OPERATION.to_string(), keys::OPERATION_STARTUP.to_string());
        env.insert(
            keys::WORKING_DIRECTORY.to_string(),
            self.working_directory.to_string_lossy().into_owned(),
        );
        if let Some(port) = self.port {
            env.insert(keys::LDAP_PORT.to_string(), port.to_string());
        }
        env.insert(
            keys::SHUTDOWN_HOOK_ENABLED.to_string(),
            self.shutdown_hook_enabled.to_string(),
        );

        let mut names: Vec<&str> = self.partitions.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        env.insert(keys::PARTITIONS.to_string(), names.join(","));

        for partition in &self.partitions {
            env.insert(keys::partition_suffix(&partition.name), partition.suffix.clone());
            env.insert(
                keys::partition_indexed_attributes(&partition.name),
                serde_json::to_string(&partition.indexed_attributes).map_err(config_error)?,
            );
            env.insert(
                keys::partition_root_entry(&partition.name),
                serde_json::to_string(&partition.root_entry_attributes.to_map())
                    .map_err(config_error)?,
            );
        }

        Ok(env)
    }

    pub fn shutdown_environment() -> Environment {
        let mut env = Environment::new();
        env.insert(keys::OPERATION.to_string(), keys::OPERATION_SHUTDOWN.to_string());
        env
    }
}

fn config_error(e: serde_json::Error) -> FixtureError {
    FixtureError::ConfigError {
        message: format!("Cannot render partition definition: {}", e),
    }
}
