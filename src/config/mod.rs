#[cfg(feature = "cli")]
pub mod cli;
pub mod service;
pub mod settings;

pub use service::ServiceConfig;
pub use settings::FixtureSettings;

/// Bootstrap administrator, fixed by the directory service.
pub const ADMIN_PRINCIPAL: &str = "uid=admin,ou=system";
pub const ADMIN_CREDENTIAL: &str = "secret";
pub const AUTHENTICATION_MODE: &str = "simple";

/// Shutdown requests are issued as the bootstrap administrator.
pub const SHUTDOWN_PRINCIPAL: &str = ADMIN_PRINCIPAL;
pub const SHUTDOWN_CREDENTIAL: &str = ADMIN_CREDENTIAL;

pub const SYSTEM_SUFFIX: &str = "ou=system";
pub const ROOT_SUFFIX: &str = "";

/// Identity of the embedded service factory placed in every environment.
pub const SERVICE_FACTORY: &str = "ldap_fixture::adapters::memory::MemoryDirectoryService";

pub const DEFAULT_WORKING_DIRECTORY: &str = "server-work";
pub const DEFAULT_SEED_FILE: &str = "init.ldif";
pub const DEFAULT_RESOURCE_DIRECTORY: &str = "resources";
pub const DEFAULT_PORT_KEY: &str = "LDAP_PORT";
pub const DEFAULT_PORT_FLOOR: u16 = 1024;
pub const DEFAULT_HOST: &str = "127.0.0.1";
