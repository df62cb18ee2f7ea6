pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::memory::MemoryDirectoryService;
pub use adapters::memory_fixture;
pub use adapters::seed::{LdifFileSeed, LdifTextSeed};
pub use config::{FixtureSettings, ServiceConfig};
pub use core::lifecycle::{LifecycleManager, LifecycleState};
pub use core::publish::published_port;
pub use utils::error::{FixtureError, Result};
