// Adapters layer: concrete implementations of the domain ports (directory
// engine, LDIF parsing, seed sources).

pub mod ldif;
pub mod memory;
pub mod seed;

use crate::config::FixtureSettings;
use crate::core::lifecycle::LifecycleManager;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use memory::MemoryDirectoryService;
use seed::LdifFileSeed;

/// Builds a fixture backed by the in-process directory service, seeded from
/// the LDIF file named in `settings`.
pub fn memory_fixture(settings: &FixtureSettings) -> Result<LifecycleManager<MemoryDirectoryService>> {
    settings.validate()?;
    let service = MemoryDirectoryService::new().with_host(settings.host()?);
    let seed = LdifFileSeed::new(settings.seed_file());
    LifecycleManager::with_settings(service, Box::new(seed), settings)
}
