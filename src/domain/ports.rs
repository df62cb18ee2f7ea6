use crate::domain::model::{Attributes, Environment, ImportRecord};
use crate::utils::error::Result;
use std::path::Path;

/// Lazily produced bulk-data records.
pub type RecordStream<'a> = Box<dyn Iterator<Item = Result<ImportRecord>> + 'a>;

/// The embedded directory engine, consumed as an opaque service.
///
/// Opening a context with a startup environment starts the service if it is
/// not running yet, the same way a JNDI-style server context factory does.
pub trait DirectoryService: Send + Sync {
    type Handle: AdminHandle;

    fn open(&self, environment: &Environment) -> Result<Self::Handle>;

    fn shutdown(&self, environment: &Environment) -> Result<()>;
}

/// An authenticated administrative context scoped at a base DN.
pub trait AdminHandle {
    fn base(&self) -> &str;

    /// Creates an entry at `dn`, resolved relative to the handle's base.
    fn create_entry(&self, dn: &str, attributes: &Attributes) -> Result<()>;
}

/// Where the seed records come from. Read once per `start()`.
pub trait SeedSource: Send + Sync {
    fn describe(&self) -> String;

    fn records(&self) -> Result<RecordStream<'static>>;
}

/// Removes the service's on-disk state between runs.
pub trait StoreCleaner: Send + Sync {
    /// Deletes `path` and fails with `CleanupFailed` if anything is left.
    fn clean(&self, path: &Path) -> Result<()>;
}
