use crate::domain::ports::StoreCleaner;
use crate::utils::error::{FixtureError, Result};
use std::fs;
use std::path::Path;

/// Deletes the on-disk state of the service and checks that it is gone.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkingStoreCleaner;

impl StoreCleaner for WorkingStoreCleaner {
    fn clean(&self, path: &Path) -> Result<()> {
        if path.exists() {
            tracing::debug!("Deleting working directory {}", path.display());
            let removed = if path.is_dir() {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            };
            removed.map_err(|e| FixtureError::CleanupFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        if path.exists() {
            return Err(FixtureError::CleanupFailed {
                path: path.to_path_buf(),
                reason: "path still exists after deletion".to_string(),
            });
        }

        Ok(())
    }
}
