use crate::domain::model::ImportRecord;
use crate::domain::ports::AdminHandle;
use crate::utils::error::{FixtureError, Result};

/// Creates one entry per record, in source order.
///
/// The first failing record (parse or create) aborts the import. Entries
/// created before it stay in the service; there is no rollback.
pub struct BulkImporter;

impl BulkImporter {
    pub fn import_all<H, I>(root: &H, records: I) -> Result<usize>
    where
        H: AdminHandle + ?Sized,
        I: IntoIterator<Item = Result<ImportRecord>>,
    {
        let mut created = 0;

        for record in records {
            let record = record.map_err(FixtureError::import_failed)?;
            root.create_entry(&record.dn, &record.attributes)
                .map_err(FixtureError::import_failed)?;
            tracing::debug!("Created entry {}", record.dn);
            created += 1;
        }

        Ok(created)
    }
}
