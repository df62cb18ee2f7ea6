pub mod context;
pub mod importer;
pub mod lifecycle;
pub mod partition;
pub mod publish;

pub use crate::domain::model::{Attributes, ImportRecord, PartitionSpec};
pub use crate::domain::ports::{AdminHandle, DirectoryService, SeedSource};
pub use crate::utils::error::Result;
