use crate::domain::model::{Attributes, PartitionSpec};
use crate::utils::error::{FixtureError, Result};
use std::collections::BTreeSet;

pub const SEED_PARTITION_NAME: &str = "sevenSeas";
pub const SEED_PARTITION_SUFFIX: &str = "o=sevenseas";

#[derive(Debug, Clone)]
pub struct PartitionBuilder {
    name: String,
    suffix: String,
    indexed_attributes: BTreeSet<String>,
    root_entry_attributes: Attributes,
}

impl PartitionBuilder {
    pub fn new(name: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            suffix: suffix.into(),
            indexed_attributes: BTreeSet::new(),
            root_entry_attributes: Attributes::new(),
        }
    }

    /// The `o=sevenseas` partition every fixture run starts with.
    pub fn seed() -> Self {
        Self::new(SEED_PARTITION_NAME, SEED_PARTITION_SUFFIX)
            .index("objectClass")
            .index("o")
            .root_attribute("objectClass", "top")
            .root_attribute("objectClass", "organization")
            .root_attribute("o", "sevenseas")
    }

    pub fn index(mut self, attribute: &str) -> Self {
        self.indexed_attributes.insert(attribute.to_string());
        self
    }

    pub fn root_attribute(mut self, attribute: &str, value: &str) -> Self {
        self.root_entry_attributes.add(attribute, value);
        self
    }

    pub fn build(self) -> Result<PartitionSpec> {
        if self.name.trim().is_empty() {
            return Err(FixtureError::ConfigValidationError {
                field: "partition.name".to_string(),
                message: "Partition name cannot be empty".to_string(),
            });
        }
        if self.suffix.trim().is_empty() {
            return Err(FixtureError::ConfigValidationError {
                field: format!("partition.{}.suffix", self.name),
                message: "Partition suffix cannot be empty".to_string(),
            });
        }

        Ok(PartitionSpec {
            name: self.name,
            suffix: self.suffix,
            indexed_attributes: self.indexed_attributes,
            root_entry_attributes: self.root_entry_attributes,
        })
    }
}
