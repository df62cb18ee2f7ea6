use std::collections::{BTreeMap, BTreeSet};

/// Key/value parameter set handed to the directory service when opening a
/// context or requesting shutdown.
pub type Environment = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub values: Vec<String>,
}

/// Attribute set of a directory entry.
///
/// Names are matched case-insensitively, values keep insertion order and
/// duplicates are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: BTreeMap<String, Attribute>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        let attribute = self
            .entries
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| Attribute {
                name: name.to_string(),
                values: Vec::new(),
            });
        if !attribute.values.contains(&value) {
            attribute.values.push(value);
        }
    }

    pub fn with(mut self, name: &str, values: &[&str]) -> Self {
        for value in values {
            self.add(name, *value);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|attribute| attribute.values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attribute name to values, keyed by the name as first written.
    pub fn to_map(&self) -> BTreeMap<String, Vec<String>> {
        self.iter()
            .map(|attribute| (attribute.name.clone(), attribute.values.clone()))
            .collect()
    }

    pub fn from_map(map: BTreeMap<String, Vec<String>>) -> Self {
        let mut attributes = Self::new();
        for (name, values) in map {
            for value in values {
                attributes.add(&name, value);
            }
        }
        attributes
    }
}

/// One bulk-data record: the entry to create and its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub dn: String,
    pub attributes: Attributes,
}

impl ImportRecord {
    pub fn new(dn: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            dn: dn.into(),
            attributes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSpec {
    pub name: String,
    pub suffix: String,
    pub indexed_attributes: BTreeSet<String>,
    pub root_entry_attributes: Attributes,
}
