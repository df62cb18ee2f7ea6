use crate::adapters::ldif::LdifReader;
use crate::domain::ports::{RecordStream, SeedSource};
use crate::utils::error::{FixtureError, Result};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};

/// Seed records read from an LDIF file when the fixture starts.
#[derive(Debug, Clone)]
pub struct LdifFileSeed {
    path: PathBuf,
}

impl LdifFileSeed {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SeedSource for LdifFileSeed {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn records(&self) -> Result<RecordStream<'static>> {
        let file = File::open(&self.path).map_err(|e| FixtureError::ConfigError {
            message: format!("Cannot open seed file {}: {}", self.path.display(), e),
        })?;
        Ok(Box::new(LdifReader::new(BufReader::new(file))))
    }
}

/// Seed records from LDIF text held in memory.
#[derive(Debug, Clone)]
pub struct LdifTextSeed {
    content: String,
}

impl LdifTextSeed {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

impl SeedSource for LdifTextSeed {
    fn describe(&self) -> String {
        format!("inline LDIF ({} bytes)", self.content.len())
    }

    fn records(&self) -> Result<RecordStream<'static>> {
        Ok(Box::new(LdifReader::new(Cursor::new(
            self.content.clone().into_bytes(),
        ))))
    }
}
