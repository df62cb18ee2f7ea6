use crate::config::{
    DEFAULT_HOST, DEFAULT_PORT_FLOOR, DEFAULT_PORT_KEY, DEFAULT_RESOURCE_DIRECTORY,
    DEFAULT_SEED_FILE, DEFAULT_WORKING_DIRECTORY,
};
use crate::utils::error::{FixtureError, Result};
use crate::utils::validation::{
    validate_env_key, validate_host, validate_path, validate_port_floor, Validate,
};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Fixture settings; every section may be omitted from the TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureSettings {
    pub server: ServerSettings,
    pub seed: SeedSettings,
    pub publish: PublishSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port_floor: u16,
    pub working_directory: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port_floor: DEFAULT_PORT_FLOOR,
            working_directory: DEFAULT_WORKING_DIRECTORY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedSettings {
    pub file: String,
}

impl Default for SeedSettings {
    fn default() -> Self {
        Self {
            file: format!("{}/{}", DEFAULT_RESOURCE_DIRECTORY, DEFAULT_SEED_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishSettings {
    pub port_key: String,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            port_key: DEFAULT_PORT_KEY.to_string(),
        }
    }
}

impl FixtureSettings {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FixtureError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析設定
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FixtureError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${LDAP_WORK_DIR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FixtureError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn host(&self) -> Result<IpAddr> {
        validate_host("server.host", &self.server.host)
    }

    pub fn port_floor(&self) -> u16 {
        self.server.port_floor
    }

    pub fn working_directory(&self) -> PathBuf {
        PathBuf::from(&self.server.working_directory)
    }

    pub fn seed_file(&self) -> PathBuf {
        PathBuf::from(&self.seed.file)
    }

    pub fn port_key(&self) -> &str {
        &self.publish.port_key
    }
}

impl Validate for FixtureSettings {
    fn validate(&self) -> Result<()> {
        self.host()?;
        validate_port_floor("server.port_floor", self.server.port_floor)?;
        validate_path("server.working_directory", &self.server.working_directory)?;
        validate_path("seed.file", &self.seed.file)?;
        validate_env_key("publish.port_key", &self.publish.port_key)?;
        Ok(())
    }
}
