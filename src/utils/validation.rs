use crate::utils::error::{FixtureError, Result};
use crate::utils::port::MAX_PORT;
use regex::Regex;
use std::net::IpAddr;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(FixtureError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(FixtureError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_port_floor(field_name: &str, floor: u16) -> Result<()> {
    if floor == 0 || floor > MAX_PORT {
        return Err(FixtureError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: floor.to_string(),
            reason: format!("Port floor must be between 1 and {}", MAX_PORT),
        });
    }
    Ok(())
}

pub fn validate_host(field_name: &str, host: &str) -> Result<IpAddr> {
    host.parse::<IpAddr>()
        .map_err(|e| FixtureError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: host.to_string(),
            reason: format!("Invalid IP address: {}", e),
        })
}

/// Environment variable names: letters, digits and underscores, not starting
/// with a digit.
pub fn validate_env_key(field_name: &str, key: &str) -> Result<()> {
    let re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").map_err(|e| FixtureError::ConfigError {
        message: e.to_string(),
    })?;

    if !re.is_match(key) {
        return Err(FixtureError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: key.to_string(),
            reason: "Not a valid environment variable name".to_string(),
        });
    }
    Ok(())
}
