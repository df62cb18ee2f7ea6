use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("No available port found at or above {floor}")]
    NoPortAvailable { floor: u16 },

    #[error("Failed to delete: {} ({reason})", path.display())]
    CleanupFailed { path: PathBuf, reason: String },

    #[error("Authentication failed for principal '{principal}'")]
    AuthenticationFailed { principal: String },

    #[error("Directory service unreachable: {message}")]
    ServiceUnreachable { message: String },

    #[error("Failed while importing seed data: {source}")]
    ImportFailed {
        #[source]
        source: Box<FixtureError>,
    },

    #[error("Shutdown request failed: {message}")]
    ShutdownRequestFailed { message: String },

    #[error("Cannot {operation} while {state}")]
    InvalidState { operation: String, state: String },

    #[error("LDIF parse error at line {line}: {message}")]
    LdifParse { line: usize, message: String },

    #[error("Entry '{dn}' rejected: {reason}")]
    EntryRejected { dn: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, FixtureError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Filesystem,
    Security,
    Data,
    Lifecycle,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FixtureError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FixtureError::NoPortAvailable { .. } | FixtureError::ServiceUnreachable { .. } => {
                ErrorCategory::Network
            }
            FixtureError::CleanupFailed { .. } | FixtureError::IoError(_) => {
                ErrorCategory::Filesystem
            }
            FixtureError::AuthenticationFailed { .. } => ErrorCategory::Security,
            FixtureError::ImportFailed { .. }
            | FixtureError::LdifParse { .. }
            | FixtureError::EntryRejected { .. } => ErrorCategory::Data,
            FixtureError::ShutdownRequestFailed { .. } | FixtureError::InvalidState { .. } => {
                ErrorCategory::Lifecycle
            }
            FixtureError::ConfigError { .. }
            | FixtureError::ConfigValidationError { .. }
            | FixtureError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FixtureError::ShutdownRequestFailed { .. } => ErrorSeverity::Low,
            FixtureError::NoPortAvailable { .. } | FixtureError::ServiceUnreachable { .. } => {
                ErrorSeverity::Medium
            }
            // 殘留的工作目錄會污染下一次啟動
            FixtureError::CleanupFailed { .. } | FixtureError::IoError(_) => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            FixtureError::NoPortAvailable { floor } => format!(
                "Free a port at or above {} or lower the configured port floor",
                floor
            ),
            FixtureError::CleanupFailed { path, .. } => format!(
                "Remove '{}' manually and check that no other process holds files in it",
                path.display()
            ),
            FixtureError::AuthenticationFailed { .. } => {
                "Check the administrator credentials of the directory service".to_string()
            }
            FixtureError::ServiceUnreachable { .. } => {
                "Make sure the directory service can start and bind its port".to_string()
            }
            FixtureError::ImportFailed { .. }
            | FixtureError::LdifParse { .. }
            | FixtureError::EntryRejected { .. } => {
                "Check the seed LDIF file: every parent entry must precede its children".to_string()
            }
            FixtureError::ShutdownRequestFailed { .. } => {
                "The service was probably already stopped; nothing to do".to_string()
            }
            FixtureError::InvalidState { .. } => {
                "Call stop() before starting the fixture again".to_string()
            }
            FixtureError::IoError(_) => "Check file permissions and disk space".to_string(),
            FixtureError::ConfigError { .. }
            | FixtureError::ConfigValidationError { .. }
            | FixtureError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command line options".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Filesystem => format!("Filesystem problem: {}", self),
            ErrorCategory::Security => format!("Access denied: {}", self),
            ErrorCategory::Data => format!("Seed data problem: {}", self),
            ErrorCategory::Lifecycle => format!("Fixture lifecycle problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
        }
    }

    pub(crate) fn import_failed(cause: FixtureError) -> Self {
        match cause {
            FixtureError::ImportFailed { .. } => cause,
            other => FixtureError::ImportFailed {
                source: Box::new(other),
            },
        }
    }
}
