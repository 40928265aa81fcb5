// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuditError>;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("GitHub API request failed: {0}")]
    Transport(String),

    #[error("Version control error in {repository}: {message}")]
    VersionControl { repository: String, message: String },

    #[error("Failed to run {program}: {message}")]
    Subprocess { program: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for AuditError {
    fn from(err: reqwest::Error) -> Self {
        AuditError::Transport(err.to_string())
    }
}

impl From<config::ConfigError> for AuditError {
    fn from(err: config::ConfigError) -> Self {
        AuditError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_control_message() {
        let err = AuditError::VersionControl {
            repository: "billing".to_string(),
            message: "not a git repository".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Version control error in billing: not a git repository"
        );
    }

    #[test]
    fn test_serde_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let converted: AuditError = err.into();
        assert!(matches!(converted, AuditError::Serialization(_)));
    }
}
