// file: src/utils/validation.rs
// description: data validation utilities and helpers
// reference: input validation patterns

use crate::error::{AuditError, Result};
use std::path::Path;

pub struct Validator;

impl Validator {
    pub fn validate_directory(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(AuditError::Validation(format!(
                "Directory does not exist: {}",
                path.display()
            )));
        }

        if !path.is_dir() {
            return Err(AuditError::Validation(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }

        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AuditError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    /// Repository names become directory and file names under the workspace.
    pub fn validate_repository_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(AuditError::Validation(
                "Repository name is empty".to_string(),
            ));
        }

        if name == "." || name == ".." {
            return Err(AuditError::Validation(format!(
                "Repository name is not a valid directory name: {}",
                name
            )));
        }

        if name.contains(['/', '\\', '\0']) {
            return Err(AuditError::Validation(format!(
                "Repository name contains a path separator: {}",
                name
            )));
        }

        Ok(())
    }

    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((index, _)) => format!("{}...", &text[..index]),
            None => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_directory() {
        let temp = TempDir::new().unwrap();
        assert!(Validator::validate_directory(temp.path()).is_ok());
        assert!(Validator::validate_directory(Path::new("/nonexistent")).is_err());

        let file = temp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(Validator::validate_directory(&file).is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(Validator::validate_url("https://api.github.com").is_ok());
        assert!(Validator::validate_url("http://ghe.internal/api/v3").is_ok());
        assert!(Validator::validate_url("api.github.com").is_err());
        assert!(Validator::validate_url("ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_repository_name() {
        assert!(Validator::validate_repository_name("billing-api").is_ok());
        assert!(Validator::validate_repository_name(".github").is_ok());
        assert!(Validator::validate_repository_name("").is_err());
        assert!(Validator::validate_repository_name("..").is_err());
        assert!(Validator::validate_repository_name("../etc").is_err());
        assert!(Validator::validate_repository_name("a\\b").is_err());
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(Validator::truncate_text("short", 10), "short");
        assert_eq!(
            Validator::truncate_text("this is a very long text", 10),
            "this is a ..."
        );
        assert_eq!(Validator::truncate_text("ééééé", 2), "éé...");
    }
}
