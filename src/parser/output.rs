// file: src/parser/output.rs
// description: two-stage json recovery for composer's outdated report
// reference: https://docs.rs/serde_json, https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

lazy_static! {
    // Everything before the first opening brace: banners, deprecation notices, warnings.
    static ref LEADING_NOISE: Regex = Regex::new(r"^[^{]*").expect("LEADING_NOISE regex is valid");
}

/// Outcome of reading the captured stdout of `composer outdated -f json`.
#[derive(Debug, Clone, PartialEq)]
pub enum Recovery {
    Parsed { value: Value, repaired: bool },
    Unrecoverable(String),
}

impl Recovery {
    pub fn recovery_applied(&self) -> bool {
        match self {
            Recovery::Parsed { repaired, .. } => *repaired,
            Recovery::Unrecoverable(_) => true,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Recovery::Parsed { value, .. } => Some(value),
            Recovery::Unrecoverable(_) => None,
        }
    }

    /// `(value, recovery_applied)`; the value is `None` when the text could not be parsed.
    pub fn into_parts(self) -> (Option<Value>, bool) {
        match self {
            Recovery::Parsed { value, repaired } => (Some(value), repaired),
            Recovery::Unrecoverable(_) => (None, true),
        }
    }
}

/// Strict parse first; on failure (or a bare `null`) strip everything before the
/// first `{` and parse again. Trailing junk and truncated documents are not handled.
pub fn recover(raw: &str) -> Recovery {
    if let Some(value) = parse_non_null(raw) {
        return Recovery::Parsed {
            value,
            repaired: false,
        };
    }

    let stripped = LEADING_NOISE.replace(raw, "");
    debug!(
        "Strict parse failed, retrying without {} leading bytes",
        raw.len() - stripped.len()
    );

    match parse_non_null(&stripped) {
        Some(value) => Recovery::Parsed {
            value,
            repaired: true,
        },
        None => Recovery::Unrecoverable(raw.to_string()),
    }
}

fn parse_non_null(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Null) | Err(_) => None,
        Ok(value) => Some(value),
    }
}

/// Number of entries in the `installed` list of a composer outdated report.
pub fn outdated_packages(report: &Value) -> Option<usize> {
    report
        .get("installed")
        .and_then(Value::as_array)
        .map(Vec::len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_clean_json_is_not_repaired() {
        let recovery = recover(r#"{"a":1}"#);
        assert_eq!(
            recovery,
            Recovery::Parsed {
                value: json!({"a": 1}),
                repaired: false
            }
        );
        assert!(!recovery.recovery_applied());
    }

    #[test]
    fn test_leading_warning_is_stripped() {
        let recovery = recover("Warning: deprecated flag\n{\"a\":1}");
        assert_eq!(recovery.value(), Some(&json!({"a": 1})));
        assert!(recovery.recovery_applied());
    }

    #[test]
    fn test_garbage_is_unrecoverable_and_preserved() {
        let recovery = recover("not json at all");
        assert_eq!(
            recovery,
            Recovery::Unrecoverable("not json at all".to_string())
        );
        assert_eq!(recovery.into_parts(), (None, true));
    }

    #[test]
    fn test_literal_null_goes_to_second_attempt() {
        let recovery = recover("null");
        assert!(matches!(recovery, Recovery::Unrecoverable(ref raw) if raw == "null"));
    }

    #[test]
    fn test_multiline_banner_before_report() {
        let raw = "Deprecation Notice: something in vendor/foo.php:12\n\
                   Deprecation Notice: another thing\n\
                   {\"installed\":[{\"name\":\"monolog/monolog\",\"version\":\"1.25.0\",\"latest\":\"2.9.1\"}]}";

        let (value, repaired) = recover(raw).into_parts();
        let value = value.unwrap();

        assert!(repaired);
        assert_eq!(outdated_packages(&value), Some(1));
        assert_eq!(value["installed"][0]["name"], "monolog/monolog");
    }

    #[test]
    fn test_trailing_junk_is_not_handled() {
        let recovery = recover("{\"a\":1}\nDone.");
        assert!(matches!(recovery, Recovery::Unrecoverable(_)));
    }

    #[test]
    fn test_empty_output_is_unrecoverable() {
        assert_eq!(recover("").into_parts(), (None, true));
    }

    #[test]
    fn test_outdated_packages_without_installed_key() {
        assert_eq!(outdated_packages(&json!({"other": []})), None);
        assert_eq!(outdated_packages(&json!({"installed": []})), Some(0));
    }
}
