//! Environment value parsing shared by Edge Gate configuration loaders.
//!
//! Services load their configuration from a `HashMap<String, String>` of
//! environment variables (see `Config::from_vars`). These helpers keep the
//! parsing rules for booleans, lists and bounded integers identical across
//! crates.

use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Error produced when an environment value cannot be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvValueError {
    #[error("{name} must be a boolean (true/false/1/0/yes/no), got '{value}'")]
    InvalidBool { name: String, value: String },

    #[error("{name} must be a valid integer, got '{value}'")]
    InvalidInteger { name: String, value: String },
}

/// Read a string value, falling back to `default` when unset.
#[must_use]
pub fn string_or(vars: &HashMap<String, String>, name: &str, default: &str) -> String {
    vars.get(name)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// Read a boolean value, falling back to `default` when unset.
///
/// # Errors
///
/// Returns `EnvValueError::InvalidBool` for unrecognized values.
pub fn bool_or(
    vars: &HashMap<String, String>,
    name: &str,
    default: bool,
) -> Result<bool, EnvValueError> {
    let Some(raw) = vars.get(name) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(EnvValueError::InvalidBool {
            name: name.to_string(),
            value: raw.clone(),
        }),
    }
}

/// Read an integer value, falling back to `default` when unset.
///
/// # Errors
///
/// Returns `EnvValueError::InvalidInteger` when the value does not parse.
pub fn int_or<T: FromStr>(
    vars: &HashMap<String, String>,
    name: &str,
    default: T,
) -> Result<T, EnvValueError> {
    let Some(raw) = vars.get(name) else {
        return Ok(default);
    };

    raw.trim()
        .parse::<T>()
        .map_err(|_| EnvValueError::InvalidInteger {
            name: name.to_string(),
            value: raw.clone(),
        })
}

/// Read a comma-separated list, falling back to `default` when unset.
///
/// Entries are trimmed. Empty entries are kept so callers decide whether an
/// empty rule is meaningful.
#[must_use]
pub fn list_or(vars: &HashMap<String, String>, name: &str, default: &[&str]) -> Vec<String> {
    match vars.get(name) {
        Some(raw) if raw.is_empty() => Vec::new(),
        Some(raw) => raw.split(',').map(|s| s.trim().to_string()).collect(),
        None => default.iter().map(ToString::to_string).collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_bool_or_default_when_unset() {
        assert!(bool_or(&HashMap::new(), "FLAG", true).unwrap());
        assert!(!bool_or(&HashMap::new(), "FLAG", false).unwrap());
    }

    #[test]
    fn test_bool_or_accepts_common_spellings() {
        for value in ["true", "TRUE", "1", "yes", " True "] {
            assert!(bool_or(&vars(&[("FLAG", value)]), "FLAG", false).unwrap());
        }
        for value in ["false", "False", "0", "no"] {
            assert!(!bool_or(&vars(&[("FLAG", value)]), "FLAG", true).unwrap());
        }
    }

    #[test]
    fn test_bool_or_rejects_garbage() {
        let result = bool_or(&vars(&[("FLAG", "maybe")]), "FLAG", false);
        assert!(
            matches!(result, Err(EnvValueError::InvalidBool { name, value }) if name == "FLAG" && value == "maybe")
        );
    }

    #[test]
    fn test_int_or_parses_and_rejects() {
        assert_eq!(int_or(&vars(&[("N", "307")]), "N", 0u16).unwrap(), 307);
        assert_eq!(int_or(&HashMap::new(), "N", 8125u16).unwrap(), 8125);
        assert!(matches!(
            int_or(&vars(&[("N", "seven")]), "N", 0u16),
            Err(EnvValueError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn test_list_or_splits_and_trims() {
        let list = list_or(&vars(&[("L", "/a, /b ,/c")]), "L", &[]);
        assert_eq!(list, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_list_or_keeps_empty_entries() {
        let list = list_or(&vars(&[("L", ",/a")]), "L", &[]);
        assert_eq!(list, vec!["", "/a"]);
    }

    #[test]
    fn test_list_or_empty_value_is_empty_list() {
        assert!(list_or(&vars(&[("L", "")]), "L", &["/default"]).is_empty());
    }

    #[test]
    fn test_list_or_default_when_unset() {
        assert_eq!(list_or(&HashMap::new(), "L", &["/x"]), vec!["/x"]);
    }
}
