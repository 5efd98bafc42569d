//! Error code catalog and lookup.
//!
//! Maps codes like "T-1-1" to their subsystem, title and default message.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata for an error code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorCodeInfo {
    /// Subsystem name ("bibliography", "assembly", "config", "internal")
    pub subsystem: String,

    pub title: String,

    pub message_template: String,

    /// When this code was introduced (version)
    pub since_version: String,
}

/// Global error catalog, embedded with `include_str!()` and parsed on first use.
///
/// # Panics
///
/// Panics if the embedded JSON is invalid, which only happens when
/// `error_catalog.json` is edited by hand incorrectly.
pub static ERROR_CATALOG: Lazy<HashMap<String, ErrorCodeInfo>> = Lazy::new(|| {
    let json_data = include_str!("../error_catalog.json");
    serde_json::from_str(json_data).expect("Invalid error catalog JSON")
});

/// Look up error code information.
pub fn get_error_info(code: &str) -> Option<&'static ErrorCodeInfo> {
    ERROR_CATALOG.get(code)
}

/// Get the subsystem name for an error code.
///
/// ```
/// use thesis_error_reporting::catalog::get_subsystem;
///
/// assert_eq!(get_subsystem("T-1-1"), Some("bibliography"));
/// ```
pub fn get_subsystem(code: &str) -> Option<&'static str> {
    get_error_info(code).map(|info| info.subsystem.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_emitted_code_is_cataloged() {
        let expected = [
            ("T-0-1", "internal"),
            ("T-1-1", "bibliography"),
            ("T-1-3", "bibliography"),
            ("T-1-5", "bibliography"),
            ("T-2-1", "assembly"),
            ("T-2-4", "assembly"),
            ("T-3-1", "config"),
        ];
        for (code, subsystem) in expected {
            assert_eq!(get_subsystem(code), Some(subsystem), "code {}", code);
        }
        assert_eq!(get_error_info("T-1-3").unwrap().title, "Conflicting Duplicate Key");
    }

    #[test]
    fn test_codes_are_well_formed() {
        for (code, info) in ERROR_CATALOG.iter() {
            let parts: Vec<&str> = code.split('-').collect();
            assert_eq!(parts.len(), 3, "bad code {}", code);
            assert_eq!(parts[0], "T");
            assert!(parts[1].parse::<u32>().is_ok());
            assert!(parts[2].parse::<u32>().is_ok());
            assert!(!info.title.is_empty());
        }
    }

    #[test]
    fn test_nonexistent_code() {
        assert!(get_error_info("T-999-999").is_none());
        assert_eq!(get_subsystem("T-999-999"), None);
    }
}
