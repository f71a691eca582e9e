//! Database initialization and persisted models

pub mod init;
pub mod models;

pub use init::*;
pub use models::*;

use crate::{Error, Result};

/// Validate a table or column name before it is spliced into SQL
///
/// Only ASCII alphanumerics and underscore are accepted.
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() < 100
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Return the identifier unchanged, or `Error::InvalidInput` if it is unsafe
pub fn checked_identifier(name: &str) -> Result<&str> {
    if is_valid_identifier(name) {
        Ok(name)
    } else {
        Err(Error::InvalidInput(format!("Invalid identifier: {:?}", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("pages"));
        assert!(is_valid_identifier("tx_csseo_domain_model_meta"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("pages; DROP TABLE pages"));
        assert!(!is_valid_identifier("pages-x"));
        assert!(!is_valid_identifier(&"a".repeat(100)));
    }

    #[test]
    fn test_checked_identifier_error() {
        assert!(matches!(checked_identifier("a b"), Err(Error::InvalidInput(_))));
        assert_eq!(checked_identifier("uid").unwrap(), "uid");
    }
}
