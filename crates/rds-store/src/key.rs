//! Key validation.
//!
//! A valid key:
//! - Must be non-empty
//! - Must be at most [`MAX_KEY_LEN`] bytes
//! - Must consist only of printable ASCII: letters, digits and punctuation
//!   (no whitespace, no control characters)

use crate::error::{StoreError, StoreResult};

/// Upper bound on key length in bytes.
pub const MAX_KEY_LEN: usize = 512;

/// Validate a key, returning `Ok(())` if it is well formed.
///
/// # Examples
///
/// ```
/// use rds_store::validate_key;
///
/// assert!(validate_key("users").is_ok());
/// assert!(validate_key("tree:org-chart").is_ok());
/// assert!(validate_key("").is_err());
/// assert!(validate_key("has space").is_err());
/// ```
pub fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(invalid(key, "key must not be empty"));
    }

    if key.len() > MAX_KEY_LEN {
        return Err(invalid(
            key,
            format!("key is {} bytes, limit is {MAX_KEY_LEN}", key.len()),
        ));
    }

    if let Some(ch) = key.chars().find(|c| !c.is_ascii_graphic()) {
        return Err(invalid(key, format!("contains forbidden character: {ch:?}")));
    }

    Ok(())
}

fn invalid(key: &str, reason: impl Into<String>) -> StoreError {
    StoreError::InvalidKey {
        key: key.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_keys() {
        for key in ["a", "users", "tree:abc", "list_1", "x.y/z", "3f2a9c"] {
            assert!(validate_key(key).is_ok(), "{key} should be valid");
        }
    }

    #[test]
    fn empty_key_rejected() {
        let err = validate_key("").unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn whitespace_rejected() {
        assert!(validate_key("a b").is_err());
        assert!(validate_key("tab\there").is_err());
        assert!(validate_key("line\n").is_err());
    }

    #[test]
    fn non_ascii_rejected() {
        assert!(validate_key("café").is_err());
    }

    #[test]
    fn length_limit() {
        let at_limit = "k".repeat(MAX_KEY_LEN);
        assert!(validate_key(&at_limit).is_ok());
        let over = "k".repeat(MAX_KEY_LEN + 1);
        assert!(matches!(
            validate_key(&over),
            Err(StoreError::InvalidKey { .. })
        ));
    }
}
