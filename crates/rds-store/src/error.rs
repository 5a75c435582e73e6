/// Errors from primitive store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key holds a value of a different shape than the operation expects.
    #[error("WRONGTYPE key {key} does not hold a {expected}")]
    WrongType { key: String, expected: &'static str },

    /// An index write targeted a list that does not exist.
    #[error("no such key: {key}")]
    NoSuchKey { key: String },

    /// An index write targeted a position outside the list.
    #[error("index {index} out of range for {key}")]
    IndexOutOfRange { key: String, index: isize },

    /// A counter increment hit a field whose value is not an integer.
    #[error("hash value at {key}.{field} is not an integer")]
    NotAnInteger { key: String, field: String },

    /// A counter increment would overflow a 64-bit integer.
    #[error("increment of {key}.{field} would overflow")]
    Overflow { key: String, field: String },

    /// The key is not a well-formed identifier.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// The store could not be reached or its backend failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
