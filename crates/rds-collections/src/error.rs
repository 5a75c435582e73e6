//! Error types for collection operations.

use rds_store::StoreError;
use thiserror::Error;

/// Errors that can occur while operating on a remote collection.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// The key is not a well-formed identifier.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// Reading a list position returned nothing.
    #[error("{key}: no element at index {index}")]
    IndexNotFound { key: String, index: isize },

    /// The store rejected a list position as out of bounds.
    #[error("{key}: index {index} out of range")]
    IndexOutOfRange { key: String, index: isize },

    /// A value expected in the collection is absent.
    #[error("{key}: value {value:?} not present")]
    ValueNotFound { key: String, value: String },

    /// A map field is absent.
    #[error("{key}: field {field:?} not present")]
    FieldNotFound { key: String, field: String },

    /// A tree node id is absent from the flat node map.
    #[error("{key}: node {id} not found")]
    NodeNotFound { key: String, id: String },

    /// The parent passed to `add_node` is not a node of this tree.
    #[error("{key}: invalid parent {parent}")]
    InvalidParent { key: String, parent: String },

    /// The collection has no element to hand out.
    #[error("{key}: collection is empty")]
    EmptyCollection { key: String },

    /// A caller-supplied argument cannot be used.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested form of the operation is not supported.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// The flat node map does not describe a single-rooted tree. Never
    /// repaired automatically.
    #[error("malformed tree {key}: {reason}")]
    MalformedTree { key: String, reason: String },

    /// A stored payload could not be decoded.
    #[error("{key}: undecodable payload: {reason}")]
    Decode { key: String, reason: String },

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// The store failed to serve a primitive.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience type alias for collection operations.
pub type CollectionResult<T> = std::result::Result<T, CollectionError>;
