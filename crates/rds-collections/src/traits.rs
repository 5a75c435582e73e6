//! One interface per collection kind.
//!
//! Every method is a round trip to the store (or several, where the
//! implementation documents it). Values go in as raw bytes and come back
//! decoded as UTF-8 text.

use std::collections::{HashMap, HashSet};
use std::ops::RangeBounds;

use serde_json::Value;

use crate::base::KeyedCollection;
use crate::error::CollectionResult;
use crate::tree::NodeRecord;

/// Behaviour shared by all adapters.
pub trait Collection {
    /// The key binding behind this adapter.
    fn base(&self) -> &KeyedCollection;

    /// Number of elements (fields, nodes) in the remote collection.
    fn len(&self) -> CollectionResult<usize>;

    fn key(&self) -> &str {
        self.base().key()
    }

    fn is_empty(&self) -> CollectionResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Delete the whole remote collection.
    fn clear(&self) -> CollectionResult<()> {
        self.base().clear().map(|_| ())
    }
}

/// Index-addressable, insertion-ordered collection.
pub trait Sequence: Collection {
    /// Push one element to the tail.
    fn append(&self, value: impl AsRef<[u8]>) -> CollectionResult<()>;

    /// Push a batch to the tail in a single primitive call.
    fn extend<I>(&self, values: I) -> CollectionResult<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>;

    /// Element at `index`; negative indices count from the tail.
    fn get(&self, index: isize) -> CollectionResult<String>;

    /// Materialized sub-sequence using half-open local range conventions.
    fn slice(&self, range: impl RangeBounds<isize>) -> CollectionResult<Vec<String>>;

    /// Overwrite the element at `index`.
    fn set(&self, index: isize, value: impl AsRef<[u8]>) -> CollectionResult<()>;

    /// Remove the element at `index`.
    fn delete(&self, index: isize) -> CollectionResult<()>;

    /// Remove the first occurrence of `value`.
    fn remove(&self, value: impl AsRef<[u8]>) -> CollectionResult<()>;

    /// Insert `value` before `index`.
    fn insert(&self, index: isize, value: impl AsRef<[u8]>) -> CollectionResult<()>;

    /// Number of elements equal to `value`.
    fn count(&self, value: impl AsRef<[u8]>) -> CollectionResult<usize>;

    /// Reverse in place.
    fn reverse(&self) -> CollectionResult<()>;

    /// Local snapshot of the whole sequence.
    fn to_vec(&self) -> CollectionResult<Vec<String>>;
}

/// Unordered collection of unique elements with set algebra.
///
/// Algebra methods without a suffix store their result under a fresh derived
/// key; `*_update` variants overwrite the receiver.
pub trait UnorderedSet: Collection + Sized {
    fn contains(&self, value: impl AsRef<[u8]>) -> CollectionResult<bool>;

    /// Add `value`. Returns `true` if it was not already present.
    fn add(&self, value: impl AsRef<[u8]>) -> CollectionResult<bool>;

    /// Remove `value` if present.
    fn discard(&self, value: impl AsRef<[u8]>) -> CollectionResult<()>;

    /// Remove `value`, failing if it is absent.
    fn remove(&self, value: impl AsRef<[u8]>) -> CollectionResult<()>;

    /// Remove and return an arbitrary element.
    fn pop(&self) -> CollectionResult<String>;

    /// Local snapshot of every element.
    fn members(&self) -> CollectionResult<HashSet<String>>;

    fn union(&self, others: &[&Self]) -> CollectionResult<Self>;
    fn intersection(&self, others: &[&Self]) -> CollectionResult<Self>;
    fn difference(&self, others: &[&Self]) -> CollectionResult<Self>;
    fn symmetric_difference(&self, other: &Self) -> CollectionResult<Self>;

    fn update(&self, others: &[&Self]) -> CollectionResult<()>;
    fn intersection_update(&self, others: &[&Self]) -> CollectionResult<()>;
    fn difference_update(&self, others: &[&Self]) -> CollectionResult<()>;
    fn symmetric_difference_update(&self, other: &Self) -> CollectionResult<()>;

    fn is_disjoint(&self, other: &Self) -> CollectionResult<bool>;
    fn is_subset(&self, other: &Self) -> CollectionResult<bool>;
    fn is_superset(&self, other: &Self) -> CollectionResult<bool>;

    /// Same cardinality and same elements.
    fn set_eq(&self, other: &Self) -> CollectionResult<bool>;

    fn is_proper_subset(&self, other: &Self) -> CollectionResult<bool> {
        Ok(self.is_subset(other)? && !self.set_eq(other)?)
    }

    fn is_proper_superset(&self, other: &Self) -> CollectionResult<bool> {
        Ok(self.is_superset(other)? && !self.set_eq(other)?)
    }
}

/// Field → value map.
pub trait Mapping: Collection {
    /// Value of `field`, failing if absent.
    fn get(&self, field: &str) -> CollectionResult<String>;

    /// Value of `field`, or `default` if absent. Store errors still propagate.
    fn get_or(&self, field: &str, default: &str) -> CollectionResult<String>;

    /// Write `field`. Returns `true` if the field was new.
    fn insert(&self, field: &str, value: impl AsRef<[u8]>) -> CollectionResult<bool>;

    /// Delete `field`, failing if absent.
    fn remove(&self, field: &str) -> CollectionResult<()>;

    fn contains_key(&self, field: &str) -> CollectionResult<bool>;
    fn keys(&self) -> CollectionResult<Vec<String>>;
    fn values(&self) -> CollectionResult<Vec<String>>;

    /// Local snapshot of every field and value.
    fn items(&self) -> CollectionResult<HashMap<String, String>>;
}

/// Single-rooted hierarchy over a flat node map.
pub trait Hierarchy: Collection {
    fn root_id(&self) -> &str;

    /// Store `record` under a new id as a child of `parent` (the root when
    /// `None`). Returns the new id.
    fn add_node(&self, record: NodeRecord, parent: Option<&str>) -> CollectionResult<String>;

    /// Overwrite the node named by the record's `id` field.
    fn update_node(&self, record: NodeRecord) -> CollectionResult<()>;

    /// Delete the node named by the record's `id` field.
    fn delete_node(&self, record: &NodeRecord) -> CollectionResult<()>;

    /// Nested view of the whole tree, rooted at [`Hierarchy::root_id`].
    fn get_tree(&self) -> CollectionResult<Value>;
}
