use std::collections::{HashMap, HashSet};
use std::fmt;

use bytes::Bytes;

use crate::error::StoreResult;

/// Set combination performed by [`StoreHandle::combine`] and
/// [`StoreHandle::combine_store`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SetOp {
    /// Members present in any source.
    Union,
    /// Members present in every source.
    Intersection,
    /// Members of the first source absent from all the others.
    Difference,
}

impl fmt::Display for SetOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SetOp::Union => "union",
            SetOp::Intersection => "intersection",
            SetOp::Difference => "difference",
        };
        f.write_str(name)
    }
}

/// Connected client to a key-addressed remote store.
///
/// Each method is one primitive round trip and is expected to be atomic with
/// respect to other primitives on the same key. Nothing above this trait
/// adds atomicity across calls.
///
/// All implementations must satisfy these invariants:
/// - A key holds at most one shape (list, set or hash). Using a key with a
///   primitive of another shape fails with `WrongType`.
/// - A collection that becomes empty ceases to exist.
/// - List indices are signed; negative values count from the tail.
/// - Transport failures are propagated, never retried or swallowed.
pub trait StoreHandle: Send + Sync {
    // ---- lists ----

    /// Append values to the tail. Returns the new length.
    fn push_tail(&self, key: &str, values: &[Bytes]) -> StoreResult<usize>;

    /// Remove and return the first element.
    fn pop_head(&self, key: &str) -> StoreResult<Option<Bytes>>;

    /// Remove and return the last element.
    fn pop_tail(&self, key: &str) -> StoreResult<Option<Bytes>>;

    /// Read the element at `index`, or `None` when out of range.
    fn index_get(&self, key: &str, index: isize) -> StoreResult<Option<Bytes>>;

    /// Overwrite the element at `index`.
    ///
    /// Fails with `NoSuchKey` when the list is missing and
    /// `IndexOutOfRange` when the index is outside it.
    fn index_set(&self, key: &str, index: isize, value: Bytes) -> StoreResult<()>;

    /// Inclusive sub-range read. Bounds clamp to the list.
    fn range_get(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<Bytes>>;

    /// Truncate the list to the inclusive sub-range. An empty range removes
    /// the list.
    fn range_trim(&self, key: &str, start: isize, stop: isize) -> StoreResult<()>;

    /// Remove up to `count` occurrences of `value`: from the head when
    /// positive, from the tail when negative, all of them when zero.
    /// Returns how many were removed.
    fn remove_value(&self, key: &str, count: isize, value: &[u8]) -> StoreResult<usize>;

    /// Number of elements in the list (0 if missing).
    fn list_len(&self, key: &str) -> StoreResult<usize>;

    // ---- sets ----

    /// Add members. Returns how many were newly added.
    fn set_add(&self, key: &str, members: &[Bytes]) -> StoreResult<usize>;

    /// Remove members. Returns how many were present.
    fn set_remove(&self, key: &str, members: &[Bytes]) -> StoreResult<usize>;

    /// Membership test.
    fn set_contains(&self, key: &str, member: &[u8]) -> StoreResult<bool>;

    /// Number of members (0 if missing).
    fn set_card(&self, key: &str) -> StoreResult<usize>;

    /// All members, in no particular order.
    fn set_members(&self, key: &str) -> StoreResult<HashSet<Bytes>>;

    /// Remove and return an arbitrary member.
    fn set_pop(&self, key: &str) -> StoreResult<Option<Bytes>>;

    /// Compute `op` over `sources` and store the result at `dest`,
    /// replacing whatever `dest` held. `dest` may be one of the sources.
    /// Returns the cardinality of the result.
    fn combine_store(&self, op: SetOp, dest: &str, sources: &[&str]) -> StoreResult<usize>;

    /// Compute `op` over `sources` without storing it.
    fn combine(&self, op: SetOp, sources: &[&str]) -> StoreResult<HashSet<Bytes>>;

    // ---- hashes ----

    /// Read one field.
    fn hash_get(&self, key: &str, field: &str) -> StoreResult<Option<Bytes>>;

    /// Write one field. Returns `true` if the field was newly created.
    fn hash_set(&self, key: &str, field: &str, value: Bytes) -> StoreResult<bool>;

    /// Delete fields. Returns how many existed.
    fn hash_delete(&self, key: &str, fields: &[&str]) -> StoreResult<usize>;

    /// Number of fields (0 if missing).
    fn hash_len(&self, key: &str) -> StoreResult<usize>;

    /// All field names.
    fn hash_keys(&self, key: &str) -> StoreResult<Vec<String>>;

    /// All field values.
    fn hash_values(&self, key: &str) -> StoreResult<Vec<Bytes>>;

    /// Every field and value in one read.
    fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, Bytes>>;

    /// Field existence test.
    fn hash_exists(&self, key: &str, field: &str) -> StoreResult<bool>;

    /// Add `delta` to an integer field (missing fields count as 0).
    /// Returns the new value.
    fn hash_incr_by(&self, key: &str, field: &str, delta: i64) -> StoreResult<i64>;

    // ---- keys ----

    /// Remove a whole collection. Returns `true` if the key existed.
    fn delete_key(&self, key: &str) -> StoreResult<bool>;

    /// Key existence test.
    fn key_exists(&self, key: &str) -> StoreResult<bool>;

    /// Write several fields. Default implementation issues one `hash_set`
    /// per field; backends may override with a single round trip.
    fn hash_set_many(&self, key: &str, entries: &[(String, Bytes)]) -> StoreResult<()> {
        for (field, value) in entries {
            self.hash_set(key, field, value.clone())?;
        }
        Ok(())
    }
}
