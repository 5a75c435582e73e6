//! Index-addressable list over the store's list primitives.
//!
//! The store only offers push/pop at the ends, index read/write, range reads
//! and range trim. Interior deletes and inserts are composed from those and
//! take several round trips; they are not atomic as a whole. A concurrent
//! reader can observe the placeholder written by an interior delete, a
//! truncated list during `insert`, or an empty list during `reverse`.
//! Callers needing atomicity must keep a single writer per key.

use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

use bytes::Bytes;
use rds_store::{StoreError, StoreHandle};
use tracing::{debug, warn};

use crate::base::KeyedCollection;
use crate::config::CollectionsConfig;
use crate::error::{CollectionError, CollectionResult};
use crate::keygen;
use crate::traits::{Collection, Sequence};

/// List whose elements live under one key of the remote store.
#[derive(Clone, Debug)]
pub struct RemoteList {
    base: KeyedCollection,
}

impl RemoteList {
    pub fn new(store: Arc<dyn StoreHandle>, key: impl Into<String>) -> CollectionResult<Self> {
        Ok(Self {
            base: KeyedCollection::new(store, key)?,
        })
    }

    pub fn with_config(
        store: Arc<dyn StoreHandle>,
        key: impl Into<String>,
        config: CollectionsConfig,
    ) -> CollectionResult<Self> {
        Ok(Self {
            base: KeyedCollection::with_config(store, key, config)?,
        })
    }

    fn store(&self) -> &dyn StoreHandle {
        &**self.base.store()
    }

    fn raw_snapshot(&self) -> CollectionResult<Vec<Bytes>> {
        Ok(self.store().range_get(self.key(), 0, -1)?)
    }

    fn decode_all(&self, raw: Vec<Bytes>) -> CollectionResult<Vec<String>> {
        raw.iter().map(|v| keygen::decode(self.key(), v)).collect()
    }

    fn push(&self, values: &[Bytes]) -> CollectionResult<()> {
        if !values.is_empty() {
            self.store().push_tail(self.key(), values)?;
        }
        Ok(())
    }

    fn index_error(&self, index: isize, err: StoreError) -> CollectionError {
        match err {
            StoreError::NoSuchKey { .. } | StoreError::IndexOutOfRange { .. } => {
                CollectionError::IndexOutOfRange {
                    key: self.key().to_string(),
                    index,
                }
            }
            other => other.into(),
        }
    }

    /// Push several elements in one primitive call.
    pub fn append_all<V: AsRef<[u8]>>(&self, values: &[V]) -> CollectionResult<()> {
        self.extend(values)
    }

    /// Sub-sequence with an explicit step. Only a step of 1 is supported.
    pub fn slice_by(
        &self,
        range: impl RangeBounds<isize>,
        step: isize,
    ) -> CollectionResult<Vec<String>> {
        if step != 1 {
            return Err(CollectionError::NotImplemented("list slices with a step other than 1"));
        }
        self.slice(range)
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> CollectionResult<String> {
        let raw = self
            .store()
            .pop_tail(self.key())?
            .ok_or_else(|| CollectionError::EmptyCollection {
                key: self.key().to_string(),
            })?;
        keygen::decode(self.key(), &raw)
    }

    /// Position of the first element equal to `value`.
    pub fn index_of(&self, value: impl AsRef<[u8]>) -> CollectionResult<usize> {
        let value = value.as_ref();
        self.raw_snapshot()?
            .iter()
            .position(|v| v[..] == *value)
            .ok_or_else(|| CollectionError::ValueNotFound {
                key: self.key().to_string(),
                value: String::from_utf8_lossy(value).into_owned(),
            })
    }

    /// Whether any element equals `value`. Reads the whole list.
    pub fn contains(&self, value: impl AsRef<[u8]>) -> CollectionResult<bool> {
        let value = value.as_ref();
        Ok(self.raw_snapshot()?.iter().any(|v| v[..] == *value))
    }

    /// Copy into a fresh derived key. Source and copy are independent.
    pub fn copy(&self) -> CollectionResult<RemoteList> {
        self.copy_into(self.base.derived()?)
    }

    /// Copy onto `key`, appending to whatever it already holds.
    pub fn copy_to(&self, key: impl Into<String>) -> CollectionResult<RemoteList> {
        self.copy_into(self.base.sibling(key)?)
    }

    fn copy_into(&self, base: KeyedCollection) -> CollectionResult<RemoteList> {
        let other = RemoteList { base };
        other.push(&self.raw_snapshot()?)?;
        debug!(source = %self.key(), dest = %other.key(), "copied list");
        Ok(other)
    }

    /// Compare the remote contents with a local sequence.
    pub fn eq_values<T: AsRef<str>>(&self, values: &[T]) -> CollectionResult<bool> {
        let current = self.to_vec()?;
        Ok(current.len() == values.len()
            && current.iter().zip(values).all(|(a, b)| a == b.as_ref()))
    }

    /// Local concatenation `self + other`. The remote list is untouched.
    pub fn concat<T: AsRef<str>>(&self, other: &[T]) -> CollectionResult<Vec<String>> {
        let mut out = self.to_vec()?;
        out.extend(other.iter().map(|v| v.as_ref().to_string()));
        Ok(out)
    }

    /// Local repetition `self * n`. The remote list is untouched.
    pub fn repeat(&self, n: usize) -> CollectionResult<Vec<String>> {
        Ok(repeated(&self.to_vec()?, n))
    }

    /// In-place repetition `self *= n`: zero empties the list.
    pub fn repeat_in_place(&self, n: usize) -> CollectionResult<()> {
        match n {
            0 => self.clear(),
            1 => Ok(()),
            _ => {
                let current = self.raw_snapshot()?;
                self.push(&repeated(&current, n - 1))
            }
        }
    }
}

fn repeated<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    (0..n).flat_map(|_| items.iter().cloned()).collect()
}

/// Translate a half-open local range into the store's inclusive bounds.
/// `None` means the range is empty whatever the list length.
fn inclusive_bounds(range: &impl RangeBounds<isize>) -> Option<(isize, isize)> {
    let start = match range.start_bound() {
        Bound::Included(s) => *s,
        Bound::Excluded(s) => s.checked_add(1)?,
        Bound::Unbounded => 0,
    };
    let stop = match range.end_bound() {
        Bound::Included(e) => *e,
        Bound::Excluded(&0) => return None,
        Bound::Excluded(e) => e.checked_sub(1)?,
        Bound::Unbounded => -1,
    };
    Some((start, stop))
}

impl Collection for RemoteList {
    fn base(&self) -> &KeyedCollection {
        &self.base
    }

    fn len(&self) -> CollectionResult<usize> {
        Ok(self.store().list_len(self.key())?)
    }
}

impl Sequence for RemoteList {
    fn append(&self, value: impl AsRef<[u8]>) -> CollectionResult<()> {
        self.push(&[Bytes::copy_from_slice(value.as_ref())])
    }

    fn extend<I>(&self, values: I) -> CollectionResult<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let batch: Vec<Bytes> = values
            .into_iter()
            .map(|v| Bytes::copy_from_slice(v.as_ref()))
            .collect();
        self.push(&batch)
    }

    fn get(&self, index: isize) -> CollectionResult<String> {
        let raw = self
            .store()
            .index_get(self.key(), index)?
            .ok_or_else(|| CollectionError::IndexNotFound {
                key: self.key().to_string(),
                index,
            })?;
        keygen::decode(self.key(), &raw)
    }

    fn slice(&self, range: impl RangeBounds<isize>) -> CollectionResult<Vec<String>> {
        let Some((start, stop)) = inclusive_bounds(&range) else {
            return Ok(Vec::new());
        };
        let raw = self.store().range_get(self.key(), start, stop)?;
        self.decode_all(raw)
    }

    fn set(&self, index: isize, value: impl AsRef<[u8]>) -> CollectionResult<()> {
        self.store()
            .index_set(self.key(), index, Bytes::copy_from_slice(value.as_ref()))
            .map_err(|e| self.index_error(index, e))
    }

    fn delete(&self, index: isize) -> CollectionResult<()> {
        let popped = match index {
            0 => self.store().pop_head(self.key())?,
            -1 => self.store().pop_tail(self.key())?,
            _ => {
                // No interior delete primitive: overwrite the slot with a
                // unique placeholder, then remove that placeholder by value.
                let marker = keygen::sentinel(self.base.config());
                self.set(index, &marker)?;
                let removed = self.store().remove_value(self.key(), 1, marker.as_bytes())?;
                if removed == 0 {
                    warn!(key = %self.key(), index, "delete placeholder vanished before removal");
                }
                debug!(key = %self.key(), index, "interior delete");
                return Ok(());
            }
        };
        popped.map(|_| ()).ok_or_else(|| CollectionError::IndexOutOfRange {
            key: self.key().to_string(),
            index,
        })
    }

    fn remove(&self, value: impl AsRef<[u8]>) -> CollectionResult<()> {
        let value = value.as_ref();
        match self.store().remove_value(self.key(), 1, value)? {
            0 => Err(CollectionError::ValueNotFound {
                key: self.key().to_string(),
                value: String::from_utf8_lossy(value).into_owned(),
            }),
            _ => Ok(()),
        }
    }

    /// Rebuilds the tail of the list: reads everything from `index` on,
    /// trims the list down to the head segment, then pushes the new value
    /// followed by the old tail. O(n) in data moved.
    fn insert(&self, index: isize, value: impl AsRef<[u8]>) -> CollectionResult<()> {
        let len = self.len()? as isize;
        let at = if index < 0 { (len + index).max(0) } else { index.min(len) };
        let value = Bytes::copy_from_slice(value.as_ref());

        if at == len {
            return self.push(&[value]);
        }

        let tail = self.store().range_get(self.key(), at, -1)?;
        if at == 0 {
            self.store().delete_key(self.key())?;
        } else {
            self.store().range_trim(self.key(), 0, at - 1)?;
        }

        let mut rebuilt = Vec::with_capacity(tail.len() + 1);
        rebuilt.push(value);
        rebuilt.extend(tail);
        self.push(&rebuilt)?;
        debug!(key = %self.key(), index = at, moved = rebuilt.len() - 1, "inserted into list");
        Ok(())
    }

    fn count(&self, value: impl AsRef<[u8]>) -> CollectionResult<usize> {
        let value = value.as_ref();
        Ok(self.raw_snapshot()?.iter().filter(|v| v[..] == *value).count())
    }

    fn reverse(&self) -> CollectionResult<()> {
        let mut current = self.raw_snapshot()?;
        current.reverse();
        self.store().delete_key(self.key())?;
        self.push(&current)?;
        debug!(key = %self.key(), len = current.len(), "reversed list");
        Ok(())
    }

    fn to_vec(&self) -> CollectionResult<Vec<String>> {
        let raw = self.raw_snapshot()?;
        self.decode_all(raw)
    }
}
