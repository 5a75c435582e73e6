//! Unique-element set over the store's set primitives.
//!
//! Algebra operations run on the store through its combine primitives.
//! Each non-mutating operation writes its result under a freshly generated
//! derived key and returns a [`RemoteSet`] bound to it; that key is an
//! ordinary collection whose lifetime belongs to the caller.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use rds_store::{SetOp, StoreHandle};
use tracing::{debug, warn};

use crate::base::KeyedCollection;
use crate::config::CollectionsConfig;
use crate::error::{CollectionError, CollectionResult};
use crate::keygen;
use crate::traits::{Collection, UnorderedSet};

/// Set whose members live under one key of the remote store.
#[derive(Clone, Debug)]
pub struct RemoteSet {
    base: KeyedCollection,
}

impl RemoteSet {
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

    fn raw_members(&self) -> CollectionResult<HashSet<Bytes>> {
        Ok(self.store().set_members(self.key())?)
    }

    /// Copy into a fresh derived key.
    pub fn copy(&self) -> CollectionResult<RemoteSet> {
        self.combine_into_new(SetOp::Union, &[])
    }

    /// Operands bound to another store cannot take part in a combine.
    /// Checked before any remote call.
    fn check_operands(&self, others: &[&RemoteSet]) -> CollectionResult<()> {
        match others.iter().find(|o| !self.base.same_store(&o.base)) {
            Some(foreign) => Err(CollectionError::InvalidArgument(format!(
                "set {} is bound to a different store than {}",
                foreign.key(),
                self.key()
            ))),
            None => Ok(()),
        }
    }

    fn sources<'a>(&'a self, others: &[&'a RemoteSet]) -> Vec<&'a str> {
        std::iter::once(self.key())
            .chain(others.iter().map(|o| Collection::key(*o)))
            .collect()
    }

    fn combine_into_new(&self, op: SetOp, others: &[&RemoteSet]) -> CollectionResult<RemoteSet> {
        self.check_operands(others)?;
        let result = RemoteSet {
            base: self.base.derived()?,
        };
        let card = self
            .store()
            .combine_store(op, result.key(), &self.sources(others))?;
        debug!(%op, source = %self.key(), dest = %result.key(), card, "stored set combination");
        Ok(result)
    }

    fn combine_in_place(&self, op: SetOp, others: &[&RemoteSet]) -> CollectionResult<()> {
        self.check_operands(others)?;
        let card = self
            .store()
            .combine_store(op, self.key(), &self.sources(others))?;
        debug!(%op, key = %self.key(), card, "combined set in place");
        Ok(())
    }

    /// Delete a key private to an operation that is already failing.
    /// Failure is logged so the caller's own error is the one returned.
    fn discard_scratch(&self) {
        if let Err(e) = self.base.clear() {
            warn!(key = %self.key(), error = %e, "failed to delete scratch set");
        }
    }

    /// Intersection of `self` and `other`, computed without storing it.
    fn inline_intersection(&self, other: &RemoteSet) -> CollectionResult<HashSet<Bytes>> {
        self.check_operands(&[other])?;
        Ok(self
            .store()
            .combine(SetOp::Intersection, &[self.key(), other.key()])?)
    }
}

impl Collection for RemoteSet {
    fn base(&self) -> &KeyedCollection {
        &self.base
    }

    fn len(&self) -> CollectionResult<usize> {
        Ok(self.store().set_card(self.key())?)
    }
}

impl UnorderedSet for RemoteSet {
    fn contains(&self, value: impl AsRef<[u8]>) -> CollectionResult<bool> {
        Ok(self.store().set_contains(self.key(), value.as_ref())?)
    }

    fn add(&self, value: impl AsRef<[u8]>) -> CollectionResult<bool> {
        let added = self
            .store()
            .set_add(self.key(), &[Bytes::copy_from_slice(value.as_ref())])?;
        Ok(added > 0)
    }

    fn discard(&self, value: impl AsRef<[u8]>) -> CollectionResult<()> {
        self.store()
            .set_remove(self.key(), &[Bytes::copy_from_slice(value.as_ref())])?;
        Ok(())
    }

    fn remove(&self, value: impl AsRef<[u8]>) -> CollectionResult<()> {
        let value = value.as_ref();
        match self
            .store()
            .set_remove(self.key(), &[Bytes::copy_from_slice(value)])?
        {
            0 => Err(CollectionError::ValueNotFound {
                key: self.key().to_string(),
                value: String::from_utf8_lossy(value).into_owned(),
            }),
            _ => Ok(()),
        }
    }

    fn pop(&self) -> CollectionResult<String> {
        let raw = self
            .store()
            .set_pop(self.key())?
            .ok_or_else(|| CollectionError::EmptyCollection {
                key: self.key().to_string(),
            })?;
        keygen::decode(self.key(), &raw)
    }

    fn members(&self) -> CollectionResult<HashSet<String>> {
        self.raw_members()?
            .iter()
            .map(|m| keygen::decode(self.key(), m))
            .collect()
    }

    fn union(&self, others: &[&Self]) -> CollectionResult<Self> {
        self.combine_into_new(SetOp::Union, others)
    }

    fn intersection(&self, others: &[&Self]) -> CollectionResult<Self> {
        self.combine_into_new(SetOp::Intersection, others)
    }

    fn difference(&self, others: &[&Self]) -> CollectionResult<Self> {
        self.combine_into_new(SetOp::Difference, others)
    }

    /// `(self ∪ other) − (self ∩ other)`. Three combine calls; the two
    /// intermediate keys are deleted before returning, on success or error.
    fn symmetric_difference(&self, other: &Self) -> CollectionResult<Self> {
        let union = self.union(&[other])?;
        let common = match self.intersection(&[other]) {
            Ok(common) => common,
            Err(e) => {
                union.discard_scratch();
                return Err(e);
            }
        };
        let result = union.difference(&[&common]);
        let cleanup = union.base.clear().and(common.base.clear());
        match (result, cleanup) {
            (Ok(result), Ok(_)) => Ok(result),
            (Ok(result), Err(e)) => {
                result.discard_scratch();
                Err(e)
            }
            (Err(e), cleanup) => {
                if let Err(c) = cleanup {
                    warn!(key = %self.key(), error = %c, "failed to delete intermediate sets");
                }
                Err(e)
            }
        }
    }

    fn update(&self, others: &[&Self]) -> CollectionResult<()> {
        self.combine_in_place(SetOp::Union, others)
    }

    fn intersection_update(&self, others: &[&Self]) -> CollectionResult<()> {
        self.combine_in_place(SetOp::Intersection, others)
    }

    fn difference_update(&self, others: &[&Self]) -> CollectionResult<()> {
        self.combine_in_place(SetOp::Difference, others)
    }

    /// Computes the symmetric difference under a derived key, then replaces
    /// the receiver with it in one combine call.
    fn symmetric_difference_update(&self, other: &Self) -> CollectionResult<()> {
        let result = self.symmetric_difference(other)?;
        let replaced = self
            .store()
            .combine_store(SetOp::Union, self.key(), &[result.key()]);
        let cleared = result.base.clear();
        replaced?;
        cleared?;
        Ok(())
    }

    fn is_disjoint(&self, other: &Self) -> CollectionResult<bool> {
        Ok(self.inline_intersection(other)?.is_empty())
    }

    fn is_subset(&self, other: &Self) -> CollectionResult<bool> {
        let common = self.inline_intersection(other)?;
        Ok(common == self.raw_members()?)
    }

    fn is_superset(&self, other: &Self) -> CollectionResult<bool> {
        let common = self.inline_intersection(other)?;
        Ok(common == other.raw_members()?)
    }

    fn set_eq(&self, other: &Self) -> CollectionResult<bool> {
        if self.len()? != other.len()? {
            return Ok(false);
        }
        Ok(self.raw_members()? == other.raw_members()?)
    }
}
