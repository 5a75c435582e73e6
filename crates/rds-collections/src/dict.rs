//! Field → value map and integer counter over the store's hash primitives.
//!
//! Both are near pass-throughs: every method is a single primitive call
//! except `copy`, which reads a snapshot and writes it in one batch.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use rds_store::StoreHandle;
use tracing::debug;

use crate::base::KeyedCollection;
use crate::config::CollectionsConfig;
use crate::error::{CollectionError, CollectionResult};
use crate::keygen;
use crate::traits::{Collection, Mapping};

/// Map whose fields live under one key of the remote store.
#[derive(Clone, Debug)]
pub struct RemoteDict {
    base: KeyedCollection,
}

impl RemoteDict {
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

    fn field_not_found(&self, field: &str) -> CollectionError {
        CollectionError::FieldNotFound {
            key: self.key().to_string(),
            field: field.to_string(),
        }
    }

    /// Write several fields in one batch.
    pub fn insert_many<V: AsRef<[u8]>>(&self, entries: &[(&str, V)]) -> CollectionResult<()> {
        let batch: Vec<(String, Bytes)> = entries
            .iter()
            .map(|(f, v)| (f.to_string(), Bytes::copy_from_slice(v.as_ref())))
            .collect();
        Ok(self.store().hash_set_many(self.key(), &batch)?)
    }

    /// Copy into a fresh derived key.
    pub fn copy(&self) -> CollectionResult<RemoteDict> {
        let other = RemoteDict {
            base: self.base.derived()?,
        };
        let snapshot: Vec<(String, Bytes)> =
            self.store().hash_get_all(self.key())?.into_iter().collect();
        other.store().hash_set_many(other.key(), &snapshot)?;
        debug!(source = %self.key(), dest = %other.key(), fields = snapshot.len(), "copied map");
        Ok(other)
    }
}

impl Collection for RemoteDict {
    fn base(&self) -> &KeyedCollection {
        &self.base
    }

    fn len(&self) -> CollectionResult<usize> {
        Ok(self.store().hash_len(self.key())?)
    }
}

impl Mapping for RemoteDict {
    fn get(&self, field: &str) -> CollectionResult<String> {
        let raw = self
            .store()
            .hash_get(self.key(), field)?
            .ok_or_else(|| self.field_not_found(field))?;
        keygen::decode(self.key(), &raw)
    }

    fn get_or(&self, field: &str, default: &str) -> CollectionResult<String> {
        match self.get(field) {
            Err(CollectionError::FieldNotFound { .. }) => Ok(default.to_string()),
            other => other,
        }
    }

    fn insert(&self, field: &str, value: impl AsRef<[u8]>) -> CollectionResult<bool> {
        Ok(self
            .store()
            .hash_set(self.key(), field, Bytes::copy_from_slice(value.as_ref()))?)
    }

    fn remove(&self, field: &str) -> CollectionResult<()> {
        match self.store().hash_delete(self.key(), &[field])? {
            0 => Err(self.field_not_found(field)),
            _ => Ok(()),
        }
    }

    fn contains_key(&self, field: &str) -> CollectionResult<bool> {
        Ok(self.store().hash_exists(self.key(), field)?)
    }

    fn keys(&self) -> CollectionResult<Vec<String>> {
        Ok(self.store().hash_keys(self.key())?)
    }

    fn values(&self) -> CollectionResult<Vec<String>> {
        self.store()
            .hash_values(self.key())?
            .iter()
            .map(|v| keygen::decode(self.key(), v))
            .collect()
    }

    fn items(&self) -> CollectionResult<HashMap<String, String>> {
        self.store()
            .hash_get_all(self.key())?
            .into_iter()
            .map(|(f, v)| keygen::decode(self.key(), &v).map(|v| (f, v)))
            .collect()
    }
}

/// Integer tally per field. Absent fields count as zero.
#[derive(Clone, Debug)]
pub struct RemoteCounter {
    dict: RemoteDict,
}

impl RemoteCounter {
    pub fn new(store: Arc<dyn StoreHandle>, key: impl Into<String>) -> CollectionResult<Self> {
        Ok(Self {
            dict: RemoteDict::new(store, key)?,
        })
    }

    pub fn with_config(
        store: Arc<dyn StoreHandle>,
        key: impl Into<String>,
        config: CollectionsConfig,
    ) -> CollectionResult<Self> {
        Ok(Self {
            dict: RemoteDict::with_config(store, key, config)?,
        })
    }

    fn parse(&self, field: &str, raw: &str) -> CollectionResult<i64> {
        raw.parse().map_err(|_| CollectionError::Decode {
            key: self.key().to_string(),
            reason: format!("field {field:?} holds non-integer {raw:?}"),
        })
    }

    /// Current count for `field`.
    pub fn get(&self, field: &str) -> CollectionResult<i64> {
        match self.dict.get(field) {
            Ok(raw) => self.parse(field, &raw),
            Err(CollectionError::FieldNotFound { .. }) => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// Add `by` to `field`. Returns the new count.
    pub fn increment(&self, field: &str, by: i64) -> CollectionResult<i64> {
        Ok(self.dict.store().hash_incr_by(self.key(), field, by)?)
    }

    /// Count each occurrence once.
    pub fn update<I>(&self, fields: I) -> CollectionResult<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for field in fields {
            self.increment(field.as_ref(), 1)?;
        }
        Ok(())
    }

    /// Add each given amount to its field.
    pub fn update_counts<I, F>(&self, counts: I) -> CollectionResult<()>
    where
        I: IntoIterator<Item = (F, i64)>,
        F: AsRef<str>,
    {
        for (field, n) in counts {
            self.increment(field.as_ref(), n)?;
        }
        Ok(())
    }

    /// Snapshot of every count.
    pub fn items(&self) -> CollectionResult<HashMap<String, i64>> {
        self.dict
            .items()?
            .into_iter()
            .map(|(field, raw)| self.parse(&field, &raw).map(|n| (field, n)))
            .collect()
    }
}

impl Collection for RemoteCounter {
    fn base(&self) -> &KeyedCollection {
        self.dict.base()
    }

    fn len(&self) -> CollectionResult<usize> {
        self.dict.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rds_store::InMemoryStore;

    fn dict() -> (Arc<InMemoryStore>, RemoteDict) {
        let store = Arc::new(InMemoryStore::new());
        let d = RemoteDict::new(store.clone(), "d").unwrap();
        (store, d)
    }

    #[test]
    fn insert_get_remove() {
        let (_, d) = dict();
        assert!(d.insert("name", "ada").unwrap());
        assert!(!d.insert("name", "grace").unwrap());
        assert_eq!(d.get("name").unwrap(), "grace");
        assert!(d.contains_key("name").unwrap());
        d.remove("name").unwrap();
        assert!(matches!(
            d.get("name"),
            Err(CollectionError::FieldNotFound { .. })
        ));
        assert!(matches!(
            d.remove("name"),
            Err(CollectionError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn get_or_only_defaults_on_absence() {
        let (store, d) = dict();
        assert_eq!(d.get_or("missing", "fallback").unwrap(), "fallback");

        store.push_tail("l", &[Bytes::from_static(b"x")]).unwrap();
        let wrong = RemoteDict::new(store, "l").unwrap();
        assert!(wrong.get_or("f", "fallback").is_err());
    }

    #[test]
    fn keys_values_items() {
        let (_, d) = dict();
        d.insert_many(&[("a", "1"), ("b", "2")]).unwrap();
        let mut keys = d.keys().unwrap();
        keys.sort();
        assert_eq!(keys, ["a", "b"]);
        let mut values = d.values().unwrap();
        values.sort();
        assert_eq!(values, ["1", "2"]);
        let items = d.items().unwrap();
        assert_eq!(items.get("b").map(String::as_str), Some("2"));
        assert_eq!(d.len().unwrap(), 2);
    }

    #[test]
    fn copy_is_independent() {
        let (_, d) = dict();
        d.insert("k", "v").unwrap();
        let c = d.copy().unwrap();
        assert_ne!(c.key(), d.key());
        c.insert("k", "changed").unwrap();
        assert_eq!(d.get("k").unwrap(), "v");
    }

    #[test]
    fn copy_of_empty_map_stays_empty() {
        let (_, d) = dict();
        let c = d.copy().unwrap();
        assert!(c.is_empty().unwrap());
    }

    #[test]
    fn clear_removes_key() {
        let (store, d) = dict();
        d.insert("k", "v").unwrap();
        d.clear().unwrap();
        assert!(!store.key_exists("d").unwrap());
    }

    #[test]
    fn counter_counts() {
        let store = Arc::new(InMemoryStore::new());
        let c = RemoteCounter::new(store, "words").unwrap();
        assert_eq!(c.get("the").unwrap(), 0);
        c.update(["the", "cat", "the"]).unwrap();
        assert_eq!(c.get("the").unwrap(), 2);
        assert_eq!(c.increment("cat", 4).unwrap(), 5);
        c.update_counts([("dog", 3), ("the", -1)]).unwrap();

        let items = c.items().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items["the"], 1);
        assert_eq!(items["dog"], 3);
        assert_eq!(c.len().unwrap(), 3);
    }

    #[test]
    fn counter_rejects_non_integer_fields() {
        let store = Arc::new(InMemoryStore::new());
        let d = RemoteDict::new(store.clone(), "c").unwrap();
        d.insert("bad", "many").unwrap();
        let c = RemoteCounter::new(store, "c").unwrap();
        assert!(matches!(c.get("bad"), Err(CollectionError::Decode { .. })));
        assert!(c.increment("bad", 1).is_err());
        assert!(c.items().is_err());
    }
}
