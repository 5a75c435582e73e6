use std::fmt;
use std::sync::Arc;

use rds_store::{validate_key, StoreError, StoreHandle};

use crate::config::CollectionsConfig;
use crate::error::{CollectionError, CollectionResult};
use crate::keygen;

/// Binding of one adapter to exactly one key on a shared store handle.
///
/// The handle is shared, never owned: cloning a `KeyedCollection` aliases
/// the same remote collection.
#[derive(Clone)]
pub struct KeyedCollection {
    store: Arc<dyn StoreHandle>,
    key: String,
    config: CollectionsConfig,
}

impl KeyedCollection {
    /// Bind to `key` with the default configuration.
    pub fn new(store: Arc<dyn StoreHandle>, key: impl Into<String>) -> CollectionResult<Self> {
        Self::with_config(store, key, CollectionsConfig::default())
    }

    /// Bind to `key`, validating it first.
    pub fn with_config(
        store: Arc<dyn StoreHandle>,
        key: impl Into<String>,
        config: CollectionsConfig,
    ) -> CollectionResult<Self> {
        let key = key.into();
        validate_key(&key).map_err(|e| match e {
            StoreError::InvalidKey { key, reason } => CollectionError::InvalidKey { key, reason },
            other => other.into(),
        })?;
        Ok(Self { store, key, config })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &Arc<dyn StoreHandle> {
        &self.store
    }

    pub fn config(&self) -> &CollectionsConfig {
        &self.config
    }

    /// Whether the remote collection currently exists.
    pub fn exists(&self) -> CollectionResult<bool> {
        Ok(self.store.key_exists(&self.key)?)
    }

    /// Delete the remote collection. Returns `true` if it existed.
    pub fn clear(&self) -> CollectionResult<bool> {
        Ok(self.store.delete_key(&self.key)?)
    }

    /// Whether `other` talks to the same store handle.
    pub fn same_store(&self, other: &KeyedCollection) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.store), Arc::as_ptr(&other.store))
    }

    /// Another binding on the same store and configuration.
    pub fn sibling(&self, key: impl Into<String>) -> CollectionResult<Self> {
        Self::with_config(Arc::clone(&self.store), key, self.config.clone())
    }

    /// A binding to a freshly generated derived key.
    pub fn derived(&self) -> CollectionResult<Self> {
        self.sibling(keygen::derived_key(&self.config))
    }
}

impl fmt::Debug for KeyedCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedCollection")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rds_store::InMemoryStore;

    fn store() -> Arc<dyn StoreHandle> {
        Arc::new(InMemoryStore::new())
    }

    #[test]
    fn rejects_empty_key() {
        let err = KeyedCollection::new(store(), "").unwrap_err();
        assert!(matches!(err, CollectionError::InvalidKey { .. }));
    }

    #[test]
    fn rejects_whitespace_key() {
        assert!(KeyedCollection::new(store(), "two words").is_err());
    }

    #[test]
    fn same_store_compares_handles() {
        let shared = store();
        let a = KeyedCollection::new(Arc::clone(&shared), "a").unwrap();
        let b = KeyedCollection::new(shared, "b").unwrap();
        let c = KeyedCollection::new(store(), "c").unwrap();
        assert!(a.same_store(&b));
        assert!(!a.same_store(&c));
    }

    #[test]
    fn derived_keys_differ_from_source() {
        let a = KeyedCollection::new(store(), "a").unwrap();
        let d = a.derived().unwrap();
        assert_ne!(d.key(), a.key());
        assert!(a.same_store(&d));
    }

    #[test]
    fn clear_and_exists() {
        let shared = store();
        shared.set_add("s", &[bytes::Bytes::from_static(b"x")]).unwrap();
        let s = KeyedCollection::new(shared, "s").unwrap();
        assert!(s.exists().unwrap());
        assert!(s.clear().unwrap());
        assert!(!s.exists().unwrap());
        assert!(!s.clear().unwrap());
    }

    #[test]
    fn debug_shows_key() {
        let a = KeyedCollection::new(store(), "visible").unwrap();
        assert!(format!("{a:?}").contains("visible"));
    }
}
