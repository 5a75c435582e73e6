//! Local collection interfaces backed by a remote key-addressed store.
//!
//! Each adapter is a thin handle: a shared [`StoreHandle`](rds_store::StoreHandle)
//! plus the key its data lives under. Nothing is cached locally, so every
//! read reflects the store and every mutation is visible to any other handle
//! bound to the same key.
//!
//! # Adapters
//!
//! - [`RemoteList`] -- ordered sequence over the store's list primitives
//! - [`RemoteSet`] -- unique elements with store-side set algebra
//! - [`RemoteDict`] and [`RemoteCounter`] -- field maps over hash primitives
//! - [`RemoteTree`] -- single-rooted hierarchy over a flat node map
//!
//! # Modules
//!
//! - [`error`] -- [`CollectionError`] and the result alias
//! - [`config`] -- key prefixes, loadable from TOML
//! - [`traits`] -- [`Sequence`], [`UnorderedSet`], [`Mapping`], [`Hierarchy`]
//! - [`keygen`] -- derived keys, sentinels and node ids
//!
//! Operations that need several primitive calls are not atomic. Concurrent
//! writers to the same key can interleave between steps; each adapter
//! documents which of its operations are affected.

pub mod base;
pub mod config;
pub mod dict;
pub mod error;
pub mod keygen;
pub mod list;
pub mod set;
pub mod traits;
pub mod tree;

pub use base::KeyedCollection;
pub use config::CollectionsConfig;
pub use dict::{RemoteCounter, RemoteDict};
pub use error::{CollectionError, CollectionResult};
pub use list::RemoteList;
pub use set::RemoteSet;
pub use traits::{Collection, Hierarchy, Mapping, Sequence, UnorderedSet};
pub use tree::{NodeRecord, RemoteTree};

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use proptest::prelude::*;
    use rds_store::{InMemoryStore, StoreHandle};
    use serde_json::json;

    use super::*;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    }

    fn store() -> Arc<dyn StoreHandle> {
        Arc::new(InMemoryStore::new())
    }

    // ---- scenarios ----

    #[test]
    fn list_remove_then_slice() {
        init_tracing();
        let list = RemoteList::new(store(), "nums").unwrap();
        list.extend(["1", "2", "3"]).unwrap();
        list.remove("2").unwrap();
        assert_eq!(list.slice(0..).unwrap(), ["1", "3"]);
    }

    #[test]
    fn handles_share_state_through_the_store() {
        let shared = store();
        let a = RemoteList::new(shared.clone(), "q").unwrap();
        let b = RemoteList::new(shared, "q").unwrap();
        a.append("job").unwrap();
        assert_eq!(b.pop().unwrap(), "job");
        assert!(a.is_empty().unwrap());
    }

    #[test]
    fn set_algebra_scenario() {
        init_tracing();
        let shared = store();
        let a = RemoteSet::new(shared.clone(), "a").unwrap();
        let b = RemoteSet::new(shared.clone(), "b").unwrap();
        for v in ["1", "2", "3"] {
            a.add(v).unwrap();
        }
        for v in ["2", "3", "4"] {
            b.add(v).unwrap();
        }

        let sym = a.symmetric_difference(&b).unwrap();
        assert_eq!(
            sym.members().unwrap(),
            HashSet::from(["1".to_string(), "4".to_string()])
        );

        a.intersection_update(&[&b]).unwrap();
        assert_eq!(
            a.members().unwrap(),
            HashSet::from(["2".to_string(), "3".to_string()])
        );
        assert!(a.is_proper_subset(&b).unwrap());
    }

    #[test]
    fn collections_coexist_under_distinct_keys() {
        let shared = store();
        let mut root = NodeRecord::new();
        root.insert("name".into(), json!("R"));
        let tree = RemoteTree::open(shared.clone(), "org", Some(root)).unwrap();
        let dict = RemoteDict::new(shared.clone(), "org").unwrap();
        dict.insert("owner", "ops").unwrap();

        assert_eq!(tree.len().unwrap(), 1);
        assert_eq!(dict.len().unwrap(), 1);
        assert_eq!(tree.get_tree().unwrap()["name"], "R");
    }

    #[test]
    fn wrong_type_surfaces_as_store_error() {
        let shared = store();
        RemoteSet::new(shared.clone(), "k").unwrap().add("x").unwrap();
        let list = RemoteList::new(shared, "k").unwrap();
        assert!(matches!(
            list.append("y"),
            Err(CollectionError::Store(rds_store::StoreError::WrongType { .. }))
        ));
    }

    // ---- properties ----

    proptest! {
        #[test]
        fn appended_values_read_back_in_order(values in prop::collection::vec("[a-z0-9]{0,8}", 1..20)) {
            let list = RemoteList::new(store(), "p").unwrap();
            for v in &values {
                list.append(v).unwrap();
            }
            prop_assert_eq!(list.len().unwrap(), values.len());
            for (i, v) in values.iter().enumerate() {
                prop_assert_eq!(&list.get(i as isize).unwrap(), v);
            }
            prop_assert_eq!(&list.get(-1).unwrap(), values.last().unwrap());
        }

        #[test]
        fn extend_matches_repeated_append(values in prop::collection::vec("[a-z]{1,6}", 0..20)) {
            let shared = store();
            let batched = RemoteList::new(shared.clone(), "batched").unwrap();
            let single = RemoteList::new(shared, "single").unwrap();
            batched.extend(&values).unwrap();
            for v in &values {
                single.append(v).unwrap();
            }
            prop_assert_eq!(batched.to_vec().unwrap(), single.to_vec().unwrap());
        }

        #[test]
        fn union_contains_both_operands(
            left in prop::collection::hash_set("[a-z]{1,4}", 0..12),
            right in prop::collection::hash_set("[a-z]{1,4}", 0..12),
        ) {
            let shared = store();
            let a = RemoteSet::new(shared.clone(), "l").unwrap();
            let b = RemoteSet::new(shared, "r").unwrap();
            for v in &left {
                a.add(v).unwrap();
            }
            for v in &right {
                b.add(v).unwrap();
            }
            let u = a.union(&[&b]).unwrap();
            let expected: HashSet<String> = left.union(&right).cloned().collect();
            prop_assert_eq!(u.members().unwrap(), expected);
            prop_assert!(a.is_subset(&u).unwrap());
            prop_assert!(b.is_subset(&u).unwrap());
        }

        #[test]
        fn every_added_node_is_reachable(parents in prop::collection::vec(0usize..8, 0..16)) {
            let tree = RemoteTree::open(store(), "t", None).unwrap();
            let mut ids = vec![tree.root_id().to_string()];
            for p in parents {
                let parent = ids[p % ids.len()].clone();
                let id = tree.add_node(NodeRecord::new(), Some(&parent)).unwrap();
                ids.push(id);
            }
            prop_assert_eq!(tree.len().unwrap(), ids.len());
            prop_assert!(tree.validate().is_ok());
        }
    }
}
