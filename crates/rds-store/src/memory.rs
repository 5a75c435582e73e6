use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use bytes::Bytes;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{SetOp, StoreHandle};

/// One stored collection.
#[derive(Clone, Debug)]
enum Entry {
    List(VecDeque<Bytes>),
    Set(HashSet<Bytes>),
    Hash(HashMap<String, Bytes>),
}

impl Entry {
    fn is_empty(&self) -> bool {
        match self {
            Entry::List(l) => l.is_empty(),
            Entry::Set(s) => s.is_empty(),
            Entry::Hash(h) => h.is_empty(),
        }
    }
}

/// In-memory, HashMap-based store with remote-store semantics.
///
/// Intended for tests and embedding. Every key lives in a single `HashMap`
/// behind a `RwLock`, so each primitive is atomic with respect to the others.
/// Values are cloned on read.
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
    ops: AtomicU64,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ops: AtomicU64::new(0),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if no key is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of every stored key.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Remove every key.
    pub fn flush(&self) -> StoreResult<()> {
        let mut map = self.entries.write().map_err(poisoned)?;
        debug!(keys = map.len(), "flushing in-memory store");
        map.clear();
        Ok(())
    }

    /// Number of primitive calls served so far.
    pub fn ops(&self) -> u64 {
        self.ops.load(Ordering::Relaxed)
    }

    fn read<R>(&self, f: impl FnOnce(&HashMap<String, Entry>) -> StoreResult<R>) -> StoreResult<R> {
        self.ops.fetch_add(1, Ordering::Relaxed);
        let map = self.entries.read().map_err(poisoned)?;
        f(&map)
    }

    fn write<R>(
        &self,
        f: impl FnOnce(&mut HashMap<String, Entry>) -> StoreResult<R>,
    ) -> StoreResult<R> {
        self.ops.fetch_add(1, Ordering::Relaxed);
        let mut map = self.entries.write().map_err(poisoned)?;
        f(&mut map)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("key_count", &self.len())
            .field("ops", &self.ops())
            .finish()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Unavailable(format!("lock poisoned: {e}"))
}

fn wrong_type(key: &str, expected: &'static str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
        expected,
    }
}

// ---------------------------------------------------------------------------
// Typed access
// ---------------------------------------------------------------------------

fn list<'a>(map: &'a HashMap<String, Entry>, key: &str) -> StoreResult<Option<&'a VecDeque<Bytes>>> {
    match map.get(key) {
        None => Ok(None),
        Some(Entry::List(l)) => Ok(Some(l)),
        Some(_) => Err(wrong_type(key, "list")),
    }
}

fn list_mut<'a>(
    map: &'a mut HashMap<String, Entry>,
    key: &str,
) -> StoreResult<Option<&'a mut VecDeque<Bytes>>> {
    match map.get_mut(key) {
        None => Ok(None),
        Some(Entry::List(l)) => Ok(Some(l)),
        Some(_) => Err(wrong_type(key, "list")),
    }
}

fn set<'a>(map: &'a HashMap<String, Entry>, key: &str) -> StoreResult<Option<&'a HashSet<Bytes>>> {
    match map.get(key) {
        None => Ok(None),
        Some(Entry::Set(s)) => Ok(Some(s)),
        Some(_) => Err(wrong_type(key, "set")),
    }
}

fn set_mut<'a>(
    map: &'a mut HashMap<String, Entry>,
    key: &str,
) -> StoreResult<Option<&'a mut HashSet<Bytes>>> {
    match map.get_mut(key) {
        None => Ok(None),
        Some(Entry::Set(s)) => Ok(Some(s)),
        Some(_) => Err(wrong_type(key, "set")),
    }
}

fn hash<'a>(
    map: &'a HashMap<String, Entry>,
    key: &str,
) -> StoreResult<Option<&'a HashMap<String, Bytes>>> {
    match map.get(key) {
        None => Ok(None),
        Some(Entry::Hash(h)) => Ok(Some(h)),
        Some(_) => Err(wrong_type(key, "hash")),
    }
}

fn hash_mut<'a>(
    map: &'a mut HashMap<String, Entry>,
    key: &str,
) -> StoreResult<Option<&'a mut HashMap<String, Bytes>>> {
    match map.get_mut(key) {
        None => Ok(None),
        Some(Entry::Hash(h)) => Ok(Some(h)),
        Some(_) => Err(wrong_type(key, "hash")),
    }
}

/// Drop the key if its collection became empty.
fn prune(map: &mut HashMap<String, Entry>, key: &str) {
    if map.get(key).is_some_and(Entry::is_empty) {
        map.remove(key);
    }
}

/// Resolve a signed index against `len`.
fn normalize_index(index: isize, len: usize) -> Option<usize> {
    let len = len as isize;
    let i = if index < 0 { len + index } else { index };
    (0..len).contains(&i).then_some(i as usize)
}

/// Resolve an inclusive signed range against `len`, clamping to the list.
fn normalize_range(start: isize, stop: isize, len: usize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        None
    } else {
        Some((start as usize, stop as usize))
    }
}

fn combine_sets(
    map: &HashMap<String, Entry>,
    op: SetOp,
    sources: &[&str],
) -> StoreResult<HashSet<Bytes>> {
    let empty = HashSet::new();
    let mut resolved = Vec::with_capacity(sources.len());
    for key in sources {
        resolved.push(set(map, key)?.unwrap_or(&empty));
    }

    let Some((first, rest)) = resolved.split_first() else {
        return Ok(HashSet::new());
    };

    let result = match op {
        SetOp::Union => resolved.iter().flat_map(|s| s.iter().cloned()).collect(),
        SetOp::Intersection => first
            .iter()
            .filter(|m| rest.iter().all(|s| s.contains(*m)))
            .cloned()
            .collect(),
        SetOp::Difference => first
            .iter()
            .filter(|m| !rest.iter().any(|s| s.contains(*m)))
            .cloned()
            .collect(),
    };
    Ok(result)
}

impl StoreHandle for InMemoryStore {
    fn push_tail(&self, key: &str, values: &[Bytes]) -> StoreResult<usize> {
        self.write(|map| {
            let entry = map
                .entry(key.to_string())
                .or_insert_with(|| Entry::List(VecDeque::new()));
            let Entry::List(l) = entry else {
                return Err(wrong_type(key, "list"));
            };
            l.extend(values.iter().cloned());
            let len = l.len();
            prune(map, key);
            Ok(len)
        })
    }

    fn pop_head(&self, key: &str) -> StoreResult<Option<Bytes>> {
        self.write(|map| {
            let popped = list_mut(map, key)?.and_then(VecDeque::pop_front);
            prune(map, key);
            Ok(popped)
        })
    }

    fn pop_tail(&self, key: &str) -> StoreResult<Option<Bytes>> {
        self.write(|map| {
            let popped = list_mut(map, key)?.and_then(VecDeque::pop_back);
            prune(map, key);
            Ok(popped)
        })
    }

    fn index_get(&self, key: &str, index: isize) -> StoreResult<Option<Bytes>> {
        self.read(|map| {
            let Some(l) = list(map, key)? else {
                return Ok(None);
            };
            Ok(normalize_index(index, l.len()).and_then(|i| l.get(i).cloned()))
        })
    }

    fn index_set(&self, key: &str, index: isize, value: Bytes) -> StoreResult<()> {
        self.write(|map| {
            let l = list_mut(map, key)?.ok_or_else(|| StoreError::NoSuchKey {
                key: key.to_string(),
            })?;
            let i = normalize_index(index, l.len()).ok_or_else(|| StoreError::IndexOutOfRange {
                key: key.to_string(),
                index,
            })?;
            l[i] = value;
            Ok(())
        })
    }

    fn range_get(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<Bytes>> {
        self.read(|map| {
            let Some(l) = list(map, key)? else {
                return Ok(Vec::new());
            };
            Ok(match normalize_range(start, stop, l.len()) {
                Some((s, e)) => l.range(s..=e).cloned().collect(),
                None => Vec::new(),
            })
        })
    }

    fn range_trim(&self, key: &str, start: isize, stop: isize) -> StoreResult<()> {
        self.write(|map| {
            let Some(l) = list_mut(map, key)? else {
                return Ok(());
            };
            match normalize_range(start, stop, l.len()) {
                Some((s, e)) => {
                    l.truncate(e + 1);
                    l.drain(..s);
                }
                None => l.clear(),
            }
            prune(map, key);
            Ok(())
        })
    }

    fn remove_value(&self, key: &str, count: isize, value: &[u8]) -> StoreResult<usize> {
        self.write(|map| {
            let Some(l) = list_mut(map, key)? else {
                return Ok(0);
            };
            let limit = if count == 0 { usize::MAX } else { count.unsigned_abs() };
            let mut removed = 0;
            if count >= 0 {
                let mut i = 0;
                while i < l.len() && removed < limit {
                    if l[i][..] == *value {
                        l.remove(i);
                        removed += 1;
                    } else {
                        i += 1;
                    }
                }
            } else {
                let mut i = l.len();
                while i > 0 && removed < limit {
                    i -= 1;
                    if l[i][..] == *value {
                        l.remove(i);
                        removed += 1;
                    }
                }
            }
            prune(map, key);
            Ok(removed)
        })
    }

    fn list_len(&self, key: &str) -> StoreResult<usize> {
        self.read(|map| Ok(list(map, key)?.map_or(0, VecDeque::len)))
    }

    fn set_add(&self, key: &str, members: &[Bytes]) -> StoreResult<usize> {
        self.write(|map| {
            let entry = map
                .entry(key.to_string())
                .or_insert_with(|| Entry::Set(HashSet::new()));
            let Entry::Set(s) = entry else {
                return Err(wrong_type(key, "set"));
            };
            let added = members.iter().filter(|m| s.insert((*m).clone())).count();
            prune(map, key);
            Ok(added)
        })
    }

    fn set_remove(&self, key: &str, members: &[Bytes]) -> StoreResult<usize> {
        self.write(|map| {
            let Some(s) = set_mut(map, key)? else {
                return Ok(0);
            };
            let removed = members.iter().filter(|m| s.remove(*m)).count();
            prune(map, key);
            Ok(removed)
        })
    }

    fn set_contains(&self, key: &str, member: &[u8]) -> StoreResult<bool> {
        self.read(|map| Ok(set(map, key)?.is_some_and(|s| s.contains(member))))
    }

    fn set_card(&self, key: &str) -> StoreResult<usize> {
        self.read(|map| Ok(set(map, key)?.map_or(0, HashSet::len)))
    }

    fn set_members(&self, key: &str) -> StoreResult<HashSet<Bytes>> {
        self.read(|map| Ok(set(map, key)?.cloned().unwrap_or_default()))
    }

    fn set_pop(&self, key: &str) -> StoreResult<Option<Bytes>> {
        self.write(|map| {
            let Some(s) = set_mut(map, key)? else {
                return Ok(None);
            };
            let picked = s.iter().next().cloned();
            if let Some(member) = &picked {
                s.remove(member);
            }
            prune(map, key);
            Ok(picked)
        })
    }

    fn combine_store(&self, op: SetOp, dest: &str, sources: &[&str]) -> StoreResult<usize> {
        self.write(|map| {
            let result = combine_sets(map, op, sources)?;
            let card = result.len();
            if result.is_empty() {
                map.remove(dest);
            } else {
                map.insert(dest.to_string(), Entry::Set(result));
            }
            Ok(card)
        })
    }

    fn combine(&self, op: SetOp, sources: &[&str]) -> StoreResult<HashSet<Bytes>> {
        self.read(|map| combine_sets(map, op, sources))
    }

    fn hash_get(&self, key: &str, field: &str) -> StoreResult<Option<Bytes>> {
        self.read(|map| Ok(hash(map, key)?.and_then(|h| h.get(field).cloned())))
    }

    fn hash_set(&self, key: &str, field: &str, value: Bytes) -> StoreResult<bool> {
        self.write(|map| {
            let entry = map
                .entry(key.to_string())
                .or_insert_with(|| Entry::Hash(HashMap::new()));
            let Entry::Hash(h) = entry else {
                return Err(wrong_type(key, "hash"));
            };
            Ok(h.insert(field.to_string(), value).is_none())
        })
    }

    fn hash_delete(&self, key: &str, fields: &[&str]) -> StoreResult<usize> {
        self.write(|map| {
            let Some(h) = hash_mut(map, key)? else {
                return Ok(0);
            };
            let removed = fields.iter().filter(|f| h.remove(**f).is_some()).count();
            prune(map, key);
            Ok(removed)
        })
    }

    fn hash_len(&self, key: &str) -> StoreResult<usize> {
        self.read(|map| Ok(hash(map, key)?.map_or(0, HashMap::len)))
    }

    fn hash_keys(&self, key: &str) -> StoreResult<Vec<String>> {
        self.read(|map| Ok(hash(map, key)?.map(|h| h.keys().cloned().collect()).unwrap_or_default()))
    }

    fn hash_values(&self, key: &str) -> StoreResult<Vec<Bytes>> {
        self.read(|map| {
            Ok(hash(map, key)?
                .map(|h| h.values().cloned().collect())
                .unwrap_or_default())
        })
    }

    fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, Bytes>> {
        self.read(|map| Ok(hash(map, key)?.cloned().unwrap_or_default()))
    }

    fn hash_exists(&self, key: &str, field: &str) -> StoreResult<bool> {
        self.read(|map| Ok(hash(map, key)?.is_some_and(|h| h.contains_key(field))))
    }

    fn hash_incr_by(&self, key: &str, field: &str, delta: i64) -> StoreResult<i64> {
        self.write(|map| {
            let entry = map
                .entry(key.to_string())
                .or_insert_with(|| Entry::Hash(HashMap::new()));
            let Entry::Hash(h) = entry else {
                return Err(wrong_type(key, "hash"));
            };
            let current = match h.get(field) {
                None => 0,
                Some(raw) => std::str::from_utf8(raw)
                    .ok()
                    .and_then(|s| s.parse::<i64>().ok())
                    .ok_or_else(|| StoreError::NotAnInteger {
                        key: key.to_string(),
                        field: field.to_string(),
                    })?,
            };
            let next = current.checked_add(delta).ok_or_else(|| StoreError::Overflow {
                key: key.to_string(),
                field: field.to_string(),
            })?;
            h.insert(field.to_string(), Bytes::from(next.to_string()));
            Ok(next)
        })
    }

    fn delete_key(&self, key: &str) -> StoreResult<bool> {
        self.write(|map| Ok(map.remove(key).is_some()))
    }

    fn key_exists(&self, key: &str) -> StoreResult<bool> {
        self.read(|map| Ok(map.contains_key(key)))
    }

    fn hash_set_many(&self, key: &str, entries: &[(String, Bytes)]) -> StoreResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        self.write(|map| {
            let entry = map
                .entry(key.to_string())
                .or_insert_with(|| Entry::Hash(HashMap::new()));
            let Entry::Hash(h) = entry else {
                return Err(wrong_type(key, "hash"));
            };
            for (field, value) in entries {
                h.insert(field.clone(), value.clone());
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    fn list_of(store: &InMemoryStore, key: &str) -> Vec<String> {
        store
            .range_get(key, 0, -1)
            .unwrap()
            .into_iter()
            .map(|v| String::from_utf8(v.to_vec()).unwrap())
            .collect()
    }

    fn seeded(values: &[&str]) -> InMemoryStore {
        let store = InMemoryStore::new();
        let values: Vec<Bytes> = values.iter().map(|v| b(v)).collect();
        store.push_tail("l", &values).unwrap();
        store
    }

    // -----------------------------------------------------------------------
    // Lists
    // -----------------------------------------------------------------------

    #[test]
    fn push_and_range() {
        let store = seeded(&["a", "b", "c"]);
        assert_eq!(store.list_len("l").unwrap(), 3);
        assert_eq!(list_of(&store, "l"), ["a", "b", "c"]);
        assert_eq!(store.range_get("l", 1, 1).unwrap(), vec![b("b")]);
        assert_eq!(store.range_get("l", -2, -1).unwrap(), vec![b("b"), b("c")]);
        assert_eq!(store.range_get("l", 0, 100).unwrap().len(), 3);
        assert!(store.range_get("l", 2, 1).unwrap().is_empty());
        assert!(store.range_get("l", 5, 9).unwrap().is_empty());
    }

    #[test]
    fn index_get_handles_negative_and_out_of_range() {
        let store = seeded(&["a", "b", "c"]);
        assert_eq!(store.index_get("l", 0).unwrap(), Some(b("a")));
        assert_eq!(store.index_get("l", -1).unwrap(), Some(b("c")));
        assert_eq!(store.index_get("l", -3).unwrap(), Some(b("a")));
        assert_eq!(store.index_get("l", 3).unwrap(), None);
        assert_eq!(store.index_get("l", -4).unwrap(), None);
        assert_eq!(store.index_get("missing", 0).unwrap(), None);
    }

    #[test]
    fn index_set_errors() {
        let store = seeded(&["a"]);
        store.index_set("l", 0, b("z")).unwrap();
        assert_eq!(list_of(&store, "l"), ["z"]);
        assert!(matches!(
            store.index_set("l", 1, b("x")),
            Err(StoreError::IndexOutOfRange { index: 1, .. })
        ));
        assert!(matches!(
            store.index_set("nope", 0, b("x")),
            Err(StoreError::NoSuchKey { .. })
        ));
    }

    #[test]
    fn pops_remove_empty_list() {
        let store = seeded(&["a", "b"]);
        assert_eq!(store.pop_head("l").unwrap(), Some(b("a")));
        assert_eq!(store.pop_tail("l").unwrap(), Some(b("b")));
        assert_eq!(store.pop_tail("l").unwrap(), None);
        assert!(!store.key_exists("l").unwrap());
    }

    #[test]
    fn range_trim_keeps_inclusive_range() {
        let store = seeded(&["a", "b", "c", "d"]);
        store.range_trim("l", 1, 2).unwrap();
        assert_eq!(list_of(&store, "l"), ["b", "c"]);

        store.range_trim("l", 0, -1).unwrap();
        assert_eq!(list_of(&store, "l"), ["b", "c"]);

        store.range_trim("l", 1, 0).unwrap();
        assert!(!store.key_exists("l").unwrap());
    }

    #[test]
    fn remove_value_directions() {
        let store = seeded(&["x", "a", "x", "b", "x"]);
        assert_eq!(store.remove_value("l", 1, b"x").unwrap(), 1);
        assert_eq!(list_of(&store, "l"), ["a", "x", "b", "x"]);

        assert_eq!(store.remove_value("l", -1, b"x").unwrap(), 1);
        assert_eq!(list_of(&store, "l"), ["a", "x", "b"]);

        store.push_tail("l", &[b("x"), b("x")]).unwrap();
        assert_eq!(store.remove_value("l", 0, b"x").unwrap(), 3);
        assert_eq!(list_of(&store, "l"), ["a", "b"]);

        assert_eq!(store.remove_value("l", 1, b"absent").unwrap(), 0);
    }

    // -----------------------------------------------------------------------
    // Sets
    // -----------------------------------------------------------------------

    #[test]
    fn set_basics() {
        let store = InMemoryStore::new();
        assert_eq!(store.set_add("s", &[b("a"), b("b"), b("a")]).unwrap(), 2);
        assert_eq!(store.set_card("s").unwrap(), 2);
        assert!(store.set_contains("s", b"a").unwrap());
        assert!(!store.set_contains("s", b"z").unwrap());
        assert_eq!(store.set_remove("s", &[b("a"), b("z")]).unwrap(), 1);
        assert_eq!(store.set_pop("s").unwrap(), Some(b("b")));
        assert_eq!(store.set_pop("s").unwrap(), None);
        assert!(!store.key_exists("s").unwrap());
    }

    #[test]
    fn combine_operations() {
        let store = InMemoryStore::new();
        store.set_add("a", &[b("1"), b("2"), b("3")]).unwrap();
        store.set_add("b", &[b("2"), b("3"), b("4")]).unwrap();

        let union = store.combine(SetOp::Union, &["a", "b"]).unwrap();
        assert_eq!(union.len(), 4);

        let inter = store.combine(SetOp::Intersection, &["a", "b"]).unwrap();
        assert_eq!(inter, HashSet::from([b("2"), b("3")]));

        let diff = store.combine(SetOp::Difference, &["a", "b"]).unwrap();
        assert_eq!(diff, HashSet::from([b("1")]));

        let with_missing = store.combine(SetOp::Intersection, &["a", "missing"]).unwrap();
        assert!(with_missing.is_empty());
    }

    #[test]
    fn combine_store_overwrites_destination() {
        let store = InMemoryStore::new();
        store.set_add("a", &[b("1"), b("2")]).unwrap();
        store.set_add("b", &[b("2")]).unwrap();

        assert_eq!(store.combine_store(SetOp::Difference, "a", &["a", "b"]).unwrap(), 1);
        assert_eq!(store.set_members("a").unwrap(), HashSet::from([b("1")]));

        assert_eq!(store.combine_store(SetOp::Intersection, "c", &["a", "b"]).unwrap(), 0);
        assert!(!store.key_exists("c").unwrap());
    }

    // -----------------------------------------------------------------------
    // Hashes
    // -----------------------------------------------------------------------

    #[test]
    fn hash_basics() {
        let store = InMemoryStore::new();
        assert!(store.hash_set("h", "f", b("1")).unwrap());
        assert!(!store.hash_set("h", "f", b("2")).unwrap());
        assert_eq!(store.hash_get("h", "f").unwrap(), Some(b("2")));
        assert_eq!(store.hash_len("h").unwrap(), 1);
        assert!(store.hash_exists("h", "f").unwrap());
        assert_eq!(store.hash_keys("h").unwrap(), vec!["f".to_string()]);
        assert_eq!(store.hash_values("h").unwrap(), vec![b("2")]);
        assert_eq!(store.hash_delete("h", &["f", "g"]).unwrap(), 1);
        assert!(!store.key_exists("h").unwrap());
    }

    #[test]
    fn hash_incr_by() {
        let store = InMemoryStore::new();
        assert_eq!(store.hash_incr_by("c", "x", 2).unwrap(), 2);
        assert_eq!(store.hash_incr_by("c", "x", -5).unwrap(), -3);

        store.hash_set("c", "word", b("abc")).unwrap();
        assert!(matches!(
            store.hash_incr_by("c", "word", 1),
            Err(StoreError::NotAnInteger { .. })
        ));

        store.hash_set("c", "big", b(&i64::MAX.to_string())).unwrap();
        assert!(matches!(
            store.hash_incr_by("c", "big", 1),
            Err(StoreError::Overflow { .. })
        ));
    }

    #[test]
    fn hash_set_many_is_one_call() {
        let store = InMemoryStore::new();
        let before = store.ops();
        store
            .hash_set_many("h", &[("a".into(), b("1")), ("b".into(), b("2"))])
            .unwrap();
        assert_eq!(store.ops() - before, 1);
        assert_eq!(store.hash_len("h").unwrap(), 2);
    }

    // -----------------------------------------------------------------------
    // Type discipline and keys
    // -----------------------------------------------------------------------

    #[test]
    fn wrong_type_is_rejected() {
        let store = seeded(&["a"]);
        assert!(matches!(
            store.set_add("l", &[b("x")]),
            Err(StoreError::WrongType { expected: "set", .. })
        ));
        assert!(matches!(
            store.hash_get("l", "f"),
            Err(StoreError::WrongType { expected: "hash", .. })
        ));
        store.set_add("s", &[b("x")]).unwrap();
        assert!(matches!(
            store.push_tail("s", &[b("y")]),
            Err(StoreError::WrongType { expected: "list", .. })
        ));
        assert!(store.combine(SetOp::Union, &["s", "l"]).is_err());
    }

    #[test]
    fn delete_keys_and_flush() {
        let store = seeded(&["a"]);
        store.set_add("s", &[b("x")]).unwrap();
        assert_eq!(store.keys(), vec!["l".to_string(), "s".to_string()]);
        assert!(store.delete_key("l").unwrap());
        assert!(!store.delete_key("l").unwrap());
        store.flush().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn ops_counts_primitive_calls() {
        let store = InMemoryStore::new();
        store.push_tail("l", &[b("a")]).unwrap();
        store.list_len("l").unwrap();
        store.index_get("l", 0).unwrap();
        assert_eq!(store.ops(), 3);
    }

    #[test]
    fn concurrent_pushes_are_serialized() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..50 {
                        store.push_tail("shared", &[b(&format!("{t}-{i}"))]).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }
        assert_eq!(store.list_len("shared").unwrap(), 400);
    }

    #[test]
    fn debug_format() {
        let store = InMemoryStore::new();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryStore"));
        assert!(debug.contains("key_count"));
    }
}
