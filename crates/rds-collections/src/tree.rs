//! Single-rooted hierarchy materialized from a flat node map.
//!
//! Every node is one field of a remote hash: the field name is the node's
//! generated id and the value is the node record as JSON text. A record's
//! `parent_id` holds its parent's id, or `null` for the root.
//!
//! # Invariants
//!
//! - Exactly one record has no parent. More than one is a fatal
//!   [`CollectionError::MalformedTree`]; the adapter never repairs it.
//! - Every other `parent_id` names an existing node of the same map.
//! - Node ids are generated here, never taken from the caller, never reused.
//!
//! Construction scans then creates, so two processes opening the same empty
//! tree at once can each create a root. Open trees from a single writer.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use bytes::Bytes;
use rds_store::StoreHandle;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::base::KeyedCollection;
use crate::config::CollectionsConfig;
use crate::dict::RemoteDict;
use crate::error::{CollectionError, CollectionResult};
use crate::keygen;
use crate::traits::{Collection, Hierarchy, Mapping};

/// A node's fields. `id` and `parent_id` are reserved.
pub type NodeRecord = Map<String, Value>;

/// Field naming a node's parent.
pub const PARENT_FIELD: &str = "parent_id";
/// Field carrying a node's id in records handed to and from callers.
pub const ID_FIELD: &str = "id";
/// Field holding the nested children in [`Hierarchy::get_tree`] output.
pub const CHILDREN_FIELD: &str = "children";

/// Tree stored as a flat node map under `tree_prefix + key`.
#[derive(Clone, Debug)]
pub struct RemoteTree {
    nodes: RemoteDict,
    root_node_id: String,
}

fn parent_of(record: &NodeRecord) -> Option<&str> {
    match record.get(PARENT_FIELD) {
        Some(Value::String(parent)) => Some(parent),
        _ => None,
    }
}

fn scrubbed(id: &str, record: &NodeRecord) -> NodeRecord {
    let mut out: NodeRecord = record
        .iter()
        .filter(|(field, _)| field.as_str() != PARENT_FIELD)
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect();
    out.insert(ID_FIELD.into(), Value::String(id.to_string()));
    out
}

/// Direct children per parent id, each list sorted for stable output.
fn child_index(snapshot: &HashMap<String, NodeRecord>) -> HashMap<&str, Vec<&str>> {
    let mut index: HashMap<&str, Vec<&str>> = HashMap::new();
    for (id, record) in snapshot {
        if let Some(parent) = parent_of(record) {
            index.entry(parent).or_default().push(id.as_str());
        }
    }
    for children in index.values_mut() {
        children.sort_unstable();
    }
    index
}

impl RemoteTree {
    /// Open the tree named `key`, creating a root from `root_data` (or an
    /// empty record) if the node map has none.
    pub fn open(
        store: Arc<dyn StoreHandle>,
        key: &str,
        root_data: Option<NodeRecord>,
    ) -> CollectionResult<Self> {
        Self::open_with_config(store, key, root_data, CollectionsConfig::default())
    }

    pub fn open_with_config(
        store: Arc<dyn StoreHandle>,
        key: &str,
        root_data: Option<NodeRecord>,
        config: CollectionsConfig,
    ) -> CollectionResult<Self> {
        let map_key = format!("{}{key}", config.tree_prefix);
        let nodes = RemoteDict::with_config(store, map_key, config)?;
        let snapshot = Self::load(&nodes)?;

        let mut roots: Vec<&String> = snapshot
            .iter()
            .filter(|(_, record)| parent_of(record).is_none())
            .map(|(id, _)| id)
            .collect();

        let root_node_id = match roots.len() {
            0 => {
                let id = Self::store_node(&nodes, root_data.unwrap_or_default(), None)?;
                debug!(tree = %nodes.key(), root = %id, "created tree root");
                id
            }
            1 => {
                let id = roots.remove(0).clone();
                debug!(tree = %nodes.key(), root = %id, nodes = snapshot.len(), "adopted tree root");
                id
            }
            n => {
                warn!(tree = %nodes.key(), roots = n, "multiple unparented nodes");
                return Err(CollectionError::MalformedTree {
                    key: nodes.key().to_string(),
                    reason: format!("{n} root nodes found"),
                });
            }
        };

        Ok(Self {
            nodes,
            root_node_id,
        })
    }

    /// The flat node map backing this tree.
    pub fn nodes(&self) -> &RemoteDict {
        &self.nodes
    }

    fn load(nodes: &RemoteDict) -> CollectionResult<HashMap<String, NodeRecord>> {
        nodes
            .items()?
            .into_iter()
            .map(|(id, raw)| Self::parse_record(nodes.key(), &id, &raw).map(|record| (id, record)))
            .collect()
    }

    /// Decode one stored record. `parent_id` must be a string id, or null
    /// or absent for the root.
    fn parse_record(key: &str, id: &str, raw: &str) -> CollectionResult<NodeRecord> {
        let decode_error = |reason: String| CollectionError::Decode {
            key: key.to_string(),
            reason: format!("node {id}: {reason}"),
        };
        let record: NodeRecord = serde_json::from_str(raw)
            .map_err(|e| decode_error(format!("not a JSON object: {e}")))?;
        match record.get(PARENT_FIELD) {
            None | Some(Value::Null) | Some(Value::String(_)) => Ok(record),
            Some(other) => Err(decode_error(format!(
                "{PARENT_FIELD} must be a string or null, found {other}"
            ))),
        }
    }

    fn store_node(
        nodes: &RemoteDict,
        mut record: NodeRecord,
        parent: Option<&str>,
    ) -> CollectionResult<String> {
        let id = keygen::node_id();
        record.remove(ID_FIELD);
        Self::write_record(nodes, &id, record, parent)?;
        Ok(id)
    }

    fn write_record(
        nodes: &RemoteDict,
        id: &str,
        mut record: NodeRecord,
        parent: Option<&str>,
    ) -> CollectionResult<()> {
        let parent = parent.map_or(Value::Null, |p| Value::String(p.to_string()));
        record.insert(PARENT_FIELD.into(), parent);
        let raw = serde_json::to_vec(&record).map_err(|e| CollectionError::Decode {
            key: nodes.key().to_string(),
            reason: e.to_string(),
        })?;
        nodes.insert(id, Bytes::from(raw))?;
        Ok(())
    }

    fn read_record(&self, id: &str) -> CollectionResult<NodeRecord> {
        let raw = match self.nodes.get(id) {
            Err(CollectionError::FieldNotFound { .. }) => return Err(self.node_not_found(id)),
            other => other?,
        };
        Self::parse_record(self.key(), id, &raw)
    }

    fn node_not_found(&self, id: &str) -> CollectionError {
        CollectionError::NodeNotFound {
            key: self.key().to_string(),
            id: id.to_string(),
        }
    }

    fn id_of<'r>(&self, record: &'r NodeRecord) -> CollectionResult<&'r str> {
        match record.get(ID_FIELD) {
            Some(Value::String(id)) => Ok(id),
            _ => Err(CollectionError::InvalidArgument(format!(
                "node record for {} has no string {ID_FIELD:?} field",
                self.key()
            ))),
        }
    }

    /// One node, with its `id` and without its `parent_id`.
    pub fn get_node(&self, id: &str) -> CollectionResult<NodeRecord> {
        Ok(scrubbed(id, &self.read_record(id)?))
    }

    /// Parent id of `id`; `None` for the root.
    pub fn parent_of(&self, id: &str) -> CollectionResult<Option<String>> {
        Ok(parent_of(&self.read_record(id)?).map(str::to_owned))
    }

    /// Ids of the direct children of `id`, sorted.
    pub fn children_of(&self, id: &str) -> CollectionResult<Vec<String>> {
        let snapshot = Self::load(&self.nodes)?;
        if !snapshot.contains_key(id) {
            return Err(self.node_not_found(id));
        }
        let index = child_index(&snapshot);
        Ok(index
            .get(id)
            .map(|children| children.iter().map(|c| c.to_string()).collect())
            .unwrap_or_default())
    }

    /// Check the whole node map: a single root that is still this tree's
    /// root, no dangling parent references, and every node reachable from
    /// the root.
    pub fn validate(&self) -> CollectionResult<()> {
        let snapshot = Self::load(&self.nodes)?;
        let malformed = |reason: String| {
            warn!(tree = %self.key(), %reason, "tree failed validation");
            Err(CollectionError::MalformedTree {
                key: self.key().to_string(),
                reason,
            })
        };

        let roots: Vec<&str> = snapshot
            .iter()
            .filter(|(_, r)| parent_of(r).is_none())
            .map(|(id, _)| id.as_str())
            .collect();
        match roots.as_slice() {
            [root] if *root == self.root_node_id => {}
            [other] => return malformed(format!("root is {other}, expected {}", self.root_node_id)),
            [] => return malformed("no root node".into()),
            many => return malformed(format!("{} root nodes found", many.len())),
        }

        if let Some((id, parent)) = snapshot.iter().find_map(|(id, r)| {
            parent_of(r)
                .filter(|p| !snapshot.contains_key(*p))
                .map(|p| (id, p))
        }) {
            return malformed(format!("node {id} references missing parent {parent}"));
        }

        let index = child_index(&snapshot);
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::from([self.root_node_id.as_str()]);
        while let Some(id) = queue.pop_front() {
            if seen.insert(id) {
                queue.extend(index.get(id).into_iter().flatten().copied());
            }
        }
        if seen.len() != snapshot.len() {
            return malformed(format!(
                "{} nodes unreachable from the root",
                snapshot.len() - seen.len()
            ));
        }
        Ok(())
    }

    fn assemble(
        id: &str,
        snapshot: &HashMap<String, NodeRecord>,
        index: &HashMap<&str, Vec<&str>>,
    ) -> Value {
        let mut node = snapshot
            .get(id)
            .map(|record| scrubbed(id, record))
            .unwrap_or_default();
        if let Some(children) = index.get(id).filter(|c| !c.is_empty()) {
            let nested = children
                .iter()
                .map(|child| Self::assemble(child, snapshot, index))
                .collect();
            node.insert(CHILDREN_FIELD.into(), Value::Array(nested));
        }
        Value::Object(node)
    }
}

impl Collection for RemoteTree {
    fn base(&self) -> &KeyedCollection {
        self.nodes.base()
    }

    fn len(&self) -> CollectionResult<usize> {
        self.nodes.len()
    }
}

impl Hierarchy for RemoteTree {
    fn root_id(&self) -> &str {
        &self.root_node_id
    }

    fn add_node(&self, record: NodeRecord, parent: Option<&str>) -> CollectionResult<String> {
        let parent = parent.unwrap_or(&self.root_node_id);
        if !self.nodes.contains_key(parent)? {
            return Err(CollectionError::InvalidParent {
                key: self.key().to_string(),
                parent: parent.to_string(),
            });
        }
        let id = Self::store_node(&self.nodes, record, Some(parent))?;
        debug!(tree = %self.key(), node = %id, parent, "added node");
        Ok(id)
    }

    /// Replaces the node's fields. The stored `parent_id` is kept, so a node
    /// cannot be moved through an update.
    fn update_node(&self, mut record: NodeRecord) -> CollectionResult<()> {
        let id = self.id_of(&record)?.to_string();
        let current = self.read_record(&id)?;
        let parent = parent_of(&current).map(str::to_owned);
        record.remove(ID_FIELD);
        Self::write_record(&self.nodes, &id, record, parent.as_deref())
    }

    /// Removes one flat entry. Children of the removed node are left in the
    /// map and become unreachable; [`RemoteTree::validate`] reports them.
    fn delete_node(&self, record: &NodeRecord) -> CollectionResult<()> {
        let id = self.id_of(record)?;
        if id == self.root_node_id {
            return Err(CollectionError::InvalidArgument(format!(
                "root node {id} of {} cannot be deleted",
                self.key()
            )));
        }
        match self.nodes.remove(id) {
            Err(CollectionError::FieldNotFound { .. }) => Err(self.node_not_found(id)),
            other => {
                other?;
                debug!(tree = %self.key(), node = %id, "deleted node");
                Ok(())
            }
        }
    }

    /// Reads the node map once and nests every node reachable from the
    /// root. Nodes without children carry no `children` field at all.
    fn get_tree(&self) -> CollectionResult<Value> {
        let snapshot = Self::load(&self.nodes)?;
        if !snapshot.contains_key(&self.root_node_id) {
            return Err(self.node_not_found(&self.root_node_id));
        }
        let index = child_index(&snapshot);
        Ok(Self::assemble(&self.root_node_id, &snapshot, &index))
    }
}
