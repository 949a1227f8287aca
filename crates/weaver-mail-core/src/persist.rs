//! Persistence boundary: trees to flat JSON records and back.
//!
//! Reading is lenient. Partial or legacy data is repaired into a valid tree
//! rather than rejected, and reading already-repaired data changes nothing.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smol_str::SmolStr;

use crate::error::{InvariantViolation, PersistError};
use crate::properties::{NodeKind, Properties, deep_merge};
use crate::registry::{self, MAX_COLUMNS, MIN_COLUMNS, defaults_for};
use crate::store::{append_column, write_column_count};
use crate::tree::{Node, NodeId, ROOT_ID, Tree};

/// One node as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: NodeId,
    /// Kind name. Kept as a string so unknown kinds survive parsing and get
    /// dropped during repair instead of failing the whole document.
    #[serde(rename = "type")]
    pub kind: SmolStr,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub properties: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeId>>,
}

/// The persisted form of a tree: records keyed by id, sorted for stable output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedTree {
    pub nodes: BTreeMap<NodeId, NodeRecord>,
}

impl PersistedTree {
    /// Strictly parse persisted JSON. Syntax and shape errors carry the
    /// failing location.
    pub fn from_json_str(src: &str) -> Result<Self, PersistError> {
        serde_json::from_str(src).map_err(|err| PersistError::from_json(err, "tree.json", src))
    }

    pub fn to_json_string(&self) -> Result<String, PersistError> {
        serde_json::to_string(self).map_err(|err| PersistError::from_json(err, "tree.json", ""))
    }

    pub fn to_json_string_pretty(&self) -> Result<String, PersistError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| PersistError::from_json(err, "tree.json", ""))
    }
}

/// Flatten a tree into persisted records.
pub fn serialize(tree: &Tree) -> PersistedTree {
    let nodes = tree
        .nodes()
        .map(|node| {
            let properties = node.properties().to_value().unwrap_or_else(|err| {
                tracing::warn!(id = %node.id(), error = %err, "properties did not serialize");
                Value::Null
            });
            let record = NodeRecord {
                id: node.id().clone(),
                kind: SmolStr::new_static(node.kind().as_str()),
                parent_id: node.parent().cloned(),
                properties,
                children: node.child_list().map(<[NodeId]>::to_vec),
            };
            (node.id().clone(), record)
        })
        .collect();
    PersistedTree { nodes }
}

/// Rebuild a tree from persisted records, repairing what it can.
///
/// Missing input or a missing `root` record gives a fresh empty tree. The
/// tree is rebuilt breadth first from the root along children lists, so
/// anything unreachable from the root is dropped, along with unknown kinds,
/// dangling ids, nodes claimed by a second parent and children a parent kind
/// does not accept. Columns are truncated to four and padded to two.
pub fn deserialize(persisted: Option<&PersistedTree>) -> Tree {
    let Some(persisted) = persisted else {
        return Tree::new();
    };
    let records = &persisted.nodes;
    let Some(root_record) = records.get(ROOT_ID) else {
        tracing::debug!(records = records.len(), "no root record, starting empty");
        return Tree::new();
    };

    let mut root_properties = read_properties(NodeKind::Root, &root_record.properties);
    registry::clamp_properties(&mut root_properties);

    let mut built: HashMap<NodeId, Node> = HashMap::with_capacity(records.len());
    let mut claimed: HashSet<NodeId> = HashSet::from([NodeId::root()]);
    let mut queue = VecDeque::from([NodeId::root()]);
    built.insert(
        NodeId::root(),
        Node::new(NodeId::root(), None, root_properties),
    );

    while let Some(parent_id) = queue.pop_front() {
        let Some(parent_kind) = built.get(&parent_id).map(Node::kind) else {
            continue;
        };
        let listed = records
            .get(&parent_id)
            .and_then(|record| record.children.as_deref())
            .unwrap_or_default();

        let mut accepted = Vec::with_capacity(listed.len());
        for child_id in listed {
            if parent_kind == NodeKind::Columns && accepted.len() >= MAX_COLUMNS {
                tracing::debug!(%parent_id, %child_id, "dropping column past the maximum");
                break;
            }
            let Some(record) = records.get(child_id) else {
                tracing::debug!(%parent_id, %child_id, "dropping dangling child");
                continue;
            };
            let Some(kind) = NodeKind::from_name(&record.kind) else {
                tracing::debug!(%child_id, kind = %record.kind, "dropping unknown kind");
                continue;
            };
            if !registry::accepts_child(parent_kind, kind) {
                tracing::debug!(%parent_id, %child_id, %kind, "dropping illegal child");
                continue;
            }
            if !claimed.insert(child_id.clone()) {
                tracing::debug!(%parent_id, %child_id, "dropping child claimed twice");
                continue;
            }

            let mut properties = read_properties(kind, &record.properties);
            registry::clamp_properties(&mut properties);
            built.insert(
                child_id.clone(),
                Node::new(child_id.clone(), Some(parent_id.clone()), properties),
            );
            if registry::can_contain_children(kind) {
                queue.push_back(child_id.clone());
            }
            accepted.push(child_id.clone());
        }

        if let Some(parent) = built.get_mut(&parent_id) {
            if parent.children.is_some() {
                parent.children = Some(accepted);
            }
        }
    }

    let dropped = records.len().saturating_sub(built.len());
    if dropped > 0 {
        tracing::debug!(dropped, "unreachable or invalid records dropped");
    }

    let mut columns_ids: Vec<NodeId> = built
        .values()
        .filter(|node| node.kind() == NodeKind::Columns)
        .map(|node| node.id().clone())
        .collect();
    columns_ids.sort();

    let mut tree = Tree::from_nodes(built.into_values());
    for id in &columns_ids {
        let mut count = tree.get(id).map_or(0, |node| node.children().len());
        while count < MIN_COLUMNS {
            append_column(&mut tree, id);
            count += 1;
        }
        write_column_count(&mut tree, id, count);
    }
    tree
}

/// Rebuild a tree from any JSON value. Records that do not have the
/// persisted shape are skipped; anything else gives a fresh tree.
pub fn deserialize_value(value: &Value) -> Tree {
    let Value::Object(entries) = value else {
        tracing::debug!("persisted value is not an object, starting empty");
        return Tree::new();
    };
    let nodes = entries
        .iter()
        .filter_map(|(key, record)| {
            match serde_json::from_value::<NodeRecord>(record.clone()) {
                Ok(record) => Some((NodeId::from(key.as_str()), record)),
                Err(err) => {
                    tracing::debug!(key, error = %err, "skipping malformed record");
                    None
                }
            }
        })
        .collect();
    deserialize(Some(&PersistedTree { nodes }))
}

/// Parse JSON text and rebuild a tree from it. Only JSON syntax errors fail;
/// everything past that is repaired.
pub fn tree_from_json_str(src: &str, name: &str) -> Result<Tree, PersistError> {
    let value: Value =
        serde_json::from_str(src).map_err(|err| PersistError::from_json(err, name, src))?;
    Ok(deserialize_value(&value))
}

/// Check persisted records as they are, without repairing anything.
///
/// Records of unknown kind are reported and left out; everything else is
/// loaded verbatim and run through the structural checks of
/// [`Tree::violations`].
pub fn audit(persisted: &PersistedTree) -> Vec<InvariantViolation> {
    let mut found = Vec::new();
    let mut nodes = Vec::with_capacity(persisted.nodes.len());
    for (id, record) in &persisted.nodes {
        let Some(kind) = NodeKind::from_name(&record.kind) else {
            found.push(InvariantViolation::UnknownKind {
                id: id.clone(),
                kind: record.kind.clone(),
            });
            continue;
        };
        nodes.push(Node {
            id: id.clone(),
            parent: record.parent_id.clone(),
            properties: read_properties(kind, &record.properties),
            children: record.children.clone(),
        });
    }
    found.extend(Tree::from_nodes(nodes).violations());
    found
}

/// Read a record's properties, falling back to defaults key by key for
/// values that do not fit the kind's record.
fn read_properties(kind: NodeKind, value: &Value) -> Properties {
    let Value::Object(entries) = value else {
        return defaults_for(kind);
    };
    if let Ok(properties) = Properties::from_value(kind, value.clone()) {
        return properties;
    }

    let defaults = defaults_for(kind);
    let Ok(mut merged) = defaults.to_value() else {
        return defaults;
    };
    for (key, entry) in entries {
        // Out of range numbers get a second chance as whole numbers so the
        // clamp after decoding can pull them to the nearest legal value.
        let attempts = [
            entry.clone(),
            saturate_numbers(entry, u32::MAX),
            saturate_numbers(entry, u32::from(u8::MAX)),
        ];
        let fitted = attempts.into_iter().find_map(|attempt| {
            let mut candidate = merged.clone();
            let mut single = Map::new();
            single.insert(key.clone(), attempt);
            deep_merge(&mut candidate, &Value::Object(single));
            Properties::from_value(kind, candidate.clone())
                .is_ok()
                .then_some(candidate)
        });
        match fitted {
            Some(candidate) => merged = candidate,
            None => tracing::debug!(%kind, key, "property did not fit, keeping default"),
        }
    }
    Properties::from_value(kind, merged).unwrap_or(defaults)
}

/// `value` with every number floored into `0..=ceiling`.
fn saturate_numbers(value: &Value, ceiling: u32) -> Value {
    match value {
        Value::Number(number) => match number.as_f64() {
            Some(n) if n.is_finite() => {
                Value::from(n.floor().clamp(0.0, f64::from(ceiling)) as u32)
            }
            _ => value.clone(),
        },
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, entry)| (key.clone(), saturate_numbers(entry, ceiling)))
                .collect(),
        ),
        _ => value.clone(),
    }
}
