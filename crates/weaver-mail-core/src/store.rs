//! Tree commands.
//!
//! Every command is a pure function from a tree snapshot to a new snapshot.
//! Work happens on a shallow clone; if any check fails the clone is dropped
//! and the input comes back unchanged, so a command either fully applies or
//! not at all. The `try_` variants report why a command was skipped.

use serde_json::{Map, Value};

use crate::error::TreeError;
use crate::properties::{NodeKind, Properties, deep_merge};
use crate::registry::{self, MIN_COLUMNS, defaults_for};
use crate::tree::{Node, NodeId, Tree};

/// A partial properties object, deep-merged into a node's properties.
pub type PropertiesPatch = Map<String, Value>;

/// Add a component with default properties under `parent`.
///
/// Returns the new tree and the id of the created node. Adding `columns`
/// also creates its default number of empty `column` children.
pub fn add_component(
    tree: &Tree,
    kind: NodeKind,
    parent: &str,
    index: Option<usize>,
) -> (Tree, Option<NodeId>) {
    match try_add_component(tree, kind, parent, index) {
        Ok((next, id)) => (next, Some(id)),
        Err(err) => (skipped(tree, "add_component", &err), None),
    }
}

pub fn try_add_component(
    tree: &Tree,
    kind: NodeKind,
    parent: &str,
    index: Option<usize>,
) -> Result<(Tree, NodeId), TreeError> {
    let mut next = tree.clone();
    let id = insert_component(&mut next, kind, parent, index)?;
    Ok((next, id))
}

/// Remove a node and its whole subtree.
pub fn remove_component(tree: &Tree, id: &str) -> Tree {
    try_remove_component(tree, id).unwrap_or_else(|err| skipped(tree, "remove_component", &err))
}

pub fn try_remove_component(tree: &Tree, id: &str) -> Result<Tree, TreeError> {
    let mut next = tree.clone();
    detach_and_delete(&mut next, id)?;
    Ok(next)
}

/// Deep-merge `patch` into the properties of `id`.
pub fn update_component(tree: &Tree, id: &str, patch: &PropertiesPatch) -> Tree {
    try_update_component(tree, id, patch)
        .unwrap_or_else(|err| skipped(tree, "update_component", &err))
}

pub fn try_update_component(
    tree: &Tree,
    id: &str,
    patch: &PropertiesPatch,
) -> Result<Tree, TreeError> {
    let mut next = tree.clone();
    patch_properties(&mut next, id, patch)?;
    Ok(next)
}

/// Move the child at `old_index` of `parent` to `new_index`.
///
/// Array move semantics: the entry is removed first, then inserted, so
/// applying the inverse indices restores the original order.
pub fn reorder_components(tree: &Tree, parent: &str, old_index: usize, new_index: usize) -> Tree {
    try_reorder_components(tree, parent, old_index, new_index)
        .unwrap_or_else(|err| skipped(tree, "reorder_components", &err))
}

pub fn try_reorder_components(
    tree: &Tree,
    parent: &str,
    old_index: usize,
    new_index: usize,
) -> Result<Tree, TreeError> {
    let len = tree
        .get(parent)
        .ok_or_else(|| TreeError::MissingNode(parent.into()))?
        .children()
        .len();
    for index in [old_index, new_index] {
        if index >= len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }
    }

    let mut next = tree.clone();
    if let Some(children) = next.children_mut(parent) {
        let moved = children.remove(old_index);
        children.insert(new_index, moved);
    }
    Ok(next)
}

/// Re-parent `id` under `target`, at `index` or appended.
pub fn move_component(tree: &Tree, id: &str, target: &str, index: Option<usize>) -> Tree {
    try_move_component(tree, id, target, index)
        .unwrap_or_else(|err| skipped(tree, "move_component", &err))
}

pub fn try_move_component(
    tree: &Tree,
    id: &str,
    target: &str,
    index: Option<usize>,
) -> Result<Tree, TreeError> {
    let mut next = tree.clone();
    reparent(&mut next, id, target, index)?;
    Ok(next)
}

/// Resize a `columns` node to `count` columns, clamped to [2, 4].
///
/// Shrinking deletes the trailing columns together with everything inside
/// them. Confirming that loss is up to the caller.
pub fn set_columns_count(tree: &Tree, columns: &str, count: usize) -> Tree {
    try_set_columns_count(tree, columns, count)
        .unwrap_or_else(|err| skipped(tree, "set_columns_count", &err))
}

pub fn try_set_columns_count(tree: &Tree, columns: &str, count: usize) -> Result<Tree, TreeError> {
    let mut next = tree.clone();
    resize_columns(&mut next, columns, count)?;
    Ok(next)
}

fn skipped(tree: &Tree, command: &'static str, err: &TreeError) -> Tree {
    tracing::debug!(command, reason = %err, "command skipped, tree unchanged");
    tree.clone()
}

fn missing(id: &str) -> TreeError {
    TreeError::MissingNode(id.into())
}

fn insert_component(
    tree: &mut Tree,
    kind: NodeKind,
    parent: &str,
    index: Option<usize>,
) -> Result<NodeId, TreeError> {
    let parent_node = tree.get(parent).ok_or_else(|| missing(parent))?;
    let parent_kind = parent_node.kind();
    if kind == NodeKind::Column {
        return Err(TreeError::ColumnManaged);
    }
    if !registry::accepts_child(parent_kind, kind) {
        return Err(TreeError::IllegalChild {
            parent: parent_kind,
            child: kind,
        });
    }
    let parent_id = parent_node.id().clone();
    let len = parent_node.children().len();

    let properties = defaults_for(kind);
    let column_count = properties.as_columns().map(|c| c.columns as usize);
    let id = tree.mint_id(kind);
    tree.insert(Node::new(id.clone(), Some(parent_id), properties));

    if let Some(count) = column_count {
        let count = registry::clamp_columns(count);
        for _ in 0..count {
            append_column(tree, &id);
        }
        write_column_count(tree, &id, count);
    }

    let children = tree.children_mut(parent).ok_or_else(|| missing(parent))?;
    let slot = index.unwrap_or(len).min(len);
    children.insert(slot, id.clone());
    tracing::trace!(%id, %kind, parent, slot, "component added");
    Ok(id)
}

pub(crate) fn append_column(tree: &mut Tree, columns: &NodeId) -> NodeId {
    let id = tree.mint_id(NodeKind::Column);
    tree.insert(Node::new(
        id.clone(),
        Some(columns.clone()),
        defaults_for(NodeKind::Column),
    ));
    if let Some(children) = tree.children_mut(columns) {
        children.push(id.clone());
    }
    id
}

pub(crate) fn write_column_count(tree: &mut Tree, columns: &str, count: usize) {
    if let Some(node) = tree.node_mut(columns) {
        if let Properties::Columns(props) = &mut node.properties {
            props.columns = count as u32;
        }
    }
}

fn detach_and_delete(tree: &mut Tree, id: &str) -> Result<(), TreeError> {
    let node = tree.get(id).ok_or_else(|| missing(id))?;
    if node.id().is_root() {
        return Err(TreeError::RootIsFixed("removed"));
    }
    let kind = node.kind();
    let parent = node.parent().cloned();

    if let Some(parent) = &parent {
        if kind == NodeKind::Column {
            let siblings = tree.get(parent).map_or(0, |p| p.children().len());
            if siblings <= MIN_COLUMNS {
                return Err(TreeError::TooFewColumns { min: MIN_COLUMNS });
            }
        }
        if let Some(children) = tree.children_mut(parent) {
            children.retain(|child| child != id);
        }
        if kind == NodeKind::Column {
            let remaining = tree.get(parent).map_or(0, |p| p.children().len());
            write_column_count(tree, parent, remaining);
        }
    }

    delete_subtree(tree, id);
    Ok(())
}

/// Delete `id` and every descendant with an explicit worklist.
///
/// The caller is responsible for detaching `id` from its parent first.
pub(crate) fn delete_subtree(tree: &mut Tree, id: &str) -> usize {
    let mut worklist = vec![NodeId::from(id)];
    let mut removed = 0;
    while let Some(next) = worklist.pop() {
        if let Some(node) = tree.take(&next) {
            worklist.extend(node.children().iter().cloned());
            removed += 1;
        }
    }
    tracing::trace!(id, removed, "subtree deleted");
    removed
}

fn patch_properties(tree: &mut Tree, id: &str, patch: &PropertiesPatch) -> Result<(), TreeError> {
    let node = tree.get(id).ok_or_else(|| missing(id))?;
    let kind = node.kind();
    let invalid = |err: serde_json::Error| TreeError::InvalidPatch {
        kind,
        message: err.to_string(),
    };

    let mut merged = node.properties().to_value().map_err(invalid)?;
    deep_merge(&mut merged, &Value::Object(patch.clone()));
    let mut properties = Properties::from_value(kind, merged).map_err(invalid)?;

    registry::clamp_properties(&mut properties);
    let mut requested_columns = None;
    if let Properties::Columns(columns) = &mut properties {
        // The count is owned by resize_columns below.
        if columns.columns as usize != node.children().len() {
            requested_columns = Some(columns.columns as usize);
        }
        columns.columns = node.children().len() as u32;
    }

    if let Some(node) = tree.node_mut(id) {
        node.properties = properties;
    }
    if let Some(count) = requested_columns {
        resize_columns(tree, id, count)?;
    }
    Ok(())
}

fn reparent(
    tree: &mut Tree,
    id: &str,
    target: &str,
    index: Option<usize>,
) -> Result<(), TreeError> {
    let node = tree.get(id).ok_or_else(|| missing(id))?;
    if node.id().is_root() {
        return Err(TreeError::RootIsFixed("moved"));
    }
    let kind = node.kind();
    if kind == NodeKind::Column {
        return Err(TreeError::ColumnManaged);
    }
    let old_parent = node.parent().cloned();

    let target_node = tree.get(target).ok_or_else(|| missing(target))?;
    let target_kind = target_node.kind();
    if !registry::accepts_child(target_kind, kind) {
        return Err(TreeError::IllegalChild {
            parent: target_kind,
            child: kind,
        });
    }
    if target == id || tree.is_ancestor(id, target) {
        return Err(TreeError::Cycle {
            id: id.into(),
            target: target.into(),
        });
    }

    if let Some(old_parent) = &old_parent {
        if let Some(children) = tree.children_mut(old_parent) {
            children.retain(|child| child != id);
        }
    }
    let children = tree.children_mut(target).ok_or_else(|| missing(target))?;
    let slot = index.map_or(children.len(), |i| i.min(children.len()));
    children.insert(slot, id.into());
    if let Some(node) = tree.node_mut(id) {
        node.parent = Some(target.into());
    }
    tracing::trace!(id, target, slot, "component moved");
    Ok(())
}

fn resize_columns(tree: &mut Tree, columns: &str, count: usize) -> Result<(), TreeError> {
    let node = tree.get(columns).ok_or_else(|| missing(columns))?;
    if node.kind() != NodeKind::Columns {
        return Err(TreeError::WrongKind {
            id: node.id().clone(),
            actual: node.kind(),
            expected: NodeKind::Columns,
        });
    }
    let columns_id = node.id().clone();
    let current = node.children().to_vec();
    let target = registry::clamp_columns(count);

    if target > current.len() {
        for _ in current.len()..target {
            append_column(tree, &columns_id);
        }
    } else if target < current.len() {
        if let Some(children) = tree.children_mut(columns) {
            children.truncate(target);
        }
        let mut removed = 0;
        for dropped in &current[target..] {
            removed += delete_subtree(tree, dropped);
        }
        tracing::debug!(columns, target, removed, "columns shrunk, trailing subtrees deleted");
    }

    write_column_count(tree, columns, target);
    Ok(())
}
