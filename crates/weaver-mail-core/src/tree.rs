//! The component tree: an arena of nodes keyed by id.
//!
//! Nodes point at their parent and list their children by id, so moving a
//! subtree is a pair of id rewrites. Node entries are reference counted:
//! cloning a `Tree` is shallow, and mutation copies only the touched entries.

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};

use crate::error::InvariantViolation;
use crate::properties::{NodeKind, Properties, RootProps};
use crate::registry::{self, MAX_COLUMNS, MIN_COLUMNS};

/// Reserved id of the root node.
pub const ROOT_ID: &str = "root";

/// Opaque unique node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(SmolStr);

impl NodeId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(SmolStr::new(id))
    }

    pub fn root() -> Self {
        Self(SmolStr::new_static(ROOT_ID))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ID
    }

    /// Numeric suffix of a minted id (`text-12` → 12).
    fn sequence(&self) -> Option<u64> {
        self.0.rsplit_once('-')?.1.parse().ok()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for NodeId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(SmolStr::from(id))
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A single placed component.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) properties: Properties,
    pub(crate) children: Option<Vec<NodeId>>,
}

impl Node {
    /// A node with the given properties and, for containers, an empty
    /// children list.
    pub(crate) fn new(id: NodeId, parent: Option<NodeId>, properties: Properties) -> Self {
        let children = registry::can_contain_children(properties.kind()).then(Vec::new);
        Self {
            id,
            parent,
            properties,
            children,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.properties.kind()
    }

    pub fn parent(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Child ids in order; empty for leaves.
    pub fn children(&self) -> &[NodeId] {
        self.children.as_deref().unwrap_or_default()
    }

    /// `None` for leaf kinds, `Some` (possibly empty) for containers.
    pub fn child_list(&self) -> Option<&[NodeId]> {
        self.children.as_deref()
    }
}

/// The full id-keyed map of nodes rooted at `"root"`.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: HashMap<NodeId, Arc<Node>>,
    next_seq: u64,
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// An empty tree: a root with registry defaults and no children.
    pub fn new() -> Self {
        let root = Node::new(NodeId::root(), None, registry::defaults_for(NodeKind::Root));
        Self::from_nodes([root])
    }

    /// Assemble a tree from already-consistent nodes.
    pub(crate) fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let nodes: HashMap<NodeId, Arc<Node>> = nodes
            .into_iter()
            .map(|node| (node.id.clone(), Arc::new(node)))
            .collect();
        let next_seq = nodes
            .keys()
            .filter_map(NodeId::sequence)
            .max()
            .map_or(1, |seq| seq.saturating_add(1));
        Self { nodes, next_seq }
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id).map(Arc::as_ref)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn root(&self) -> Option<&Node> {
        self.get(ROOT_ID)
    }

    pub fn root_properties(&self) -> Option<&RootProps> {
        self.root().and_then(|root| root.properties.as_root())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().map(Arc::as_ref)
    }

    /// Nodes reachable from the root, depth first, children in order.
    pub fn walk(&self) -> Vec<&Node> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut seen = HashSet::new();
        let mut stack = vec![ROOT_ID];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            if !seen.insert(node.id.as_str()) {
                continue;
            }
            out.push(node);
            stack.extend(node.children().iter().rev().map(NodeId::as_str));
        }
        out
    }

    /// Every transitive descendant of `id`, excluding `id` itself.
    pub fn descendants(&self, id: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<&NodeId> = match self.get(id) {
            Some(node) => node.children().iter().collect(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            if out.len() > self.nodes.len() {
                break;
            }
            out.push(next.clone());
            if let Some(node) = self.get(next) {
                stack.extend(node.children());
            }
        }
        out
    }

    /// Whether `ancestor` lies on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: &str, id: &str) -> bool {
        let mut current = self.get(id).and_then(Node::parent);
        // A parent chain longer than the tree means a cycle.
        for _ in 0..self.nodes.len() {
            match current {
                Some(parent) if parent == ancestor => return true,
                Some(parent) => current = self.get(parent).and_then(Node::parent),
                None => return false,
            }
        }
        false
    }

    /// The first broken invariant, if any.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        match self.violations().into_iter().next() {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }

    /// Every broken structural invariant.
    pub fn violations(&self) -> Vec<InvariantViolation> {
        let mut found = Vec::new();

        match self.root() {
            None => {
                found.push(InvariantViolation::MissingRoot);
                return found;
            }
            Some(root) => {
                if root.kind() != NodeKind::Root {
                    found.push(InvariantViolation::RootKind(root.kind()));
                }
                if let Some(parent) = root.parent() {
                    found.push(InvariantViolation::RootHasParent(parent.clone()));
                }
                if let Some(props) = root.properties.as_root() {
                    if registry::clamp_content_width(props.max_width) != props.max_width {
                        found.push(InvariantViolation::MaxWidthOutOfRange(props.max_width));
                    }
                }
            }
        }

        let mut ids: Vec<&NodeId> = self.nodes.keys().collect();
        ids.sort();
        for id in ids {
            let Some(node) = self.get(id) else { continue };
            let kind = node.kind();

            match (&node.children, registry::can_contain_children(kind)) {
                (Some(_), false) => found.push(InvariantViolation::LeafWithChildren {
                    id: id.clone(),
                    kind,
                }),
                (None, true) => {
                    found.push(InvariantViolation::ContainerWithoutChildren { id: id.clone() })
                }
                _ => {}
            }

            for child_id in node.children() {
                match self.get(child_id) {
                    None => found.push(InvariantViolation::DanglingChild {
                        parent: id.clone(),
                        child: child_id.clone(),
                    }),
                    Some(child) => {
                        if child.parent() != Some(id) {
                            found.push(InvariantViolation::ParentMismatch {
                                child: child_id.clone(),
                                listed_by: id.clone(),
                                parent: child.parent.clone(),
                            });
                        }
                        if !registry::accepts_child(kind, child.kind()) {
                            found.push(InvariantViolation::IllegalChild {
                                parent: id.clone(),
                                parent_kind: kind,
                                child: child_id.clone(),
                                child_kind: child.kind(),
                            });
                        }
                    }
                }
            }

            if let Some(columns) = node.properties.as_columns() {
                let count = node.children().len();
                if !(MIN_COLUMNS..=MAX_COLUMNS).contains(&count) {
                    found.push(InvariantViolation::ColumnCount {
                        id: id.clone(),
                        count,
                    });
                }
                if columns.columns as usize != count {
                    found.push(InvariantViolation::ColumnsPropertyMismatch {
                        id: id.clone(),
                        recorded: columns.columns,
                        actual: count,
                    });
                }
            }

            if id.is_root() {
                continue;
            }
            match node.parent() {
                None => found.push(InvariantViolation::Orphan { id: id.clone() }),
                Some(parent_id) => match self.get(parent_id) {
                    None => found.push(InvariantViolation::MissingParent {
                        id: id.clone(),
                        parent: parent_id.clone(),
                    }),
                    Some(parent) => {
                        let listed = parent.children().iter().filter(|c| *c == id).count();
                        if listed != 1 {
                            found.push(InvariantViolation::NotListedOnce {
                                id: id.clone(),
                                parent: parent_id.clone(),
                            });
                        }
                    }
                },
            }
            if self.is_ancestor(id, id) {
                found.push(InvariantViolation::Cycle(id.clone()));
            }
        }

        found
    }

    // Mutation stays inside the crate: only store commands edit the map.

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id).map(Arc::make_mut)
    }

    pub(crate) fn children_mut(&mut self, id: &str) -> Option<&mut Vec<NodeId>> {
        self.node_mut(id)?.children.as_mut()
    }

    pub(crate) fn insert(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), Arc::new(node));
    }

    pub(crate) fn take(&mut self, id: &str) -> Option<Arc<Node>> {
        self.nodes.remove(id)
    }

    /// Mint an unused id of the form `{kind}-{n}`.
    pub(crate) fn mint_id(&mut self, kind: NodeKind) -> NodeId {
        loop {
            let candidate = NodeId(format_smolstr!("{}-{}", kind, self.next_seq));
            self.next_seq = self.next_seq.saturating_add(1);
            if !self.nodes.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::defaults_for;

    fn leaf(id: &str, parent: &str, kind: NodeKind) -> Node {
        Node::new(id.into(), Some(parent.into()), defaults_for(kind))
    }

    #[test]
    fn test_new_tree_is_valid() {
        let tree = Tree::new();
        assert_eq!(tree.len(), 1);
        let root = tree.root().unwrap();
        assert_eq!(root.kind(), NodeKind::Root);
        assert!(root.parent().is_none());
        assert_eq!(root.child_list(), Some(&[][..]));
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn test_mint_id_skips_taken_ids() {
        let mut root = Node::new(NodeId::root(), None, defaults_for(NodeKind::Root));
        root.children = Some(vec!["text-3".into()]);
        let mut tree = Tree::from_nodes([root, leaf("text-3", "root", NodeKind::Text)]);
        // Sequence resumes after the highest suffix present.
        assert_eq!(tree.mint_id(NodeKind::Spacer), "spacer-4");
        assert_eq!(tree.mint_id(NodeKind::Text), "text-5");
    }

    #[test]
    fn test_walk_is_preorder() {
        let mut root = Node::new(NodeId::root(), None, defaults_for(NodeKind::Root));
        root.children = Some(vec!["a".into(), "b".into()]);
        let tree = Tree::from_nodes([
            root,
            leaf("a", "root", NodeKind::Text),
            leaf("b", "root", NodeKind::Spacer),
        ]);
        let order: Vec<&str> = tree.walk().into_iter().map(|n| n.id().as_str()).collect();
        assert_eq!(order, vec!["root", "a", "b"]);
    }

    #[test]
    fn test_violations_report_broken_links() {
        let mut root = Node::new(NodeId::root(), None, defaults_for(NodeKind::Root));
        root.children = Some(vec!["ghost".into()]);
        let tree = Tree::from_nodes([root, leaf("lost", "nowhere", NodeKind::Text)]);
        let violations = tree.violations();
        assert!(violations.contains(&InvariantViolation::DanglingChild {
            parent: NodeId::root(),
            child: "ghost".into(),
        }));
        assert!(violations.contains(&InvariantViolation::MissingParent {
            id: "lost".into(),
            parent: "nowhere".into(),
        }));
    }

    #[test]
    fn test_is_ancestor() {
        let mut root = Node::new(NodeId::root(), None, defaults_for(NodeKind::Root));
        root.children = Some(vec!["cols".into()]);
        let mut cols = leaf("cols", "root", NodeKind::Columns);
        cols.children = Some(vec!["c1".into()]);
        let tree = Tree::from_nodes([root, cols, leaf("c1", "cols", NodeKind::Column)]);
        assert!(tree.is_ancestor("root", "c1"));
        assert!(tree.is_ancestor("cols", "c1"));
        assert!(!tree.is_ancestor("c1", "cols"));
        assert_eq!(tree.descendants("root").len(), 2);
    }
}
