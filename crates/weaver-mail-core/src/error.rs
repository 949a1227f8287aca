//! Error types for weaver-mail.
//!
//! Tree commands never fail outright; a `TreeError` explains why a command
//! was skipped. `InvariantViolation` reports a structurally broken tree and
//! `PersistError` wraps JSON decoding failures with their source location.

use miette::{Diagnostic, NamedSource, SourceOffset, SourceSpan};
use smol_str::SmolStr;

use crate::properties::NodeKind;
use crate::tree::NodeId;

/// Why a tree command left the tree unchanged.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Diagnostic)]
#[non_exhaustive]
pub enum TreeError {
    #[error("node `{0}` does not exist")]
    #[diagnostic(code(weaver_mail::tree::missing_node))]
    MissingNode(NodeId),

    #[error("the root node cannot be {0}")]
    #[diagnostic(code(weaver_mail::tree::root_fixed))]
    RootIsFixed(&'static str),

    #[error("a {parent} node cannot contain a {child} node")]
    #[diagnostic(code(weaver_mail::tree::illegal_child))]
    IllegalChild { parent: NodeKind, child: NodeKind },

    #[error("index {index} is out of range for {len} children")]
    #[diagnostic(code(weaver_mail::tree::index))]
    IndexOutOfRange { index: usize, len: usize },

    #[error("`{id}` is a {actual} node, expected {expected}")]
    #[diagnostic(code(weaver_mail::tree::wrong_kind))]
    WrongKind {
        id: NodeId,
        actual: NodeKind,
        expected: NodeKind,
    },

    #[error("moving `{id}` under `{target}` would make it its own ancestor")]
    #[diagnostic(code(weaver_mail::tree::cycle))]
    Cycle { id: NodeId, target: NodeId },

    #[error("a columns node keeps at least {min} columns")]
    #[diagnostic(
        code(weaver_mail::tree::too_few_columns),
        help("use set_columns_count to shrink a columns node")
    )]
    TooFewColumns { min: usize },

    #[error("column nodes only move with their columns container")]
    #[diagnostic(code(weaver_mail::tree::column_managed))]
    ColumnManaged,

    #[error("properties patch does not fit a {kind} node: {message}")]
    #[diagnostic(code(weaver_mail::tree::invalid_patch))]
    InvalidPatch { kind: NodeKind, message: String },
}

/// A broken structural invariant, as found by `Tree::violations`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Diagnostic)]
#[non_exhaustive]
pub enum InvariantViolation {
    #[error("tree has no root node")]
    #[diagnostic(code(weaver_mail::invariant::missing_root))]
    MissingRoot,

    #[error("node `root` is a {0} node")]
    #[diagnostic(code(weaver_mail::invariant::root_kind))]
    RootKind(NodeKind),

    #[error("root node has parent `{0}`")]
    #[diagnostic(code(weaver_mail::invariant::root_parent))]
    RootHasParent(NodeId),

    #[error("`{parent}` lists missing child `{child}`")]
    #[diagnostic(code(weaver_mail::invariant::dangling_child))]
    DanglingChild { parent: NodeId, child: NodeId },

    #[error("`{child}` is listed by `{listed_by}` but names {parent:?} as parent")]
    #[diagnostic(code(weaver_mail::invariant::parent_mismatch))]
    ParentMismatch {
        child: NodeId,
        listed_by: NodeId,
        parent: Option<NodeId>,
    },

    #[error("`{id}` names missing parent `{parent}`")]
    #[diagnostic(code(weaver_mail::invariant::missing_parent))]
    MissingParent { id: NodeId, parent: NodeId },

    #[error("`{id}` is not listed exactly once by its parent `{parent}`")]
    #[diagnostic(code(weaver_mail::invariant::not_listed))]
    NotListedOnce { id: NodeId, parent: NodeId },

    #[error("`{id}` has no parent")]
    #[diagnostic(code(weaver_mail::invariant::orphan))]
    Orphan { id: NodeId },

    #[error("{kind} node `{id}` has a children list")]
    #[diagnostic(code(weaver_mail::invariant::leaf_children))]
    LeafWithChildren { id: NodeId, kind: NodeKind },

    #[error("container `{id}` has no children list")]
    #[diagnostic(code(weaver_mail::invariant::container_children))]
    ContainerWithoutChildren { id: NodeId },

    #[error("{parent_kind} node `{parent}` holds {child_kind} node `{child}`")]
    #[diagnostic(code(weaver_mail::invariant::illegal_child))]
    IllegalChild {
        parent: NodeId,
        parent_kind: NodeKind,
        child: NodeId,
        child_kind: NodeKind,
    },

    #[error("columns node `{id}` owns {count} columns")]
    #[diagnostic(code(weaver_mail::invariant::column_count))]
    ColumnCount { id: NodeId, count: usize },

    #[error("columns node `{id}` records {recorded} columns but owns {actual}")]
    #[diagnostic(code(weaver_mail::invariant::column_property))]
    ColumnsPropertyMismatch {
        id: NodeId,
        recorded: u32,
        actual: usize,
    },

    #[error("root max width {0} is outside [320, 1200]")]
    #[diagnostic(code(weaver_mail::invariant::max_width))]
    MaxWidthOutOfRange(u32),

    #[error("`{0}` is its own ancestor")]
    #[diagnostic(code(weaver_mail::invariant::cycle))]
    Cycle(NodeId),

    #[error("record `{id}` has unknown type `{kind}`")]
    #[diagnostic(code(weaver_mail::invariant::unknown_kind))]
    UnknownKind { id: NodeId, kind: SmolStr },
}

/// Failure to decode persisted tree bytes.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[error("could not read persisted tree: {source}")]
#[diagnostic(code(weaver_mail::persist::json))]
pub struct PersistError {
    #[source]
    source: serde_json::Error,
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    location: Option<SourceSpan>,
}

impl PersistError {
    /// Attach the offending document to a JSON error so the diagnostic can
    /// point at the failing line and column.
    pub fn from_json(source: serde_json::Error, name: &str, text: &str) -> Self {
        let location = (source.line() > 0).then(|| {
            SourceSpan::new(
                SourceOffset::from_location(text, source.line(), source.column()),
                0,
            )
        });
        Self {
            source,
            src: NamedSource::new(name, text.to_owned()),
            location,
        }
    }

    pub fn json(&self) -> &serde_json::Error {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_error_messages() {
        let err = TreeError::IllegalChild {
            parent: NodeKind::Columns,
            child: NodeKind::Text,
        };
        assert_eq!(err.to_string(), "a columns node cannot contain a text node");

        let err = TreeError::MissingNode(NodeId::from("text-4"));
        assert_eq!(err.to_string(), "node `text-4` does not exist");
    }

    #[test]
    fn test_violation_messages() {
        let violation = InvariantViolation::ColumnsPropertyMismatch {
            id: "columns-2".into(),
            recorded: 3,
            actual: 2,
        };
        insta::assert_snapshot!(violation.to_string(), @"columns node `columns-2` records 3 columns but owns 2");
        let violation = InvariantViolation::UnknownKind {
            id: "w".into(),
            kind: "widget".into(),
        };
        insta::assert_snapshot!(violation.to_string(), @"record `w` has unknown type `widget`");
    }

    #[test]
    fn test_persist_error_locates_failure() {
        let text = "{\n  \"root\": oops\n}";
        let json = serde_json::from_str::<serde_json::Value>(text).unwrap_err();
        let err = PersistError::from_json(json, "tree.json", text);
        assert!(err.location.is_some());
        assert!(err.to_string().starts_with("could not read persisted tree"));
    }
}
