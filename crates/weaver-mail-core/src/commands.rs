//! Serializable tree commands and their dispatcher.
//!
//! `Command` is the wire form of the store operations, tagged by `op`:
//!
//! ```json
//! { "op": "addComponent", "type": "text", "parentId": "root" }
//! { "op": "setColumnsCount", "id": "columns-1", "count": 3 }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::properties::NodeKind;
use crate::store::{self, PropertiesPatch};
use crate::tree::{NodeId, Tree};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    /// Add a component with default properties.
    AddComponent {
        #[serde(rename = "type")]
        kind: NodeKind,
        parent_id: NodeId,
        /// Insertion index; appends when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },

    /// Remove a component and its subtree.
    RemoveComponent { id: NodeId },

    /// Deep-merge a partial properties object.
    UpdateComponent {
        id: NodeId,
        properties: PropertiesPatch,
    },

    /// Move a child within its parent.
    ReorderComponents {
        parent_id: NodeId,
        old_index: usize,
        new_index: usize,
    },

    /// Re-parent a component. A missing or negative index appends.
    MoveComponent {
        id: NodeId,
        target_parent_id: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_index: Option<i64>,
    },

    /// Resize a columns node. Out of range counts are clamped.
    SetColumnsCount { id: NodeId, count: i64 },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddComponent { .. } => "addComponent",
            Command::RemoveComponent { .. } => "removeComponent",
            Command::UpdateComponent { .. } => "updateComponent",
            Command::ReorderComponents { .. } => "reorderComponents",
            Command::MoveComponent { .. } => "moveComponent",
            Command::SetColumnsCount { .. } => "setColumnsCount",
        }
    }
}

/// What happened when a command ran.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The command passed its checks. `created` names the node an
    /// `addComponent` produced.
    Applied { created: Option<NodeId> },
    /// The command was rejected and the tree is unchanged.
    Skipped(TreeError),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied { .. })
    }
}

/// Result of [`execute`]: the next tree and how it was reached.
#[derive(Debug, Clone)]
pub struct Execution {
    pub tree: Tree,
    pub outcome: Outcome,
}

/// Run one command against a snapshot.
#[tracing::instrument(level = "debug", skip_all, fields(op = command.name()))]
pub fn execute(tree: &Tree, command: &Command) -> Execution {
    let result = match command {
        Command::AddComponent {
            kind,
            parent_id,
            index,
        } => store::try_add_component(tree, *kind, parent_id, *index)
            .map(|(next, id)| (next, Some(id))),
        Command::RemoveComponent { id } => {
            store::try_remove_component(tree, id).map(|next| (next, None))
        }
        Command::UpdateComponent { id, properties } => {
            store::try_update_component(tree, id, properties).map(|next| (next, None))
        }
        Command::ReorderComponents {
            parent_id,
            old_index,
            new_index,
        } => store::try_reorder_components(tree, parent_id, *old_index, *new_index)
            .map(|next| (next, None)),
        Command::MoveComponent {
            id,
            target_parent_id,
            target_index,
        } => {
            let index = target_index.and_then(|i| usize::try_from(i).ok());
            store::try_move_component(tree, id, target_parent_id, index).map(|next| (next, None))
        }
        Command::SetColumnsCount { id, count } => {
            let count = usize::try_from(*count).unwrap_or(0);
            store::try_set_columns_count(tree, id, count).map(|next| (next, None))
        }
    };

    match result {
        Ok((tree, created)) => Execution {
            tree,
            outcome: Outcome::Applied { created },
        },
        Err(err) => {
            tracing::debug!(reason = %err, "command skipped, tree unchanged");
            Execution {
                tree: tree.clone(),
                outcome: Outcome::Skipped(err),
            }
        }
    }
}
