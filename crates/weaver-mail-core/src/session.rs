//! Editing session: the current tree, the selected component, and history.
//!
//! Selection is UI state. It never lives in the tree and never enters
//! history; it is only kept pointing at a node that exists.

use crate::commands::{Command, Outcome, execute};
use crate::history::{History, UndoManager};
use crate::tree::{Node, NodeId, Tree};

#[derive(Debug, Clone, Default)]
pub struct EditSession {
    history: History,
    selected: Option<NodeId>,
}

impl EditSession {
    pub fn new(tree: Tree) -> Self {
        Self::with_history(History::new(tree, crate::history::DEFAULT_MAX_STEPS))
    }

    pub fn with_history(history: History) -> Self {
        Self {
            history,
            selected: None,
        }
    }

    pub fn tree(&self) -> &Tree {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selected(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.selected.as_deref().and_then(|id| self.tree().get(id))
    }

    /// Select a component, or clear the selection with `None`.
    ///
    /// Returns false and leaves the selection alone if `id` does not exist.
    pub fn select(&mut self, id: Option<&str>) -> bool {
        match id {
            None => {
                self.selected = None;
                true
            }
            Some(id) if self.tree().contains(id) => {
                self.selected = Some(id.into());
                true
            }
            Some(id) => {
                tracing::debug!(id, "ignoring selection of missing node");
                false
            }
        }
    }

    /// Run a command and commit the result.
    ///
    /// Skipped commands and commands that change nothing do not enter history.
    pub fn apply(&mut self, command: &Command) -> Outcome {
        let run = execute(self.tree(), command);
        if run.outcome.is_applied() && self.history.commit(run.tree) {
            self.prune_selection();
        }
        run.outcome
    }

    /// Replace the tree, dropping history and selection.
    pub fn load(&mut self, tree: Tree) {
        self.history.reset(tree);
        self.selected = None;
    }

    fn prune_selection(&mut self) {
        if let Some(id) = &self.selected {
            if !self.tree().contains(id) {
                tracing::trace!(%id, "selected node is gone, clearing selection");
                self.selected = None;
            }
        }
    }
}

impl UndoManager for EditSession {
    fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn undo(&mut self) -> bool {
        let undone = self.history.undo();
        if undone {
            self.prune_selection();
        }
        undone
    }

    fn redo(&mut self) -> bool {
        let redone = self.history.redo();
        if redone {
            self.prune_selection();
        }
        redone
    }

    fn clear_history(&mut self) {
        self.history.clear_history();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::NodeKind;
    use serde_json::json;

    fn add(kind: NodeKind, parent: &str) -> Command {
        Command::AddComponent {
            kind,
            parent_id: parent.into(),
            index: None,
        }
    }

    fn created(outcome: Outcome) -> NodeId {
        match outcome {
            Outcome::Applied { created: Some(id) } => id,
            other => panic!("expected a new node, got {other:?}"),
        }
    }

    #[test]
    fn test_select_requires_existing_node() {
        let mut session = EditSession::default();
        assert!(!session.select(Some("text-1")));
        assert!(session.selected().is_none());

        let id = created(session.apply(&add(NodeKind::Text, "root")));
        assert!(session.select(Some(id.as_str())));
        assert_eq!(session.selected_node().map(Node::kind), Some(NodeKind::Text));
        assert!(session.select(None));
        assert!(session.selected().is_none());
    }

    #[test]
    fn test_skipped_commands_stay_out_of_history() {
        let mut session = EditSession::default();
        let outcome = session.apply(&Command::RemoveComponent { id: NodeId::root() });
        assert!(!outcome.is_applied());
        assert!(!session.can_undo());

        let Some(patch) = json!({ "maxWidth": 600 }).as_object().cloned() else {
            unreachable!()
        };
        let outcome = session.apply(&Command::UpdateComponent {
            id: NodeId::root(),
            properties: patch,
        });
        assert!(outcome.is_applied());
        assert!(!session.can_undo());
    }

    #[test]
    fn test_selection_cleared_by_cascade() {
        let mut session = EditSession::default();
        let columns = created(session.apply(&add(NodeKind::Columns, "root")));
        let last_column = session.tree().get(&columns).unwrap().children()[1].clone();
        let text = created(session.apply(&add(NodeKind::Text, &last_column)));
        session.select(Some(text.as_str()));

        session.apply(&Command::RemoveComponent { id: columns });
        assert!(session.selected().is_none());
    }

    #[test]
    fn test_undo_clears_selection_of_undone_node() {
        let mut session = EditSession::default();
        let text = created(session.apply(&add(NodeKind::Text, "root")));
        session.select(Some(text.as_str()));

        assert!(session.undo());
        assert!(session.selected().is_none());
        assert!(session.redo());
        assert!(session.tree().contains(&text));
    }

    #[test]
    fn test_load_resets_everything() {
        let mut session = EditSession::default();
        let text = created(session.apply(&add(NodeKind::Text, "root")));
        session.select(Some(text.as_str()));
        session.load(Tree::new());
        assert!(!session.can_undo());
        assert!(session.selected().is_none());
        assert_eq!(session.tree().len(), 1);
    }
}
