//! Undo/redo over tree snapshots.
//!
//! Provides:
//! - `UndoManager` trait, shared by `History` and edit sessions
//! - `History` - owns the current tree and bounded snapshot stacks
//!
//! Trees share unchanged node entries, so a snapshot costs one map clone
//! plus the entries a command touched.

use std::collections::VecDeque;

use crate::tree::Tree;

/// Default number of undo steps kept.
pub const DEFAULT_MAX_STEPS: usize = 100;

/// Walks an owner's current tree back and forth through recorded snapshots.
///
/// `undo` swaps the current tree for the newest snapshot and pushes the
/// replaced tree onto the redo side; `redo` does the reverse. Both return
/// false and leave the tree alone when their side is empty. Any new commit
/// empties the redo side.
pub trait UndoManager {
    fn can_undo(&self) -> bool;

    fn can_redo(&self) -> bool;

    fn undo(&mut self) -> bool;

    fn redo(&mut self) -> bool;

    /// Drop every snapshot, keeping the current tree.
    fn clear_history(&mut self);
}

/// The current tree plus the snapshots needed to walk back and forth.
#[derive(Debug, Clone)]
pub struct History {
    current: Tree,
    undo_stack: VecDeque<Tree>,
    redo_stack: Vec<Tree>,
    max_steps: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(Tree::new(), DEFAULT_MAX_STEPS)
    }
}

impl History {
    pub fn new(tree: Tree, max_steps: usize) -> Self {
        Self {
            current: tree,
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    pub fn current(&self) -> &Tree {
        &self.current
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Make `next` the current tree.
    ///
    /// Returns false, recording nothing, when `next` equals the current tree.
    /// A real change clears the redo stack and evicts the oldest snapshot
    /// past `max_steps`.
    pub fn commit(&mut self, next: Tree) -> bool {
        if next == self.current {
            return false;
        }
        let previous = std::mem::replace(&mut self.current, next);
        self.redo_stack.clear();
        if self.max_steps == 0 {
            return true;
        }
        self.undo_stack.push_back(previous);
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.pop_front();
        }
        true
    }

    /// Replace the current tree and forget all history, as on load.
    pub fn reset(&mut self, tree: Tree) {
        self.current = tree;
        self.clear_history();
    }
}

impl UndoManager for History {
    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop_back() else {
            return false;
        };
        let undone = std::mem::replace(&mut self.current, previous);
        self.redo_stack.push(undone);
        true
    }

    fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        let previous = std::mem::replace(&mut self.current, next);
        self.undo_stack.push_back(previous);
        true
    }

    fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
