//! weaver-mail-core: the email component tree and its commands.
//!
//! This crate provides:
//! - `Tree` - arena of typed component nodes rooted at `"root"`
//! - Property registry with per-kind defaults and containment rules
//! - Pure tree commands (`add_component`, `move_component`, ...) and the
//!   serializable `Command` dispatcher
//! - Lenient persistence to and from flat JSON records
//! - `EditSession` with selection and snapshot undo/redo

pub mod commands;
pub mod error;
pub mod history;
pub mod persist;
pub mod properties;
pub mod registry;
pub mod session;
pub mod store;
pub mod tree;

pub use commands::{Command, Execution, Outcome, execute};
pub use error::{InvariantViolation, PersistError, TreeError};
pub use history::{History, UndoManager};
pub use persist::{
    NodeRecord, PersistedTree, audit, deserialize, deserialize_value, serialize, tree_from_json_str,
};
pub use properties::{
    BorderStyle, ButtonProps, ColumnProps, ColumnsProps, DividerProps, FontWeight, HeadingProps,
    ImageProps, NodeKind, Padding, Properties, RootProps, SpacerProps, TextAlign, TextProps,
    VerticalAlign,
};
pub use registry::{accepts_child, can_contain_children, defaults_for};
pub use session::EditSession;
pub use smol_str::SmolStr;
pub use store::{
    PropertiesPatch, add_component, move_component, remove_component, reorder_components,
    set_columns_count, try_add_component, try_move_component, try_remove_component,
    try_reorder_components, try_set_columns_count, try_update_component, update_component,
};
pub use tree::{Node, NodeId, ROOT_ID, Tree};
