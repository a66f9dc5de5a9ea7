//!

use crate::node::NodeIdx;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    displaydoc::Display,
    thiserror::Error,
)]
pub enum Error {
    /// Couldn't find a live node for {0:?}.
    NodeNotFound(NodeIdx),
    /// The root node cannot be the subject of this operation.
    RootNode,
    /// Node {0:?} has no parent.
    Detached(NodeIdx),
    /// Node {0:?} cannot be placed relative to itself.
    SelfTarget(NodeIdx),
    /// Moving {node:?} under {new_parent:?} would create a cycle.
    WouldCreateCycle { node: NodeIdx, new_parent: NodeIdx },
    /// An equal value is already registered for node {existing:?}.
    DuplicateValue { existing: NodeIdx },
    /// No node holds the requested parent value.
    ParentValueNotFound,
    /// Position {pos} is out of range for {len} positions.
    IndexOutOfRange { pos: usize, len: usize },
    /// The undo stack is empty.
    EmptyUndoStack,
    /// The redo stack is empty.
    EmptyRedoStack,
}

impl Error {
    /// Return `true` if `self` reports a violated precondition
    /// (a bad position or popping an empty stack) rather than an
    /// operation that was rejected because of the tree's shape.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Self::IndexOutOfRange { .. } | Self::EmptyUndoStack | Self::EmptyRedoStack
        )
    }
}
