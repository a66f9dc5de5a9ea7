//! This crate defines an editable, cache-friendly ordered tree whose
//! nodes can be looked up by payload value, along with a linear
//! undo/redo history that hosts can use to record edits to it.
#![forbid(unsafe_code)]

mod arena;
pub mod error;
pub mod history;
pub mod node;
pub mod tree;

#[rustfmt::skip]
pub use crate::{
    error::{Error, Result},
    history::History,
    node::{Node, NodeCount, NodeIdx},
    tree::{Placement, Tree},
};
