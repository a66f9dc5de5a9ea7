//! A linear undo/redo ledger.  `History<T>` never applies or inverts
//! its entries; hosts record either full snapshots or invertible
//! commands, and replay them themselves.

use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

#[derive(Clone, Debug)]
pub struct History<T> {
    /// Oldest entry at the front, top of the stack at the back.
    undo: VecDeque<T>,
    /// Top of the stack at the back.
    redo: Vec<T>,
    max_depth: Option<usize>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> History<T> {
    pub fn new() -> Self {
        Self {
            undo: VecDeque::new(),
            redo: vec![],
            max_depth: None,
        }
    }

    /// Keep at most `max_depth` entries on the undo stack.  Pushing
    /// beyond that drops the oldest one.
    ///
    /// A `max_depth` of 0 is raised to 1, so the latest entry can always
    /// be undone; `max_depth()` reports the bound in effect.  Use
    /// [`History::new`] for an unbounded history.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo: VecDeque::with_capacity(max_depth),
            redo: vec![],
            max_depth: Some(max_depth.max(1)),
        }
    }

    #[inline]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Record `item`.  Any undone entries are discarded.
    pub fn push(&mut self, item: T) {
        let discarded = self.redo.len();
        self.redo.clear();
        self.undo.push_back(item);
        if let Some(max_depth) = self.max_depth {
            while self.undo.len() > max_depth {
                self.undo.pop_front();
            }
        }
        tracing::trace!(discarded, depth = self.undo.len(), "pushed history entry");
    }

    /// Move the top undo entry to the redo stack, and return it.
    pub fn undo(&mut self) -> Result<&T> {
        let item = self.undo.pop_back().ok_or(Error::EmptyUndoStack)?;
        self.redo.push(item);
        tracing::trace!(depth = self.undo.len(), "undo");
        self.peek_redo()
    }

    /// Move the top redo entry back to the undo stack, and return it.
    pub fn redo(&mut self) -> Result<&T> {
        let item = self.redo.pop().ok_or(Error::EmptyRedoStack)?;
        self.undo.push_back(item);
        tracing::trace!(depth = self.undo.len(), "redo");
        self.peek_undo()
    }

    #[inline]
    pub fn peek_undo(&self) -> Result<&T> {
        self.undo.back().ok_or(Error::EmptyUndoStack)
    }

    #[inline]
    pub fn peek_redo(&self) -> Result<&T> {
        self.redo.last().ok_or(Error::EmptyRedoStack)
    }

    #[inline]
    pub fn has_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[inline]
    pub fn has_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[inline]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    #[inline]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// The undo stack, bottom first.
    pub fn undo_entries(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.undo.iter()
    }

    /// The redo stack, bottom first.
    pub fn redo_entries(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.redo.iter()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

// NOTE: `max_depth` takes no part in comparison or hashing.
impl<T: PartialEq> PartialEq for History<T> {
    fn eq(&self, other: &Self) -> bool {
        self.undo == other.undo && self.redo == other.redo
    }
}

impl<T: Eq> Eq for History<T> {}

impl<T: Hash> Hash for History<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.undo.hash(state);
        self.redo.hash(state);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn undo_then_redo() -> Result<()> {
        let mut history = History::new();
        history.push(1);
        history.push(2);
        assert_eq!(history.undo()?, &2);
        assert!(history.has_redo());
        assert_eq!(history.peek_undo()?, &1);
        assert_eq!(history.redo()?, &2);
        assert!(!history.has_redo());
        assert_eq!(history.peek_undo()?, &2);
        Ok(())
    }

    #[test]
    fn push_discards_redo() -> Result<()> {
        let mut history = History::new();
        history.push(1);
        history.push(2);
        history.undo()?;
        assert!(history.has_redo());
        history.push(3);
        assert!(!history.has_redo());
        assert_eq!(history.undo_entries().copied().collect::<Vec<_>>(), [1, 3]);
        assert_eq!(history.redo(), Err(Error::EmptyRedoStack));
        Ok(())
    }

    #[test]
    fn empty_stacks_fault() {
        let mut history: History<u8> = History::default();
        assert!(!history.has_undo());
        assert!(!history.has_redo());
        assert_eq!(history.undo(), Err(Error::EmptyUndoStack));
        assert_eq!(history.redo(), Err(Error::EmptyRedoStack));
        assert_eq!(history.peek_undo(), Err(Error::EmptyUndoStack));
        assert_eq!(history.peek_redo(), Err(Error::EmptyRedoStack));
        assert!(history.undo().unwrap_err().is_fault());
    }

    #[test]
    fn undo_everything_then_redo_everything() -> Result<()> {
        let mut history = History::new();
        for n in 1..=3 {
            history.push(n);
        }
        while history.has_undo() {
            history.undo()?;
        }
        assert_eq!(history.redo_len(), 3);
        assert_eq!(history.peek_redo()?, &1);
        let redone: Vec<i32> = (0..3).map(|_| history.redo().copied()).collect::<Result<_>>()?;
        assert_eq!(redone, [1, 2, 3]);
        assert_eq!(history.undo_len(), 3);
        Ok(())
    }

    #[test]
    fn max_depth_drops_oldest() -> Result<()> {
        let mut history = History::with_max_depth(2);
        history.push('a');
        history.push('b');
        history.push('c');
        assert_eq!(history.undo_len(), 2);
        assert_eq!(history.undo()?, &'c');
        assert_eq!(history.undo()?, &'b');
        assert!(!history.has_undo());
        Ok(())
    }

    #[test]
    fn zero_max_depth_keeps_latest_entry() -> Result<()> {
        let mut history = History::with_max_depth(0);
        assert_eq!(history.max_depth(), Some(1));
        history.push('a');
        history.push('b');
        assert_eq!(history.undo_len(), 1);
        assert_eq!(history.undo()?, &'b');
        assert_eq!(history.undo(), Err(Error::EmptyUndoStack));
        assert_eq!(History::<char>::new().max_depth(), None);
        Ok(())
    }

    #[test]
    fn clear_empties_both_stacks() -> Result<()> {
        let mut history = History::new();
        history.push("x");
        history.push("y");
        history.undo()?;
        history.clear();
        assert!(!history.has_undo());
        assert!(!history.has_redo());
        Ok(())
    }

    #[test]
    fn equality_covers_both_stacks() -> Result<()> {
        let mut lhs = History::new();
        let mut rhs = History::with_max_depth(10);
        for n in [1, 2] {
            lhs.push(n);
            rhs.push(n);
        }
        assert_eq!(lhs, rhs);
        assert_eq!(hash_of(&lhs), hash_of(&rhs));
        lhs.undo()?;
        assert_ne!(lhs, rhs);
        rhs.undo()?;
        assert_eq!(lhs, rhs);
        lhs.push(7);
        rhs.push(7);
        rhs.undo()?;
        rhs.redo()?;
        assert_eq!(lhs, rhs);
        rhs.undo()?;
        lhs.undo()?;
        lhs.undo()?;
        rhs.undo()?;
        assert_eq!(lhs, rhs);
        Ok(())
    }

    #[test]
    fn equal_undo_stacks_with_different_redo_stacks() -> Result<()> {
        let mut lhs = History::new();
        lhs.push(1);
        lhs.push(2);
        lhs.undo()?;
        let mut rhs = History::new();
        rhs.push(1);
        assert!(lhs.undo_entries().eq(rhs.undo_entries()));
        assert_ne!(lhs, rhs);
        Ok(())
    }
}
