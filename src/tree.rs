//! An ordered, editable tree whose nodes can be found by payload value.

use crate::arena::Arena;
pub use crate::{
    error::{Error, Result},
    node::{Node, NodeCount, NodeIdx},
};
use itertools::Itertools;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;


#[macro_export]
/// Declaratively construct a `Result<Tree<D>>`, where the `$data`
/// arguments all have type `D`.  Each top-level group becomes a child
/// of the root sentinel.
macro_rules! tree {
    (
        $(
            ($data:expr $(, $($children:tt),+)?)
        ),*
        $(,)?
    ) => {{ #[allow(redundant_semicolons, unused)] {
        let build = || -> $crate::Result<$crate::Tree<_>> {
            let mut tree = $crate::Tree::default();
            $(
                let node_idx = tree.add($data, None)?;
                $(
                    $(
                        $crate::place_tree! { [in tree] node_idx; $children }
                    )+
                )? ;
            )* ;
            Ok(tree)
        };
        build()
    }}};
}

#[doc(hidden)]
#[macro_export]
// A "placement in" variant of the `tree!{}` macro.  No `Tree` instance
// is created; one is passed in as `$tree`, along with a `$parent_idx`.
// Must be expanded inside a fn returning `Result<_>`.
macro_rules! place_tree {
    (
        [in $tree:expr]
        $parent_idx:expr;
        ($data:expr $(, $($children:tt),+)?)
    ) => {{ #[allow(redundant_semicolons, unused)] {
        let node_idx: $crate::NodeIdx = $tree.add($data, $parent_idx)?;
        $(
            $(
                $crate::place_tree! { [in $tree] node_idx; $children }
            )+
        )? ;
    }}};
}


/// Where `Tree::move_relative()` puts a node relative to its destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Placement {
    Above,
    Below,
}

const INDENT: &str = "  ";

#[derive(Clone, Debug)]
pub struct Tree<D> {
    arena: Arena<D>,
    lookup: HashMap<D, NodeIdx>,
    /// Subtree roots detached by `Tree::remove()`.
    orphans: Vec<NodeIdx>,
    /// The flattened pre-order view.  An empty cell means it's dirty.
    flat: OnceCell<Vec<NodeIdx>>,
}

impl<D> Default for Tree<D> {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl<D> Tree<D> {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            arena: Arena::with_capacity(cap),
            lookup: HashMap::with_capacity(cap),
            orphans: vec![],
            flat: OnceCell::new(),
        }
    }

    #[inline(always)]
    pub fn root(&self) -> NodeIdx {
        NodeIdx::ROOT
    }

    /// The number of nodes reachable from the root, the root excluded.
    #[inline]
    pub fn len(&self) -> usize {
        *self.arena.count_descendants(NodeIdx::ROOT)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.arena[NodeIdx::ROOT].is_leaf_node()
    }

    #[inline]
    /// Get the logical size, which is defined as `physical size - garbage size`
    /// i.e. the number of allocated, non-garbage nodes in `self`.  This
    /// includes orphaned nodes that are no longer reachable from the root.
    pub fn logical_size(&self) -> NodeCount {
        self.arena.logical_size()
    }

    #[inline]
    /// Get the physical size, which is defined as the number of nodes
    /// allocated in the tree, whether they are garbage or not.
    pub fn physical_size(&self) -> NodeCount {
        self.arena.physical_size()
    }

    /// Get the garbage size i.e. the number of garbage nodes in `self`.
    #[inline]
    pub fn garbage_size(&self) -> NodeCount {
        self.arena.garbage_size()
    }

    /// Return `true` if the flattened view must be rebuilt on next use.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.flat.get().is_none()
    }

    #[inline]
    pub fn node(&self, idx: NodeIdx) -> Option<&Node<D>> {
        self.arena.is_live(idx).then(|| &self.arena[idx])
    }

    #[inline]
    pub fn data_of(&self, idx: NodeIdx) -> Option<&D> {
        self.node(idx).and_then(Node::data)
    }

    #[inline]
    pub fn parent_of(&self, idx: NodeIdx) -> Option<NodeIdx> {
        self.node(idx).and_then(Node::parent)
    }

    pub fn children_of(
        &self,
        idx: NodeIdx,
    ) -> impl DoubleEndedIterator<Item = NodeIdx> + '_ {
        self.node(idx).into_iter().flat_map(Node::children)
    }

    /// Walk up from `self[idx]`, nearest ancestor first.  For a node that
    /// is reachable from the root, the last ancestor is the root itself.
    pub fn ancestors_of(
        &self,
        idx: NodeIdx,
    ) -> impl DoubleEndedIterator<Item = NodeIdx> {
        let ancestors: Vec<NodeIdx> = match self.arena.is_live(idx) {
            true => self.arena.ancestors_of(idx).collect(),
            false => vec![],
        };
        ancestors.into_iter()
    }

    /// Top-level nodes have depth 0.
    pub fn depth_of(&self, idx: NodeIdx) -> Option<usize> {
        if idx.is_root() || !self.is_attached(idx) {
            return None;
        }
        Some(self.arena.ancestors_of(idx).count() - 1)
    }

    /// The position of `self[idx]` among its siblings.
    #[inline]
    pub fn local_index(&self, idx: NodeIdx) -> Option<usize> {
        self.arena.is_live(idx).then(|| self.arena.local_index(idx)).flatten()
    }

    /// Count the nodes strictly below `self[idx]`.
    pub fn count_descendants(&self, idx: NodeIdx) -> Result<NodeCount> {
        self.ensure_live(idx)?;
        Ok(self.arena.count_descendants(idx))
    }

    /// Return `true` if `self[idx]` is reachable from the root.
    pub fn is_attached(&self, idx: NodeIdx) -> bool {
        idx.is_root()
            || (self.arena.is_live(idx) && self.arena.contains(NodeIdx::ROOT, idx))
    }

    /// Return `true` if `self[node_idx]` lies strictly below
    /// `self[ancestor_idx]`.
    pub fn is_ancestor_of(&self, ancestor_idx: NodeIdx, node_idx: NodeIdx) -> bool {
        self.arena.is_live(ancestor_idx)
            && self.arena.is_live(node_idx)
            && self.arena.contains(ancestor_idx, node_idx)
    }

    /// Walk the subtree rooted @ `self[start_idx]` in pre-order.
    /// Unlike the flattened view, this includes `start_idx` itself and
    /// also works for orphaned subtrees.
    pub fn dfs_pre(
        &self,
        start_idx: NodeIdx,
    ) -> impl DoubleEndedIterator<Item = NodeIdx> {
        let visited: Vec<NodeIdx> = match self.arena.is_live(start_idx) {
            true => self.arena.dfs_pre(start_idx).collect(),
            false => vec![],
        };
        visited.into_iter()
    }

    /// The roots of the subtrees detached by `Tree::remove()` that have
    /// not been purged yet.
    pub fn orphans(&self) -> impl DoubleEndedIterator<Item = NodeIdx> + '_ {
        self.orphans.iter().copied()
            .filter(|&oidx| self.arena.is_live(oidx) && self.arena[oidx].parent.is_none())
    }

    #[inline]
    pub fn get(&self, pos: usize) -> Option<&D> {
        let node_idx = *self.flat().get(pos)?;
        self.arena[node_idx].data()
    }

    #[inline]
    pub fn get_mut(&mut self, pos: usize) -> Option<&mut D> {
        let arena = &self.arena;
        let node_idx = *self.flat.get_or_init(|| flatten(arena)).get(pos)?;
        self.arena[node_idx].data.as_mut()
    }

    /// Iterate over the payloads in pre-order.  Each call walks the
    /// current state of `self`.
    pub fn iter(&self) -> Iter<'_, D> {
        Iter {
            arena: &self.arena,
            idxs: self.flat().iter(),
        }
    }

    pub fn to_vec(&self) -> Vec<D>
    where
        D: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Empty `self`, including any orphaned subtrees.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.lookup.clear();
        self.orphans.clear();
        self.invalidate();
        tracing::debug!("cleared tree");
    }

    /// Move `self[node_idx]` to position `pos` among its current siblings.
    /// `pos` is counted with the node itself removed.
    pub fn move_to(&mut self, node_idx: NodeIdx, pos: usize) -> Result<()> {
        self.ensure_movable(node_idx)?;
        let Some(parent_idx) = self.arena[node_idx].parent else {
            return Err(Error::Detached(node_idx));
        };
        self.arena.move_child(parent_idx, node_idx, pos)?;
        self.invalidate();
        tracing::debug!(node = %node_idx, pos, "moved node");
        Ok(())
    }

    /// Place `self[node_idx]` directly above or below `self[dest_idx]`,
    /// reparenting it if the two don't share a parent.
    /// Return the local index `self[node_idx]` ends up at.
    /// Placing a node below the last of its destination siblings fails
    /// with `IndexOutOfRange`, as that position lies past the end.
    pub fn move_relative(
        &mut self,
        node_idx: NodeIdx,
        dest_idx: NodeIdx,
        placement: Placement,
    ) -> Result<usize> {
        self.ensure_movable(node_idx)?;
        self.ensure_movable(dest_idx)?;
        if node_idx == dest_idx {
            return Err(Error::SelfTarget(node_idx));
        }
        let (Some(dest_parent_idx), Some(dest_pos)) =
            (self.arena[dest_idx].parent, self.arena.local_index(dest_idx))
        else {
            return Err(Error::Detached(dest_idx));
        };
        let offset = match placement {
            Placement::Above => 0,
            Placement::Below => 1,
        };
        if self.arena[node_idx].parent == Some(dest_parent_idx) {
            let node_pos = self.arena.local_index(node_idx)
                .ok_or(Error::Detached(node_idx))?;
            // Removing the node first shifts everything after it by one.
            let pos = dest_pos + offset - usize::from(dest_pos > node_pos);
            self.move_to(node_idx, pos)?;
            Ok(pos)
        } else {
            let pos = dest_pos + offset;
            self.reparent(node_idx, dest_parent_idx, Some(pos))?;
            Ok(pos)
        }
    }

    /// Move the subtree rooted @ `self[node_idx]` under `self[new_parent]`
    /// (the root if `None`), at position `pos` if given or as the last
    /// child otherwise.  `pos` must lie within the children of the new
    /// parent, not counting `self[node_idx]`.  All checks run before
    /// anything is written.
    pub fn reparent(
        &mut self,
        node_idx: NodeIdx,
        new_parent: impl Into<Option<NodeIdx>>,
        pos: Option<usize>,
    ) -> Result<()> {
        let parent_idx = new_parent.into().unwrap_or(NodeIdx::ROOT);
        self.ensure_movable(node_idx)?;
        self.ensure_live(parent_idx)?;
        if node_idx == parent_idx {
            tracing::debug!(node = %node_idx, "rejected reparenting under itself");
            return Err(Error::SelfTarget(node_idx));
        }
        if self.arena.contains(node_idx, parent_idx) {
            tracing::debug!(
                node = %node_idx, parent = %parent_idx,
                "rejected reparenting under a descendant"
            );
            return Err(Error::WouldCreateCycle {
                node: node_idx,
                new_parent: parent_idx,
            });
        }
        if let Some(pos) = pos {
            let already_child = self.arena[node_idx].parent == Some(parent_idx);
            let len = self.arena[parent_idx].count_children()
                - usize::from(already_child);
            if pos >= len {
                return Err(Error::IndexOutOfRange { pos, len });
            }
        }
        self.arena.attach(parent_idx, node_idx);
        if let Some(pos) = pos {
            self.arena.move_child(parent_idx, node_idx, pos)?;
        }
        self.orphans.retain(|&oidx| oidx != node_idx);
        self.invalidate();
        tracing::debug!(node = %node_idx, parent = %parent_idx, ?pos, "reparented node");
        Ok(())
    }

    fn flat(&self) -> &[NodeIdx] {
        self.flat.get_or_init(|| flatten(&self.arena))
    }

    /// Every structural mutation goes through here.
    #[inline(always)]
    fn invalidate(&mut self) {
        self.flat.take();
    }

    fn ensure_live(&self, idx: NodeIdx) -> Result<()> {
        match self.arena.is_live(idx) {
            true => Ok(()),
            false => Err(Error::NodeNotFound(idx)),
        }
    }

    fn ensure_movable(&self, idx: NodeIdx) -> Result<()> {
        if idx.is_root() {
            return Err(Error::RootNode);
        }
        self.ensure_live(idx)
    }
}

impl<D> Tree<D>
where
    D: Clone + Eq + Hash,
{
    /// Add a node holding `data` as the last child of `self[parent]`,
    /// or of the root if `parent` is `None`.
    /// Each value can be registered at most once.
    pub fn add(
        &mut self,
        data: D,
        parent: impl Into<Option<NodeIdx>>,
    ) -> Result<NodeIdx> {
        let parent_idx = parent.into().unwrap_or(NodeIdx::ROOT);
        self.ensure_live(parent_idx)?;
        if let Some(&existing) = self.lookup.get(&data) {
            return Err(Error::DuplicateValue { existing });
        }
        let node_idx = self.arena.alloc(data.clone());
        self.arena.attach(parent_idx, node_idx);
        self.lookup.insert(data, node_idx);
        self.invalidate();
        tracing::debug!(node = %node_idx, parent = %parent_idx, "added node");
        Ok(node_idx)
    }

    /// Like `Tree::add()`, but the parent is looked up by value.
    /// Fails without modifying `self` if no node holds `parent_data`.
    pub fn add_under(&mut self, data: D, parent_data: &D) -> Result<NodeIdx> {
        let parent_idx = self.find(parent_data).ok_or(Error::ParentValueNotFound)?;
        self.add(data, parent_idx)
    }

    /// Unregister `data` and detach its node from its parent.
    /// The node keeps its own subtree, whose values stay registered.
    /// Return whether a node was detached.
    pub fn remove(&mut self, data: &D) -> bool {
        let Some(node_idx) = self.lookup.remove(data) else {
            return false;
        };
        let detached = match self.arena[node_idx].parent {
            Some(parent_idx) => self.arena.detach(parent_idx, node_idx),
            None => false,
        };
        if detached {
            self.orphans.push(node_idx);
            self.invalidate();
        }
        tracing::debug!(node = %node_idx, detached, "removed node");
        detached
    }

    #[inline]
    pub fn find(&self, data: &D) -> Option<NodeIdx> {
        self.lookup.get(data).copied()
    }

    #[inline]
    pub fn contains_value(&self, data: &D) -> bool {
        self.lookup.contains_key(data)
    }

    /// Replace the payload at position `pos` of the flattened view and
    /// re-register it under its new value.  Return the old payload.
    pub fn set(&mut self, pos: usize, data: D) -> Result<D> {
        let flat = self.flat();
        let Some(&node_idx) = flat.get(pos) else {
            return Err(Error::IndexOutOfRange { pos, len: flat.len() });
        };
        if let Some(&existing) = self.lookup.get(&data) {
            if existing != node_idx {
                return Err(Error::DuplicateValue { existing });
            }
        }
        let old = match self.arena[node_idx].data.as_mut() {
            Some(slot) => std::mem::replace(slot, data.clone()),
            None => return Err(Error::RootNode),
        };
        if self.lookup.get(&old) == Some(&node_idx) {
            self.lookup.remove(&old);
        }
        self.lookup.insert(data, node_idx);
        Ok(old)
    }

    /// Recycle every orphaned subtree that is still detached, and
    /// unregister the values it held.  Return the number of recycled nodes.
    ///
    /// Recycled slots are handed out again by later calls to `add`, under
    /// the same `NodeIdx`.  A handle into a purged subtree is therefore
    /// stale: it fails with `NodeNotFound` while its slot is free, and
    /// refers to whichever node reuses the slot afterwards.
    pub fn purge_orphans(&mut self) -> NodeCount {
        let orphans: Vec<NodeIdx> = self.orphans.drain(..).unique().collect();
        let mut purged = NodeCount::default();
        for orphan_idx in orphans {
            if !self.arena.is_live(orphan_idx) || self.arena[orphan_idx].parent.is_some() {
                continue;
            }
            for (idx, data) in self.arena.free_subtree(orphan_idx) {
                if self.lookup.get(&data) == Some(&idx) {
                    self.lookup.remove(&data);
                }
                purged += 1;
            }
        }
        tracing::debug!(purged = *purged, "purged orphans");
        purged
    }
}

fn flatten<D>(arena: &Arena<D>) -> Vec<NodeIdx> {
    tracing::trace!("rebuilding flattened view");
    arena.dfs_pre(NodeIdx::ROOT).skip(1).collect()
}

impl<D> std::ops::Index<usize> for Tree<D> {
    type Output = D;

    fn index(&self, pos: usize) -> &Self::Output {
        let len = self.flat().len();
        self.get(pos).unwrap_or_else(|| {
            panic!("index out of bounds: the len is {len} but the index is {pos}")
        })
    }
}

/// NOTE: Writing through this doesn't update the value lookup.
///       Use `Tree::set()` when `D`'s equality depends on what changes.
impl<D> std::ops::IndexMut<usize> for Tree<D> {
    fn index_mut(&mut self, pos: usize) -> &mut Self::Output {
        let len = self.flat().len();
        self.get_mut(pos).unwrap_or_else(|| {
            panic!("index out of bounds: the len is {len} but the index is {pos}")
        })
    }
}

impl<D> PartialEq<Self> for Tree<D>
where
    D: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        // NOTE: The idea is to do a logical comparison where:
        // 1. Orphaned and garbage nodes are excluded from comparison
        // 2. Reachable nodes are compared in DFS order
        let (sflat, oflat) = (self.flat(), other.flat());
        if sflat.len() != oflat.len() {
            return false;
        }
        sflat.iter().zip(oflat).all(|(&sidx, &oidx)| {
            let (snode, onode) = (&self.arena[sidx], &other.arena[oidx]);
            snode.count_children() == onode.count_children()
                && snode.data == onode.data
        })
    }
}

#[rustfmt::skip]
impl<D> Eq for Tree<D> where D: Eq {}

impl<D> fmt::Display for Tree<D>
where
    D: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut stack: Vec<(usize, NodeIdx)> = self.arena[NodeIdx::ROOT]
            .children()
            .rev()
            .map(|cidx| (0, cidx))
            .collect();
        while let Some((depth, node_idx)) = stack.pop() {
            let node = &self.arena[node_idx];
            if let Some(data) = node.data() {
                writeln!(f, "{}{data}", INDENT.repeat(depth))?;
            }
            stack.extend(node.children().rev().map(|cidx| (depth + 1, cidx)));
        }
        Ok(())
    }
}


/// A pre-order iterator over the payloads of a `Tree<D>`.
#[derive(Clone, Debug)]
pub struct Iter<'t, D> {
    arena: &'t Arena<D>,
    idxs: std::slice::Iter<'t, NodeIdx>,
}

impl<'t, D> Iterator for Iter<'t, D> {
    type Item = &'t D;

    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        self.idxs.by_ref().find_map(|&idx| arena[idx].data())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.idxs.size_hint()
    }
}

impl<D> DoubleEndedIterator for Iter<'_, D> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        self.idxs.by_ref().rev().find_map(|&idx| arena[idx].data())
    }
}

impl<D> ExactSizeIterator for Iter<'_, D> {}

impl<'t, D> IntoIterator for &'t Tree<D> {
    type Item = &'t D;
    type IntoIter = Iter<'t, D>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
