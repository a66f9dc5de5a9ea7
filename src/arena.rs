//! This module deals with arena allocation, and with the raw
//! graph-editing primitives that `Tree<D>` builds on.

use crate::{
    error::{Error, Result},
    node::{Node, NodeCount, NodeIdx},
};
use std::collections::VecDeque;

#[derive(Clone, Debug)]
pub(crate) struct Arena<D> {
    /// `nodes[0]` is always the root sentinel.
    nodes: Vec<Node<D>>,
    garbage: VecDeque<NodeIdx>,
}

impl<D> Default for Arena<D> {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl<D> Arena<D> {
    pub fn with_capacity(cap: usize) -> Self {
        let mut nodes = Vec::with_capacity(cap.max(1));
        nodes.push(Node::new(NodeIdx::ROOT, None));
        Self {
            nodes,
            garbage: VecDeque::with_capacity(cap),
        }
    }

    /// Drop every node except the root sentinel, which loses its children.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0].children.clear();
        self.garbage.clear();
    }

    /// Get the logical size, which is defined as `physical size - garbage size`
    /// i.e. the number of allocated, non-garbage nodes in `self`.
    #[inline]
    pub fn logical_size(&self) -> NodeCount {
        self.physical_size() - self.garbage_size()
    }

    /// Get the physical size, which is defined as the number of nodes
    /// allocated in the arena, whether they are garbage or not.
    /// The root sentinel is not counted.
    #[inline]
    pub fn physical_size(&self) -> NodeCount {
        NodeCount::from(self.nodes.len() - 1)
    }

    /// Get the garbage size i.e. the number of garbage nodes in `self`.
    #[inline]
    pub fn garbage_size(&self) -> NodeCount {
        NodeCount::from(self.garbage.len())
    }

    /// Return `true` if `idx` refers to the root or to an allocated,
    /// non-garbage node.
    #[inline]
    pub fn is_live(&self, idx: NodeIdx) -> bool {
        match self.nodes.get(idx.0) {
            Some(node) => idx.is_root() || node.data.is_some(),
            None => false,
        }
    }

    /// If there is a garbage `Node<D>` in `self`, recycle it.
    /// Otherwise, allocate a new one.
    /// In either case, assign `data` to the node, and return its `NodeIdx`.
    /// The node starts out detached.
    pub fn alloc(&mut self, data: D) -> NodeIdx {
        if let Some(node_idx) = self.garbage.pop_front() {
            self[node_idx].data = Some(data);
            node_idx
        } else {
            let node_idx = NodeIdx(self.nodes.len());
            self.nodes.push(Node::new(node_idx, Some(data)));
            node_idx
        }
    }

    /// Detach `self[subroot_idx]` from its parent, if any, and recycle it
    /// along with all of its descendants.  The payloads of the recycled
    /// nodes are handed back to the caller.
    pub fn free_subtree(&mut self, subroot_idx: NodeIdx) -> Vec<(NodeIdx, D)> {
        if let Some(parent_idx) = self[subroot_idx].parent {
            self.detach(parent_idx, subroot_idx);
        }
        let mut freed = vec![];
        for idx in self.dfs_pre(subroot_idx).collect::<Vec<_>>() {
            let node = &mut self[idx];
            node.parent = None;
            node.children.clear();
            if let Some(data) = node.data.take() {
                freed.push((idx, data));
            }
            self.garbage.push_back(idx);
        }
        freed
    }

    /// Make `self[child_idx]` the last child of `self[parent_idx]`.
    /// If the child already has a parent, it is detached from that
    /// parent first, so it is never observably parentless.
    pub fn attach(&mut self, parent_idx: NodeIdx, child_idx: NodeIdx) {
        if let Some(old_parent_idx) = self[child_idx].parent {
            self[old_parent_idx].remove_child(child_idx);
        }
        self[parent_idx].push_child(child_idx);
        self[child_idx].parent = Some(parent_idx);
    }

    /// Remove `self[child_idx]` from the children of `self[parent_idx]`.
    /// Return whether it was one of them.
    pub fn detach(&mut self, parent_idx: NodeIdx, child_idx: NodeIdx) -> bool {
        let removed = self[parent_idx].remove_child(child_idx);
        if removed {
            self[child_idx].parent = None;
        }
        removed
    }

    /// Return `true` if `node_idx` lies strictly below `ancestor_idx`.
    pub fn contains(&self, ancestor_idx: NodeIdx, node_idx: NodeIdx) -> bool {
        self.ancestors_of(node_idx).any(|aidx| aidx == ancestor_idx)
    }

    /// The position of `self[node_idx]` among its siblings.
    #[inline]
    pub fn local_index(&self, node_idx: NodeIdx) -> Option<usize> {
        let parent_idx = self[node_idx].parent?;
        self[parent_idx].child_ordinal(node_idx)
    }

    /// Move `self[child_idx]` to position `pos` among the children of
    /// `self[parent_idx]`.  `pos` is counted with the child removed, so it
    /// must lie in `0..count_children() - 1`.  Nothing is written unless
    /// the move is valid.
    pub fn move_child(
        &mut self,
        parent_idx: NodeIdx,
        child_idx: NodeIdx,
        pos: usize,
    ) -> Result<()> {
        let Some(from) = self[parent_idx].child_ordinal(child_idx) else {
            return Err(Error::Detached(child_idx));
        };
        let len = self[parent_idx].count_children() - 1;
        if pos >= len {
            return Err(Error::IndexOutOfRange { pos, len });
        }
        let parent = &mut self[parent_idx];
        parent.children.remove(from);
        parent.insert_child(child_idx, pos);
        Ok(())
    }

    /// Count the nodes strictly below `self[node_idx]`.
    #[inline]
    pub fn count_descendants(&self, node_idx: NodeIdx) -> NodeCount {
        NodeCount::from(self.dfs_pre(node_idx).count() - 1)
    }

    /// Walk the parent chain, nearest ancestor first.
    pub fn ancestors_of(
        &self,
        node_idx: NodeIdx,
    ) -> impl DoubleEndedIterator<Item = NodeIdx> {
        let mut ancestors = vec![];
        let mut current = self[node_idx].parent;
        while let Some(aidx) = current {
            ancestors.push(aidx);
            current = self[aidx].parent;
        }
        ancestors.into_iter()
    }

    pub fn dfs_pre(
        &self,
        start_idx: NodeIdx,
    ) -> impl DoubleEndedIterator<Item = NodeIdx> {
        let mut output = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![start_idx];
        while let Some(node_idx) = stack.pop() {
            output.push(node_idx);
            stack.extend(self[node_idx].children().rev());
        }
        output.into_iter()
    }
}

impl<D> std::ops::Index<NodeIdx> for Arena<D> {
    type Output = Node<D>;

    fn index(&self, idx: NodeIdx) -> &Self::Output {
        &self.nodes[idx.0]
    }
}

impl<D> std::ops::IndexMut<NodeIdx> for Arena<D> {
    fn index_mut(&mut self, idx: NodeIdx) -> &mut Self::Output {
        &mut self.nodes[idx.0]
    }
}
