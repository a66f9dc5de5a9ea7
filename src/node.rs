//! Node handles, node counts and the `Node<D>` primitive itself.

#[rustfmt::skip]
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::From
)]
pub struct NodeIdx(pub(crate) usize);

impl NodeIdx {
    /// The payload-less sentinel that owns the top-level nodes.
    pub const ROOT: Self = Self(0);

    #[inline(always)]
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl std::fmt::Debug for NodeIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "NodeIdx({})", self.0)
    }
}

impl std::fmt::Display for NodeIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}


#[rustfmt::skip]
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Deref,
    derive_more::From,
)]
pub struct NodeCount(usize);

impl std::ops::Add<Self> for NodeCount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::Sub<Self> for NodeCount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign<usize> for NodeCount {
    fn add_assign(&mut self, rhs: usize) {
        self.0 += rhs;
    }
}


/// A single slot in the arena.  The root sentinel is the only live
/// node without `data`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Node<D> {
    pub(crate) idx: NodeIdx,
    pub(crate) parent: Option<NodeIdx>,
    pub(crate) children: Vec<NodeIdx>,
    pub(crate) data: Option<D>,
}

impl<D> Node<D> {
    pub(crate) fn new(idx: NodeIdx, data: Option<D>) -> Self {
        Node {
            idx,
            parent: None,
            children: Vec::with_capacity(4),
            data,
        }
    }

    #[inline(always)]
    pub fn idx(&self) -> NodeIdx {
        self.idx
    }

    #[inline(always)]
    pub fn data(&self) -> Option<&D> {
        self.data.as_ref()
    }

    #[inline(always)]
    pub fn parent(&self) -> Option<NodeIdx> {
        self.parent
    }

    #[inline(always)]
    pub fn children(&self) -> impl DoubleEndedIterator<Item = NodeIdx> + '_ {
        self.children.iter().copied()
    }

    #[inline(always)]
    pub fn count_children(&self) -> usize {
        self.children.len()
    }

    /// Return the position of `child_idx` among the children of `self`,
    /// or `None` if it isn't one of them.
    #[inline]
    pub fn child_ordinal(&self, child_idx: NodeIdx) -> Option<usize> {
        self.children.iter().position(|&cidx| cidx == child_idx)
    }

    #[inline(always)]
    pub(crate) fn push_child(&mut self, child_idx: NodeIdx) {
        self.children.push(child_idx);
    }

    #[inline(always)]
    pub(crate) fn insert_child(&mut self, child_idx: NodeIdx, pos: usize) {
        self.children.insert(pos, child_idx);
    }

    /// Filter out `child_idx` from `self.children`.
    /// Return whether it was present.
    #[inline]
    pub(crate) fn remove_child(&mut self, child_idx: NodeIdx) -> bool {
        match self.child_ordinal(child_idx) {
            Some(pos) => {
                self.children.remove(pos);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn is_root_node(&self) -> bool {
        self.idx.is_root()
    }

    #[inline]
    pub fn is_branch_node(&self) -> bool {
        !self.is_leaf_node()
    }

    #[inline]
    pub fn is_leaf_node(&self) -> bool {
        self.children.is_empty()
    }
}

impl<D: std::fmt::Debug> std::fmt::Debug for Node<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ds = f.debug_struct("Node");
        let ds = ds.field("idx", &self.idx);
        let ds = ds.field("parent", &self.parent);
        let ds = ds.field("children", &self.children);
        let ds = ds.field("data", &self.data);
        ds.finish()
    }
}
