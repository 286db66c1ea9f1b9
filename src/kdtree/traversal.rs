//! Utilities to traverse the KDTree structure.

use crate::kdtree::index::{Entry, NodeId, NodeKind};
use crate::kdtree::KDTree;

/// A node in the KDTree.
///
/// Leaves hold exactly one entry. Internal nodes hold the value their children were split on and
/// always have both children.
#[derive(Debug)]
pub struct Node<'a, N, V, O> {
    /// The tree that this node is a reference onto
    tree: &'a KDTree<N, V, O>,
    id: NodeId,
    depth: usize,
}

impl<N, V, O> Clone for Node<'_, N, V, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N, V, O> Copy for Node<'_, N, V, O> {}

impl<'a, N, V, O> Node<'a, N, V, O> {
    pub(crate) fn from_root(tree: &'a KDTree<N, V, O>) -> Option<Self> {
        tree.root.map(|id| Self { tree, id, depth: 0 })
    }

    #[inline]
    fn kind(&self) -> &'a NodeKind<N> {
        &self.tree.nodes[self.id]
    }

    /// Distance from the root. The root has depth 0.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The axis this node splits on, `depth % dimension`.
    ///
    /// Leaves report the axis their parent's children would split on, though they do not split.
    #[inline]
    pub fn axis(&self) -> usize {
        self.depth % self.tree.dimension
    }

    /// Returns `true` if this is a leaf node without children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind(), NodeKind::Leaf { .. })
    }

    /// Returns `true` if this is an intermediate node with children.
    #[inline]
    pub fn is_parent(&self) -> bool {
        !self.is_leaf()
    }

    /// The splitting value of an internal node, `None` for leaves.
    pub fn median(&self) -> Option<&'a N> {
        match self.kind() {
            NodeKind::Internal { median, .. } => Some(median),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// The entry held by a leaf, `None` for internal nodes.
    pub fn entry(&self) -> Option<&'a Entry<N, V>> {
        match self.kind() {
            NodeKind::Leaf { entry } => Some(&self.tree.entries[*entry]),
            NodeKind::Internal { .. } => None,
        }
    }

    /// The child holding entries `<=` the median on this node's axis.
    pub fn left_child(&self) -> Option<Node<'a, N, V, O>> {
        match self.kind() {
            NodeKind::Internal { left, .. } => Some(self.child(*left)),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// The child holding entries `>=` the median on this node's axis.
    pub fn right_child(&self) -> Option<Node<'a, N, V, O>> {
        match self.kind() {
            NodeKind::Internal { right, .. } => Some(self.child(*right)),
            NodeKind::Leaf { .. } => None,
        }
    }

    fn child(&self, id: NodeId) -> Self {
        Self {
            tree: self.tree,
            id,
            depth: self.depth + 1,
        }
    }
}

impl<N, V, O> KDTree<N, V, O> {
    /// Access the root node of the KDTree for manual traversal. `None` for an empty tree.
    pub fn root(&self) -> Option<Node<'_, N, V, O>> {
        Node::from_root(self)
    }

    /// The number of levels below the root on the longest path, `0` for a single leaf.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack: Vec<Node<'_, N, V, O>> = self.root().into_iter().collect();
        while let Some(node) = stack.pop() {
            height = height.max(node.depth());
            stack.extend(node.left_child());
            stack.extend(node.right_child());
        }
        height
    }
}
