use std::iter::{FusedIterator, Rev};
use std::mem;
use std::slice;

use crate::error::{KDIndexError, Result};
use crate::kdtree::resolve::{CollisionResolver, KeepLast};
use crate::kdtree::KDTreeBuilder;
use crate::r#type::{CoordOrder, NaturalOrder};

/// A stored key/value pair.
///
/// Entries are created once when the tree is built and live as long as the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<N, V> {
    pub(crate) key: Vec<N>,
    pub(crate) value: V,
}

impl<N, V> Entry<N, V> {
    /// The coordinates of this entry, one per axis.
    #[inline]
    pub fn key(&self) -> &[N] {
        &self.key
    }

    /// The value stored under this key.
    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Split this entry into its key and value.
    pub fn into_parts(self) -> (Vec<N>, V) {
        (self.key, self.value)
    }

    /// Copy this entry out of the tree, e.g. to build a new tree from a query result.
    pub fn to_pair(&self) -> (Vec<N>, V)
    where
        N: Clone,
        V: Clone,
    {
        (self.key.clone(), self.value.clone())
    }
}

/// Position of a node inside the tree's node arena.
pub(crate) type NodeId = usize;

/// Position of an entry inside the tree's value store.
pub(crate) type EntryId = usize;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeKind<N> {
    Leaf {
        entry: EntryId,
    },
    Internal {
        /// Every entry in `left` is `<=` this on the node's axis, every entry in `right` is `>=`.
        median: N,
        left: NodeId,
        right: NodeId,
    },
}

/// An immutable k-d tree over keys with an arbitrary number of axes.
///
/// Usually this will be created from scratch via [`KDTreeBuilder`], or with
/// [`KDTree::try_new`] when all pairs are already at hand.
///
/// The tree owns both its nodes and its stored entries. Results of
/// [`range`][KDTree::range] and [`iter`][KDTree::iter] borrow from the tree and cannot outlive
/// it; to build a new tree from a query result, clone the matched entries first.
#[derive(Debug, Clone, PartialEq)]
pub struct KDTree<N, V, O = NaturalOrder> {
    pub(crate) dimension: usize,
    pub(crate) order: O,
    /// Arena of nodes. Children are always stored before their parent.
    pub(crate) nodes: Vec<NodeKind<N>>,
    pub(crate) root: Option<NodeId>,
    /// Entries in the order their leaves were finalized during the build.
    pub(crate) entries: Vec<Entry<N, V>>,
}

impl<N: Clone, V> KDTree<N, V, NaturalOrder> {
    /// Build a tree from `(key, value)` pairs using the natural order of the coordinates.
    ///
    /// Pairs with equal keys are merged, keeping the value added last.
    pub fn try_new<K, I>(pairs: I, dimension: usize) -> Result<Self>
    where
        N: PartialOrd,
        K: Into<Vec<N>>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::try_new_with(pairs, dimension, NaturalOrder, KeepLast)
    }
}

impl<N: Clone, V, O: CoordOrder<N>> KDTree<N, V, O> {
    /// Build a tree from `(key, value)` pairs using a custom coordinate order.
    ///
    /// Pairs with equal keys are merged, keeping the value added last.
    pub fn try_new_with_order<K, I>(pairs: I, dimension: usize, order: O) -> Result<Self>
    where
        K: Into<Vec<N>>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::try_new_with(pairs, dimension, order, KeepLast)
    }

    /// Build a tree from `(key, value)` pairs with a custom coordinate order and collision
    /// resolver.
    pub fn try_new_with<K, I, R>(
        pairs: I,
        dimension: usize,
        order: O,
        resolver: R,
    ) -> Result<Self>
    where
        K: Into<Vec<N>>,
        I: IntoIterator<Item = (K, V)>,
        R: CollisionResolver<N, V>,
    {
        let pairs = pairs.into_iter();
        let mut builder = KDTreeBuilder::with_capacity(dimension, pairs.size_hint().0)?
            .with_order(order)
            .with_resolver(resolver);
        builder.extend_pairs(pairs)?;
        Ok(builder.finish())
    }
}

impl<N, V, O> KDTree<N, V, O> {
    pub(crate) fn empty(dimension: usize, order: O) -> Self {
        Self {
            dimension,
            order,
            nodes: Vec::new(),
            root: None,
            entries: Vec::new(),
        }
    }

    /// The number of axes of every key in this tree.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The number of stored entries, after merging colliding keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The total number of nodes, both leaves and internal nodes.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// The coordinate order used by this tree.
    #[inline]
    pub fn order(&self) -> &O {
        &self.order
    }

    /// Iterate over every stored entry.
    ///
    /// Entries come out in reverse of the order in which the builder finalized them, which is the
    /// same order [`range`][KDTree::range] yields its matches in.
    pub fn iter(&self) -> Iter<'_, N, V> {
        Iter {
            inner: self.entries.iter().rev(),
        }
    }

    /// Move the contents out of this tree, leaving it empty.
    ///
    /// The returned tree takes over the nodes and entries without copying them. `self` keeps its
    /// dimension and reports no entries and no query matches afterwards.
    pub fn take(&mut self) -> Self
    where
        O: Clone,
    {
        let empty = Self::empty(self.dimension, self.order.clone());
        mem::replace(self, empty)
    }

    /// Consume the tree, returning its entries in iteration order.
    pub fn into_entries(self) -> Vec<Entry<N, V>> {
        let mut entries = self.entries;
        entries.reverse();
        entries
    }

    pub(crate) fn check_dimension(&self, len: usize, what: &str) -> Result<()> {
        if len != self.dimension {
            return Err(KDIndexError::InvalidInput(format!(
                "{} has {} axes, expected {}.",
                what, len, self.dimension
            )));
        }
        Ok(())
    }
}

impl<'a, N, V, O> IntoIterator for &'a KDTree<N, V, O> {
    type Item = &'a Entry<N, V>;
    type IntoIter = Iter<'a, N, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over all entries of a [`KDTree`], created by [`KDTree::iter`].
#[derive(Debug, Clone)]
pub struct Iter<'a, N, V> {
    inner: Rev<slice::Iter<'a, Entry<N, V>>>,
}

impl<'a, N, V> Iterator for Iter<'a, N, V> {
    type Item = &'a Entry<N, V>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<N, V> ExactSizeIterator for Iter<'_, N, V> {}

impl<N, V> FusedIterator for Iter<'_, N, V> {}
