use std::iter::FusedIterator;

use geo_traits::{CoordTrait, RectTrait};
use num_traits::Bounded;
use tinyvec::TinyVec;

use crate::error::{KDIndexError, Result};
use crate::kdtree::index::{Entry, NodeId, NodeKind};
use crate::kdtree::KDTree;
use crate::r#type::CoordOrder;

impl<N: Clone, V, O: CoordOrder<N>> KDTree<N, V, O> {
    /// Search the index for entries within an axis-aligned box.
    ///
    /// `bounds` holds one inclusive `(min, max)` pair per axis, in axis order. Matches are
    /// produced lazily, in the same order as [`iter`][KDTree::iter].
    ///
    /// ```
    /// use kd_index::kdtree::KDTree;
    ///
    /// let pairs = vec![([10., 1.], 1), ([8., 3.], 2), ([1., 3.], 3), ([7., 2.], 4)];
    /// let tree = KDTree::try_new(pairs, 2).unwrap();
    ///
    /// let mut found: Vec<i32> = tree
    ///     .range(&[(4., 8.), (1., 5.)])
    ///     .unwrap()
    ///     .map(|entry| *entry.value())
    ///     .collect();
    /// found.sort();
    /// assert_eq!(found, vec![2, 4]);
    /// ```
    pub fn range(&self, bounds: &[(N, N)]) -> Result<RangeIter<'_, N, V, O>> {
        self.check_dimension(bounds.len(), "Query box")?;
        Ok(RangeIter::new(self, bounds.to_vec()))
    }

    /// Search a two-dimensional index for entries within a rectangle.
    pub fn range_rect(&self, rect: &impl RectTrait<T = N>) -> Result<RangeIter<'_, N, V, O>> {
        if self.dimension != 2 {
            return Err(KDIndexError::InvalidInput(format!(
                "Rectangle queries need a 2-dimensional tree, this one has {} axes.",
                self.dimension
            )));
        }
        let (min, max) = (rect.min(), rect.max());
        Ok(RangeIter::new(
            self,
            vec![(min.x(), max.x()), (min.y(), max.y())],
        ))
    }

    /// Look up the value stored under exactly `key`.
    pub fn get(&self, key: &[N]) -> Result<Option<&V>> {
        self.check_dimension(key.len(), "Key")?;
        let bounds: Vec<(N, N)> = key.iter().map(|c| (c.clone(), c.clone())).collect();
        let found = RangeIter::new(self, bounds)
            .find(|entry| self.order.keys_equal(entry.key(), key))
            .map(Entry::value);
        Ok(found)
    }

    /// Returns `true` if an entry is stored under exactly `key`.
    pub fn contains_key(&self, key: &[N]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

impl<N: Bounded + Clone, V, O> KDTree<N, V, O> {
    /// A query box spanning the whole coordinate domain on every axis.
    ///
    /// Note that for floats this is `[MIN, MAX]`, which excludes infinite coordinates.
    pub fn full_range(&self) -> Vec<(N, N)> {
        vec![(N::min_value(), N::max_value()); self.dimension]
    }
}

/// Lazy iterator over the entries matching a range query, created by [`KDTree::range`].
///
/// Cloning forks the traversal at its current position. Call [`KDTree::range`] again to start
/// over.
#[derive(Debug, Clone)]
pub struct RangeIter<'a, N, V, O> {
    tree: &'a KDTree<N, V, O>,
    bounds: Vec<(N, N)>,
    /// Pending `(node, depth)` pairs.
    stack: TinyVec<[(NodeId, usize); 32]>,
}

impl<'a, N, V, O: CoordOrder<N>> RangeIter<'a, N, V, O> {
    fn new(tree: &'a KDTree<N, V, O>, bounds: Vec<(N, N)>) -> Self {
        let mut stack = TinyVec::new();
        if let Some(root) = tree.root {
            stack.push((root, 0));
        }
        Self {
            tree,
            bounds,
            stack,
        }
    }

    /// The query box being searched.
    pub fn bounds(&self) -> &[(N, N)] {
        &self.bounds
    }

    #[inline]
    fn contains(&self, key: &[N]) -> bool {
        let order = &self.tree.order;
        key.iter()
            .zip(&self.bounds)
            .all(|(c, (min, max))| order.less_eq(min, c) && order.less_eq(c, max))
    }
}

impl<'a, N, V, O: CoordOrder<N>> Iterator for RangeIter<'a, N, V, O> {
    type Item = &'a Entry<N, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        while let Some((node, depth)) = self.stack.pop() {
            match &tree.nodes[node] {
                NodeKind::Leaf { entry } => {
                    let entry = &tree.entries[*entry];
                    if self.contains(entry.key()) {
                        return Some(entry);
                    }
                }
                NodeKind::Internal {
                    median,
                    left,
                    right,
                } => {
                    let (min, max) = &self.bounds[depth % tree.dimension];

                    // Entries equal to the median may sit on either side, so both tests are
                    // non-strict. Right is pushed last so it is searched first.
                    if tree.order.less_eq(min, median) {
                        self.stack.push((*left, depth + 1));
                    }
                    if tree.order.less_eq(median, max) {
                        self.stack.push((*right, depth + 1));
                    }
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.stack.is_empty() {
            (0, Some(0))
        } else {
            (0, Some(self.tree.len()))
        }
    }
}

impl<N, V, O: CoordOrder<N>> FusedIterator for RangeIter<'_, N, V, O> {}
