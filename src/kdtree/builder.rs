use std::cmp;
use std::mem;

use crate::error::{KDIndexError, Result};
use crate::kdtree::index::{Entry, NodeId, NodeKind};
use crate::kdtree::resolve::{CollisionResolver, KeepLast};
use crate::kdtree::KDTree;
use crate::r#type::{CoordOrder, NaturalOrder};

/// A builder to create a [`KDTree`].
///
/// ```
/// use kd_index::kdtree::KDTreeBuilder;
///
/// let mut builder = KDTreeBuilder::<f64, &str>::new(2).unwrap();
/// builder.add([0., 0.], "a").unwrap();
/// builder.add([1., 1.], "b").unwrap();
/// builder.add([2., 2.], "c").unwrap();
/// let tree = builder.finish();
/// assert_eq!(tree.len(), 3);
/// ```
pub struct KDTreeBuilder<N, V, O = NaturalOrder, R = KeepLast> {
    dimension: usize,
    order: O,
    resolver: R,
    keys: Vec<Vec<N>>,
    values: Vec<V>,
}

impl<N, V> KDTreeBuilder<N, V> {
    /// Create a new builder for keys with `dimension` axes.
    pub fn new(dimension: usize) -> Result<Self> {
        Self::with_capacity(dimension, 0)
    }

    /// Create a new builder for keys with `dimension` axes, with room for `capacity` pairs.
    pub fn with_capacity(dimension: usize, capacity: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(KDIndexError::InvalidInput(
                "Dimension must be at least 1.".to_string(),
            ));
        }

        Ok(Self {
            dimension,
            order: NaturalOrder,
            resolver: KeepLast,
            keys: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        })
    }
}

impl<N, V, O, R> KDTreeBuilder<N, V, O, R> {
    /// Use a custom coordinate order instead of the natural one.
    pub fn with_order<O2: CoordOrder<N>>(self, order: O2) -> KDTreeBuilder<N, V, O2, R> {
        KDTreeBuilder {
            dimension: self.dimension,
            order,
            resolver: self.resolver,
            keys: self.keys,
            values: self.values,
        }
    }

    /// Use a custom strategy for merging pairs with colliding keys.
    pub fn with_resolver<R2: CollisionResolver<N, V>>(
        self,
        resolver: R2,
    ) -> KDTreeBuilder<N, V, O, R2> {
        KDTreeBuilder {
            dimension: self.dimension,
            order: self.order,
            resolver,
            keys: self.keys,
            values: self.values,
        }
    }

    /// The number of axes every key must have.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The number of pairs added so far.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no pairs were added yet.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Add a pair to the index.
    ///
    /// This returns the insertion index. When several pairs share a key, the collision resolver
    /// sees them ordered by this index.
    pub fn add(&mut self, key: impl Into<Vec<N>>, value: V) -> Result<usize> {
        let key = key.into();
        if key.len() != self.dimension {
            return Err(KDIndexError::InvalidInput(format!(
                "Key {} has {} axes, expected {}.",
                self.keys.len(),
                key.len(),
                self.dimension
            )));
        }

        let index = self.keys.len();
        self.keys.push(key);
        self.values.push(value);
        Ok(index)
    }

    /// Add every pair of `pairs`, stopping at the first key with the wrong dimension.
    pub fn extend_pairs<K, I>(&mut self, pairs: I) -> Result<()>
    where
        K: Into<Vec<N>>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in pairs {
            self.add(key, value)?;
        }
        Ok(())
    }
}

impl<N, V, O, R> KDTreeBuilder<N, V, O, R>
where
    N: Clone,
    O: CoordOrder<N>,
    R: CollisionResolver<N, V>,
{
    /// Consume this builder, partitioning the pairs into a balanced tree ready for queries.
    pub fn finish(self) -> KDTree<N, V, O> {
        let num_items = self.keys.len();
        if num_items == 0 {
            return KDTree::empty(self.dimension, self.order);
        }

        let mut ids: Vec<usize> = (0..num_items).collect();
        let mut state = BuildState {
            dimension: self.dimension,
            order: &self.order,
            resolver: &self.resolver,
            keys: self.keys,
            values: self.values.into_iter().map(Some).collect(),
            nodes: Vec::with_capacity(2 * num_items - 1),
            entries: Vec::with_capacity(num_items),
            collisions: 0,
        };

        let root = state.build(&mut ids, 0);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            items = num_items,
            entries = state.entries.len(),
            nodes = state.nodes.len(),
            collisions = state.collisions,
            "built k-d tree"
        );

        let BuildState { nodes, entries, .. } = state;
        KDTree {
            dimension: self.dimension,
            order: self.order,
            nodes,
            root: Some(root),
            entries,
        }
    }
}

/// Scratch state of a single build.
///
/// `ids` passed to [`BuildState::build`] is a permutation of insertion indices into `keys` and
/// `values`. A pair is moved out of `keys`/`values` exactly once, when its leaf is finalized.
struct BuildState<'a, N, V, O, R> {
    dimension: usize,
    order: &'a O,
    resolver: &'a R,
    keys: Vec<Vec<N>>,
    values: Vec<Option<V>>,
    nodes: Vec<NodeKind<N>>,
    entries: Vec<Entry<N, V>>,
    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    collisions: usize,
}

impl<N, V, O, R> BuildState<'_, N, V, O, R>
where
    N: Clone,
    O: CoordOrder<N>,
    R: CollisionResolver<N, V>,
{
    fn build(&mut self, ids: &mut [usize], depth: usize) -> NodeId {
        debug_assert!(!ids.is_empty());
        let axis = depth % self.dimension;

        if ids.len() == 1 || self.all_keys_equal(ids) {
            return self.push_leaf(ids);
        }

        let Some((median, split)) = self.split(ids, axis) else {
            return self.push_leaf(ids);
        };

        let (left_ids, right_ids) = ids.split_at_mut(split);
        let left = self.build(left_ids, depth + 1);
        let right = self.build(right_ids, depth + 1);

        self.nodes.push(NodeKind::Internal {
            median,
            left,
            right,
        });
        self.nodes.len() - 1
    }

    fn all_keys_equal(&self, ids: &[usize]) -> bool {
        let first = &self.keys[ids[0]];
        ids[1..]
            .iter()
            .all(|&id| self.order.keys_equal(first, &self.keys[id]))
    }

    /// Reorder `ids` so that `ids[..split]` goes left and `ids[split..]` goes right, returning
    /// the splitting value and `split`. Both sides are non-empty.
    fn split(&self, ids: &mut [usize], axis: usize) -> Option<(N, usize)> {
        let keys = &self.keys;
        let order = self.order;
        let last = ids.len() - 1;
        let k = last >> 1;

        select(ids, keys, order, k, 0, last, axis);
        let median = keys[ids[k]][axis].clone();

        let split = partition(ids, |id| order.less_eq(&keys[id][axis], &median));
        if split < ids.len() {
            return Some((median, split));
        }

        // Everything from the median up is tied on this axis. Split below the tie instead.
        let below = ids
            .iter()
            .map(|&id| &keys[id][axis])
            .filter(|c| order.less(c, &median))
            .fold(None, |max: Option<&N>, c| match max {
                Some(m) if !order.less(m, c) => Some(m),
                _ => Some(c),
            })
            .cloned();
        if let Some(lower) = below {
            #[cfg(feature = "tracing")]
            tracing::trace!(axis, items = ids.len(), "median tied with maximum, splitting below");
            let split = partition(ids, |id| order.less_eq(&keys[id][axis], &lower));
            return Some((lower, split));
        }

        // Every coordinate on this axis is tied. Peel off the collision group of the
        // median-bearing key.
        #[cfg(feature = "tracing")]
        tracing::trace!(axis, items = ids.len(), "axis fully tied, splitting on key equality");
        let pivot = ids[k];
        let split = partition(ids, |id| order.keys_equal(&keys[id], &keys[pivot]));
        if 0 < split && split < ids.len() {
            return Some((median, split));
        }

        // Only reachable when `equal` is not an equivalence relation (e.g. NaN coordinates).
        // Split off the pivot alone so the build still terminates.
        let pos = ids.iter().position(|&id| id == pivot)?;
        ids.swap(0, pos);
        Some((median, 1))
    }

    fn push_leaf(&mut self, ids: &mut [usize]) -> NodeId {
        let entry = if let [id] = *ids {
            let (key, value) = self.take_pair(id);
            Entry { key, value }
        } else {
            // Colliding pairs are resolved in insertion order
            ids.sort_unstable();
            let run: Vec<(Vec<N>, V)> = ids.iter().map(|&id| self.take_pair(id)).collect();
            self.collisions += run.len() - 1;
            let key = run[run.len() - 1].0.clone();
            let value = self.resolver.resolve(run);
            Entry { key, value }
        };

        self.entries.push(entry);
        self.nodes.push(NodeKind::Leaf {
            entry: self.entries.len() - 1,
        });
        self.nodes.len() - 1
    }

    fn take_pair(&mut self, id: usize) -> (Vec<N>, V) {
        let key = mem::take(&mut self.keys[id]);
        let Some(value) = self.values[id].take() else {
            unreachable!("pair {id} finalized twice");
        };
        (key, value)
    }
}

/// Move every id satisfying `pred` to the front of `ids`, returning how many there are.
fn partition<F: FnMut(usize) -> bool>(ids: &mut [usize], mut pred: F) -> usize {
    let mut split = 0;
    for i in 0..ids.len() {
        if pred(ids[i]) {
            ids.swap(split, i);
            split += 1;
        }
    }
    split
}

/// Custom Floyd-Rivest selection algorithm: reorder `ids` so that `ids[left..k]` are not greater
/// than the k-th item and `ids[k + 1..=right]` are not smaller, comparing on `axis`.
fn select<N, O: CoordOrder<N>>(
    ids: &mut [usize],
    keys: &[Vec<N>],
    order: &O,
    k: usize,
    mut left: usize,
    mut right: usize,
    axis: usize,
) where
    N: Clone,
{
    while right > left {
        if right - left > 600 {
            let n = (right - left + 1) as f64;
            let m = (k - left + 1) as f64;
            let z = f64::ln(n);
            let s = 0.5 * f64::exp((2.0 * z) / 3.0);
            let sd = 0.5
                * f64::sqrt((z * s * (n - s)) / n)
                * (if m - n / 2.0 < 0.0 { -1.0 } else { 1.0 });
            let new_left = cmp::max(left, f64::floor(k as f64 - (m * s) / n + sd) as usize);
            let new_right = cmp::min(
                right,
                f64::floor(k as f64 + ((n - m) * s) / n + sd) as usize,
            );
            select(ids, keys, order, k, new_left, new_right, axis);
        }

        let t = coord(keys, ids, axis, k).clone();
        let mut i = left;
        let mut j = right;

        ids.swap(left, k);
        if order.less(&t, coord(keys, ids, axis, right)) {
            ids.swap(left, right);
        }

        while i < j {
            ids.swap(i, j);
            i += 1;
            j -= 1;
            while order.less(coord(keys, ids, axis, i), &t) {
                i += 1;
            }
            while order.less(&t, coord(keys, ids, axis, j)) {
                j -= 1;
            }
        }

        if order.equivalent(coord(keys, ids, axis, left), &t) {
            ids.swap(left, j);
        } else {
            j += 1;
            ids.swap(j, right);
        }

        if j <= k {
            left = j + 1;
        }
        if k <= j {
            if j == 0 {
                break;
            }
            right = j - 1;
        }
    }
}

#[inline]
fn coord<'k, N>(keys: &'k [Vec<N>], ids: &[usize], axis: usize, i: usize) -> &'k N {
    &keys[ids[i]][axis]
}
