//! Strategies for merging pairs whose keys collide on every axis.

/// Merges a run of colliding pairs into the single value that is stored in the tree.
///
/// The run is non-empty and ordered by insertion index. Every key in the run is equal to the
/// others on every axis (according to the tree's [`CoordOrder`][crate::CoordOrder]).
///
/// Any closure `Fn(Vec<(Vec<N>, V)>) -> V` is a resolver:
///
/// ```
/// use kd_index::kdtree::KDTree;
/// use kd_index::NaturalOrder;
///
/// let pairs = vec![(vec![1, 1], 2), (vec![1, 1], 3), (vec![0, 5], 1)];
/// let sum = |run: Vec<(Vec<i32>, i32)>| run.into_iter().map(|(_, v)| v).sum::<i32>();
/// let tree = KDTree::try_new_with(pairs, 2, NaturalOrder, sum).unwrap();
/// assert_eq!(tree.get(&[1, 1]).unwrap(), Some(&5));
/// ```
pub trait CollisionResolver<N, V> {
    /// Produce the stored value for a run of colliding pairs.
    fn resolve(&self, run: Vec<(Vec<N>, V)>) -> V;
}

impl<N, V, F> CollisionResolver<N, V> for F
where
    F: Fn(Vec<(Vec<N>, V)>) -> V,
{
    fn resolve(&self, run: Vec<(Vec<N>, V)>) -> V {
        self(run)
    }
}

/// Keep the value that was added last. This is the default, matching "overwrite" semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeepLast;

impl<N, V> CollisionResolver<N, V> for KeepLast {
    fn resolve(&self, run: Vec<(Vec<N>, V)>) -> V {
        match run.into_iter().last() {
            Some((_, value)) => value,
            None => unreachable!("collision runs are never empty"),
        }
    }
}

/// Keep the value that was added first and ignore later duplicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeepFirst;

impl<N, V> CollisionResolver<N, V> for KeepFirst {
    fn resolve(&self, run: Vec<(Vec<N>, V)>) -> V {
        match run.into_iter().next() {
            Some((_, value)) => value,
            None => unreachable!("collision runs are never empty"),
        }
    }
}
