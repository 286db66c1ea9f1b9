use std::fmt;

/// A strategy for comparing the coordinates of keys stored in a
/// [`KDTree`][crate::kdtree::KDTree].
///
/// The tree never uses `<` or `==` on coordinates directly. All comparisons during construction
/// and querying go through this trait, so any coordinate type can be indexed as long as a strict
/// weak ordering can be defined over it.
///
/// - [`less`][CoordOrder::less] must be a strict weak ordering. It drives median selection,
///   partitioning and query pruning.
/// - [`equal`][CoordOrder::equal] must be an equivalence relation. It is used only to detect keys
///   that collide on every axis.
pub trait CoordOrder<N> {
    /// Returns `true` if `a` sorts strictly before `b`.
    fn less(&self, a: &N, b: &N) -> bool;

    /// Returns `true` if `a` and `b` are the same coordinate.
    fn equal(&self, a: &N, b: &N) -> bool;

    /// `a <= b` under this ordering.
    #[inline]
    fn less_eq(&self, a: &N, b: &N) -> bool {
        !self.less(b, a)
    }

    /// Neither coordinate sorts before the other.
    #[inline]
    fn equivalent(&self, a: &N, b: &N) -> bool {
        !self.less(a, b) && !self.less(b, a)
    }

    /// Full-key equality: every coordinate of `a` is [`equal`][CoordOrder::equal] to the
    /// coordinate of `b` at the same position.
    fn keys_equal(&self, a: &[N], b: &[N]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.equal(x, y))
    }
}

/// Orders coordinates by their [`PartialOrd`] and [`PartialEq`] implementations.
///
/// This is the default order of a [`KDTree`][crate::kdtree::KDTree]. Note that for floats, `NaN`
/// coordinates are neither less nor greater than anything and will never match a range query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<N: PartialOrd> CoordOrder<N> for NaturalOrder {
    #[inline]
    fn less(&self, a: &N, b: &N) -> bool {
        a < b
    }

    #[inline]
    fn equal(&self, a: &N, b: &N) -> bool {
        a == b
    }
}

/// An order defined by a pair of closures.
///
/// ```
/// use kd_index::OrderBy;
/// use kd_index::kdtree::KDTree;
///
/// // Case-insensitive string coordinates
/// let order = OrderBy::new(
///     |a: &String, b: &String| a.to_lowercase() < b.to_lowercase(),
///     |a: &String, b: &String| a.eq_ignore_ascii_case(b),
/// );
/// let pairs = vec![
///     (vec!["b".to_string()], 1),
///     (vec!["A".to_string()], 2),
///     (vec!["a".to_string()], 3),
/// ];
/// let tree = KDTree::try_new_with_order(pairs, 1, order).unwrap();
/// assert_eq!(tree.len(), 2);
/// ```
#[derive(Clone, Copy)]
pub struct OrderBy<L, E> {
    less: L,
    equal: E,
}

impl<L, E> OrderBy<L, E> {
    /// Create a new order from a strict "less than" and an equality predicate.
    pub fn new(less: L, equal: E) -> Self {
        Self { less, equal }
    }
}

impl<N, L, E> CoordOrder<N> for OrderBy<L, E>
where
    L: Fn(&N, &N) -> bool,
    E: Fn(&N, &N) -> bool,
{
    #[inline]
    fn less(&self, a: &N, b: &N) -> bool {
        (self.less)(a, b)
    }

    #[inline]
    fn equal(&self, a: &N, b: &N) -> bool {
        (self.equal)(a, b)
    }
}

impl<L, E> fmt::Debug for OrderBy<L, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderBy").finish_non_exhaustive()
    }
}
