//! An implementation of an immutable K-D Tree over keys with any number of axes.

#![warn(missing_docs)]

mod builder;
mod index;
mod query;
mod resolve;
mod traversal;

pub use builder::KDTreeBuilder;
pub use index::{Entry, Iter, KDTree};
pub use query::RangeIter;
pub use resolve::{CollisionResolver, KeepFirst, KeepLast};
pub use traversal::Node;
