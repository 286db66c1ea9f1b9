#![doc = include_str!("../README.md")]

mod error;
pub mod kdtree;
mod r#type;

pub use error::{KDIndexError, Result};
pub use r#type::{CoordOrder, NaturalOrder, OrderBy};

#[cfg(test)]
pub(crate) mod test;
