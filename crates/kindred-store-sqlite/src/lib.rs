//! SQLite backend for the kindred genealogy graph.
//!
//! The target database uses the RootsMagic table layout, so an existing
//! database opens untouched and a fresh file gets the same shape. All writes
//! go through [`merge::MergeEngine`], which runs a fixed sequence of passes
//! with one transaction per pass.

mod schema;
mod store;

pub mod error;
pub mod merge;

pub use error::{Error, Result};
pub use merge::{MergeEngine, MergeReport};
pub use store::GraphStore;

#[cfg(test)]
mod tests;
