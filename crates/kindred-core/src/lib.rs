//! Core types and algorithms for the Kindred match-reconciliation engine.
//!
//! This crate is deliberately free of database dependencies. It holds the
//! canonical record model, the genealogical date transcoder, the surrogate-id
//! resolver, the pipeline configuration, and the injectable clock. The
//! extraction and merge crates depend on it; it depends on nothing heavier
//! than a hash function.

pub mod clock;
pub mod config;
pub mod date;
pub mod error;
pub mod ident;
pub mod record;

pub use error::{Error, Result};
