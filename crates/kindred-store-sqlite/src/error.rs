//! Error type for `kindred-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("core error: {0}")]
  Core(#[from] kindred_core::Error),

  /// A merge pass failed and was rolled back. No later pass has run.
  #[error("{pass} pass failed: {source}")]
  Pass {
    pass:   &'static str,
    source: rusqlite::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
