//! Error type for `kindred-extract`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("source database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("core error: {0}")]
  Core(#[from] kindred_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
