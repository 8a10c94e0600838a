//! Error types for `kindred-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown provider code: {0}")]
  UnknownProvider(i64),

  #[error("unknown sex code: {0}")]
  UnknownSex(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
