//! Error types for `carelog-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A person record arrived without a usable name.
  #[error("person name must not be empty")]
  EmptyName,

  #[error("unknown age bucket: {0:?}")]
  UnknownBucket(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
