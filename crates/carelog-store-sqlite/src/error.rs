//! Error type for `carelog-store-sqlite`.

use carelog_core::person::PersonId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] carelog_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("person not found: {0}")]
  PersonNotFound(PersonId),

  /// The merge of one duplicate group was rolled back.
  #[error("merge of duplicate group {name:?} failed: {source}")]
  MergeFailed {
    name:   String,
    #[source]
    source: tokio_rusqlite::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
