//! Error type for `feria-store-sqlite`.

use rusqlite::{ErrorCode, ffi};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("database schema version {found} is newer than supported version {supported}")]
  UnsupportedSchema { found: i64, supported: i64 },

  #[error("invalid value in column {column}: {reason}")]
  Decode {
    column: &'static str,
    reason: String,
  },
}

impl Error {
  fn sqlite(&self) -> Option<&rusqlite::Error> {
    match self {
      Self::Sqlite(e) | Self::Database(tokio_rusqlite::Error::Rusqlite(e)) => Some(e),
      _ => None,
    }
  }

  /// True when the failure came from another writer: a lock that outlived
  /// the busy timeout, or a uniqueness race lost to a concurrent commit.
  pub fn is_contention(&self) -> bool {
    let Some(rusqlite::Error::SqliteFailure(failure, _)) = self.sqlite() else {
      return false;
    };
    matches!(failure.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
      || failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
      || failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  }
}

impl From<Error> for feria_core::Error {
  fn from(e: Error) -> Self {
    if e.is_contention() {
      tracing::debug!(error = %e, "sqlite contention");
      feria_core::Error::StorageConflict
    } else {
      feria_core::Error::storage(e)
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
