//! [`SqliteStore`]: the SQLite implementation of [`ReservationStore`].

use std::{path::Path, time::Duration};

use feria_core::{
  Result as CoreResult,
  store::{Ledger, ReservationStore, TxMode},
};
use rusqlite::TransactionBehavior;
use tracing::info;

use crate::{
  Error, Result,
  ledger::SqliteLedger,
  schema::{SCHEMA, SCHEMA_VERSION},
};

/// How long a writer waits for another connection's lock before the attempt
/// is reported as a storage conflict.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A reservation store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted. Separate
/// [`SqliteStore::open`] calls on the same file coordinate through SQLite's
/// own locking.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_owned();
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    info!(path = %path.display(), "opened reservation store");
    Ok(store)
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(())
      })
      .await?;

    let found = self.schema_version().await?;
    if found > SCHEMA_VERSION {
      return Err(Error::UnsupportedSchema { found, supported: SCHEMA_VERSION });
    }

    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// The `user_version` recorded by the schema; `0` for a fresh database.
  pub async fn schema_version(&self) -> Result<i64> {
    let version: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?))
      .await?;
    Ok(version)
  }
}

// ─── ReservationStore impl ───────────────────────────────────────────────────

impl ReservationStore for SqliteStore {
  /// `Serializable` runs under `BEGIN IMMEDIATE`, taking the database write
  /// lock up front. `Read` runs under a deferred transaction that is always
  /// rolled back.
  async fn transact<T, F>(&self, mode: TxMode, op: F) -> CoreResult<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn Ledger) -> CoreResult<T> + Send + 'static,
  {
    let behavior = match mode {
      TxMode::Read => TransactionBehavior::Deferred,
      TxMode::Serializable => TransactionBehavior::Immediate,
    };

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(behavior)?;
        let result = op(&mut SqliteLedger::new(&tx));
        if result.is_ok() && mode == TxMode::Serializable {
          tx.commit()?;
        }
        Ok(result)
      })
      .await;

    match outcome {
      Ok(result) => result,
      Err(e) => Err(Error::from(e).into()),
    }
  }
}
