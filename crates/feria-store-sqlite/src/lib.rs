//! SQLite backend for the fair booking protocol.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Serializable transactions are
//! `BEGIN IMMEDIATE`: the write lock is taken before the first read, so a
//! capacity check and the insert it guards cannot interleave with another
//! writer.

mod encode;
mod ledger;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
