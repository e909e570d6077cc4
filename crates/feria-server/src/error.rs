//! Error types for server setup: configuration, credentials and mail.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,

  #[error("invalid configuration: {0}")]
  Config(String),

  #[error("password hashing failed: {0}")]
  Hash(String),

  #[error("invalid mail address: {0}")]
  Address(#[from] lettre::address::AddressError),

  #[error("smtp error: {0}")]
  Smtp(#[from] lettre::transport::smtp::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
