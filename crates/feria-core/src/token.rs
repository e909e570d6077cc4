//! Single-use confirmation tokens.
//!
//! A token is a bearer credential mailed to the person who booked. It is 32
//! bytes from the operating system's CSPRNG, hex-encoded, and carries no
//! information about the reservation it unlocks.
//!
//! Once a token is consumed the store clears it and keeps only its SHA-256
//! digest, so a repeated click can be recognised without the token itself
//! remaining usable.

use std::fmt;

use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Number of random bytes in a freshly generated token.
pub const TOKEN_BYTES: usize = 32;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConfirmationToken(String);

impl ConfirmationToken {
  /// Draw a new token from the OS random source.
  pub fn generate() -> Self {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Self(hex::encode(bytes))
  }

  /// Wrap a token read back from storage or from a request.
  pub fn from_raw(raw: impl Into<String>) -> Self { Self(raw.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  /// Digest retained after the token is spent.
  pub fn digest(&self) -> String { token_digest(&self.0) }
}

/// Never print the credential itself.
impl fmt::Debug for ConfirmationToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("ConfirmationToken(..)")
  }
}

/// SHA-256 of a raw token string, hex-encoded.
pub fn token_digest(raw: &str) -> String {
  hex::encode(Sha256::digest(raw.as_bytes()))
}
