//! HTTP Basic credentials for the administrative endpoints.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::http::{HeaderMap, header};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use feria_api::AdminCheck;
use rand_core::OsRng;

use crate::error::{Error, Result};

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct BasicAuth {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

impl BasicAuth {
  /// Fails at startup rather than on the first admin request.
  pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Result<Self> {
    let auth = Self { username: username.into(), password_hash: password_hash.into() };
    PasswordHash::new(&auth.password_hash)
      .map_err(|e| Error::Config(format!("admin_password_hash: {e}")))?;
    Ok(auth)
  }

  /// Verify the `Authorization` header against the configured credentials.
  pub fn verify(&self, headers: &HeaderMap) -> Result<()> {
    let header_val = headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .ok_or(Error::Unauthorized)?;

    let encoded = header_val.strip_prefix("Basic ").ok_or(Error::Unauthorized)?;

    let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
    let creds = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

    let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

    if username != self.username {
      return Err(Error::Unauthorized);
    }

    let parsed_hash = PasswordHash::new(&self.password_hash).map_err(|_| Error::Unauthorized)?;

    Argon2::default()
      .verify_password(password.as_bytes(), &parsed_hash)
      .map_err(|_| Error::Unauthorized)
  }
}

impl AdminCheck for BasicAuth {
  fn is_admin(&self, headers: &HeaderMap) -> bool {
    match self.verify(headers) {
      Ok(()) => true,
      Err(_) => {
        tracing::debug!("admin credentials rejected");
        false
      }
    }
  }
}

/// Argon2 PHC string for `password`, suitable for `admin_password_hash`.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::Hash(e.to_string()))
}
