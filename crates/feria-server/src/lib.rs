//! HTTP server for the fair booking service.
//!
//! Mounts the [`feria_api`] router under `/api`, wires the SQLite store, the
//! admin credential check and the confirmation mailer, and carries the
//! runtime configuration.

pub mod auth;
pub mod error;
pub mod mail;

pub use error::Error;

use std::path::PathBuf;

use axum::{Router, body::Body, http::Request};
use chrono::{Duration, NaiveDate};
use feria_api::{ApiState, api_router};
use feria_core::{notify::Notifier, policy::Policy, store::ReservationStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::Span;

use mail::SmtpConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `FERIA_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                     String,
  #[serde(default = "default_port")]
  pub port:                     u16,
  pub store_path:               PathBuf,
  /// Base of the confirmation link mailed to coordinators.
  pub public_url:               String,
  /// Where the browser lands after following a confirmation link.
  #[serde(default)]
  pub frontend_url:             String,
  pub admin_username:           String,
  pub admin_password_hash:      String,
  #[serde(default = "default_max_students")]
  pub max_students_per_booking: u32,
  #[serde(default = "default_ttl_hours")]
  pub confirmation_ttl_hours:   u32,
  #[serde(default = "default_retries")]
  pub max_transaction_retries:  u32,
  #[serde(default)]
  pub smtp:                     Option<SmtpConfig>,
  /// Fair days created by `--seed`.
  #[serde(default)]
  pub seed_dates:               Vec<NaiveDate>,
  #[serde(default = "default_slot_capacity")]
  pub slot_capacity:            u32,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_max_students() -> u32 { Policy::default().max_students_per_booking }

fn default_ttl_hours() -> u32 { 24 }

fn default_retries() -> u32 { Policy::default().max_transaction_retries }

fn default_slot_capacity() -> u32 { 200 }

impl ServerConfig {
  pub fn policy(&self) -> Policy {
    Policy {
      max_students_per_booking: self.max_students_per_booking,
      confirmation_ttl:         Duration::hours(i64::from(self.confirmation_ttl_hours)),
      max_transaction_retries:  self.max_transaction_retries,
    }
  }

  pub fn validate(&self) -> error::Result<()> {
    if self.public_url.trim().is_empty() {
      return Err(Error::Config("public_url must not be empty".into()));
    }
    if self.max_students_per_booking == 0 {
      return Err(Error::Config("max_students_per_booking must be positive".into()));
    }
    if self.confirmation_ttl_hours == 0 {
      return Err(Error::Config("confirmation_ttl_hours must be positive".into()));
    }
    Ok(())
  }
}

// ─── Application ──────────────────────────────────────────────────────────────

/// The full application: the API under `/api` with request tracing.
pub fn app<S, N>(state: ApiState<S, N>) -> Router
where
  S: ReservationStore + 'static,
  N: Notifier + 'static,
{
  Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http().make_span_with(request_span))
}

/// Span for one HTTP request. Records the path only: the query string of a
/// confirmation link carries the bearer token.
fn request_span(req: &Request<Body>) -> Span {
  tracing::debug_span!(
    "request",
    method = %req.method(),
    path = %req.uri().path(),
    version = ?req.version(),
  )
}
