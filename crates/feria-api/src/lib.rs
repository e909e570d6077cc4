//! JSON REST API for the fair booking service.
//!
//! Exposes an axum [`Router`] backed by a [`BookingService`]. TLS, request
//! tracing, and the concrete admin credential check are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", feria_api::api_router(state))
//! ```

pub mod admin;
pub mod error;
pub mod events;
pub mod institutions;
pub mod reservations;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use feria_core::{booking::BookingService, notify::Notifier, store::ReservationStore};

pub use admin::{Admin, AdminCheck};
pub use error::ApiError;

// ─── State ───────────────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S, N> {
  pub booking:      BookingService<S, N>,
  pub admin:        Arc<dyn AdminCheck>,
  /// Where confirmation links send the browser afterwards. Empty means `/`.
  pub frontend_url: Arc<str>,
}

impl<S, N> Clone for ApiState<S, N> {
  fn clone(&self) -> Self {
    Self {
      booking:      self.booking.clone(),
      admin:        Arc::clone(&self.admin),
      frontend_url: Arc::clone(&self.frontend_url),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, N>(state: ApiState<S, N>) -> Router<()>
where
  S: ReservationStore + 'static,
  N: Notifier + 'static,
{
  Router::new()
    // Public booking
    .route("/reservations", post(reservations::create::<S, N>))
    .route("/reservations/confirm", get(reservations::confirm::<S, N>))
    // Availability
    .route("/events/days", get(events::days::<S, N>))
    .route("/slots/{id}/availability", get(events::availability::<S, N>))
    // Registry
    .route("/institutions/{code}", get(institutions::lookup::<S, N>))
    // Administration
    .route(
      "/admin/reservations/{id}",
      get(admin::get_one::<S, N>).patch(admin::amend::<S, N>),
    )
    .with_state(state)
}
