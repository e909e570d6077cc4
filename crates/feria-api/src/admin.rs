//! Administrative reservation endpoints and the capability that guards them.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/admin/reservations/{id}` | Full record, never the token |
//! | `PATCH` | `/admin/reservations/{id}` | Partial update; same invariants as booking |

use axum::{
  Json,
  extract::{FromRequestParts, Path, State},
  http::{HeaderMap, request::Parts},
};
use feria_core::{
  notify::Notifier,
  reservation::{Reservation, ReservationPatch},
  store::ReservationStore,
};
use tracing::info;
use uuid::Uuid;

use crate::{
  ApiState,
  error::{ApiError, JsonBody},
};

// ─── Capability ──────────────────────────────────────────────────────────────

/// Decides whether a request carries administrator credentials.
pub trait AdminCheck: Send + Sync {
  fn is_admin(&self, headers: &HeaderMap) -> bool;
}

/// Zero-size marker: present in a handler means the caller is an
/// administrator.
pub struct Admin;

impl<S, N> FromRequestParts<ApiState<S, N>> for Admin
where
  S: Send + Sync,
  N: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S, N>,
  ) -> Result<Self, Self::Rejection> {
    if state.admin.is_admin(&parts.headers) {
      Ok(Admin)
    } else {
      Err(ApiError::Unauthorized)
    }
  }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `GET /admin/reservations/{id}`
pub async fn get_one<S, N>(
  _admin: Admin,
  State(state): State<ApiState<S, N>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Reservation>, ApiError>
where
  S: ReservationStore,
  N: Notifier,
{
  Ok(Json(state.booking.reservation(id).await?))
}

/// `PATCH /admin/reservations/{id}`
pub async fn amend<S, N>(
  _admin: Admin,
  State(state): State<ApiState<S, N>>,
  Path(id): Path<Uuid>,
  JsonBody(patch): JsonBody<ReservationPatch>,
) -> Result<Json<Reservation>, ApiError>
where
  S: ReservationStore,
  N: Notifier,
{
  let reservation = state.booking.amend_reservation(id, patch).await?;
  info!(reservation_id = %id, "reservation amended by admin");
  Ok(Json(reservation))
}
