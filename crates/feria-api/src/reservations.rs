//! Handlers for `/reservations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/reservations` | 201 `{reservation, emailSent}` |
//! | `GET`  | `/reservations/confirm?token=…` | Always `302 Found` |

use axum::{
  Json,
  extract::{Query, State},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use feria_core::{
  booking::{Booked, confirm::ConfirmOutcome},
  notify::Notifier,
  reservation::ReservationRequest,
  store::ReservationStore,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::{
  ApiState,
  error::{ApiError, JsonBody},
};

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /reservations`
pub async fn create<S, N>(
  State(state): State<ApiState<S, N>>,
  JsonBody(request): JsonBody<ReservationRequest>,
) -> Result<(StatusCode, Json<Booked>), ApiError>
where
  S: ReservationStore,
  N: Notifier,
{
  let booked = state.booking.create_reservation(request).await?;
  Ok((StatusCode::CREATED, Json(booked)))
}

// ─── Confirm ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ConfirmParams {
  pub token: Option<String>,
}

/// `GET /reservations/confirm?token=<token>`
///
/// Redirects to the frontend with `confirmed=true` or `confirmed=error`. The
/// token never appears in the response.
pub async fn confirm<S, N>(
  State(state): State<ApiState<S, N>>,
  Query(params): Query<ConfirmParams>,
) -> Response
where
  S: ReservationStore,
  N: Notifier,
{
  let success = match state.booking.confirm_reservation(params.token.as_deref()).await {
    Ok(ConfirmOutcome::Rejected(reason)) => {
      info!(?reason, "confirmation link rejected");
      false
    }
    Ok(_) => true,
    Err(e) => {
      error!(error = %e, "confirmation failed");
      false
    }
  };
  redirect(&state.frontend_url, success)
}

fn redirect(frontend_url: &str, success: bool) -> Response {
  let base = if frontend_url.is_empty() { "/" } else { frontend_url };
  let separator = if base.contains('?') { '&' } else { '?' };
  let outcome = if success { "true" } else { "error" };
  let location = format!("{base}{separator}confirmed={outcome}");
  (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
