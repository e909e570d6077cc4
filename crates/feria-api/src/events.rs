//! Handlers for fair days and slot availability.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/events/days` | Every day with its slots and seats left |
//! | `GET`  | `/slots/{id}/availability` | 404 if the slot does not exist |

use axum::{
  Json,
  extract::{Path, State},
};
use feria_core::{fair::FairDay, notify::Notifier, store::ReservationStore};
use serde::Serialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// `GET /events/days`
pub async fn days<S, N>(
  State(state): State<ApiState<S, N>>,
) -> Result<Json<Vec<FairDay>>, ApiError>
where
  S: ReservationStore,
  N: Notifier,
{
  Ok(Json(state.booking.fair_days().await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSeats {
  pub slot_id:         Uuid,
  pub available_seats: u32,
}

/// `GET /slots/{id}/availability`
pub async fn availability<S, N>(
  State(state): State<ApiState<S, N>>,
  Path(slot_id): Path<Uuid>,
) -> Result<Json<SlotSeats>, ApiError>
where
  S: ReservationStore,
  N: Notifier,
{
  let available_seats = state.booking.available_seats(slot_id).await?;
  Ok(Json(SlotSeats { slot_id, available_seats }))
}
