//! Institution registry lookup.

use axum::{
  Json,
  extract::{Path, State},
};
use feria_core::{institution::Institution, notify::Notifier, store::ReservationStore};

use crate::{ApiState, error::ApiError};

/// `GET /institutions/{code}`
pub async fn lookup<S, N>(
  State(state): State<ApiState<S, N>>,
  Path(code): Path<String>,
) -> Result<Json<Institution>, ApiError>
where
  S: ReservationStore,
  N: Notifier,
{
  state
    .booking
    .lookup_institution(&code)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("institution {code} not found")))
}
