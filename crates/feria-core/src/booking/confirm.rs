//! Confirmation token resolver.
//!
//! A mailed link moves a `pending` reservation to `confirmed` exactly once.
//! Repeat clicks on a spent link are recognised through the retained token
//! digest and reported as success without touching the row again.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Result,
  reservation::ReservationStatus,
  store::Ledger,
  token::token_digest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
  /// This call moved the reservation to `confirmed`.
  Confirmed(Uuid),
  /// The reservation was already confirmed; nothing changed.
  AlreadyConfirmed(Uuid),
  Rejected(Rejection),
}

impl ConfirmOutcome {
  pub fn is_success(&self) -> bool {
    matches!(self, Self::Confirmed(_) | Self::AlreadyConfirmed(_))
  }
}

/// Why a link could not confirm anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
  MissingToken,
  UnknownToken,
  Cancelled,
  /// The link outlived the confirmation window. The reservation stays
  /// `pending` and keeps holding its seats.
  Expired,
}

/// Resolve one click on a confirmation link.
///
/// Expiry is strict: a link used exactly `ttl` after booking still works.
pub fn resolve(
  ledger: &mut dyn Ledger,
  token: Option<&str>,
  now: DateTime<Utc>,
  ttl: Duration,
) -> Result<ConfirmOutcome> {
  let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
    return Ok(ConfirmOutcome::Rejected(Rejection::MissingToken));
  };

  let Some(reservation) = ledger.reservation_by_token(token)? else {
    return spent(ledger, token);
  };
  let id = reservation.reservation_id;

  match reservation.status {
    ReservationStatus::Confirmed => Ok(ConfirmOutcome::AlreadyConfirmed(id)),
    ReservationStatus::Cancelled => Ok(ConfirmOutcome::Rejected(Rejection::Cancelled)),
    ReservationStatus::Pending if now - reservation.created_at > ttl => {
      info!(reservation_id = %id, "confirmation link expired");
      Ok(ConfirmOutcome::Rejected(Rejection::Expired))
    }
    ReservationStatus::Pending => {
      ledger.update_status(id, ReservationStatus::Confirmed, Some(now), true, now)?;
      info!(reservation_id = %id, "reservation confirmed");
      Ok(ConfirmOutcome::Confirmed(id))
    }
  }
}

/// Classify a token that no longer matches an outstanding link.
fn spent(ledger: &mut dyn Ledger, token: &str) -> Result<ConfirmOutcome> {
  let outcome = match ledger.reservation_by_spent_token(&token_digest(token))? {
    Some(r) if r.status == ReservationStatus::Confirmed => {
      ConfirmOutcome::AlreadyConfirmed(r.reservation_id)
    }
    Some(r) if r.status == ReservationStatus::Cancelled => {
      ConfirmOutcome::Rejected(Rejection::Cancelled)
    }
    _ => ConfirmOutcome::Rejected(Rejection::UnknownToken),
  };
  debug!(?outcome, "token matched no outstanding link");
  Ok(outcome)
}
