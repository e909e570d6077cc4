//! Administrative amendment of an existing reservation.
//!
//! Runs under the same serializable discipline as [`super::admit`] and
//! re-checks capacity and duplicates whenever the change could affect them.
//! The reservation's own seats are excluded from those re-checks.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result,
  booking::admit::{check_capacity, ensure_institution, resolve_slot},
  reservation::{Reservation, ReservationPatch, ReservationStatus},
  store::Ledger,
};

/// Apply a validated patch to reservation `id` and return the stored result.
pub fn amend(
  ledger: &mut dyn Ledger,
  id: Uuid,
  patch: &ReservationPatch,
  now: DateTime<Utc>,
) -> Result<Reservation> {
  let current = ledger.reservation(id)?.ok_or(Error::ReservationNotFound(id))?;
  let mut next = current.clone();

  if let Some(code) = &patch.institution_code {
    next.institution_code = code.clone();
  }
  if let Some(name) = &patch.school_name {
    next.school_name = name.clone();
  }
  if let Some(name) = &patch.coordinator_name {
    next.coordinator_name = name.clone();
  }
  if let Some(last) = &patch.coordinator_last_name {
    next.coordinator_last_name = Some(last.clone()).filter(|l| !l.is_empty());
  }
  if let Some(email) = &patch.email {
    next.email = email.clone();
  }
  if let Some(phone) = &patch.phone {
    next.phone = phone.clone();
  }
  if let Some(count) = patch.student_count {
    next.student_count = count;
  }
  if let Some(status) = patch.status {
    next.status = status;
  }

  // A bare slot change moves the reservation to that slot's day.
  if patch.slot_id.is_some() || patch.event_id.is_some() {
    let slot_id = patch.slot_id.unwrap_or(current.slot_id);
    let event_id = match (patch.event_id, patch.slot_id) {
      (Some(event_id), _) => event_id,
      (None, Some(_)) => {
        ledger.slot(slot_id)?.ok_or(Error::SlotNotFound(slot_id))?.event_id
      }
      (None, None) => current.event_id,
    };
    resolve_slot(ledger, event_id, slot_id)?;
    next.slot_id = slot_id;
    next.event_id = event_id;
  }

  let slot_changed = next.slot_id != current.slot_id;
  let code_changed = next.institution_code != current.institution_code;
  let count_changed = next.student_count != current.student_count;
  let reactivated = !current.status.is_active() && next.status.is_active();

  if next.status.is_active() {
    if slot_changed || count_changed || reactivated {
      let slot = ledger
        .slot(next.slot_id)?
        .ok_or(Error::SlotNotFound(next.slot_id))?;
      let active = ledger.sum_active_students(next.slot_id, Some(id))?;
      check_capacity(&slot, active, next.student_count)?;
    }

    if (slot_changed || code_changed || reactivated)
      && ledger
        .find_active_reservation(&next.institution_code, next.slot_id, Some(id))?
        .is_some()
    {
      return Err(Error::DuplicateBooking {
        institution_code: next.institution_code.clone(),
        slot_id:          next.slot_id,
      });
    }
  }

  if code_changed {
    ensure_institution(ledger, &next.institution_code, &next.school_name, now)?;
  }

  let confirming = current.status != ReservationStatus::Confirmed
    && next.status == ReservationStatus::Confirmed;
  if next.status != ReservationStatus::Confirmed {
    next.confirmed_at = None;
  }
  next.updated_at = now;

  ledger.update_reservation(&next)?;
  if confirming {
    ledger.update_status(id, ReservationStatus::Confirmed, Some(now), true, now)?;
  }

  if current.status != next.status {
    info!(
      reservation_id = %id,
      from = %current.status,
      to = %next.status,
      "reservation status changed by admin"
    );
  }

  ledger.reservation(id)?.ok_or(Error::ReservationNotFound(id))
}
