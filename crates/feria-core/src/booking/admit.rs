//! Reservation writer: admits or rejects one booking request.
//!
//! [`admit`] must run inside a serializable transaction. It re-derives the
//! slot's occupancy from the rows visible to that transaction, so two
//! concurrent bookings cannot both see the same free seats.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result,
  booking::availability::remaining,
  fair::{Event, TimeSlot},
  institution::Institution,
  reservation::{NewReservation, Reservation, ReservationStatus},
  store::Ledger,
  token::ConfirmationToken,
};

/// A committed booking together with the topology it was checked against.
#[derive(Debug, Clone)]
pub struct Admission {
  pub reservation:         Reservation,
  pub event:               Event,
  pub slot:                TimeSlot,
  pub institution_created: bool,
}

/// Run the admission checks in order and insert a `pending` reservation.
///
/// Capacity is checked before duplicates, so a request that violates both
/// reports the capacity failure.
pub fn admit(
  ledger: &mut dyn Ledger,
  request: &NewReservation,
  token: ConfirmationToken,
  now: DateTime<Utc>,
) -> Result<Admission> {
  let (event, slot) = resolve_slot(ledger, request.event_id, request.slot_id)?;

  let active = ledger.sum_active_students(slot.slot_id, None)?;
  check_capacity(&slot, active, request.student_count)?;

  if ledger
    .find_active_reservation(&request.institution_code, slot.slot_id, None)?
    .is_some()
  {
    return Err(Error::DuplicateBooking {
      institution_code: request.institution_code.clone(),
      slot_id:          slot.slot_id,
    });
  }

  let institution_created =
    ensure_institution(ledger, &request.institution_code, &request.school_name, now)?;

  let reservation = Reservation {
    reservation_id:        Uuid::new_v4(),
    institution_code:      request.institution_code.clone(),
    school_name:           request.school_name.clone(),
    coordinator_name:      request.coordinator_name.clone(),
    coordinator_last_name: request.coordinator_last_name.clone(),
    email:                 request.email.clone(),
    phone:                 request.phone.clone(),
    student_count:         request.student_count,
    event_id:              event.event_id,
    slot_id:               slot.slot_id,
    status:                ReservationStatus::Pending,
    confirmation_token:    Some(token),
    created_at:            now,
    updated_at:            now,
    confirmed_at:          None,
  };
  ledger.insert_reservation(&reservation)?;

  Ok(Admission { reservation, event, slot, institution_created })
}

/// Load a slot and its event, and check the caller named the right event.
pub(crate) fn resolve_slot(
  ledger: &mut dyn Ledger,
  event_id: Uuid,
  slot_id: Uuid,
) -> Result<(Event, TimeSlot)> {
  let slot = ledger.slot(slot_id)?.ok_or(Error::SlotNotFound(slot_id))?;

  if slot.event_id != event_id {
    if ledger.event(event_id)?.is_none() {
      return Err(Error::EventNotFound(event_id));
    }
    return Err(Error::SlotEventMismatch { slot_id, event_id });
  }

  let event = ledger
    .event(slot.event_id)?
    .ok_or(Error::EventNotFound(slot.event_id))?;
  Ok((event, slot))
}

/// Reject when `requested` more students would push the slot past capacity.
pub(crate) fn check_capacity(slot: &TimeSlot, active: u32, requested: u32) -> Result<()> {
  let would_be = u64::from(active) + u64::from(requested);
  if would_be > u64::from(slot.capacity) {
    return Err(Error::InsufficientCapacity { remaining: remaining(slot.capacity, active) });
  }
  Ok(())
}

/// Lookup-then-create inside the caller's transaction. Never renames an
/// existing institution.
pub(crate) fn ensure_institution(
  ledger: &mut dyn Ledger,
  code: &str,
  name: &str,
  now: DateTime<Utc>,
) -> Result<bool> {
  if ledger.institution(code)?.is_some() {
    return Ok(false);
  }

  ledger.create_institution(&Institution {
    code:       code.to_owned(),
    name:       name.to_owned(),
    created_at: now,
  })?;
  info!(institution_code = %code, "registered new institution");
  Ok(true)
}
