//! Slot availability projector.
//!
//! Remaining seats are always derived from the reservation rows, never read
//! from a stored counter. Values computed here are advisory; the writer
//! re-derives them inside its own serializable transaction.

use uuid::Uuid;

use crate::{
  Error, Result,
  fair::{FairDay, SlotAvailability},
  store::Ledger,
};

/// Seats left given a capacity and the students already holding seats.
/// Clamped at zero.
pub fn remaining(capacity: u32, active_students: u32) -> u32 {
  capacity.saturating_sub(active_students)
}

/// Remaining seats in one slot.
pub fn available_seats(ledger: &mut dyn Ledger, slot_id: Uuid) -> Result<u32> {
  let slot = ledger.slot(slot_id)?.ok_or(Error::SlotNotFound(slot_id))?;
  let active = ledger.sum_active_students(slot_id, None)?;
  Ok(remaining(slot.capacity, active))
}

/// Every fair day with its slots and their remaining seats.
pub fn fair_days(ledger: &mut dyn Ledger) -> Result<Vec<FairDay>> {
  let mut days = Vec::new();

  for event in ledger.events()? {
    let mut slots = Vec::new();
    for slot in ledger.slots_for_event(event.event_id)? {
      let active = ledger.sum_active_students(slot.slot_id, None)?;
      slots.push(SlotAvailability {
        slot_id:   slot.slot_id,
        time:      slot.label(),
        capacity:  slot.capacity,
        available: remaining(slot.capacity, active),
      });
    }

    days.push(FairDay {
      event_id: event.event_id,
      date: event.date,
      day: event.label(),
      slots,
    });
  }

  Ok(days)
}
