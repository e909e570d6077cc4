//! Fair seeding.

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Result,
  fair::{Event, STANDARD_SLOTS, TimeSlot},
  store::Ledger,
};

/// Create one event per date with the standard slots. Dates that already
/// have an event are skipped. Returns the number of events created.
pub fn seed_fair(
  ledger: &mut dyn Ledger,
  name: &str,
  dates: &[NaiveDate],
  capacity: u32,
) -> Result<usize> {
  let mut created = 0;

  for &date in dates {
    if ledger.event_by_date(date)?.is_some() {
      debug!(%date, "fair day already seeded");
      continue;
    }

    let event = Event { event_id: Uuid::new_v4(), name: name.to_owned(), date };
    ledger.insert_event(&event)?;

    for (starts, ends) in STANDARD_SLOTS {
      ledger.insert_slot(&TimeSlot {
        slot_id: Uuid::new_v4(),
        event_id: event.event_id,
        starts: starts.to_owned(),
        ends: ends.to_owned(),
        capacity,
      })?;
    }

    info!(%date, event_id = %event.event_id, capacity, "seeded fair day");
    created += 1;
  }

  Ok(created)
}
