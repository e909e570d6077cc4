//! Storage contracts consumed by the booking protocol.
//!
//! [`ReservationStore`] runs a closure inside one storage transaction and
//! hands it a [`Ledger`], the set of reads and writes the protocol needs. The
//! closure's `Ok` commits; any `Err` rolls everything back. Backends such as
//! `feria-store-sqlite` implement both traits.
//!
//! Ledger methods are synchronous: a transaction never spans an `.await`, so
//! the decide-then-write sequence cannot be interleaved with other work on
//! the same connection.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  Result,
  fair::{Event, TimeSlot},
  institution::Institution,
  reservation::{Reservation, ReservationStatus},
};

/// Isolation requested for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
  /// Read-only; may observe a slightly stale snapshot.
  Read,
  /// Behaves as if no other transaction ran concurrently. A backend that
  /// cannot guarantee this must fail with [`crate::Error::StorageConflict`].
  Serializable,
}

/// Reads and writes available inside a transaction.
pub trait Ledger {
  // ── Fair topology ─────────────────────────────────────────────────────

  fn event(&mut self, event_id: Uuid) -> Result<Option<Event>>;

  fn event_by_date(&mut self, date: NaiveDate) -> Result<Option<Event>>;

  /// All events ordered by date.
  fn events(&mut self) -> Result<Vec<Event>>;

  fn slot(&mut self, slot_id: Uuid) -> Result<Option<TimeSlot>>;

  /// Slots of one event ordered by start label.
  fn slots_for_event(&mut self, event_id: Uuid) -> Result<Vec<TimeSlot>>;

  fn insert_event(&mut self, event: &Event) -> Result<()>;

  fn insert_slot(&mut self, slot: &TimeSlot) -> Result<()>;

  // ── Capacity and duplicates ───────────────────────────────────────────

  /// Sum of `student_count` over active reservations on `slot_id`,
  /// optionally ignoring one reservation.
  fn sum_active_students(&mut self, slot_id: Uuid, exclude: Option<Uuid>) -> Result<u32>;

  /// Any active reservation for `(institution_code, slot_id)`, optionally
  /// ignoring one reservation.
  fn find_active_reservation(
    &mut self,
    institution_code: &str,
    slot_id: Uuid,
    exclude: Option<Uuid>,
  ) -> Result<Option<Reservation>>;

  // ── Institutions ──────────────────────────────────────────────────────

  fn institution(&mut self, code: &str) -> Result<Option<Institution>>;

  /// Fails if the code already exists.
  fn create_institution(&mut self, institution: &Institution) -> Result<()>;

  // ── Reservations ──────────────────────────────────────────────────────

  fn insert_reservation(&mut self, reservation: &Reservation) -> Result<()>;

  fn reservation(&mut self, reservation_id: Uuid) -> Result<Option<Reservation>>;

  /// Exact match on an outstanding confirmation token.
  fn reservation_by_token(&mut self, token: &str) -> Result<Option<Reservation>>;

  /// Match on the digest of a token that was already cleared.
  fn reservation_by_spent_token(&mut self, digest: &str) -> Result<Option<Reservation>>;

  /// Set status and timestamps.
  ///
  /// With `clear_token`, the outstanding token is removed and its digest
  /// (see [`crate::token::token_digest`]) is retained in its place.
  fn update_status(
    &mut self,
    reservation_id: Uuid,
    status: ReservationStatus,
    confirmed_at: Option<DateTime<Utc>>,
    clear_token: bool,
    updated_at: DateTime<Utc>,
  ) -> Result<()>;

  /// Overwrite every editable column of an existing reservation. Token
  /// columns are left untouched; see [`Ledger::update_status`].
  fn update_reservation(&mut self, reservation: &Reservation) -> Result<()>;
}

/// A transactional reservation store.
pub trait ReservationStore: Send + Sync {
  /// Run `op` in one transaction of the given mode.
  ///
  /// Commits when `op` returns `Ok`, rolls back otherwise. Contention that
  /// the backend resolves by aborting surfaces as
  /// [`crate::Error::StorageConflict`].
  fn transact<T, F>(&self, mode: TxMode, op: F) -> impl Future<Output = Result<T>> + Send + '_
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn Ledger) -> Result<T> + Send + 'static;
}
