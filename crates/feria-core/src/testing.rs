//! In-memory fakes for unit tests.

use std::{
  collections::{BTreeMap, HashMap},
  sync::{
    Mutex,
    atomic::{AtomicU32, Ordering},
  },
};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  booking::seed::seed_fair,
  clock::Clock,
  fair::{Event, TimeSlot},
  institution::Institution,
  notify::{ConfirmationNotice, Notifier, NotifyError},
  reservation::{NewReservation, Reservation, ReservationStatus},
  store::{Ledger, ReservationStore, TxMode},
  token::ConfirmationToken,
};

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// A [`Ledger`] over plain collections. Uniqueness rules mirror the SQLite
/// schema and fail with [`Error::StorageConflict`].
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
  events:       Vec<Event>,
  slots:        Vec<TimeSlot>,
  institutions: BTreeMap<String, Institution>,
  reservations: Vec<Reservation>,
  spent:        HashMap<String, Uuid>,
}

impl MemoryLedger {
  /// Three fair days (16–18 March 2026) with the standard slots.
  pub fn fair(capacity: u32) -> Self {
    let mut ledger = Self::default();
    let dates: Vec<_> = (16..=18)
      .map(|d| NaiveDate::from_ymd_opt(2026, 3, d).unwrap())
      .collect();
    seed_fair(&mut ledger, "Feria", &dates, capacity).unwrap();
    ledger
  }

  /// The earliest slot of the earliest day.
  pub fn first_slot(&self) -> TimeSlot {
    let first_day = self.events.iter().min_by_key(|e| e.date).unwrap();
    self
      .slots
      .iter()
      .filter(|s| s.event_id == first_day.event_id)
      .min_by(|a, b| a.starts.cmp(&b.starts))
      .cloned()
      .unwrap()
  }

  /// Insert a row without any checks.
  pub fn push(&mut self, reservation: Reservation) { self.reservations.push(reservation); }

  pub fn reservation_count(&self) -> usize { self.reservations.len() }

  /// Largest number of active reservations any one institution holds on
  /// `slot_id`.
  pub fn max_active_per_institution(&self, slot_id: Uuid) -> usize {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in self.active_on(slot_id) {
      *counts.entry(r.institution_code.as_str()).or_default() += 1;
    }
    counts.into_values().max().unwrap_or(0)
  }

  fn active_on(&self, slot_id: Uuid) -> impl Iterator<Item = &Reservation> {
    self
      .reservations
      .iter()
      .filter(move |r| r.slot_id == slot_id && r.status.is_active())
  }

  fn row_mut(&mut self, id: Uuid) -> Result<&mut Reservation> {
    self
      .reservations
      .iter_mut()
      .find(|r| r.reservation_id == id)
      .ok_or(Error::ReservationNotFound(id))
  }
}

impl Ledger for MemoryLedger {
  fn event(&mut self, event_id: Uuid) -> Result<Option<Event>> {
    Ok(self.events.iter().find(|e| e.event_id == event_id).cloned())
  }

  fn event_by_date(&mut self, date: NaiveDate) -> Result<Option<Event>> {
    Ok(self.events.iter().find(|e| e.date == date).cloned())
  }

  fn events(&mut self) -> Result<Vec<Event>> {
    let mut events = self.events.clone();
    events.sort_by_key(|e| e.date);
    Ok(events)
  }

  fn slot(&mut self, slot_id: Uuid) -> Result<Option<TimeSlot>> {
    Ok(self.slots.iter().find(|s| s.slot_id == slot_id).cloned())
  }

  fn slots_for_event(&mut self, event_id: Uuid) -> Result<Vec<TimeSlot>> {
    let mut slots: Vec<_> =
      self.slots.iter().filter(|s| s.event_id == event_id).cloned().collect();
    slots.sort_by(|a, b| a.starts.cmp(&b.starts));
    Ok(slots)
  }

  fn insert_event(&mut self, event: &Event) -> Result<()> {
    if self.events.iter().any(|e| e.date == event.date) {
      return Err(Error::StorageConflict);
    }
    self.events.push(event.clone());
    Ok(())
  }

  fn insert_slot(&mut self, slot: &TimeSlot) -> Result<()> {
    self.slots.push(slot.clone());
    Ok(())
  }

  fn sum_active_students(&mut self, slot_id: Uuid, exclude: Option<Uuid>) -> Result<u32> {
    Ok(
      self
        .active_on(slot_id)
        .filter(|r| Some(r.reservation_id) != exclude)
        .map(|r| r.student_count)
        .sum(),
    )
  }

  fn find_active_reservation(
    &mut self,
    institution_code: &str,
    slot_id: Uuid,
    exclude: Option<Uuid>,
  ) -> Result<Option<Reservation>> {
    Ok(
      self
        .active_on(slot_id)
        .find(|r| r.institution_code == institution_code && Some(r.reservation_id) != exclude)
        .cloned(),
    )
  }

  fn institution(&mut self, code: &str) -> Result<Option<Institution>> {
    Ok(self.institutions.get(code).cloned())
  }

  fn create_institution(&mut self, institution: &Institution) -> Result<()> {
    if self.institutions.contains_key(&institution.code) {
      return Err(Error::StorageConflict);
    }
    self.institutions.insert(institution.code.clone(), institution.clone());
    Ok(())
  }

  fn insert_reservation(&mut self, reservation: &Reservation) -> Result<()> {
    if reservation.status.is_active()
      && self
        .active_on(reservation.slot_id)
        .any(|r| r.institution_code == reservation.institution_code)
    {
      return Err(Error::StorageConflict);
    }
    self.reservations.push(reservation.clone());
    Ok(())
  }

  fn reservation(&mut self, reservation_id: Uuid) -> Result<Option<Reservation>> {
    Ok(self.reservations.iter().find(|r| r.reservation_id == reservation_id).cloned())
  }

  fn reservation_by_token(&mut self, token: &str) -> Result<Option<Reservation>> {
    Ok(
      self
        .reservations
        .iter()
        .find(|r| r.confirmation_token.as_ref().is_some_and(|t| t.as_str() == token))
        .cloned(),
    )
  }

  fn reservation_by_spent_token(&mut self, digest: &str) -> Result<Option<Reservation>> {
    let Some(&id) = self.spent.get(digest) else { return Ok(None) };
    self.reservation(id)
  }

  fn update_status(
    &mut self,
    reservation_id: Uuid,
    status: ReservationStatus,
    confirmed_at: Option<DateTime<Utc>>,
    clear_token: bool,
    updated_at: DateTime<Utc>,
  ) -> Result<()> {
    let row = self.row_mut(reservation_id)?;
    row.status = status;
    row.confirmed_at = confirmed_at;
    row.updated_at = updated_at;
    let spent = if clear_token { row.confirmation_token.take() } else { None };

    if let Some(token) = spent {
      self.spent.insert(token.digest(), reservation_id);
    }
    Ok(())
  }

  fn update_reservation(&mut self, reservation: &Reservation) -> Result<()> {
    let row = self.row_mut(reservation.reservation_id)?;
    let token = row.confirmation_token.take();
    *row = Reservation { confirmation_token: token, ..reservation.clone() };
    Ok(())
  }
}

/// A stored reservation on `slot`, bypassing the writer. Pending and
/// cancelled rows carry a fresh token; confirmed rows do not.
pub fn reservation_on(
  slot: &TimeSlot,
  code: &str,
  students: u32,
  status: ReservationStatus,
) -> Reservation {
  let now = Utc::now();
  let confirmed = status == ReservationStatus::Confirmed;
  Reservation {
    reservation_id:        Uuid::new_v4(),
    institution_code:      code.into(),
    school_name:           format!("Escuela {code}"),
    coordinator_name:      "Ana".into(),
    coordinator_last_name: None,
    email:                 "ana@example.com".into(),
    phone:                 "0987654321".into(),
    student_count:         students,
    event_id:              slot.event_id,
    slot_id:               slot.slot_id,
    status,
    confirmation_token:    (!confirmed).then(ConfirmationToken::generate),
    created_at:            now,
    updated_at:            now,
    confirmed_at:          confirmed.then_some(now),
  }
}

/// A validated booking request for `slot`.
pub fn new_reservation(slot: &TimeSlot, code: &str, students: u32) -> NewReservation {
  NewReservation {
    institution_code:      code.into(),
    school_name:           format!("Escuela {code}"),
    coordinator_name:      "Ana".into(),
    coordinator_last_name: None,
    email:                 "ana@example.com".into(),
    phone:                 "0987654321".into(),
    student_count:         students,
    event_id:              slot.event_id,
    slot_id:               slot.slot_id,
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Copy-on-write transactions over a [`MemoryLedger`]: each transaction works
/// on a clone that replaces the committed state only on commit.
#[derive(Debug, Default)]
pub struct MemoryStore {
  ledger:    Mutex<MemoryLedger>,
  fail_next: AtomicU32,
  attempts:  AtomicU32,
}

impl MemoryStore {
  pub fn new(ledger: MemoryLedger) -> Self {
    Self { ledger: Mutex::new(ledger), ..Self::default() }
  }

  /// Make the next `n` transactions fail with a serialization conflict.
  pub fn fail_next(&self, n: u32) { self.fail_next.store(n, Ordering::SeqCst); }

  /// Transactions started so far, including injected failures.
  pub fn attempts(&self) -> u32 { self.attempts.load(Ordering::SeqCst) }

  pub fn snapshot(&self) -> MemoryLedger { self.ledger.lock().unwrap().clone() }

  fn run<T>(
    &self,
    mode: TxMode,
    op: impl FnOnce(&mut dyn Ledger) -> Result<T>,
  ) -> Result<T> {
    self.attempts.fetch_add(1, Ordering::SeqCst);
    let injected = self
      .fail_next
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok();
    if injected {
      return Err(Error::StorageConflict);
    }

    let mut committed = self.ledger.lock().unwrap();
    let mut working = committed.clone();
    let out = op(&mut working)?;
    if mode == TxMode::Serializable {
      *committed = working;
    }
    Ok(out)
  }
}

impl ReservationStore for MemoryStore {
  async fn transact<T, F>(&self, mode: TxMode, op: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn Ledger) -> Result<T> + Send + 'static,
  {
    self.run(mode, op)
  }
}

// ─── Clock ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
  pub fn new(at: DateTime<Utc>) -> Self { Self(Mutex::new(at)) }

  pub fn advance(&self, by: Duration) { *self.0.lock().unwrap() += by; }
}

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> { *self.0.lock().unwrap() }
}

// ─── Notifier ────────────────────────────────────────────────────────────────

/// Records every notice; optionally fails every send.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
  sent: Mutex<Vec<ConfirmationNotice>>,
  fail: bool,
}

impl RecordingNotifier {
  pub fn failing() -> Self { Self { fail: true, ..Self::default() } }

  pub fn sent(&self) -> Vec<ConfirmationNotice> { self.sent.lock().unwrap().clone() }
}

impl Notifier for RecordingNotifier {
  async fn send_confirmation<'a>(
    &'a self,
    notice: &'a ConfirmationNotice,
  ) -> Result<(), NotifyError> {
    if self.fail {
      return Err(NotifyError::Delivery("mail relay unavailable".into()));
    }
    self.sent.lock().unwrap().push(notice.clone());
    Ok(())
  }
}
