//! The seat-reservation protocol.
//!
//! [`BookingService`] sequences the three components over a
//! [`ReservationStore`]:
//!
//! - [`availability`] projects remaining seats from live reservations;
//! - [`admit`] decides and records a booking inside one serializable
//!   transaction, then the service mails the confirmation link;
//! - [`confirm`] resolves a mailed token into a confirmed reservation.
//!
//! Every write goes through [`BookingService::serializable`], which retries
//! the whole transaction a bounded number of times on
//! [`Error::StorageConflict`].

pub mod admit;
pub mod amend;
pub mod availability;
pub mod confirm;
pub mod seed;

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  clock::{Clock, SystemClock},
  fair::FairDay,
  institution::Institution,
  notify::{ConfirmationNotice, Notifier},
  policy::Policy,
  reservation::{Reservation, ReservationPatch, ReservationRequest},
  store::{Ledger, ReservationStore, TxMode},
  token::ConfirmationToken,
};

use self::{admit::Admission, confirm::ConfirmOutcome};

/// Result of a successful booking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booked {
  pub reservation: Reservation,
  /// Whether the confirmation email was handed to the mail transport.
  pub email_sent:  bool,
}

pub struct BookingService<S, N> {
  store:      Arc<S>,
  notifier:   Arc<N>,
  policy:     Policy,
  clock:      Arc<dyn Clock>,
  public_url: String,
}

impl<S, N> Clone for BookingService<S, N> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      notifier:   Arc::clone(&self.notifier),
      policy:     self.policy,
      clock:      Arc::clone(&self.clock),
      public_url: self.public_url.clone(),
    }
  }
}

impl<S, N> BookingService<S, N>
where
  S: ReservationStore,
  N: Notifier,
{
  /// `public_url` is the externally reachable base of the API, used to build
  /// confirmation links.
  pub fn new(
    store: Arc<S>,
    notifier: Arc<N>,
    policy: Policy,
    public_url: impl Into<String>,
  ) -> Self {
    Self {
      store,
      notifier,
      policy,
      clock: Arc::new(SystemClock),
      public_url: public_url.into(),
    }
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn policy(&self) -> &Policy { &self.policy }

  pub fn store(&self) -> &Arc<S> { &self.store }

  // ─── Writer ────────────────────────────────────────────────────────────────

  /// Validate, admit, and mail the confirmation link.
  ///
  /// The reservation is committed before the email is attempted; a mail
  /// failure only shows up as `email_sent: false`.
  pub async fn create_reservation(&self, request: ReservationRequest) -> Result<Booked> {
    let new = request.validate(&self.policy)?;
    let token = ConfirmationToken::generate();
    let now = self.clock.now();

    let admission = self
      .serializable(move |ledger| admit::admit(ledger, &new, token, now))
      .await?;

    info!(
      reservation_id = %admission.reservation.reservation_id,
      slot_id = %admission.slot.slot_id,
      institution_code = %admission.reservation.institution_code,
      students = admission.reservation.student_count,
      "reservation created"
    );

    let email_sent = self.notify(&admission).await;
    Ok(Booked { reservation: admission.reservation, email_sent })
  }

  async fn notify(&self, admission: &Admission) -> bool {
    let Some(token) = &admission.reservation.confirmation_token else {
      return false;
    };
    let notice = self.notice(admission, token);

    match self.notifier.send_confirmation(&notice).await {
      Ok(()) => true,
      Err(e) => {
        error!(
          reservation_id = %admission.reservation.reservation_id,
          error = %e,
          "failed to send confirmation email"
        );
        false
      }
    }
  }

  fn notice(&self, admission: &Admission, token: &ConfirmationToken) -> ConfirmationNotice {
    let r = &admission.reservation;
    ConfirmationNotice {
      email:            r.email.clone(),
      school_name:      r.school_name.clone(),
      coordinator_name: match &r.coordinator_last_name {
        Some(last) => format!("{} {last}", r.coordinator_name),
        None => r.coordinator_name.clone(),
      },
      day_label:        admission.event.label(),
      slot_label:       admission.slot.label(),
      student_count:    r.student_count,
      reservation_id:   r.reservation_id,
      confirm_link:     self.confirm_link(token),
    }
  }

  fn confirm_link(&self, token: &ConfirmationToken) -> String {
    format!(
      "{}/api/reservations/confirm?token={}",
      self.public_url.trim_end_matches('/'),
      token.as_str()
    )
  }

  // ─── Resolver ──────────────────────────────────────────────────────────────

  pub async fn confirm_reservation(&self, token: Option<&str>) -> Result<ConfirmOutcome> {
    let token = token.map(str::to_owned);
    let now = self.clock.now();
    let ttl = self.policy.confirmation_ttl;

    self
      .serializable(move |ledger| confirm::resolve(ledger, token.as_deref(), now, ttl))
      .await
  }

  // ─── Projector ─────────────────────────────────────────────────────────────

  /// Advisory; the writer re-derives seats inside its own transaction.
  pub async fn available_seats(&self, slot_id: Uuid) -> Result<u32> {
    self
      .store
      .transact(TxMode::Read, move |ledger| availability::available_seats(ledger, slot_id))
      .await
  }

  pub async fn fair_days(&self) -> Result<Vec<FairDay>> {
    self.store.transact(TxMode::Read, availability::fair_days).await
  }

  // ─── Registry and administration ───────────────────────────────────────────

  pub async fn lookup_institution(&self, code: &str) -> Result<Option<Institution>> {
    let code = code.trim().to_owned();
    self.store.transact(TxMode::Read, move |ledger| ledger.institution(&code)).await
  }

  pub async fn reservation(&self, id: Uuid) -> Result<Reservation> {
    self
      .store
      .transact(TxMode::Read, move |ledger| {
        ledger.reservation(id)?.ok_or(Error::ReservationNotFound(id))
      })
      .await
  }

  pub async fn amend_reservation(
    &self,
    id: Uuid,
    patch: ReservationPatch,
  ) -> Result<Reservation> {
    let patch = patch.validate(&self.policy)?;
    let now = self.clock.now();
    self.serializable(move |ledger| amend::amend(ledger, id, &patch, now)).await
  }

  /// Idempotently create fair days; see [`seed::seed_fair`].
  pub async fn seed_fair(
    &self,
    name: &str,
    dates: Vec<NaiveDate>,
    capacity: u32,
  ) -> Result<usize> {
    let name = name.to_owned();
    self
      .serializable(move |ledger| seed::seed_fair(ledger, &name, &dates, capacity))
      .await
  }

  // ─── Transactions ──────────────────────────────────────────────────────────

  /// Run `op` serializably, replaying it from the start after a storage
  /// conflict up to `max_transaction_retries` times.
  async fn serializable<T, F>(&self, op: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn Ledger) -> Result<T> + Clone + Send + 'static,
  {
    let mut attempt = 0;
    loop {
      match self.store.transact(TxMode::Serializable, op.clone()).await {
        Err(Error::StorageConflict) if attempt < self.policy.max_transaction_retries => {
          attempt += 1;
          warn!(attempt, "serialization conflict; retrying transaction");
        }
        Err(Error::StorageConflict) => {
          warn!(attempts = attempt + 1, "serialization conflict; giving up");
          return Err(Error::StorageConflict);
        }
        other => return other,
      }
    }
  }
}

#[cfg(test)]
mod tests;
