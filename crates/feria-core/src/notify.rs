//! Outbound confirmation email contract.
//!
//! Delivery is best-effort: the booking is already committed when a notifier
//! runs, and a failure only flips the `email_sent` flag returned to the caller.

use std::{fmt, future::Future};

use thiserror::Error;
use uuid::Uuid;

/// Everything a confirmation email needs.
#[derive(Clone, PartialEq, Eq)]
pub struct ConfirmationNotice {
  pub email:            String,
  pub school_name:      String,
  pub coordinator_name: String,
  pub day_label:        String,
  pub slot_label:       String,
  pub student_count:    u32,
  pub reservation_id:   Uuid,
  /// Carries the bearer token; do not log.
  pub confirm_link:     String,
}

impl fmt::Debug for ConfirmationNotice {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ConfirmationNotice")
      .field("email", &self.email)
      .field("school_name", &self.school_name)
      .field("day_label", &self.day_label)
      .field("slot_label", &self.slot_label)
      .field("student_count", &self.student_count)
      .field("reservation_id", &self.reservation_id)
      .finish_non_exhaustive()
  }
}

#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("invalid address: {0}")]
  Address(String),

  #[error("could not build message: {0}")]
  Message(String),

  #[error("delivery failed: {0}")]
  Delivery(String),
}

pub trait Notifier: Send + Sync {
  fn send_confirmation<'a>(
    &'a self,
    notice: &'a ConfirmationNotice,
  ) -> impl Future<Output = Result<(), NotifyError>> + Send + 'a;
}
