//! Error types for `feria-core`.
//!
//! Every rejection is classified where it is detected and travels unchanged
//! to the boundary; callers branch on [`Error::kind`].

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("event not found: {0}")]
  EventNotFound(Uuid),

  #[error("time slot not found: {0}")]
  SlotNotFound(Uuid),

  #[error("reservation not found: {0}")]
  ReservationNotFound(Uuid),

  #[error("invalid {field}: {reason}")]
  Invalid {
    field:  &'static str,
    reason: String,
  },

  #[error("time slot {slot_id} does not belong to event {event_id}")]
  SlotEventMismatch { slot_id: Uuid, event_id: Uuid },

  #[error("insufficient seats: only {remaining} left in this time slot")]
  InsufficientCapacity { remaining: u32 },

  #[error(
    "institution {institution_code} already holds an active booking for time \
     slot {slot_id}"
  )]
  DuplicateBooking {
    institution_code: String,
    slot_id:          Uuid,
  },

  /// The storage engine aborted the transaction because of a concurrent
  /// writer. Safe to retry the whole transactional sequence.
  #[error("storage serialization conflict")]
  StorageConflict,

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Coarse classification used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  BadRequest,
  Conflict,
  Transient,
  Internal,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::EventNotFound(_)
      | Self::SlotNotFound(_)
      | Self::ReservationNotFound(_) => ErrorKind::NotFound,
      Self::Invalid { .. }
      | Self::SlotEventMismatch { .. }
      | Self::InsufficientCapacity { .. } => ErrorKind::BadRequest,
      Self::DuplicateBooking { .. } => ErrorKind::Conflict,
      Self::StorageConflict => ErrorKind::Transient,
      Self::Storage(_) => ErrorKind::Internal,
    }
  }

  /// Seats still free in the slot, when the rejection was for capacity.
  pub fn remaining_seats(&self) -> Option<u32> {
    match self {
      Self::InsufficientCapacity { remaining } => Some(*remaining),
      _ => None,
    }
  }

  /// Wrap an arbitrary backend error.
  pub fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Storage(Box::new(e))
  }

  pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
    Self::Invalid { field, reason: reason.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
