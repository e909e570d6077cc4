//! Tunable booking policy.

use chrono::Duration;

/// Limits that are product decisions rather than protocol rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
  /// Largest group a single booking may bring.
  pub max_students_per_booking: u32,
  /// How long a mailed confirmation link stays valid after booking.
  pub confirmation_ttl:         Duration,
  /// Extra attempts after a storage serialization conflict.
  pub max_transaction_retries:  u32,
}

impl Default for Policy {
  fn default() -> Self {
    Self {
      max_students_per_booking: 200,
      confirmation_ttl:         Duration::hours(24),
      max_transaction_retries:  3,
    }
  }
}
