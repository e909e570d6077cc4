//! Reservations: the central record of the booking protocol.
//!
//! A reservation starts `pending` with a confirmation token, moves to
//! `confirmed` when the mailed link is followed, and may be `cancelled` by an
//! administrator. Only `pending` and `confirmed` reservations hold seats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  policy::Policy,
  token::ConfirmationToken,
  validate::{self, MAX_PERSON_NAME_LEN, MAX_SCHOOL_NAME_LEN},
  Result,
};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReservationStatus {
  Pending,
  Confirmed,
  Cancelled,
}

impl ReservationStatus {
  /// Active reservations consume capacity and block duplicates.
  pub fn is_active(self) -> bool { matches!(self, Self::Pending | Self::Confirmed) }
}

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
  pub reservation_id:        Uuid,
  pub institution_code:      String,
  pub school_name:           String,
  pub coordinator_name:      String,
  pub coordinator_last_name: Option<String>,
  /// Stored trimmed and lower-cased.
  pub email:                 String,
  pub phone:                 String,
  pub student_count:         u32,
  pub event_id:              Uuid,
  pub slot_id:               Uuid,
  pub status:                ReservationStatus,
  /// Present only while the reservation can still be confirmed by link.
  #[serde(skip)]
  pub confirmation_token:    Option<ConfirmationToken>,
  pub created_at:            DateTime<Utc>,
  pub updated_at:            DateTime<Utc>,
  pub confirmed_at:          Option<DateTime<Utc>>,
}

// ─── Booking request ─────────────────────────────────────────────────────────

/// A booking as submitted by the public form, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
  pub institution_code:      String,
  pub school_name:           String,
  pub coordinator_name:      String,
  #[serde(default)]
  pub coordinator_last_name: Option<String>,
  pub email:                 String,
  pub phone:                 String,
  pub student_count:         u32,
  pub event_id:              Uuid,
  pub slot_id:               Uuid,
}

/// A booking request that passed field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
  pub institution_code:      String,
  pub school_name:           String,
  pub coordinator_name:      String,
  pub coordinator_last_name: Option<String>,
  pub email:                 String,
  pub phone:                 String,
  pub student_count:         u32,
  pub event_id:              Uuid,
  pub slot_id:               Uuid,
}

impl ReservationRequest {
  /// Trim, normalise and bound every field.
  pub fn validate(self, policy: &Policy) -> Result<NewReservation> {
    Ok(NewReservation {
      institution_code:      validate::institution_code(&self.institution_code)?,
      school_name:           validate::required_text(
        "schoolName",
        &self.school_name,
        MAX_SCHOOL_NAME_LEN,
      )?,
      coordinator_name:      validate::required_text(
        "coordinatorName",
        &self.coordinator_name,
        MAX_PERSON_NAME_LEN,
      )?,
      coordinator_last_name: validate::optional_text(
        "coordinatorLastName",
        self.coordinator_last_name.as_deref(),
        MAX_PERSON_NAME_LEN,
      )?,
      email:                 validate::email(&self.email)?,
      phone:                 validate::phone(&self.phone)?,
      student_count:         validate::student_count(
        self.student_count,
        policy.max_students_per_booking,
      )?,
      event_id:              self.event_id,
      slot_id:               self.slot_id,
    })
  }
}

// ─── Administrative amendment ────────────────────────────────────────────────

/// Partial update applied by an administrator. Absent fields are unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationPatch {
  pub institution_code:      Option<String>,
  pub school_name:           Option<String>,
  pub coordinator_name:      Option<String>,
  pub coordinator_last_name: Option<String>,
  pub email:                 Option<String>,
  pub phone:                 Option<String>,
  pub student_count:         Option<u32>,
  pub event_id:              Option<Uuid>,
  pub slot_id:               Option<Uuid>,
  pub status:                Option<ReservationStatus>,
}

impl ReservationPatch {
  /// Apply the same field rules as a new booking to each present field.
  ///
  /// An empty `coordinatorLastName` clears the stored value.
  pub fn validate(self, policy: &Policy) -> Result<Self> {
    Ok(Self {
      institution_code:      self
        .institution_code
        .as_deref()
        .map(validate::institution_code)
        .transpose()?,
      school_name:           self
        .school_name
        .as_deref()
        .map(|v| validate::required_text("schoolName", v, MAX_SCHOOL_NAME_LEN))
        .transpose()?,
      coordinator_name:      self
        .coordinator_name
        .as_deref()
        .map(|v| {
          validate::required_text("coordinatorName", v, MAX_PERSON_NAME_LEN)
        })
        .transpose()?,
      coordinator_last_name: match self.coordinator_last_name.as_deref() {
        None => None,
        Some(v) => Some(
          validate::optional_text("coordinatorLastName", Some(v), MAX_PERSON_NAME_LEN)?
            .unwrap_or_default(),
        ),
      },
      email:                 self.email.as_deref().map(validate::email).transpose()?,
      phone:                 self.phone.as_deref().map(validate::phone).transpose()?,
      student_count:         self
        .student_count
        .map(|n| validate::student_count(n, policy.max_students_per_booking))
        .transpose()?,
      event_id:              self.event_id,
      slot_id:               self.slot_id,
      status:                self.status,
    })
  }
}
