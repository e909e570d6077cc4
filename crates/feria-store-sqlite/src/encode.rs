//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates are `YYYY-MM-DD`, UUIDs are
//! hyphenated lowercase strings, and statuses use their lowercase names.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use feria_core::{
  fair::{Event, TimeSlot},
  institution::Institution,
  reservation::{Reservation, ReservationStatus},
  token::ConfirmationToken,
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(date: NaiveDate) -> String { date.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

/// Counts are stored as SQLite INTEGERs and must fit a `u32`.
pub fn decode_count(column: &'static str, n: i64) -> Result<u32> {
  u32::try_from(n).map_err(|_| Error::Decode { column, reason: format!("{n} out of range") })
}

pub fn decode_status(s: &str) -> Result<ReservationStatus> {
  ReservationStatus::from_str(s).map_err(|_| Error::Decode {
    column: "status",
    reason: format!("unknown status {s:?}"),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const EVENT_COLUMNS: &str = "event_id, name, date";

/// Raw strings read directly from an `events` row.
pub struct RawEvent {
  pub event_id: String,
  pub name:     String,
  pub date:     String,
}

impl RawEvent {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { event_id: row.get(0)?, name: row.get(1)?, date: row.get(2)? })
  }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id: decode_uuid(&self.event_id)?,
      name:     self.name,
      date:     decode_date(&self.date)?,
    })
  }
}

pub const SLOT_COLUMNS: &str = "slot_id, event_id, starts, ends, capacity";

/// Raw values read directly from a `time_slots` row.
pub struct RawSlot {
  pub slot_id:  String,
  pub event_id: String,
  pub starts:   String,
  pub ends:     String,
  pub capacity: i64,
}

impl RawSlot {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      slot_id:  row.get(0)?,
      event_id: row.get(1)?,
      starts:   row.get(2)?,
      ends:     row.get(3)?,
      capacity: row.get(4)?,
    })
  }

  pub fn into_slot(self) -> Result<TimeSlot> {
    Ok(TimeSlot {
      slot_id:  decode_uuid(&self.slot_id)?,
      event_id: decode_uuid(&self.event_id)?,
      starts:   self.starts,
      ends:     self.ends,
      capacity: decode_count("capacity", self.capacity)?,
    })
  }
}

/// Raw strings read directly from an `institutions` row.
pub struct RawInstitution {
  pub code:       String,
  pub name:       String,
  pub created_at: String,
}

impl RawInstitution {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { code: row.get(0)?, name: row.get(1)?, created_at: row.get(2)? })
  }

  pub fn into_institution(self) -> Result<Institution> {
    Ok(Institution {
      code:       self.code,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const RESERVATION_COLUMNS: &str = "reservation_id, institution_code, school_name, \
   coordinator_name, coordinator_last_name, email, phone, student_count, event_id, \
   slot_id, status, confirmation_token, created_at, updated_at, confirmed_at";

/// Raw values read directly from a `reservations` row, in
/// [`RESERVATION_COLUMNS`] order.
pub struct RawReservation {
  pub reservation_id:        String,
  pub institution_code:      String,
  pub school_name:           String,
  pub coordinator_name:      String,
  pub coordinator_last_name: Option<String>,
  pub email:                 String,
  pub phone:                 String,
  pub student_count:         i64,
  pub event_id:              String,
  pub slot_id:               String,
  pub status:                String,
  pub confirmation_token:    Option<String>,
  pub created_at:            String,
  pub updated_at:            String,
  pub confirmed_at:          Option<String>,
}

impl RawReservation {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      reservation_id:        row.get(0)?,
      institution_code:      row.get(1)?,
      school_name:           row.get(2)?,
      coordinator_name:      row.get(3)?,
      coordinator_last_name: row.get(4)?,
      email:                 row.get(5)?,
      phone:                 row.get(6)?,
      student_count:         row.get(7)?,
      event_id:              row.get(8)?,
      slot_id:               row.get(9)?,
      status:                row.get(10)?,
      confirmation_token:    row.get(11)?,
      created_at:            row.get(12)?,
      updated_at:            row.get(13)?,
      confirmed_at:          row.get(14)?,
    })
  }

  pub fn into_reservation(self) -> Result<Reservation> {
    Ok(Reservation {
      reservation_id:        decode_uuid(&self.reservation_id)?,
      institution_code:      self.institution_code,
      school_name:           self.school_name,
      coordinator_name:      self.coordinator_name,
      coordinator_last_name: self.coordinator_last_name,
      email:                 self.email,
      phone:                 self.phone,
      student_count:         decode_count("student_count", self.student_count)?,
      event_id:              decode_uuid(&self.event_id)?,
      slot_id:               decode_uuid(&self.slot_id)?,
      status:                decode_status(&self.status)?,
      confirmation_token:    self.confirmation_token.map(ConfirmationToken::from_raw),
      created_at:            decode_dt(&self.created_at)?,
      updated_at:            decode_dt(&self.updated_at)?,
      confirmed_at:          self.confirmed_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}
