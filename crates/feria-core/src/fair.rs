//! Fair days and their bookable time slots.
//!
//! Events and slots are seeded once and never edited by the booking protocol.
//! A slot's remaining seats are never stored; see [`crate::booking::availability`].

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three windows every fair day offers, as `(start, end)` labels.
pub const STANDARD_SLOTS: [(&str, &str); 3] =
  [("09h00", "11h00"), ("11h00", "13h00"), ("13h00", "15h00")];

/// One day of the fair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
  pub event_id: Uuid,
  pub name:     String,
  pub date:     NaiveDate,
}

impl Event {
  /// Human label for the day, e.g. `"Lunes 16 marzo"`.
  pub fn label(&self) -> String { day_label(self.date) }
}

/// A fixed-capacity window within an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
  pub slot_id:  Uuid,
  pub event_id: Uuid,
  pub starts:   String,
  pub ends:     String,
  /// Set once at seeding; never decreases.
  pub capacity: u32,
}

impl TimeSlot {
  /// Human label for the window, e.g. `"09h00 - 11h00"`.
  pub fn label(&self) -> String { format!("{} - {}", self.starts, self.ends) }
}

// ─── Public listing ──────────────────────────────────────────────────────────

/// A slot as shown to the public, with seats derived from live reservations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
  pub slot_id:   Uuid,
  pub time:      String,
  pub capacity:  u32,
  pub available: u32,
}

/// A fair day with all of its slots, ordered by start time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FairDay {
  pub event_id: Uuid,
  pub date:     NaiveDate,
  pub day:      String,
  pub slots:    Vec<SlotAvailability>,
}

// ─── Labels ──────────────────────────────────────────────────────────────────

const MONTHS: [&str; 12] = [
  "enero",
  "febrero",
  "marzo",
  "abril",
  "mayo",
  "junio",
  "julio",
  "agosto",
  "septiembre",
  "octubre",
  "noviembre",
  "diciembre",
];

fn weekday_name(w: Weekday) -> &'static str {
  match w {
    Weekday::Mon => "Lunes",
    Weekday::Tue => "Martes",
    Weekday::Wed => "Miércoles",
    Weekday::Thu => "Jueves",
    Weekday::Fri => "Viernes",
    Weekday::Sat => "Sábado",
    Weekday::Sun => "Domingo",
  }
}

/// Format a calendar date the way the fair's invitations print it.
pub fn day_label(date: NaiveDate) -> String {
  format!(
    "{} {} {}",
    weekday_name(date.weekday()),
    date.day(),
    MONTHS[date.month0() as usize],
  )
}
