//! [`SqliteLedger`]: the [`Ledger`] operations as SQL over one open
//! transaction.

use chrono::{DateTime, NaiveDate, Utc};
use feria_core::{
  Error as CoreError,
  Result as CoreResult,
  fair::{Event, TimeSlot},
  institution::Institution,
  reservation::{Reservation, ReservationStatus},
  store::Ledger,
  token::token_digest,
};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    EVENT_COLUMNS, RESERVATION_COLUMNS, RawEvent, RawInstitution, RawReservation,
    RawSlot, SLOT_COLUMNS, decode_count, encode_date, encode_dt, encode_uuid,
  },
};

const ACTIVE: &str = "status IN ('pending', 'confirmed')";

/// Run a block of store-level work and classify its error for the protocol.
fn lift<T>(work: impl FnOnce() -> Result<T>) -> CoreResult<T> { work().map_err(Into::into) }

/// Borrows the connection of an open transaction; see
/// [`crate::SqliteStore`]'s `transact`.
pub struct SqliteLedger<'c> {
  conn: &'c Connection,
}

impl<'c> SqliteLedger<'c> {
  pub fn new(conn: &'c Connection) -> Self { Self { conn } }

  fn reservation_where(&self, clause: &str, key: &str) -> Result<Option<Reservation>> {
    let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE {clause} = ?1");
    self
      .conn
      .query_row(&sql, params![key], RawReservation::from_row)
      .optional()?
      .map(RawReservation::into_reservation)
      .transpose()
  }
}

impl Ledger for SqliteLedger<'_> {
  // ── Fair topology ─────────────────────────────────────────────────────────

  fn event(&mut self, event_id: Uuid) -> CoreResult<Option<Event>> {
    lift(|| {
      self
        .conn
        .query_row(
          &format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?1"),
          params![encode_uuid(event_id)],
          RawEvent::from_row,
        )
        .optional()?
        .map(RawEvent::into_event)
        .transpose()
    })
  }

  fn event_by_date(&mut self, date: NaiveDate) -> CoreResult<Option<Event>> {
    lift(|| {
      self
        .conn
        .query_row(
          &format!("SELECT {EVENT_COLUMNS} FROM events WHERE date = ?1"),
          params![encode_date(date)],
          RawEvent::from_row,
        )
        .optional()?
        .map(RawEvent::into_event)
        .transpose()
    })
  }

  fn events(&mut self) -> CoreResult<Vec<Event>> {
    lift(|| {
      let mut stmt = self
        .conn
        .prepare(&format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY date"))?;
      let raws = stmt
        .query_map([], RawEvent::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      raws.into_iter().map(RawEvent::into_event).collect()
    })
  }

  fn slot(&mut self, slot_id: Uuid) -> CoreResult<Option<TimeSlot>> {
    lift(|| {
      self
        .conn
        .query_row(
          &format!("SELECT {SLOT_COLUMNS} FROM time_slots WHERE slot_id = ?1"),
          params![encode_uuid(slot_id)],
          RawSlot::from_row,
        )
        .optional()?
        .map(RawSlot::into_slot)
        .transpose()
    })
  }

  fn slots_for_event(&mut self, event_id: Uuid) -> CoreResult<Vec<TimeSlot>> {
    lift(|| {
      let mut stmt = self.conn.prepare(&format!(
        "SELECT {SLOT_COLUMNS} FROM time_slots WHERE event_id = ?1 ORDER BY starts"
      ))?;
      let raws = stmt
        .query_map(params![encode_uuid(event_id)], RawSlot::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      raws.into_iter().map(RawSlot::into_slot).collect()
    })
  }

  fn insert_event(&mut self, event: &Event) -> CoreResult<()> {
    lift(|| {
      self.conn.execute(
        "INSERT INTO events (event_id, name, date) VALUES (?1, ?2, ?3)",
        params![encode_uuid(event.event_id), event.name, encode_date(event.date)],
      )?;
      Ok(())
    })
  }

  fn insert_slot(&mut self, slot: &TimeSlot) -> CoreResult<()> {
    lift(|| {
      self.conn.execute(
        "INSERT INTO time_slots (slot_id, event_id, starts, ends, capacity)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
          encode_uuid(slot.slot_id),
          encode_uuid(slot.event_id),
          slot.starts,
          slot.ends,
          slot.capacity,
        ],
      )?;
      Ok(())
    })
  }

  // ── Capacity and duplicates ───────────────────────────────────────────────

  fn sum_active_students(&mut self, slot_id: Uuid, exclude: Option<Uuid>) -> CoreResult<u32> {
    lift(|| {
      let total: i64 = self.conn.query_row(
        &format!(
          "SELECT COALESCE(SUM(student_count), 0) FROM reservations
           WHERE slot_id = ?1 AND {ACTIVE}
             AND (?2 IS NULL OR reservation_id != ?2)"
        ),
        params![encode_uuid(slot_id), exclude.map(encode_uuid)],
        |r| r.get(0),
      )?;
      decode_count("student_count", total)
    })
  }

  fn find_active_reservation(
    &mut self,
    institution_code: &str,
    slot_id: Uuid,
    exclude: Option<Uuid>,
  ) -> CoreResult<Option<Reservation>> {
    lift(|| {
      self
        .conn
        .query_row(
          &format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations
             WHERE institution_code = ?1 AND slot_id = ?2 AND {ACTIVE}
               AND (?3 IS NULL OR reservation_id != ?3)
             LIMIT 1"
          ),
          params![institution_code, encode_uuid(slot_id), exclude.map(encode_uuid)],
          RawReservation::from_row,
        )
        .optional()?
        .map(RawReservation::into_reservation)
        .transpose()
    })
  }

  // ── Institutions ──────────────────────────────────────────────────────────

  fn institution(&mut self, code: &str) -> CoreResult<Option<Institution>> {
    lift(|| {
      self
        .conn
        .query_row(
          "SELECT code, name, created_at FROM institutions WHERE code = ?1",
          params![code],
          RawInstitution::from_row,
        )
        .optional()?
        .map(RawInstitution::into_institution)
        .transpose()
    })
  }

  fn create_institution(&mut self, institution: &Institution) -> CoreResult<()> {
    lift(|| {
      self.conn.execute(
        "INSERT INTO institutions (code, name, created_at) VALUES (?1, ?2, ?3)",
        params![institution.code, institution.name, encode_dt(institution.created_at)],
      )?;
      Ok(())
    })
  }

  // ── Reservations ──────────────────────────────────────────────────────────

  fn insert_reservation(&mut self, r: &Reservation) -> CoreResult<()> {
    lift(|| {
      self.conn.execute(
        &format!(
          "INSERT INTO reservations ({RESERVATION_COLUMNS})
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ),
        params![
          encode_uuid(r.reservation_id),
          r.institution_code,
          r.school_name,
          r.coordinator_name,
          r.coordinator_last_name,
          r.email,
          r.phone,
          r.student_count,
          encode_uuid(r.event_id),
          encode_uuid(r.slot_id),
          r.status.as_ref(),
          r.confirmation_token.as_ref().map(|t| t.as_str()),
          encode_dt(r.created_at),
          encode_dt(r.updated_at),
          r.confirmed_at.map(encode_dt),
        ],
      )?;
      Ok(())
    })
  }

  fn reservation(&mut self, reservation_id: Uuid) -> CoreResult<Option<Reservation>> {
    lift(|| self.reservation_where("reservation_id", &encode_uuid(reservation_id)))
  }

  fn reservation_by_token(&mut self, token: &str) -> CoreResult<Option<Reservation>> {
    lift(|| self.reservation_where("confirmation_token", token))
  }

  fn reservation_by_spent_token(&mut self, digest: &str) -> CoreResult<Option<Reservation>> {
    lift(|| self.reservation_where("spent_token_digest", digest))
  }

  fn update_status(
    &mut self,
    reservation_id: Uuid,
    status: ReservationStatus,
    confirmed_at: Option<DateTime<Utc>>,
    clear_token: bool,
    updated_at: DateTime<Utc>,
  ) -> CoreResult<()> {
    let id = encode_uuid(reservation_id);
    let changed = lift(|| {
      let spent = if clear_token {
        self
          .conn
          .query_row(
            "SELECT confirmation_token FROM reservations WHERE reservation_id = ?1",
            params![id],
            |r| r.get::<_, Option<String>>(0),
          )
          .optional()?
          .flatten()
          .map(|token| token_digest(&token))
      } else {
        None
      };

      let changed = self.conn.execute(
        "UPDATE reservations
            SET status = ?2,
                confirmed_at = ?3,
                updated_at = ?4,
                confirmation_token = CASE WHEN ?5 THEN NULL ELSE confirmation_token END,
                spent_token_digest = COALESCE(?6, spent_token_digest)
          WHERE reservation_id = ?1",
        params![
          id,
          status.as_ref(),
          confirmed_at.map(encode_dt),
          encode_dt(updated_at),
          clear_token,
          spent,
        ],
      )?;
      Ok(changed)
    })?;

    if changed == 0 {
      return Err(CoreError::ReservationNotFound(reservation_id));
    }
    Ok(())
  }

  fn update_reservation(&mut self, r: &Reservation) -> CoreResult<()> {
    let changed = lift(|| {
      Ok(self.conn.execute(
        "UPDATE reservations
            SET institution_code = ?2,
                school_name = ?3,
                coordinator_name = ?4,
                coordinator_last_name = ?5,
                email = ?6,
                phone = ?7,
                student_count = ?8,
                event_id = ?9,
                slot_id = ?10,
                status = ?11,
                updated_at = ?12,
                confirmed_at = ?13
          WHERE reservation_id = ?1",
        params![
          encode_uuid(r.reservation_id),
          r.institution_code,
          r.school_name,
          r.coordinator_name,
          r.coordinator_last_name,
          r.email,
          r.phone,
          r.student_count,
          encode_uuid(r.event_id),
          encode_uuid(r.slot_id),
          r.status.as_ref(),
          encode_dt(r.updated_at),
          r.confirmed_at.map(encode_dt),
        ],
      )?)
    })?;

    if changed == 0 {
      return Err(CoreError::ReservationNotFound(r.reservation_id));
    }
    Ok(())
  }
}
