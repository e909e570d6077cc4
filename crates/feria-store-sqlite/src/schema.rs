//! SQL schema for the fair booking SQLite store.
//!
//! Executed once per connection at startup. `PRAGMA user_version` records the
//! schema revision so later migrations can be gated on it.

/// Current schema revision.
pub const SCHEMA_VERSION: i64 = 1;

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per fair day.
CREATE TABLE IF NOT EXISTS events (
    event_id  TEXT PRIMARY KEY,
    name      TEXT NOT NULL,
    date      TEXT NOT NULL UNIQUE      -- ISO 8601 calendar date
);

CREATE TABLE IF NOT EXISTS time_slots (
    slot_id   TEXT PRIMARY KEY,
    event_id  TEXT NOT NULL REFERENCES events(event_id),
    starts    TEXT NOT NULL,            -- e.g. '09h00'
    ends      TEXT NOT NULL,
    capacity  INTEGER NOT NULL CHECK (capacity >= 0),
    UNIQUE (event_id, starts)
);

-- Existing bookings were admitted against the old capacity.
CREATE TRIGGER IF NOT EXISTS time_slots_capacity_never_shrinks
BEFORE UPDATE OF capacity ON time_slots
WHEN NEW.capacity < OLD.capacity
BEGIN
    SELECT RAISE(ABORT, 'time slot capacity cannot decrease');
END;

CREATE TABLE IF NOT EXISTS institutions (
    code        TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- Remaining seats are never stored; they are summed from this table.
CREATE TABLE IF NOT EXISTS reservations (
    reservation_id         TEXT PRIMARY KEY,
    institution_code       TEXT NOT NULL REFERENCES institutions(code),
    school_name            TEXT NOT NULL,
    coordinator_name       TEXT NOT NULL,
    coordinator_last_name  TEXT,
    email                  TEXT NOT NULL,
    phone                  TEXT NOT NULL,
    student_count          INTEGER NOT NULL CHECK (student_count > 0),
    event_id               TEXT NOT NULL REFERENCES events(event_id),
    slot_id                TEXT NOT NULL REFERENCES time_slots(slot_id),
    status                 TEXT NOT NULL
                           CHECK (status IN ('pending', 'confirmed', 'cancelled')),
    confirmation_token     TEXT UNIQUE,   -- NULL once spent
    spent_token_digest     TEXT UNIQUE,   -- SHA-256 of the spent token
    created_at             TEXT NOT NULL,
    updated_at             TEXT NOT NULL,
    confirmed_at           TEXT
);

-- At most one active booking per institution and slot.
CREATE UNIQUE INDEX IF NOT EXISTS reservations_one_active_per_slot
    ON reservations(institution_code, slot_id)
    WHERE status IN ('pending', 'confirmed');

CREATE INDEX IF NOT EXISTS reservations_slot_status_idx ON reservations(slot_id, status);
CREATE INDEX IF NOT EXISTS time_slots_event_idx         ON time_slots(event_id);

PRAGMA user_version = 1;
";
