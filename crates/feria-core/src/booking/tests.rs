use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use super::{BookingService, confirm::Rejection};
use crate::{
  Error, ErrorKind,
  booking::confirm::ConfirmOutcome,
  clock::Clock,
  fair::TimeSlot,
  policy::Policy,
  reservation::{ReservationPatch, ReservationRequest, ReservationStatus},
  store::Ledger,
  testing::{FixedClock, MemoryLedger, MemoryStore, RecordingNotifier},
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

type Service = BookingService<MemoryStore, RecordingNotifier>;

struct Fixture {
  service:  Service,
  store:    Arc<MemoryStore>,
  notifier: Arc<RecordingNotifier>,
  clock:    Arc<FixedClock>,
  slot:     TimeSlot,
}

fn fixture_with(capacity: u32, notifier: RecordingNotifier) -> Fixture {
  let ledger = MemoryLedger::fair(capacity);
  let slot = ledger.first_slot();
  let store = Arc::new(MemoryStore::new(ledger));
  let notifier = Arc::new(notifier);
  let clock = Arc::new(FixedClock::new(
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
  ));
  let service = BookingService::new(
    store.clone(),
    notifier.clone(),
    Policy::default(),
    "https://feria.example.org/",
  )
  .with_clock(clock.clone());

  Fixture { service, store, notifier, clock, slot }
}

fn fixture(capacity: u32) -> Fixture { fixture_with(capacity, RecordingNotifier::default()) }

fn request(slot: &TimeSlot, code: &str, students: u32) -> ReservationRequest {
  ReservationRequest {
    institution_code:      code.into(),
    school_name:           format!("Escuela {code}"),
    coordinator_name:      "Ana".into(),
    coordinator_last_name: Some("Pérez".into()),
    email:                 "Ana@Example.com".into(),
    phone:                 "0987654321".into(),
    student_count:         students,
    event_id:              slot.event_id,
    slot_id:               slot.slot_id,
  }
}

fn token_from_link(link: &str) -> String {
  link.rsplit_once("token=").map(|(_, t)| t.to_owned()).unwrap()
}

// ─── End-to-end scenarios ────────────────────────────────────────────────────

#[tokio::test]
async fn fills_a_slot_exactly_and_rejects_the_rest() {
  let f = fixture(200);
  let slot = f.slot.clone();

  f.service.create_reservation(request(&slot, "A1234", 150)).await.unwrap();
  assert_eq!(f.service.available_seats(slot.slot_id).await.unwrap(), 50);

  let err = f
    .service
    .create_reservation(request(&slot, "B5678", 60))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::BadRequest);
  assert_eq!(err.remaining_seats(), Some(50));
  assert!(err.to_string().contains("50"));
  assert_eq!(f.store.snapshot().reservation_count(), 1);

  f.service.create_reservation(request(&slot, "B5678", 50)).await.unwrap();
  assert_eq!(f.service.available_seats(slot.slot_id).await.unwrap(), 0);

  let err = f
    .service
    .create_reservation(request(&slot, "C0001", 1))
    .await
    .unwrap_err();
  assert_eq!(err.remaining_seats(), Some(0));
}

#[tokio::test]
async fn second_booking_for_same_institution_is_conflict() {
  let f = fixture(1000);
  f.service.create_reservation(request(&f.slot, "A1234", 10)).await.unwrap();

  let err = f
    .service
    .create_reservation(request(&f.slot, "A1234", 10))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateBooking { .. }));
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn link_confirms_within_window_and_is_idempotent() {
  let f = fixture(200);
  let booked = f.service.create_reservation(request(&f.slot, "A1234", 30)).await.unwrap();
  let token = token_from_link(&f.notifier.sent()[0].confirm_link);

  f.clock.advance(Duration::hours(3));
  let outcome = f.service.confirm_reservation(Some(&token)).await.unwrap();
  assert_eq!(outcome, ConfirmOutcome::Confirmed(booked.reservation.reservation_id));

  let stored = f.service.reservation(booked.reservation.reservation_id).await.unwrap();
  assert_eq!(stored.status, ReservationStatus::Confirmed);
  assert!(stored.confirmation_token.is_none());

  let again = f.service.confirm_reservation(Some(&token)).await.unwrap();
  assert!(again.is_success());
  assert_eq!(f.service.available_seats(f.slot.slot_id).await.unwrap(), 170);
}

#[tokio::test]
async fn late_link_is_rejected_and_seats_stay_held() {
  let f = fixture(200);
  let booked = f.service.create_reservation(request(&f.slot, "A1234", 30)).await.unwrap();
  let token = token_from_link(&f.notifier.sent()[0].confirm_link);

  f.clock.advance(Duration::hours(25));
  let outcome = f.service.confirm_reservation(Some(&token)).await.unwrap();
  assert_eq!(outcome, ConfirmOutcome::Rejected(Rejection::Expired));

  let stored = f.service.reservation(booked.reservation.reservation_id).await.unwrap();
  assert_eq!(stored.status, ReservationStatus::Pending);
  assert_eq!(f.service.available_seats(f.slot.slot_id).await.unwrap(), 170);
}

// ─── Notification ────────────────────────────────────────────────────────────

#[tokio::test]
async fn notice_carries_labels_and_link() {
  let f = fixture(200);
  let booked = f.service.create_reservation(request(&f.slot, "A1234", 30)).await.unwrap();
  assert!(booked.email_sent);

  let sent = f.notifier.sent();
  assert_eq!(sent.len(), 1);
  let notice = &sent[0];
  assert_eq!(notice.email, "ana@example.com");
  assert_eq!(notice.coordinator_name, "Ana Pérez");
  assert_eq!(notice.day_label, "Lunes 16 marzo");
  assert_eq!(notice.slot_label, "09h00 - 11h00");
  assert_eq!(notice.reservation_id, booked.reservation.reservation_id);
  assert!(
    notice
      .confirm_link
      .starts_with("https://feria.example.org/api/reservations/confirm?token=")
  );
  assert_eq!(token_from_link(&notice.confirm_link).len(), 64);
}

#[tokio::test]
async fn mail_failure_keeps_the_booking() {
  let f = fixture_with(200, RecordingNotifier::failing());
  let booked = f.service.create_reservation(request(&f.slot, "A1234", 30)).await.unwrap();

  assert!(!booked.email_sent);
  assert_eq!(booked.reservation.status, ReservationStatus::Pending);
  assert_eq!(f.service.available_seats(f.slot.slot_id).await.unwrap(), 170);
}

#[tokio::test]
async fn invalid_request_never_reaches_storage() {
  let f = fixture(200);
  let mut bad = request(&f.slot, "A1234", 30);
  bad.email = "not-an-email".into();

  let err = f.service.create_reservation(bad).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::BadRequest);
  assert_eq!(f.store.attempts(), 0);
  assert!(f.notifier.sent().is_empty());
}

#[tokio::test]
async fn oversized_group_is_rejected_by_policy() {
  let f = fixture(1000);
  let err = f
    .service
    .create_reservation(request(&f.slot, "A1234", 201))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::BadRequest);
  assert_eq!(err.remaining_seats(), None);
}

// ─── Retries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn conflicts_are_retried_up_to_the_policy_limit() {
  let f = fixture(200);
  f.store.fail_next(3);

  f.service.create_reservation(request(&f.slot, "A1234", 30)).await.unwrap();
  assert_eq!(f.store.attempts(), 4);
  assert_eq!(f.store.snapshot().reservation_count(), 1);
}

#[tokio::test]
async fn persistent_conflict_surfaces_as_transient() {
  let f = fixture(200);
  f.store.fail_next(10);

  let err = f
    .service
    .create_reservation(request(&f.slot, "A1234", 30))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Transient);
  assert_eq!(f.store.attempts(), 4);
  assert_eq!(f.store.snapshot().reservation_count(), 0);
  assert!(f.notifier.sent().is_empty());
}

#[tokio::test]
async fn concurrent_bookings_never_overcommit() {
  let f = fixture(100);
  let mut handles = Vec::new();

  for i in 0..20 {
    let service = f.service.clone();
    let req = request(&f.slot, &format!("S{i}"), 15);
    handles.push(tokio::spawn(async move { service.create_reservation(req).await }));
  }

  let mut admitted = 0;
  for handle in handles {
    if handle.await.unwrap().is_ok() {
      admitted += 1;
    }
  }

  assert_eq!(admitted, 6);
  assert_eq!(f.service.available_seats(f.slot.slot_id).await.unwrap(), 10);
}

// ─── Listing, registry and admin ─────────────────────────────────────────────

#[tokio::test]
async fn fair_days_reflect_bookings() {
  let f = fixture(200);
  f.service.create_reservation(request(&f.slot, "A1234", 120)).await.unwrap();

  let days = f.service.fair_days().await.unwrap();
  assert_eq!(days.len(), 3);
  assert_eq!(days[0].slots[0].available, 80);
  assert!(days[1].slots.iter().all(|s| s.available == 200));
}

#[tokio::test]
async fn bookings_register_institutions() {
  let f = fixture(200);
  assert!(f.service.lookup_institution("A1234").await.unwrap().is_none());

  f.service.create_reservation(request(&f.slot, "A1234", 10)).await.unwrap();
  let found = f.service.lookup_institution(" A1234 ").await.unwrap().unwrap();
  assert_eq!(found.name, "Escuela A1234");
}

#[tokio::test]
async fn admin_amend_validates_and_applies() {
  let f = fixture(200);
  let booked = f.service.create_reservation(request(&f.slot, "A1234", 10)).await.unwrap();
  let id = booked.reservation.reservation_id;

  let bad = ReservationPatch { phone: Some("12".into()), ..Default::default() };
  let err = f.service.amend_reservation(id, bad).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::BadRequest);

  f.clock.advance(Duration::minutes(10));
  let patch = ReservationPatch {
    student_count: Some(40),
    status: Some(ReservationStatus::Confirmed),
    ..Default::default()
  };
  let amended = f.service.amend_reservation(id, patch).await.unwrap();
  assert_eq!(amended.student_count, 40);
  assert_eq!(amended.confirmed_at, Some(f.clock.now()));
  assert!(amended.updated_at > amended.created_at);

  let token = token_from_link(&f.notifier.sent()[0].confirm_link);
  let outcome = f.service.confirm_reservation(Some(&token)).await.unwrap();
  assert_eq!(outcome, ConfirmOutcome::AlreadyConfirmed(id));
}

#[tokio::test]
async fn unknown_reservation_is_not_found() {
  let f = fixture(200);
  let err = f.service.reservation(Uuid::new_v4()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn seeding_twice_creates_nothing_new() {
  let f = fixture(200);
  let dates = vec![
    NaiveDate::from_ymd_opt(2026, 3, 18).unwrap(),
    NaiveDate::from_ymd_opt(2026, 3, 19).unwrap(),
  ];

  assert_eq!(f.service.seed_fair("Feria", dates.clone(), 150).await.unwrap(), 1);
  assert_eq!(f.service.seed_fair("Feria", dates, 150).await.unwrap(), 0);
  assert_eq!(f.store.snapshot().events().unwrap().len(), 4);
}
