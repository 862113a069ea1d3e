//! Tests for booking creation and the status lifecycle.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::json;
use parking_lot::Mutex;
use slot_engine::model::{
    AvailabilityRule, Booking, BookingRequest, BookingStatus, BookingType, Customer, DateRange,
};
use slot_engine::store::{AvailabilityStore, BookingStore, StoreError, StoreResult};
use slot_engine::{
    AvailabilityService, EmbedSettings, FixedClock, MemoryStore, SettingsError, SlotError, Snapshot,
};
use uuid::Uuid;

// ── Helpers ─────────────────────────────────────────────────────────────────

const CUT: &str = "7f9c2a4e-1d3b-4c5a-9e8f-0a1b2c3d4e5f";
const COLOUR: &str = "2b4d6f80-a1c3-4e5f-8a9b-0c1d2e3f4a5b";

fn salon() -> (Uuid, Arc<MemoryStore>) {
    let embed = Uuid::new_v4();
    let snapshot: Snapshot = serde_json::from_value(json!({
        "embed_id": embed,
        "name": "Studio North",
        "settings": {
            "industry": "salon",
            "stylists": ["Mia"],
            "timezone": "Europe/Berlin",
            "allowed_booking_types": [CUT],
            "custom_fields": {
                "hair_length": {
                    "label": "Hair length",
                    "kind": "choice",
                    "options": ["short", "long"],
                    "required": true
                }
            }
        },
        "rules": [
            { "day_of_week": 1, "start_time": "09:00:00", "end_time": "12:00:00" },
            { "day_of_week": 1, "start_time": "23:00:00", "end_time": "23:59:00" }
        ],
        "booking_types": [
            { "id": CUT, "name": "Cut", "duration_minutes": 45 },
            { "id": COLOUR, "name": "Colour", "duration_minutes": 90 }
        ]
    }))
    .unwrap();
    (embed, Arc::new(MemoryStore::from_snapshot(snapshot).unwrap()))
}

fn service(store: Arc<MemoryStore>) -> AvailabilityService<Arc<MemoryStore>, FixedClock> {
    let now = NaiveDateTime::parse_from_str("2026-03-01T12:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
    AvailabilityService::new(store, FixedClock(now))
}

fn request(start: &str) -> BookingRequest {
    let mut custom_fields = BTreeMap::new();
    custom_fields.insert("hair_length".to_string(), json!("short"));
    BookingRequest {
        date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        start_time: NaiveTime::parse_from_str(start, "%H:%M:%S").unwrap(),
        booking_type_id: None,
        customer: Customer {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: Some("+44 20 7946 0958".to_string()),
        },
        notes: None,
        custom_fields,
        user_id: None,
    }
}

// ── Creation ────────────────────────────────────────────────────────────────

#[test]
fn booking_takes_the_slot() {
    let (embed, store) = salon();
    let service = service(store);

    let booking = service.book_slot(embed, request("09:00:00")).unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.embed_id, embed);
    assert_eq!(booking.end_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());

    let slots = service.get_available_time_slots(embed, "2026-03-02").unwrap();
    assert!(!slots[0].is_available);
    assert!(slots[1].is_available);
}

#[test]
fn booking_type_sets_duration() {
    let (embed, store) = salon();
    let service = service(store);

    let mut req = request("10:00:00");
    req.booking_type_id = Some(CUT.parse().unwrap());
    let booking = service.book_slot(embed, req).unwrap();
    assert_eq!(booking.end_time, NaiveTime::from_hms_opt(10, 45, 0).unwrap());
}

#[test]
fn disallowed_booking_type_rejected() {
    let (embed, store) = salon();
    let service = service(store);

    let mut req = request("10:00:00");
    req.booking_type_id = Some(COLOUR.parse().unwrap());
    assert!(matches!(service.book_slot(embed, req), Err(SlotError::InvalidRequest(_))));

    let mut req = request("10:00:00");
    req.booking_type_id = Some(Uuid::new_v4());
    assert!(matches!(service.book_slot(embed, req), Err(SlotError::InvalidRequest(_))));
}

#[test]
fn second_booking_of_same_slot_is_unavailable() {
    let (embed, store) = salon();
    let service = service(store);

    service.book_slot(embed, request("09:30:00")).unwrap();
    let err = service.book_slot(embed, request("09:30:00")).unwrap_err();
    match err {
        SlotError::SlotUnavailable(message) => assert!(message.contains("already booked")),
        other => panic!("expected SlotUnavailable, got {:?}", other),
    }
}

#[test]
fn outside_hours_is_unavailable() {
    let (embed, store) = salon();
    let service = service(store);
    let err = service.book_slot(embed, request("13:00:00")).unwrap_err();
    assert!(matches!(
        err,
        SlotError::SlotUnavailable(ref m) if m.contains("not within available hours")
    ));
}

#[test]
fn invalid_customer_rejected_before_any_read() {
    let (embed, store) = salon();
    let service = service(store);

    let mut req = request("09:00:00");
    req.customer.email = "not-an-email".to_string();
    assert!(matches!(service.book_slot(embed, req), Err(SlotError::InvalidRequest(_))));
}

#[test]
fn missing_required_custom_field_rejected() {
    let (embed, store) = salon();
    let service = service(store);

    let mut req = request("09:00:00");
    req.custom_fields.clear();
    assert!(matches!(
        service.book_slot(embed, req),
        Err(SlotError::Settings(SettingsError::MissingAnswer(_)))
    ));
}

#[test]
fn booking_past_midnight_rejected() {
    let (embed, store) = salon();
    let service = service(store);

    let mut req = request("23:30:00");
    req.booking_type_id = Some(CUT.parse().unwrap());
    assert!(matches!(service.book_slot(embed, req), Err(SlotError::InvalidRequest(_))));
}

#[test]
fn last_slot_before_midnight_can_be_booked() {
    let (embed, store) = salon();
    let service = service(store);

    let check = service.check_slot_availability(embed, "2026-03-02", "23:30:00").unwrap();
    assert!(check.available);

    let booking = service.book_slot(embed, request("23:30:00")).unwrap();
    assert_eq!(booking.end_time, NaiveTime::from_hms_opt(0, 0, 0).unwrap());

    let slots = service.get_available_time_slots(embed, "2026-03-02").unwrap();
    let last = slots.last().unwrap();
    assert_eq!(last.time, NaiveTime::from_hms_opt(23, 30, 0).unwrap());
    assert!(!last.is_available);

    assert!(matches!(
        service.book_slot(embed, request("23:30:00")),
        Err(SlotError::SlotUnavailable(_))
    ));
}

#[test]
fn racing_bookings_produce_one_winner() {
    let (embed, store) = salon();
    let service = Arc::new(service(store.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            thread::spawn(move || service.book_slot(embed, request("11:00:00")))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for loser in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(
            loser,
            SlotError::SlotUnavailable(_) | SlotError::Store(StoreError::Duplicate(_))
        ));
    }

    let held = store
        .list_bookings(embed, DateRange::day(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()))
        .unwrap();
    assert_eq!(held.len(), 1);
}

// ── Lifecycle ───────────────────────────────────────────────────────────────

#[test]
fn confirm_then_complete() {
    let (embed, store) = salon();
    let service = service(store);
    let booking = service.book_slot(embed, request("09:00:00")).unwrap();

    let confirmed = service
        .update_booking_status(embed, booking.id, BookingStatus::Confirmed)
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    let completed = service
        .update_booking_status(embed, booking.id, BookingStatus::Completed)
        .unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);

    let err = service.cancel_booking(embed, booking.id).unwrap_err();
    assert!(matches!(
        err,
        SlotError::InvalidTransition {
            from: BookingStatus::Completed,
            to: BookingStatus::Cancelled,
            ..
        }
    ));
}

#[test]
fn pending_cannot_be_marked_no_show() {
    let (embed, store) = salon();
    let service = service(store);
    let booking = service.book_slot(embed, request("09:00:00")).unwrap();

    assert!(matches!(
        service.update_booking_status(embed, booking.id, BookingStatus::NoShow),
        Err(SlotError::InvalidTransition { .. })
    ));
}

#[test]
fn cancellation_reopens_the_slot() {
    let (embed, store) = salon();
    let service = service(store);
    let booking = service.book_slot(embed, request("09:00:00")).unwrap();

    service.cancel_booking(embed, booking.id).unwrap();
    let check = service.check_slot_availability(embed, "2026-03-02", "09:00:00").unwrap();
    assert!(check.available);
    assert!(service.book_slot(embed, request("09:00:00")).is_ok());
}

#[test]
fn unknown_booking_is_not_found() {
    let (embed, store) = salon();
    let service = service(store);
    assert!(matches!(
        service.cancel_booking(embed, Uuid::new_v4()),
        Err(SlotError::Store(StoreError::NotFound { entity: "booking", .. }))
    ));
}

// ── Concurrent status changes ───────────────────────────────────────────────

type Interleaving = Box<dyn FnOnce(&Arc<MemoryStore>) + Send>;

/// Runs `after_read` once, right after the first `get_booking`, so another
/// client's writes land between the lifecycle check and the status write.
struct InterleavedStore {
    inner: Arc<MemoryStore>,
    after_read: Mutex<Option<Interleaving>>,
}

impl AvailabilityStore for InterleavedStore {
    fn list_availability_rules(&self, embed_id: Uuid) -> StoreResult<Vec<AvailabilityRule>> {
        self.inner.list_availability_rules(embed_id)
    }

    fn list_bookings(&self, embed_id: Uuid, range: DateRange) -> StoreResult<Vec<Booking>> {
        self.inner.list_bookings(embed_id, range)
    }
}

impl BookingStore for InterleavedStore {
    fn embed_settings(&self, embed_id: Uuid) -> StoreResult<EmbedSettings> {
        self.inner.embed_settings(embed_id)
    }

    fn list_booking_types(&self, embed_id: Uuid) -> StoreResult<Vec<BookingType>> {
        self.inner.list_booking_types(embed_id)
    }

    fn get_booking(&self, embed_id: Uuid, booking_id: Uuid) -> StoreResult<Booking> {
        let booking = self.inner.get_booking(embed_id, booking_id)?;
        let interleave = self.after_read.lock().take();
        if let Some(interleave) = interleave {
            interleave(&self.inner);
        }
        Ok(booking)
    }

    fn insert_booking(&self, booking: Booking) -> StoreResult<Booking> {
        self.inner.insert_booking(booking)
    }

    fn update_booking_status(
        &self,
        embed_id: Uuid,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> StoreResult<Booking> {
        self.inner.update_booking_status(embed_id, booking_id, from, to)
    }

    fn upsert_availability_rule(&self, rule: AvailabilityRule) -> StoreResult<AvailabilityRule> {
        self.inner.upsert_availability_rule(rule)
    }

    fn delete_availability_rule(&self, embed_id: Uuid, rule_id: Uuid) -> StoreResult<()> {
        self.inner.delete_availability_rule(embed_id, rule_id)
    }
}

#[test]
fn confirm_after_concurrent_cancel_and_rebook_is_rejected() {
    let (embed, store) = salon();
    let first = service(store.clone()).book_slot(embed, request("09:00:00")).unwrap();

    let first_id = first.id;
    let interleaved = InterleavedStore {
        inner: store.clone(),
        after_read: Mutex::new(Some(Box::new(move |inner: &Arc<MemoryStore>| {
            let other = service(Arc::clone(inner));
            other.cancel_booking(embed, first_id).unwrap();
            other.book_slot(embed, request("09:00:00")).unwrap();
        }))),
    };
    let now = NaiveDateTime::parse_from_str("2026-03-01T12:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
    let owner = AvailabilityService::new(interleaved, FixedClock(now));

    let err = owner
        .update_booking_status(embed, first.id, BookingStatus::Confirmed)
        .unwrap_err();
    assert!(matches!(
        err,
        SlotError::InvalidTransition {
            from: BookingStatus::Cancelled,
            to: BookingStatus::Confirmed,
            ..
        }
    ));

    let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let holders = store
        .list_bookings(embed, DateRange::day(date))
        .unwrap()
        .into_iter()
        .filter(|b| b.occupies(date, NaiveTime::from_hms_opt(9, 0, 0).unwrap()))
        .count();
    assert_eq!(holders, 1);
}

#[test]
fn stale_read_retries_against_fresh_status() {
    let (embed, store) = salon();
    let first = service(store.clone()).book_slot(embed, request("09:00:00")).unwrap();

    let first_id = first.id;
    let interleaved = InterleavedStore {
        inner: store.clone(),
        after_read: Mutex::new(Some(Box::new(move |inner: &Arc<MemoryStore>| {
            service(Arc::clone(inner))
                .update_booking_status(embed, first_id, BookingStatus::Confirmed)
                .unwrap();
        }))),
    };
    let now = NaiveDateTime::parse_from_str("2026-03-01T12:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
    let owner = AvailabilityService::new(interleaved, FixedClock(now));

    let cancelled = owner.cancel_booking(embed, first.id).unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
}
