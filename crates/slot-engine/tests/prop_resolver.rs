//! Property-based tests for the slot resolver using proptest.
//!
//! These check invariants that should hold for any rule set, booking set and
//! "now", not just the hand-picked cases in `resolver_tests.rs`.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use proptest::prelude::*;
use slot_engine::model::{AvailabilityRule, Booking, BookingStatus};
use slot_engine::resolver::{
    available_time_slots, check_slot, month_availability, weekday_index, SLOT_MINUTES,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Half-hour aligned minute-of-day.
fn arb_half_hour() -> impl Strategy<Value = u32> {
    (0u32..48).prop_map(|n| n * 30)
}

fn arb_rule() -> impl Strategy<Value = AvailabilityRule> {
    (0u8..=6, 0u32..47, 1u32..=16).prop_map(|(day, start_idx, len)| {
        let start = start_idx * 30;
        let end = (start + len * 30).min(23 * 60 + 59);
        AvailabilityRule::weekly(Uuid::nil(), day, minute_time(start), minute_time(end))
    })
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..730)
        .prop_map(|offset| NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(offset))
}

fn arb_status() -> impl Strategy<Value = BookingStatus> {
    prop_oneof![
        Just(BookingStatus::Pending),
        Just(BookingStatus::Confirmed),
        Just(BookingStatus::Cancelled),
        Just(BookingStatus::Completed),
        Just(BookingStatus::NoShow),
    ]
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn minute_time(minutes: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap()
}

fn booking(date: NaiveDate, start: NaiveTime, status: BookingStatus) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        embed_id: Uuid::nil(),
        booking_type_id: None,
        date,
        start_time: start,
        end_time: start + Duration::minutes(SLOT_MINUTES),
        status,
        customer: Default::default(),
        notes: None,
        custom_fields: Default::default(),
        user_id: None,
        created_at: chrono::Utc::now(),
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    /// Slots only come from rules for the date's weekday.
    #[test]
    fn no_matching_weekday_means_no_slots(
        rules in prop::collection::vec(arb_rule(), 0..6),
        date in arb_date(),
    ) {
        let weekday = weekday_index(date);
        let other: Vec<AvailabilityRule> =
            rules.into_iter().filter(|r| r.day_of_week != weekday).collect();
        let slots = available_time_slots(&other, &[], date, midnight(date));
        prop_assert!(slots.is_empty());
    }

    /// Every slot of a date strictly before today is closed.
    #[test]
    fn past_dates_are_fully_closed(
        rules in prop::collection::vec(arb_rule(), 0..6),
        date in arb_date(),
        days_later in 1i64..400,
    ) {
        let now = midnight(date + Duration::days(days_later));
        let slots = available_time_slots(&rules, &[], date, now);
        prop_assert!(slots.iter().all(|s| !s.is_available));
    }

    /// Slot count is the sum of per-rule half-hour steps, duplicates included.
    #[test]
    fn slot_count_matches_rule_widths(
        rules in prop::collection::vec(arb_rule(), 0..6),
        date in arb_date(),
    ) {
        let weekday = weekday_index(date);
        let expected: usize = rules
            .iter()
            .filter(|r| r.day_of_week == weekday)
            .map(|r| {
                let secs = (r.end_time - r.start_time).num_seconds();
                ((secs + SLOT_MINUTES * 60 - 1) / (SLOT_MINUTES * 60)) as usize
            })
            .sum();
        let slots = available_time_slots(&rules, &[], date, midnight(date));
        prop_assert_eq!(slots.len(), expected);
    }

    /// A slot-holding booking closes exactly the slots that share its start.
    #[test]
    fn holding_booking_closes_its_start(
        rules in prop::collection::vec(arb_rule(), 1..6),
        date in arb_date(),
        start in arb_half_hour(),
        status in arb_status(),
    ) {
        let start = minute_time(start);
        let bookings = vec![booking(date, start, status)];
        let slots = available_time_slots(&rules, &bookings, date, midnight(date));

        for slot in &slots {
            let blocked = slot.time == start && status != BookingStatus::Cancelled;
            prop_assert_eq!(slot.is_available, !blocked);
        }
    }

    /// The single-slot check agrees with the day view on slot boundaries.
    #[test]
    fn check_agrees_with_day_view(
        rules in prop::collection::vec(arb_rule(), 1..6),
        date in arb_date(),
        booked in prop::collection::vec(arb_half_hour(), 0..4),
        now_minutes in 0u32..(24 * 60),
    ) {
        let bookings: Vec<Booking> = booked
            .into_iter()
            .map(|m| booking(date, minute_time(m), BookingStatus::Confirmed))
            .collect();
        let now = date.and_time(minute_time(now_minutes));

        for slot in available_time_slots(&rules, &bookings, date, now) {
            let check = check_slot(&rules, &bookings, date, slot.time, now);
            prop_assert_eq!(check.available, slot.is_available);
        }
    }

    /// Month totals equal the sum of the per-day views.
    #[test]
    fn month_matches_day_views(
        rules in prop::collection::vec(arb_rule(), 0..6),
        date in arb_date(),
        now_offset in -40i64..40,
    ) {
        let now = midnight(date + Duration::days(now_offset));
        let days = month_availability(&rules, &[], date, now);

        prop_assert!(days.iter().all(|d| d.date.month() == date.month()));
        for day in days {
            let open = available_time_slots(&rules, &[], day.date, now)
                .iter()
                .filter(|s| s.is_available)
                .count();
            prop_assert_eq!(day.available_slots, open);
            prop_assert_eq!(day.has_availability, open > 0);
        }
    }
}
