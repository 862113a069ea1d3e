//! Turn weekly availability rules and existing bookings into open slots.
//!
//! Every function here is pure: callers pass the rules, the bookings and the
//! current wall-clock moment, and get a derived view back. Nothing is cached
//! and nothing is written.
//!
//! Known gaps, kept as-is:
//! - overlapping rules for the same weekday yield duplicate slots;
//! - a booking blocks a slot only when its start time equals the slot start.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::model::{AvailabilityRule, Booking, DayAvailability, Slot, SlotCheck};
use crate::wall_clock;

/// Fixed width of every slot.
pub const SLOT_MINUTES: i64 = 30;

pub const MSG_OUTSIDE_HOURS: &str = "Selected time is not within available hours";
pub const MSG_ALREADY_BOOKED: &str = "This time slot is already booked";
pub const MSG_IN_PAST: &str = "This time slot is in the past";

/// Weekday index with 0 = Sunday .. 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Rules that open the given date: same weekday and within any date bounds.
pub fn rules_for_date(
    rules: &[AvailabilityRule],
    date: NaiveDate,
) -> impl Iterator<Item = &AvailabilityRule> {
    let weekday = weekday_index(date);
    rules
        .iter()
        .filter(move |rule| rule.day_of_week == weekday && rule.is_in_effect(date))
}

/// Slot start times for one rule, from `start_time` (inclusive) to `end_time`
/// (exclusive) in [`SLOT_MINUTES`] steps.
///
/// The last slot may run past `end_time` when the window is not a multiple of
/// the slot width.
pub fn slot_starts(rule: &AvailabilityRule) -> Vec<NaiveTime> {
    let step = Duration::minutes(SLOT_MINUTES);
    let mut starts = Vec::new();
    let mut cursor = rule.start_time;

    while cursor < rule.end_time {
        starts.push(cursor);
        let (next, wrapped_secs) = cursor.overflowing_add_signed(step);
        if wrapped_secs != 0 {
            // Stepped past midnight.
            break;
        }
        cursor = next;
    }

    starts
}

/// Start times of slot-holding bookings, keyed by date.
fn booked_starts(bookings: &[Booking]) -> HashMap<NaiveDate, HashSet<NaiveTime>> {
    let mut booked: HashMap<NaiveDate, HashSet<NaiveTime>> = HashMap::new();
    for booking in bookings.iter().filter(|b| b.holds_slot()) {
        booked.entry(booking.date).or_default().insert(booking.start_time);
    }
    booked
}

fn resolve_day(
    rules: &[AvailabilityRule],
    booked: Option<&HashSet<NaiveTime>>,
    date: NaiveDate,
    now: NaiveDateTime,
) -> Vec<Slot> {
    rules_for_date(rules, date)
        .flat_map(slot_starts)
        .map(|time| {
            let taken = booked.is_some_and(|set| set.contains(&time));
            Slot {
                time,
                is_available: !taken && date.and_time(time) >= now,
            }
        })
        .collect()
}

/// Compute the slots for one date.
///
/// A slot is available iff nobody holds a booking starting at that exact time
/// and the slot does not start before `now`. A slot starting exactly at `now`
/// is still available.
pub fn available_time_slots(
    rules: &[AvailabilityRule],
    bookings: &[Booking],
    date: NaiveDate,
    now: NaiveDateTime,
) -> Vec<Slot> {
    let booked = booked_starts(bookings);
    let slots = resolve_day(rules, booked.get(&date), date, now);
    debug!(
        %date,
        total = slots.len(),
        open = slots.iter().filter(|s| s.is_available).count(),
        "resolved day"
    );
    slots
}

/// Per-day availability for the calendar month containing `month`.
pub fn month_availability(
    rules: &[AvailabilityRule],
    bookings: &[Booking],
    month: NaiveDate,
    now: NaiveDateTime,
) -> Vec<DayAvailability> {
    let booked = booked_starts(bookings);
    let first = wall_clock::first_of_month(month);

    let days: Vec<DayAvailability> = first
        .iter_days()
        .take_while(|date| date.month() == first.month())
        .map(|date| {
            let open = resolve_day(rules, booked.get(&date), date, now)
                .iter()
                .filter(|slot| slot.is_available)
                .count();
            DayAvailability {
                date,
                has_availability: open > 0,
                available_slots: open,
            }
        })
        .collect();

    debug!(
        month = %first.format("%Y-%m"),
        open_days = days.iter().filter(|d| d.has_availability).count(),
        "resolved month"
    );
    days
}

/// Check whether a customer may book `date` at `time`.
///
/// Checks run in order: inside a rule window, not already booked, not in the
/// past. The first failure decides the message.
pub fn check_slot(
    rules: &[AvailabilityRule],
    bookings: &[Booking],
    date: NaiveDate,
    time: NaiveTime,
    now: NaiveDateTime,
) -> SlotCheck {
    if !rules_for_date(rules, date).any(|rule| rule.contains(time)) {
        return SlotCheck::rejected(MSG_OUTSIDE_HOURS);
    }
    if bookings.iter().any(|b| b.occupies(date, time)) {
        return SlotCheck::rejected(MSG_ALREADY_BOOKED);
    }
    if date.and_time(time) < now {
        return SlotCheck::rejected(MSG_IN_PAST);
    }
    SlotCheck::open()
}
