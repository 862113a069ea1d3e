//! WASM bindings for slot-engine.
//!
//! Exposes the slot resolver to the embeddable booking widget via
//! `wasm-bindgen`. Rules and bookings cross the boundary as JSON strings in
//! the same shape the storage rows use; results come back as JSON strings.
//! The widget passes "now" in the embed's wall-clock time.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p slot-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir widget/pkg/ \
//!   target/wasm32-unknown-unknown/release/slot_engine_wasm.wasm
//! ```

use chrono::NaiveDateTime;
use serde::Serialize;
use slot_engine::model::{AvailabilityRule, Booking};
use slot_engine::{wall_clock, EmbedSettings};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Plain-Rust core, kept free of JsValue so it runs in native tests
// ---------------------------------------------------------------------------

type BindingResult<T> = Result<T, String>;

fn parse_rules(json: &str) -> BindingResult<Vec<AvailabilityRule>> {
    let rules: Vec<AvailabilityRule> =
        serde_json::from_str(json).map_err(|e| format!("Invalid rules JSON: {}", e))?;
    for rule in &rules {
        rule.validate().map_err(|e| e.to_string())?;
    }
    Ok(rules)
}

fn parse_bookings(json: &str) -> BindingResult<Vec<Booking>> {
    serde_json::from_str(json).map_err(|e| format!("Invalid bookings JSON: {}", e))
}

fn parse_now(now: &str) -> BindingResult<NaiveDateTime> {
    wall_clock::parse_datetime(now).map_err(|e| e.to_string())
}

fn to_json<T: Serialize>(value: &T) -> BindingResult<String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

fn day_slots(
    rules_json: &str,
    bookings_json: &str,
    date: &str,
    now: &str,
) -> BindingResult<String> {
    let rules = parse_rules(rules_json)?;
    let bookings = parse_bookings(bookings_json)?;
    let date = wall_clock::parse_date(date).map_err(|e| e.to_string())?;
    let slots = slot_engine::available_time_slots(&rules, &bookings, date, parse_now(now)?);
    to_json(&slots)
}

fn month_view(
    rules_json: &str,
    bookings_json: &str,
    month: &str,
    now: &str,
) -> BindingResult<String> {
    let rules = parse_rules(rules_json)?;
    let bookings = parse_bookings(bookings_json)?;
    let month = wall_clock::parse_month(month).map_err(|e| e.to_string())?;
    let days = slot_engine::month_availability(&rules, &bookings, month, parse_now(now)?);
    to_json(&days)
}

fn slot_check(
    rules_json: &str,
    bookings_json: &str,
    date: &str,
    time: &str,
    now: &str,
) -> BindingResult<String> {
    let rules = parse_rules(rules_json)?;
    let bookings = parse_bookings(bookings_json)?;
    let date = wall_clock::parse_date(date).map_err(|e| e.to_string())?;
    let time = wall_clock::parse_time(time).map_err(|e| e.to_string())?;
    let check = slot_engine::check_slot(&rules, &bookings, date, time, parse_now(now)?);
    to_json(&check)
}

fn normalized_settings(settings_json: &str) -> BindingResult<String> {
    let settings = EmbedSettings::from_json(settings_json).map_err(|e| e.to_string())?;
    to_json(&settings)
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Slots for one date.
///
/// `rules_json` and `bookings_json` are JSON arrays of availability-rule and
/// booking rows. `date` is `YYYY-MM-DD`, `now` is a local
/// `YYYY-MM-DDTHH:mm:ss`. Returns a JSON array of `{time, isAvailable}`.
#[wasm_bindgen(js_name = "availableTimeSlots")]
pub fn available_time_slots(
    rules_json: &str,
    bookings_json: &str,
    date: &str,
    now: &str,
) -> Result<String, JsValue> {
    day_slots(rules_json, bookings_json, date, now).map_err(|e| JsValue::from_str(&e))
}

/// Per-day availability for a `YYYY-MM` month.
///
/// Returns a JSON array of `{date, hasAvailability, availableSlots}`.
#[wasm_bindgen(js_name = "monthAvailability")]
pub fn month_availability(
    rules_json: &str,
    bookings_json: &str,
    month: &str,
    now: &str,
) -> Result<String, JsValue> {
    month_view(rules_json, bookings_json, month, now).map_err(|e| JsValue::from_str(&e))
}

/// Check one slot. Returns `{available, message?}`.
#[wasm_bindgen(js_name = "checkSlot")]
pub fn check_slot(
    rules_json: &str,
    bookings_json: &str,
    date: &str,
    time: &str,
    now: &str,
) -> Result<String, JsValue> {
    slot_check(rules_json, bookings_json, date, time, now).map_err(|e| JsValue::from_str(&e))
}

/// Validate an embed settings document and return it with defaults filled in.
#[wasm_bindgen(js_name = "validateSettings")]
pub fn validate_settings(settings_json: &str) -> Result<String, JsValue> {
    normalized_settings(settings_json).map_err(|e| JsValue::from_str(&e))
}
