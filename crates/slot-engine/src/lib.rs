//! # slot-engine
//!
//! Availability resolution for embeddable booking widgets.
//!
//! An embed (one business account) publishes weekly open-hours rules. Its
//! customers pick a 30-minute slot from a calendar. This crate turns the rules
//! plus the embed's existing bookings into the open slots for a day or a
//! month, checks a single requested slot, and runs the booking lifecycle on
//! top of a pluggable store.
//!
//! ## Modules
//!
//! - [`resolver`] — pure slot computation (day, month, single-slot check)
//! - [`service`] — store-backed API: `get_available_time_slots`,
//!   `get_availability_for_month`, `check_slot_availability`
//! - [`booking`] — create bookings and move them through their status lifecycle
//! - [`store`] — storage traits; [`memory`] — in-memory implementation and JSON snapshots
//! - [`settings`] — industry-tagged embed configuration and custom booking-form fields
//! - [`model`] — rules, bookings, booking types and derived slot views
//! - [`clock`] — system and fixed clocks in the embed's timezone
//! - [`wall_clock`] — `HH:mm:ss` / ISO date parsing and serde helpers
//! - [`error`] — Error types

pub mod booking;
pub mod clock;
pub mod error;
pub mod memory;
pub mod model;
pub mod resolver;
pub mod service;
pub mod settings;
pub mod store;
pub mod wall_clock;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::SlotError;
pub use memory::{MemoryStore, Snapshot};
pub use model::{
    AvailabilityRule, Booking, BookingRequest, BookingStatus, BookingType, Customer, DateRange,
    DayAvailability, Slot, SlotCheck,
};
pub use resolver::{available_time_slots, check_slot, month_availability, SLOT_MINUTES};
pub use service::AvailabilityService;
pub use settings::{EmbedSettings, IndustryProfile, SettingsError};
pub use store::{AvailabilityStore, BookingStore, StoreError};
