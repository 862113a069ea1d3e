//! The storage seam.
//!
//! The resolver only ever reads through [`AvailabilityStore`]; the booking
//! flow additionally writes through [`BookingStore`]. One store handle is
//! built at startup and shared (see the `Arc` impls below) rather than
//! constructed per call.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::model::{AvailabilityRule, Booking, BookingStatus, BookingType, DateRange};
use crate::settings::EmbedSettings;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing store could not be reached or failed mid-read.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// A non-cancelled booking already holds this embed/date/start time.
    #[error("Duplicate booking: {0}")]
    Duplicate(String),

    /// The booking's status moved on since it was read.
    #[error("Booking {id} is {actual}, expected {expected}")]
    StatusChanged {
        id: Uuid,
        expected: BookingStatus,
        actual: BookingStatus,
    },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Read access needed to resolve availability.
pub trait AvailabilityStore: Send + Sync {
    fn list_availability_rules(&self, embed_id: Uuid) -> StoreResult<Vec<AvailabilityRule>>;

    /// Bookings of any status whose date falls inside `range`.
    fn list_bookings(&self, embed_id: Uuid, range: DateRange) -> StoreResult<Vec<Booking>>;
}

/// Read/write access used by the booking flow and tenant administration.
pub trait BookingStore: AvailabilityStore {
    fn embed_settings(&self, embed_id: Uuid) -> StoreResult<EmbedSettings>;

    fn list_booking_types(&self, embed_id: Uuid) -> StoreResult<Vec<BookingType>>;

    fn get_booking(&self, embed_id: Uuid, booking_id: Uuid) -> StoreResult<Booking>;

    /// Persist a new booking. Fails with [`StoreError::Duplicate`] when a
    /// slot-holding booking already starts at the same date and time.
    fn insert_booking(&self, booking: Booking) -> StoreResult<Booking>;

    /// Move a booking from `from` to `to` as one atomic step.
    ///
    /// Fails with [`StoreError::StatusChanged`] when the stored status is no
    /// longer `from`, and with [`StoreError::Duplicate`] when `to` would make
    /// this booking a second holder of its slot.
    fn update_booking_status(
        &self,
        embed_id: Uuid,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> StoreResult<Booking>;

    fn upsert_availability_rule(&self, rule: AvailabilityRule) -> StoreResult<AvailabilityRule>;

    fn delete_availability_rule(&self, embed_id: Uuid, rule_id: Uuid) -> StoreResult<()>;
}

impl<T: AvailabilityStore + ?Sized> AvailabilityStore for Arc<T> {
    fn list_availability_rules(&self, embed_id: Uuid) -> StoreResult<Vec<AvailabilityRule>> {
        (**self).list_availability_rules(embed_id)
    }

    fn list_bookings(&self, embed_id: Uuid, range: DateRange) -> StoreResult<Vec<Booking>> {
        (**self).list_bookings(embed_id, range)
    }
}

impl<T: BookingStore + ?Sized> BookingStore for Arc<T> {
    fn embed_settings(&self, embed_id: Uuid) -> StoreResult<EmbedSettings> {
        (**self).embed_settings(embed_id)
    }

    fn list_booking_types(&self, embed_id: Uuid) -> StoreResult<Vec<BookingType>> {
        (**self).list_booking_types(embed_id)
    }

    fn get_booking(&self, embed_id: Uuid, booking_id: Uuid) -> StoreResult<Booking> {
        (**self).get_booking(embed_id, booking_id)
    }

    fn insert_booking(&self, booking: Booking) -> StoreResult<Booking> {
        (**self).insert_booking(booking)
    }

    fn update_booking_status(
        &self,
        embed_id: Uuid,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> StoreResult<Booking> {
        (**self).update_booking_status(embed_id, booking_id, from, to)
    }

    fn upsert_availability_rule(&self, rule: AvailabilityRule) -> StoreResult<AvailabilityRule> {
        (**self).upsert_availability_rule(rule)
    }

    fn delete_availability_rule(&self, embed_id: Uuid, rule_id: Uuid) -> StoreResult<()> {
        (**self).delete_availability_rule(embed_id, rule_id)
    }
}
