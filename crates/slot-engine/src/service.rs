//! The availability API exposed to widget and dashboard callers.
//!
//! [`AvailabilityService`] owns one store handle and one clock. Each call
//! reads what it needs from the store, then hands off to the pure functions
//! in [`crate::resolver`]. A failed read aborts the call; there is no retry
//! and no partial result.

use chrono::{NaiveDate, NaiveTime};
use tracing::instrument;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::model::{DateRange, DayAvailability, Slot, SlotCheck};
use crate::resolver;
use crate::store::AvailabilityStore;
use crate::wall_clock;

pub struct AvailabilityService<S, C = SystemClock> {
    pub(crate) store: S,
    pub(crate) clock: C,
}

impl<S, C> AvailabilityService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<S: AvailabilityStore, C: Clock> AvailabilityService<S, C> {
    /// Per-day availability for a `YYYY-MM` month.
    pub fn get_availability_for_month(
        &self,
        embed_id: Uuid,
        month: &str,
    ) -> Result<Vec<DayAvailability>> {
        self.month_availability(embed_id, wall_clock::parse_month(month)?)
    }

    /// Slots for a `YYYY-MM-DD` date.
    pub fn get_available_time_slots(&self, embed_id: Uuid, date: &str) -> Result<Vec<Slot>> {
        self.time_slots(embed_id, wall_clock::parse_date(date)?)
    }

    /// Check one `YYYY-MM-DD` / `HH:mm:ss` slot.
    pub fn check_slot_availability(
        &self,
        embed_id: Uuid,
        date: &str,
        time: &str,
    ) -> Result<SlotCheck> {
        self.check(
            embed_id,
            wall_clock::parse_date(date)?,
            wall_clock::parse_time(time)?,
        )
    }

    #[instrument(skip(self))]
    pub fn month_availability(
        &self,
        embed_id: Uuid,
        month: NaiveDate,
    ) -> Result<Vec<DayAvailability>> {
        let rules = self.store.list_availability_rules(embed_id)?;
        let bookings = self.store.list_bookings(embed_id, DateRange::month(month))?;
        Ok(resolver::month_availability(&rules, &bookings, month, self.clock.now()))
    }

    #[instrument(skip(self))]
    pub fn time_slots(&self, embed_id: Uuid, date: NaiveDate) -> Result<Vec<Slot>> {
        let rules = self.store.list_availability_rules(embed_id)?;
        let bookings = self.store.list_bookings(embed_id, DateRange::day(date))?;
        Ok(resolver::available_time_slots(&rules, &bookings, date, self.clock.now()))
    }

    #[instrument(skip(self))]
    pub fn check(&self, embed_id: Uuid, date: NaiveDate, time: NaiveTime) -> Result<SlotCheck> {
        let rules = self.store.list_availability_rules(embed_id)?;
        let bookings = self.store.list_bookings(embed_id, DateRange::day(date))?;
        Ok(resolver::check_slot(&rules, &bookings, date, time, self.clock.now()))
    }
}
