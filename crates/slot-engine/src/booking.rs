//! Booking creation and status changes.

use chrono::{Duration, NaiveTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{Result, SlotError};
use crate::model::{Booking, BookingRequest, BookingStatus};
use crate::resolver::SLOT_MINUTES;
use crate::service::AvailabilityService;
use crate::store::{BookingStore, StoreError};

impl<S: BookingStore, C: Clock> AvailabilityService<S, C> {
    /// Create a pending booking for a customer.
    ///
    /// The slot is re-checked right before the write. The store still refuses
    /// a second holder of the same start time, so two requests racing past
    /// the check cannot both succeed against [`MemoryStore`](crate::MemoryStore).
    #[instrument(skip(self, request), fields(date = %request.date, time = %request.start_time))]
    pub fn book_slot(&self, embed_id: Uuid, request: BookingRequest) -> Result<Booking> {
        request.customer.validate()?;

        let settings = self.store.embed_settings(embed_id)?;
        settings.validate_answers(&request.custom_fields)?;

        let duration_minutes = match request.booking_type_id {
            Some(type_id) => {
                let booking_type = self
                    .store
                    .list_booking_types(embed_id)?
                    .into_iter()
                    .find(|bt| bt.id == type_id)
                    .ok_or_else(|| {
                        SlotError::InvalidRequest(format!("unknown booking type {}", type_id))
                    })?;
                if !booking_type.is_active || !settings.allows_booking_type(type_id) {
                    return Err(SlotError::InvalidRequest(format!(
                        "booking type '{}' is not offered",
                        booking_type.name
                    )));
                }
                i64::from(booking_type.duration_minutes)
            }
            None => SLOT_MINUTES,
        };

        let check = self.check(embed_id, request.date, request.start_time)?;
        if !check.available {
            let message = check.message.unwrap_or_default();
            warn!(%embed_id, reason = %message, "booking rejected");
            return Err(SlotError::SlotUnavailable(message));
        }

        let (end_time, wrapped_secs) = request
            .start_time
            .overflowing_add_signed(Duration::minutes(duration_minutes));
        let ends_at_midnight = wrapped_secs == 86_400 && end_time == NaiveTime::MIN;
        if wrapped_secs != 0 && !ends_at_midnight {
            return Err(SlotError::InvalidRequest(
                "booking would run past midnight".to_string(),
            ));
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            embed_id,
            booking_type_id: request.booking_type_id,
            date: request.date,
            start_time: request.start_time,
            end_time,
            status: BookingStatus::Pending,
            customer: request.customer,
            notes: request.notes,
            custom_fields: request.custom_fields,
            user_id: request.user_id,
            created_at: Utc::now(),
        };

        let booking = self.store.insert_booking(booking)?;
        info!(%embed_id, booking_id = %booking.id, "booking created");
        Ok(booking)
    }

    /// Move a booking to `status`, enforcing the lifecycle.
    ///
    /// The store applies the change only if the booking still has the status
    /// the lifecycle check saw; otherwise the check is repeated against the
    /// fresh status.
    #[instrument(skip(self))]
    pub fn update_booking_status(
        &self,
        embed_id: Uuid,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking> {
        let mut current = self.store.get_booking(embed_id, booking_id)?.status;
        loop {
            if !current.can_transition_to(status) {
                return Err(SlotError::InvalidTransition {
                    id: booking_id,
                    from: current,
                    to: status,
                });
            }
            match self.store.update_booking_status(embed_id, booking_id, current, status) {
                Ok(updated) => {
                    info!(
                        %embed_id,
                        %booking_id,
                        from = %current,
                        to = %status,
                        "booking status changed"
                    );
                    return Ok(updated);
                }
                Err(StoreError::StatusChanged { actual, .. }) => {
                    debug!(%booking_id, expected = %current, %actual, "status moved, re-checking");
                    current = actual;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Customer-initiated cancellation.
    pub fn cancel_booking(&self, embed_id: Uuid, booking_id: Uuid) -> Result<Booking> {
        self.update_booking_status(embed_id, booking_id, BookingStatus::Cancelled)
    }
}
