//! Error types for slot-engine operations.

use thiserror::Error;
use uuid::Uuid;

use crate::model::BookingStatus;
use crate::settings::SettingsError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid time '{0}': expected HH:mm:ss")]
    InvalidTime(String),

    #[error("Invalid timestamp '{0}': expected YYYY-MM-DDTHH:mm:ss")]
    InvalidDateTime(String),

    #[error("Invalid month '{0}': expected YYYY-MM")]
    InvalidMonth(String),

    #[error("Invalid availability rule: {0}")]
    InvalidRule(String),

    #[error("Invalid booking request: {0}")]
    InvalidRequest(String),

    /// The requested slot failed the availability check. Carries the same
    /// message a [`SlotCheck`](crate::model::SlotCheck) would report.
    #[error("Slot unavailable: {0}")]
    SlotUnavailable(String),

    #[error("Booking {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

pub type Result<T> = std::result::Result<T, SlotError>;
