//! Domain records shared by the resolver, the store and the booking flow.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SlotError};
use crate::wall_clock::{self, serde_time};

fn default_true() -> bool {
    true
}

/// A recurring weekly open window for one embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRule {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub embed_id: Uuid,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: u8,
    #[serde(with = "serde_time")]
    pub start_time: NaiveTime,
    #[serde(with = "serde_time")]
    pub end_time: NaiveTime,
    /// Stored with the rule; slot generation does not apply it.
    #[serde(default)]
    pub buffer_minutes: u32,
    #[serde(default = "default_true")]
    pub is_recurring: bool,
    #[serde(default)]
    pub valid_from: Option<NaiveDate>,
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
}

impl AvailabilityRule {
    /// A recurring rule with no buffer and no date bounds.
    pub fn weekly(
        embed_id: Uuid,
        day_of_week: u8,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            embed_id,
            day_of_week,
            start_time,
            end_time,
            buffer_minutes: 0,
            is_recurring: true,
            valid_from: None,
            valid_until: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.day_of_week > 6 {
            return Err(SlotError::InvalidRule(format!(
                "day_of_week must be 0-6, got {}",
                self.day_of_week
            )));
        }
        if self.start_time >= self.end_time {
            return Err(SlotError::InvalidRule(format!(
                "start_time {} must be before end_time {}",
                self.start_time.format(wall_clock::TIME_FORMAT),
                self.end_time.format(wall_clock::TIME_FORMAT)
            )));
        }
        if let (Some(from), Some(until)) = (self.valid_from, self.valid_until) {
            if from > until {
                return Err(SlotError::InvalidRule(format!(
                    "valid_from {} is after valid_until {}",
                    from, until
                )));
            }
        }
        Ok(())
    }

    /// Whether the optional date bounds admit `date`.
    pub fn is_in_effect(&self, date: NaiveDate) -> bool {
        self.valid_from.is_none_or(|from| date >= from)
            && self.valid_until.is_none_or(|until| date <= until)
    }

    /// Whether `time` falls inside `[start_time, end_time)`.
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start_time <= time && time < self.end_time
    }
}

/// Lifecycle of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    #[serde(alias = "no-show")]
    NoShow,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
        BookingStatus::NoShow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
            BookingStatus::NoShow => "no_show",
        }
    }

    /// Every status except `cancelled` keeps its start time blocked.
    pub fn holds_slot(self) -> bool {
        self != BookingStatus::Cancelled
    }

    /// Cancelled, completed and no-show bookings never change again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Cancelled | BookingStatus::Completed | BookingStatus::NoShow
        )
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Completed)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            "no_show" | "no-show" => Ok(BookingStatus::NoShow),
            _ => Err(format!("Unknown booking status: {}", s)),
        }
    }
}

/// Contact details a customer leaves with a booking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Customer {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(SlotError::InvalidRequest("customer name is required".to_string()));
        }
        let email = self.email.trim();
        let valid_email = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            }
            None => false,
        };
        if !valid_email {
            return Err(SlotError::InvalidRequest(format!(
                "'{}' is not a valid email address",
                self.email
            )));
        }
        if let Some(phone) = &self.phone {
            let digits = phone.chars().filter(char::is_ascii_digit).count();
            if digits < 6 {
                return Err(SlotError::InvalidRequest(format!(
                    "'{}' is not a valid phone number",
                    phone
                )));
            }
        }
        Ok(())
    }
}

/// A customer's reservation of one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub embed_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_type_id: Option<Uuid>,
    pub date: NaiveDate,
    #[serde(with = "serde_time")]
    pub start_time: NaiveTime,
    #[serde(with = "serde_time")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub customer: Customer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_fields: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Every status except `cancelled` keeps the slot taken.
    pub fn holds_slot(&self) -> bool {
        self.status.holds_slot()
    }

    /// Whether the interval is non-empty. An `end_time` of `00:00:00` after a
    /// later start means the booking runs up to midnight.
    pub fn ends_after_start(&self) -> bool {
        self.end_time > self.start_time
            || (self.end_time == NaiveTime::MIN && self.start_time != NaiveTime::MIN)
    }

    /// Whether this booking blocks the slot starting at `date` + `time`.
    ///
    /// Only the start time is compared; a booking whose interval covers
    /// `time` without starting there does not block it.
    pub fn occupies(&self, date: NaiveDate, time: NaiveTime) -> bool {
        self.holds_slot() && self.date == date && self.start_time == time
    }
}

/// A kind of appointment the embed offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingType {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub embed_id: Uuid,
    pub name: String,
    pub duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<u64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// What a customer submits from the widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub date: NaiveDate,
    #[serde(with = "serde_time")]
    pub start_time: NaiveTime,
    #[serde(default)]
    pub booking_type_id: Option<Uuid>,
    pub customer: Customer,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

/// Inclusive calendar date range used when listing bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn day(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    /// The whole calendar month containing `date`.
    pub fn month(date: NaiveDate) -> Self {
        Self {
            start: wall_clock::first_of_month(date),
            end: wall_clock::last_of_month(date),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A candidate appointment start time on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[serde(with = "serde_time")]
    pub time: NaiveTime,
    pub is_available: bool,
}

/// Month-view summary for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub has_availability: bool,
    /// Number of open slots on this day.
    pub available_slots: usize,
}

/// Result of checking a single requested slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCheck {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SlotCheck {
    pub fn open() -> Self {
        Self {
            available: true,
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            available: false,
            message: Some(message.into()),
        }
    }
}
