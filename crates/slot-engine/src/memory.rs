//! In-memory store for tests, the CLI and local development.
//!
//! Data for each embed lives behind one `RwLock`. Records are validated as
//! they enter: snapshot settings go through [`EmbedSettings::from_value`] and
//! rules through [`AvailabilityRule::validate`].

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::model::{AvailabilityRule, Booking, BookingStatus, BookingType, DateRange};
use crate::settings::EmbedSettings;
use crate::store::{AvailabilityStore, BookingStore, StoreError, StoreResult};

/// Serialized form of everything stored for one embed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub embed_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub settings: serde_json::Value,
    #[serde(default)]
    pub rules: Vec<AvailabilityRule>,
    #[serde(default)]
    pub booking_types: Vec<BookingType>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Default)]
struct EmbedRecord {
    name: Option<String>,
    settings: EmbedSettings,
    rules: Vec<AvailabilityRule>,
    booking_types: Vec<BookingType>,
    bookings: Vec<Booking>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    embeds: RwLock<HashMap<Uuid, EmbedRecord>>,
}

fn embed_not_found(id: Uuid) -> StoreError {
    StoreError::NotFound { entity: "embed", id }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> StoreResult<Self> {
        let store = Self::new();
        store.load_snapshot(snapshot)?;
        Ok(store)
    }

    /// Register an embed with no rules, types or bookings.
    pub fn register_embed(&self, embed_id: Uuid, settings: EmbedSettings) {
        self.embeds.write().insert(
            embed_id,
            EmbedRecord {
                settings,
                ..EmbedRecord::default()
            },
        );
    }

    /// Replace everything stored for `snapshot.embed_id`.
    ///
    /// Child records are re-parented onto the snapshot's embed.
    pub fn load_snapshot(&self, snapshot: Snapshot) -> StoreResult<()> {
        let embed_id = snapshot.embed_id;
        let settings = EmbedSettings::from_value(snapshot.settings)
            .map_err(|e| StoreError::InvalidRecord(format!("embed {} settings: {}", embed_id, e)))?;

        let mut rules = snapshot.rules;
        for rule in &mut rules {
            rule.validate()
                .map_err(|e| StoreError::InvalidRecord(format!("rule {}: {}", rule.id, e)))?;
            rule.embed_id = embed_id;
        }
        let mut booking_types = snapshot.booking_types;
        for booking_type in &mut booking_types {
            if booking_type.duration_minutes == 0 {
                return Err(StoreError::InvalidRecord(format!(
                    "booking type {} has zero duration",
                    booking_type.id
                )));
            }
            booking_type.embed_id = embed_id;
        }
        let mut bookings = snapshot.bookings;
        for booking in &mut bookings {
            booking.embed_id = embed_id;
        }

        debug!(
            %embed_id,
            rules = rules.len(),
            booking_types = booking_types.len(),
            bookings = bookings.len(),
            "loaded snapshot"
        );

        self.embeds.write().insert(
            embed_id,
            EmbedRecord {
                name: snapshot.name,
                settings,
                rules,
                booking_types,
                bookings,
            },
        );
        Ok(())
    }

    /// Export everything stored for one embed.
    pub fn snapshot(&self, embed_id: Uuid) -> StoreResult<Snapshot> {
        let embeds = self.embeds.read();
        let record = embeds.get(&embed_id).ok_or_else(|| embed_not_found(embed_id))?;
        let settings = serde_json::to_value(&record.settings)
            .map_err(|e| StoreError::InvalidRecord(format!("embed {} settings: {}", embed_id, e)))?;
        Ok(Snapshot {
            embed_id,
            name: record.name.clone(),
            settings,
            rules: record.rules.clone(),
            booking_types: record.booking_types.clone(),
            bookings: record.bookings.clone(),
        })
    }

    fn read<T>(&self, embed_id: Uuid, f: impl FnOnce(&EmbedRecord) -> T) -> StoreResult<T> {
        let embeds = self.embeds.read();
        embeds.get(&embed_id).map(f).ok_or_else(|| embed_not_found(embed_id))
    }

    fn write<T>(
        &self,
        embed_id: Uuid,
        f: impl FnOnce(&mut EmbedRecord) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut embeds = self.embeds.write();
        let record = embeds.get_mut(&embed_id).ok_or_else(|| embed_not_found(embed_id))?;
        f(record)
    }
}

impl AvailabilityStore for MemoryStore {
    fn list_availability_rules(&self, embed_id: Uuid) -> StoreResult<Vec<AvailabilityRule>> {
        self.read(embed_id, |record| record.rules.clone())
    }

    fn list_bookings(&self, embed_id: Uuid, range: DateRange) -> StoreResult<Vec<Booking>> {
        self.read(embed_id, |record| {
            record
                .bookings
                .iter()
                .filter(|b| range.contains(b.date))
                .cloned()
                .collect()
        })
    }
}

impl BookingStore for MemoryStore {
    fn embed_settings(&self, embed_id: Uuid) -> StoreResult<EmbedSettings> {
        self.read(embed_id, |record| record.settings.clone())
    }

    fn list_booking_types(&self, embed_id: Uuid) -> StoreResult<Vec<BookingType>> {
        self.read(embed_id, |record| record.booking_types.clone())
    }

    fn get_booking(&self, embed_id: Uuid, booking_id: Uuid) -> StoreResult<Booking> {
        self.read(embed_id, |record| {
            record.bookings.iter().find(|b| b.id == booking_id).cloned()
        })?
        .ok_or(StoreError::NotFound {
            entity: "booking",
            id: booking_id,
        })
    }

    fn insert_booking(&self, booking: Booking) -> StoreResult<Booking> {
        if !booking.ends_after_start() {
            return Err(StoreError::InvalidRecord(format!(
                "booking {} ends before it starts",
                booking.id
            )));
        }
        self.write(booking.embed_id, |record| {
            if booking.holds_slot()
                && record
                    .bookings
                    .iter()
                    .any(|existing| existing.occupies(booking.date, booking.start_time))
            {
                return Err(StoreError::Duplicate(format!(
                    "{} at {} is already held",
                    booking.date,
                    booking.start_time.format("%H:%M:%S")
                )));
            }
            if record.bookings.iter().any(|existing| existing.id == booking.id) {
                return Err(StoreError::Duplicate(format!(
                    "booking id {} already exists",
                    booking.id
                )));
            }
            debug!(booking_id = %booking.id, date = %booking.date, "inserted booking");
            record.bookings.push(booking.clone());
            Ok(booking)
        })
    }

    fn update_booking_status(
        &self,
        embed_id: Uuid,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> StoreResult<Booking> {
        self.write(embed_id, |record| {
            let index = record
                .bookings
                .iter()
                .position(|b| b.id == booking_id)
                .ok_or(StoreError::NotFound {
                    entity: "booking",
                    id: booking_id,
                })?;
            let current = &record.bookings[index];
            if current.status != from {
                return Err(StoreError::StatusChanged {
                    id: booking_id,
                    expected: from,
                    actual: current.status,
                });
            }
            let taken = record.bookings.iter().any(|other| {
                other.id != booking_id && other.occupies(current.date, current.start_time)
            });
            if to.holds_slot() && !current.holds_slot() && taken {
                return Err(StoreError::Duplicate(format!(
                    "{} at {} is already held",
                    current.date,
                    current.start_time.format("%H:%M:%S")
                )));
            }
            let booking = &mut record.bookings[index];
            booking.status = to;
            Ok(booking.clone())
        })
    }

    fn upsert_availability_rule(&self, rule: AvailabilityRule) -> StoreResult<AvailabilityRule> {
        rule.validate()
            .map_err(|e| StoreError::InvalidRecord(format!("rule {}: {}", rule.id, e)))?;
        self.write(rule.embed_id, |record| {
            match record.rules.iter_mut().find(|r| r.id == rule.id) {
                Some(existing) => *existing = rule.clone(),
                None => record.rules.push(rule.clone()),
            }
            Ok(rule)
        })
    }

    fn delete_availability_rule(&self, embed_id: Uuid, rule_id: Uuid) -> StoreResult<()> {
        self.write(embed_id, |record| {
            let before = record.rules.len();
            record.rules.retain(|r| r.id != rule_id);
            if record.rules.len() == before {
                return Err(StoreError::NotFound {
                    entity: "availability rule",
                    id: rule_id,
                });
            }
            Ok(())
        })
    }
}
