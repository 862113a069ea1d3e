//! `slots` CLI — resolve and book an embed's availability from a JSON snapshot.
//!
//! ## Usage
//!
//! ```sh
//! # Open slots for one day
//! slots --snapshot embed.json day 2026-03-02
//!
//! # Month overview, with "now" pinned for reproducible output
//! slots --snapshot embed.json --now 2026-03-01T08:00:00 month 2026-03
//!
//! # Check a single slot
//! slots --snapshot embed.json check 2026-03-02 09:30
//!
//! # Book a slot and write the updated snapshot back
//! slots --snapshot embed.json book 2026-03-02 09:30 --name "Ada" --email ada@example.com --write
//!
//! # Confirm, complete, cancel ... a booking
//! slots --snapshot embed.json status <BOOKING_ID> confirmed --write
//!
//! # Validate settings and rules
//! slots --snapshot embed.json validate
//! ```
//!
//! Logging goes to stderr and is controlled by `SLOTS_LOG` (e.g. `SLOTS_LOG=slot_engine=debug`).

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use slot_engine::settings::parse_timezone;
use slot_engine::store::{AvailabilityStore, BookingStore};
use slot_engine::wall_clock;
use slot_engine::{
    AvailabilityService, BookingRequest, BookingStatus, Clock, Customer, FixedClock, MemoryStore,
    Snapshot, SystemClock,
};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "slots", version, about = "Resolve and book embed availability")]
struct Cli {
    /// JSON snapshot of one embed: settings, rules, booking types and bookings
    #[arg(short, long, env = "SLOTS_SNAPSHOT")]
    snapshot: String,

    /// IANA timezone used for "now" (defaults to the embed's configured timezone)
    #[arg(long, env = "SLOTS_TIMEZONE")]
    timezone: Option<String>,

    /// Pin "now" to a local timestamp, e.g. 2026-03-01T08:00:00
    #[arg(long, env = "SLOTS_NOW")]
    now: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the slots for one date (YYYY-MM-DD)
    Day { date: String },
    /// Per-day availability for a month (YYYY-MM)
    Month { month: String },
    /// Check whether one slot can be booked
    Check { date: String, time: String },
    /// Book a slot as a customer
    Book {
        date: String,
        time: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        /// Booking type id (defaults to a single 30-minute slot)
        #[arg(long)]
        booking_type: Option<Uuid>,
        #[arg(long)]
        notes: Option<String>,
        /// Custom form answer as key=value; the value is read as JSON when it parses
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, serde_json::Value)>,
        /// Write the updated snapshot back to the snapshot file
        #[arg(long)]
        write: bool,
    },
    /// Move a booking to a new status (confirmed, cancelled, completed, no_show)
    Status {
        booking_id: Uuid,
        status: BookingStatus,
        /// Write the updated snapshot back to the snapshot file
        #[arg(long)]
        write: bool,
    },
    /// Validate the snapshot and print a summary
    Validate,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let raw = std::fs::read_to_string(&cli.snapshot)
        .with_context(|| format!("Failed to read snapshot: {}", cli.snapshot))?;
    let snapshot: Snapshot = serde_json::from_str(&raw).context("Failed to parse snapshot JSON")?;
    let embed_id = snapshot.embed_id;
    let store =
        Arc::new(MemoryStore::from_snapshot(snapshot).context("Snapshot failed validation")?);

    let clock = build_clock(cli.now.as_deref(), cli.timezone.as_deref(), &store, embed_id)?;
    debug!(%embed_id, now = %clock.now(), "resolving");
    let service = AvailabilityService::new(Arc::clone(&store), clock);

    match cli.command {
        Commands::Day { date } => {
            let slots = service
                .get_available_time_slots(embed_id, &date)
                .context("Failed to resolve slots")?;
            print_json(&slots)?;
        }
        Commands::Month { month } => {
            let days = service
                .get_availability_for_month(embed_id, &month)
                .context("Failed to resolve month")?;
            print_json(&days)?;
        }
        Commands::Check { date, time } => {
            let check = service
                .check_slot_availability(embed_id, &date, &time)
                .context("Failed to check slot")?;
            print_json(&check)?;
        }
        Commands::Book {
            date,
            time,
            name,
            email,
            phone,
            booking_type,
            notes,
            fields,
            write,
        } => {
            let request = BookingRequest {
                date: wall_clock::parse_date(&date)?,
                start_time: wall_clock::parse_time(&time)?,
                booking_type_id: booking_type,
                customer: Customer { name, email, phone },
                notes,
                custom_fields: fields.into_iter().collect::<BTreeMap<_, _>>(),
                user_id: None,
            };
            let booking = service.book_slot(embed_id, request).context("Booking failed")?;
            if write {
                write_snapshot(&cli.snapshot, &store, embed_id)?;
            }
            print_json(&booking)?;
        }
        Commands::Status {
            booking_id,
            status,
            write,
        } => {
            let booking = service
                .update_booking_status(embed_id, booking_id, status)
                .context("Status change failed")?;
            if write {
                write_snapshot(&cli.snapshot, &store, embed_id)?;
            }
            print_json(&booking)?;
        }
        Commands::Validate => {
            let settings = store.embed_settings(embed_id)?;
            let rules = store.list_availability_rules(embed_id)?;
            let booking_types = store.list_booking_types(embed_id)?;
            let exported = store.snapshot(embed_id)?;
            println!("embed:         {}", embed_id);
            println!("industry:      {}", settings.industry.name());
            println!("timezone:      {}", settings.timezone);
            println!("rules:         {}", rules.len());
            println!("booking types: {}", booking_types.len());
            println!("bookings:      {}", exported.bookings.len());
            println!("custom fields: {}", settings.custom_fields.len());
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SLOTS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Pick the clock: a pinned `--now` wins, then `--timezone`, then the embed's settings.
fn build_clock(
    now: Option<&str>,
    timezone: Option<&str>,
    store: &MemoryStore,
    embed_id: Uuid,
) -> Result<Box<dyn Clock>> {
    if let Some(now) = now {
        let at = wall_clock::parse_datetime(now).context("Invalid --now")?;
        return Ok(Box::new(FixedClock(at)));
    }
    let tz = match timezone {
        Some(name) => parse_timezone(name)?,
        None => store.embed_settings(embed_id)?.tz()?,
    };
    Ok(Box::new(SystemClock::new(tz)))
}

/// Parse a `key=value` custom field answer.
fn parse_field(raw: &str) -> std::result::Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.trim().to_string(), value))
}

fn write_snapshot(path: &str, store: &MemoryStore, embed_id: Uuid) -> Result<()> {
    let snapshot = store.snapshot(embed_id)?;
    let json = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write snapshot: {}", path))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
