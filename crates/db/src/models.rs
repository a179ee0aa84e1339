use chrono::{DateTime, NaiveDate, Utc};
use clinicslot_core::models::{Booking, BookingStatus, ClockTime, Slot, Visit};
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSlot {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub slot_date: NaiveDate,
    pub start_minute: i32,
    pub end_minute: i32,
    pub duration_minutes: i32,
    pub is_available: bool,
    pub bound_booking_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBooking {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub provider_id: Uuid,
    pub slot_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking joined with its slot; slot columns carry an `s_` prefix.
#[derive(Debug, Clone, FromRow)]
pub struct DbVisit {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub provider_id: Uuid,
    pub slot_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub s_slot_date: NaiveDate,
    pub s_start_minute: i32,
    pub s_end_minute: i32,
    pub s_duration_minutes: i32,
    pub s_is_available: bool,
    pub s_bound_booking_id: Option<Uuid>,
    pub s_created_at: DateTime<Utc>,
}

fn clock_time(minute: i32) -> Result<ClockTime> {
    u16::try_from(minute)
        .ok()
        .and_then(ClockTime::from_minutes)
        .ok_or_else(|| eyre!("Stored minute-of-day {} is out of range", minute))
}

fn duration(minutes: i32) -> Result<u16> {
    u16::try_from(minutes).map_err(|_| eyre!("Stored slot duration {} is out of range", minutes))
}

fn booking_status(status: &str) -> Result<BookingStatus> {
    BookingStatus::parse(status).map_err(|e| eyre!("Stored booking status is invalid: {}", e))
}

impl TryFrom<DbSlot> for Slot {
    type Error = eyre::Report;

    fn try_from(row: DbSlot) -> Result<Self> {
        Ok(Slot {
            id: row.id,
            provider_id: row.provider_id,
            date: row.slot_date,
            start_time: clock_time(row.start_minute)?,
            end_time: clock_time(row.end_minute)?,
            duration_minutes: duration(row.duration_minutes)?,
            is_available: row.is_available,
            bound_booking_id: row.bound_booking_id,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<DbBooking> for Booking {
    type Error = eyre::Report;

    fn try_from(row: DbBooking) -> Result<Self> {
        Ok(Booking {
            id: row.id,
            requester_id: row.requester_id,
            provider_id: row.provider_id,
            slot_id: row.slot_id,
            status: booking_status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<DbVisit> for Visit {
    type Error = eyre::Report;

    fn try_from(row: DbVisit) -> Result<Self> {
        let slot = Slot {
            id: row.slot_id,
            provider_id: row.provider_id,
            date: row.s_slot_date,
            start_time: clock_time(row.s_start_minute)?,
            end_time: clock_time(row.s_end_minute)?,
            duration_minutes: duration(row.s_duration_minutes)?,
            is_available: row.s_is_available,
            bound_booking_id: row.s_bound_booking_id,
            created_at: row.s_created_at,
        };
        let booking = Booking {
            id: row.id,
            requester_id: row.requester_id,
            provider_id: row.provider_id,
            slot_id: row.slot_id,
            status: booking_status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        Ok(Visit { booking, slot })
    }
}

pub(crate) fn into_slots(rows: Vec<DbSlot>) -> Result<Vec<Slot>> {
    rows.into_iter().map(Slot::try_from).collect()
}

pub(crate) fn into_bookings(rows: Vec<DbBooking>) -> Result<Vec<Booking>> {
    rows.into_iter().map(Booking::try_from).collect()
}
