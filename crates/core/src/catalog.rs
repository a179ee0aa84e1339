//! # Slot Catalog
//!
//! Creation, listing, rescheduling and deletion of the bookable slots a
//! provider publishes. The catalog never changes whether a slot is
//! available; that belongs to [`crate::ledger`].

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{BookingError, BookingResult};
use crate::models::slot::{CreateGridRequest, CreateSlotRequest, RescheduleSlotRequest};
use crate::models::{Caller, ClockTime, NewSlot, Slot, SlotTimes};
use crate::store::{ReservationStore, SlotQuery, SlotWrite};

pub const MIN_DURATION_MINUTES: u16 = 15;
pub const MAX_DURATION_MINUTES: u16 = 240;

pub const DEFAULT_GRID_START: ClockTime = ClockTime::at(9, 0);
pub const DEFAULT_GRID_END: ClockTime = ClockTime::at(17, 0);
pub const DEFAULT_GRID_DURATION_MINUTES: u16 = 60;

pub fn validate_duration(duration_minutes: u16) -> BookingResult<()> {
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
        return Err(BookingError::Validation(format!(
            "Duration must be between {} and {} minutes, got {}",
            MIN_DURATION_MINUTES, MAX_DURATION_MINUTES, duration_minutes
        )));
    }
    Ok(())
}

/// Returns the length of `[start, end)` in minutes.
pub fn validate_interval(start: ClockTime, end: ClockTime) -> BookingResult<u16> {
    start.minutes_until(end).ok_or_else(|| {
        BookingError::Validation(format!(
            "End time {} must be after start time {}",
            end, start
        ))
    })
}

/// Splits `[range_start, range_end)` into back-to-back intervals of
/// `duration_minutes`. A trailing remainder shorter than one interval is
/// dropped.
pub fn hourly_grid(
    range_start: ClockTime,
    range_end: ClockTime,
    duration_minutes: u16,
) -> BookingResult<Vec<(ClockTime, ClockTime)>> {
    validate_interval(range_start, range_end)?;
    validate_duration(duration_minutes)?;

    let mut intervals = Vec::new();
    let mut cursor = range_start;
    while let Some(next) = cursor.checked_add_minutes(duration_minutes) {
        if next > range_end {
            break;
        }
        intervals.push((cursor, next));
        cursor = next;
    }
    Ok(intervals)
}

fn ensure_slot_owner(caller: &Caller, provider_id: Uuid) -> BookingResult<()> {
    if caller.id == provider_id || caller.is_admin() {
        return Ok(());
    }
    warn!(caller = %caller.id, provider = %provider_id, "caller does not manage this provider's slots");
    Err(BookingError::Forbidden(
        "Only the owning provider or an admin can manage these slots".to_string(),
    ))
}

fn slot_times(
    date: NaiveDate,
    start_time: ClockTime,
    end_time: ClockTime,
    duration_minutes: Option<u16>,
) -> BookingResult<SlotTimes> {
    let length = validate_interval(start_time, end_time)?;
    let duration_minutes = duration_minutes.unwrap_or(length);
    validate_duration(duration_minutes)?;

    Ok(SlotTimes {
        date,
        start_time,
        end_time,
        duration_minutes,
    })
}

pub async fn create_slot<S: ReservationStore + ?Sized>(
    store: &S,
    caller: &Caller,
    provider_id: Uuid,
    request: CreateSlotRequest,
) -> BookingResult<Slot> {
    ensure_slot_owner(caller, provider_id)?;
    let times = slot_times(
        request.date,
        request.start_time,
        request.end_time,
        request.duration_minutes,
    )?;

    let new_slot = NewSlot {
        id: Uuid::new_v4(),
        provider_id,
        date: times.date,
        start_time: times.start_time,
        end_time: times.end_time,
        duration_minutes: times.duration_minutes,
    };

    let slot = store
        .insert_slots(vec![new_slot])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| BookingError::Database(eyre::eyre!("Store returned no slot after insert")))?;

    info!(slot = %slot.id, provider = %provider_id, date = %slot.date, start = %slot.start_time, "slot created");
    Ok(slot)
}

pub async fn create_hourly_grid<S: ReservationStore + ?Sized>(
    store: &S,
    caller: &Caller,
    provider_id: Uuid,
    request: CreateGridRequest,
) -> BookingResult<Vec<Slot>> {
    ensure_slot_owner(caller, provider_id)?;

    let range_start = request.range_start.unwrap_or(DEFAULT_GRID_START);
    let range_end = request.range_end.unwrap_or(DEFAULT_GRID_END);
    let duration_minutes = request
        .duration_minutes
        .unwrap_or(DEFAULT_GRID_DURATION_MINUTES);

    let new_slots: Vec<NewSlot> = hourly_grid(range_start, range_end, duration_minutes)?
        .into_iter()
        .map(|(start_time, end_time)| NewSlot {
            id: Uuid::new_v4(),
            provider_id,
            date: request.date,
            start_time,
            end_time,
            duration_minutes,
        })
        .collect();

    if new_slots.is_empty() {
        debug!(provider = %provider_id, %range_start, %range_end, duration_minutes, "range too short for a single slot");
        return Ok(Vec::new());
    }

    let slots = store.insert_slots(new_slots).await?;
    info!(provider = %provider_id, date = %request.date, count = slots.len(), "slot grid created");
    Ok(slots)
}

pub async fn get_slot<S: ReservationStore + ?Sized>(store: &S, slot_id: Uuid) -> BookingResult<Slot> {
    store
        .get_slot(slot_id)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("Slot with ID {} not found", slot_id)))
}

pub async fn list_slots<S: ReservationStore + ?Sized>(
    store: &S,
    provider_id: Uuid,
) -> BookingResult<Vec<Slot>> {
    Ok(store.list_slots(SlotQuery::all(provider_id)).await?)
}

pub async fn reschedule_slot<S: ReservationStore + ?Sized>(
    store: &S,
    caller: &Caller,
    slot_id: Uuid,
    request: RescheduleSlotRequest,
) -> BookingResult<Slot> {
    let current = get_slot(store, slot_id).await?;
    ensure_slot_owner(caller, current.provider_id)?;

    let times = slot_times(
        request.date.unwrap_or(current.date),
        request.start_time.unwrap_or(current.start_time),
        request.end_time.unwrap_or(current.end_time),
        Some(request.duration_minutes.unwrap_or(current.duration_minutes)),
    )?;

    match store.reschedule_slot(slot_id, times).await? {
        SlotWrite::Done(slot) => {
            info!(slot = %slot_id, date = %slot.date, start = %slot.start_time, "slot rescheduled");
            Ok(slot)
        }
        SlotWrite::Bound => Err(BookingError::Conflict(
            "Cannot reschedule a slot that has an appointment".to_string(),
        )),
        SlotWrite::Missing => Err(BookingError::NotFound(format!(
            "Slot with ID {} not found",
            slot_id
        ))),
    }
}

pub async fn delete_slot<S: ReservationStore + ?Sized>(
    store: &S,
    caller: &Caller,
    slot_id: Uuid,
) -> BookingResult<()> {
    let slot = get_slot(store, slot_id).await?;
    if !slot.is_available {
        return Err(BookingError::Conflict(
            "Cannot delete a slot that has an appointment".to_string(),
        ));
    }
    ensure_slot_owner(caller, slot.provider_id)?;

    match store.delete_slot(slot_id).await? {
        SlotWrite::Done(()) => {
            info!(slot = %slot_id, provider = %slot.provider_id, "slot deleted");
            Ok(())
        }
        SlotWrite::Bound => {
            warn!(slot = %slot_id, "slot was claimed before it could be deleted");
            Err(BookingError::Conflict(
                "Cannot delete a slot that has an appointment".to_string(),
            ))
        }
        SlotWrite::Missing => Err(BookingError::NotFound(format!(
            "Slot with ID {} not found",
            slot_id
        ))),
    }
}
