//! # Availability Query
//!
//! Read-only views over the store. Every call goes to the store, so a
//! caller that just lost a claim sees the slot as taken on its next query.

use uuid::Uuid;

use crate::errors::{BookingError, BookingResult};
use crate::models::{Caller, DateWindow, Slot, Visit};
use crate::store::{ReservationStore, SlotQuery};

/// Free slots of a provider, optionally limited to a date window, ordered by
/// (date, start time).
pub async fn list_available<S: ReservationStore + ?Sized>(
    store: &S,
    provider_id: Uuid,
    window: Option<DateWindow>,
) -> BookingResult<Vec<Slot>> {
    let query = SlotQuery::available(provider_id, window.unwrap_or_default());
    Ok(store.list_slots(query).await?)
}

/// Confirmed bookings whose slot falls within the window, for the reminder
/// sweep. Admin only.
pub async fn upcoming_visits<S: ReservationStore + ?Sized>(
    store: &S,
    caller: &Caller,
    window: DateWindow,
) -> BookingResult<Vec<Visit>> {
    if !caller.is_admin() {
        return Err(BookingError::Forbidden(
            "Only administrators can read the reminder schedule".to_string(),
        ));
    }
    Ok(store.confirmed_visits(window).await?)
}
