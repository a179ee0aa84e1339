//! # Reservation Ledger
//!
//! Owns the link between a slot and the booking that holds it. A slot is
//! claimed and released only through [`ReservationStore::claim_slot`] and
//! [`ReservationStore::release_booking`], each a single atomic step, so two
//! concurrent claims on one slot can never both succeed.
//!
//! Cancellation is handled here too: cancelling a booking, whether through
//! [`release_slot`] or [`transition_status`], reopens its slot in the same
//! step, and repeating a cancellation is a no-op.

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{BookingError, BookingResult};
use crate::models::{Booking, BookingFilter, BookingStatus, Caller, ClaimReceipt, Role};
use crate::store::{BookingWrite, ClaimOutcome, ReservationStore};

fn booking_not_found(booking_id: Uuid) -> BookingError {
    BookingError::NotFound(format!("Booking with ID {} not found", booking_id))
}

/// The patient, the provider and admins may act on a booking.
fn ensure_party(caller: &Caller, booking: &Booking) -> BookingResult<()> {
    if caller.id == booking.requester_id || caller.id == booking.provider_id || caller.is_admin() {
        return Ok(());
    }
    warn!(caller = %caller.id, booking = %booking.id, "caller is not a party to this booking");
    Err(BookingError::Forbidden(
        "You are not authorized to update this appointment".to_string(),
    ))
}

async fn load_booking<S: ReservationStore + ?Sized>(
    store: &S,
    booking_id: Uuid,
) -> BookingResult<Booking> {
    store
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| booking_not_found(booking_id))
}

/// Binds a new `confirmed` booking for `requester_id` to the slot.
///
/// Re-claiming a slot the requester already holds returns the existing
/// booking with `already_booked` set. Any other claim on a bound slot is a
/// [`BookingError::Conflict`].
pub async fn claim_slot<S: ReservationStore + ?Sized>(
    store: &S,
    slot_id: Uuid,
    requester_id: Uuid,
) -> BookingResult<ClaimReceipt> {
    match store.claim_slot(slot_id, requester_id, Utc::now()).await? {
        ClaimOutcome::Claimed(booking) => {
            info!(slot = %slot_id, booking = %booking.id, requester = %requester_id, "slot claimed");
            Ok(ClaimReceipt {
                booking,
                already_booked: false,
            })
        }
        ClaimOutcome::AlreadyHeld(booking) => {
            debug!(slot = %slot_id, booking = %booking.id, "requester already holds this slot");
            Ok(ClaimReceipt {
                booking,
                already_booked: true,
            })
        }
        ClaimOutcome::Taken => {
            warn!(slot = %slot_id, requester = %requester_id, "claim lost, slot already taken");
            Err(BookingError::Conflict(
                "This appointment slot is no longer available".to_string(),
            ))
        }
        ClaimOutcome::Missing => Err(BookingError::NotFound(format!(
            "Slot with ID {} not found",
            slot_id
        ))),
    }
}

async fn release_authorized<S: ReservationStore + ?Sized>(
    store: &S,
    booking_id: Uuid,
) -> BookingResult<Booking> {
    match store.release_booking(booking_id, Utc::now()).await? {
        BookingWrite::Applied(booking) => {
            info!(booking = %booking_id, slot = %booking.slot_id, "booking cancelled, slot released");
            Ok(booking)
        }
        BookingWrite::Unchanged(booking) if booking.status == BookingStatus::Cancelled => {
            debug!(booking = %booking_id, "booking already cancelled");
            Ok(booking)
        }
        BookingWrite::Unchanged(booking) => Err(BookingError::Conflict(format!(
            "Booking {} is {} and can no longer be cancelled",
            booking_id, booking.status
        ))),
        BookingWrite::Missing => Err(booking_not_found(booking_id)),
    }
}

/// Cancels a booking and reopens its slot.
pub async fn release_slot<S: ReservationStore + ?Sized>(
    store: &S,
    caller: &Caller,
    booking_id: Uuid,
) -> BookingResult<Booking> {
    let booking = load_booking(store, booking_id).await?;
    ensure_party(caller, &booking)?;
    release_authorized(store, booking_id).await
}

/// Moves a booking to `new_status`. Only `cancelled` touches the slot.
pub async fn transition_status<S: ReservationStore + ?Sized>(
    store: &S,
    caller: &Caller,
    booking_id: Uuid,
    new_status: &str,
) -> BookingResult<Booking> {
    let status = BookingStatus::parse(new_status)?;
    let booking = load_booking(store, booking_id).await?;
    ensure_party(caller, &booking)?;

    if status == BookingStatus::Cancelled {
        return release_authorized(store, booking_id).await;
    }
    if booking.status == status {
        return Ok(booking);
    }
    if booking.status.is_terminal() {
        return Err(BookingError::Conflict(format!(
            "Booking {} is already {}",
            booking_id, booking.status
        )));
    }

    match store
        .update_booking_status(booking_id, status, Utc::now())
        .await?
    {
        BookingWrite::Applied(booking) => {
            info!(booking = %booking_id, status = %status, "booking status updated");
            Ok(booking)
        }
        BookingWrite::Unchanged(booking) if booking.status == status => Ok(booking),
        BookingWrite::Unchanged(booking) => Err(BookingError::Conflict(format!(
            "Booking {} is already {}",
            booking_id, booking.status
        ))),
        BookingWrite::Missing => Err(booking_not_found(booking_id)),
    }
}

pub async fn get_booking<S: ReservationStore + ?Sized>(
    store: &S,
    caller: &Caller,
    booking_id: Uuid,
) -> BookingResult<Booking> {
    let booking = load_booking(store, booking_id).await?;
    ensure_party(caller, &booking)?;
    Ok(booking)
}

/// Patients see their own bookings, providers the bookings on their slots,
/// admins everything.
pub async fn list_bookings<S: ReservationStore + ?Sized>(
    store: &S,
    caller: &Caller,
) -> BookingResult<Vec<Booking>> {
    let filter = match caller.role {
        Role::Patient => BookingFilter::Requester(caller.id),
        Role::Provider => BookingFilter::Provider(caller.id),
        Role::Admin => BookingFilter::All,
    };
    Ok(store.list_bookings(filter).await?)
}

/// Removes a booking outright. Admin only; patients and providers cancel instead.
pub async fn delete_booking<S: ReservationStore + ?Sized>(
    store: &S,
    caller: &Caller,
    booking_id: Uuid,
) -> BookingResult<Booking> {
    if !caller.is_admin() {
        return Err(BookingError::Forbidden(
            "Only administrators can delete appointments".to_string(),
        ));
    }

    let booking = store
        .delete_booking(booking_id)
        .await?
        .ok_or_else(|| booking_not_found(booking_id))?;
    info!(booking = %booking_id, slot = %booking.slot_id, "booking deleted");
    Ok(booking)
}
