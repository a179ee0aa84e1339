//! # Reservation Store
//!
//! The persistence seam of the reservation core. Every method is a single
//! atomic step against the backing store: the operations in [`crate::catalog`],
//! [`crate::ledger`] and [`crate::availability`] never compose a read and a
//! write into a state change themselves. Conditional writes report what they
//! found instead of failing, and the caller maps that outcome onto
//! [`crate::errors::BookingError`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::Result;
use uuid::Uuid;

use crate::models::{
    Booking, BookingFilter, BookingStatus, DateWindow, NewSlot, Slot, SlotTimes, Visit,
};

/// Outcome of a write that only applies to an unbound slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotWrite<T> {
    Done(T),
    /// The slot exists but is bound to a booking; nothing was written.
    Bound,
    Missing,
}

/// Outcome of the conditional claim on a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The slot was free and is now bound to this fresh booking.
    Claimed(Booking),
    /// The slot is already bound to an active booking of the same requester.
    AlreadyHeld(Booking),
    /// The slot is bound to someone else (or was between states).
    Taken,
    Missing,
}

/// Outcome of a conditional status write on a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingWrite {
    Applied(Booking),
    /// The booking was already in a terminal status and was left as found.
    Unchanged(Booking),
    Missing,
}

/// Slot selection for listings. Results are always ordered by (date, start time).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotQuery {
    pub provider_id: Uuid,
    pub window: DateWindow,
    pub only_available: bool,
}

impl SlotQuery {
    pub fn all(provider_id: Uuid) -> Self {
        Self {
            provider_id,
            window: DateWindow::default(),
            only_available: false,
        }
    }

    pub fn available(provider_id: Uuid, window: DateWindow) -> Self {
        Self {
            provider_id,
            window,
            only_available: true,
        }
    }
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Inserts all slots or none of them.
    async fn insert_slots(&self, slots: Vec<NewSlot>) -> Result<Vec<Slot>>;

    async fn get_slot(&self, id: Uuid) -> Result<Option<Slot>>;

    async fn list_slots(&self, query: SlotQuery) -> Result<Vec<Slot>>;

    /// Replaces the times of a slot, only while it is available.
    async fn reschedule_slot(&self, id: Uuid, times: SlotTimes) -> Result<SlotWrite<Slot>>;

    /// Deletes a slot, only while it is available.
    async fn delete_slot(&self, id: Uuid) -> Result<SlotWrite<()>>;

    /// Binds a new `confirmed` booking to the slot if and only if the slot is
    /// available, as one indivisible step.
    async fn claim_slot(
        &self,
        slot_id: Uuid,
        requester_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<ClaimOutcome>;

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>>;

    /// Bookings matching the filter, newest first.
    async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<Booking>>;

    /// Sets a non-cancelled status on a booking that is not terminal.
    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<BookingWrite>;

    /// Cancels a non-terminal booking and reopens its slot in the same step.
    async fn release_booking(&self, id: Uuid, at: DateTime<Utc>) -> Result<BookingWrite>;

    /// Removes a booking, reopening its slot if the booking held it.
    async fn delete_booking(&self, id: Uuid) -> Result<Option<Booking>>;

    /// Confirmed bookings whose slot date falls in the window, ordered by slot time.
    async fn confirmed_visits(&self, window: DateWindow) -> Result<Vec<Visit>>;
}
