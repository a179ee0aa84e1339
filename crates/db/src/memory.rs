//! In-process [`ReservationStore`] for tests and local demos.
//!
//! All state sits behind one mutex and every trait method runs start to end
//! under it without awaiting, which gives each operation the same atomicity
//! the PostgreSQL store gets from its conditional updates and transactions.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clinicslot_core::models::{
    Booking, BookingFilter, BookingStatus, DateWindow, NewSlot, Slot, SlotTimes, Visit,
};
use clinicslot_core::store::{BookingWrite, ClaimOutcome, ReservationStore, SlotQuery, SlotWrite};
use eyre::{eyre, Result};
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryState {
    slots: HashMap<Uuid, Slot>,
    bookings: HashMap<Uuid, Booking>,
}

impl MemoryState {
    fn reopen_slot(&mut self, slot_id: Uuid, booking_id: Uuid) {
        if let Some(slot) = self.slots.get_mut(&slot_id) {
            if slot.bound_booking_id == Some(booking_id) {
                slot.is_available = true;
                slot.bound_booking_id = None;
            }
        }
    }

    fn release(&mut self, id: Uuid, at: DateTime<Utc>) -> BookingWrite {
        let Some(booking) = self.bookings.get_mut(&id) else {
            return BookingWrite::Missing;
        };
        if booking.status.is_terminal() {
            return BookingWrite::Unchanged(booking.clone());
        }

        booking.status = BookingStatus::Cancelled;
        booking.updated_at = at;
        let released = booking.clone();
        self.reopen_slot(released.slot_id, released.id);
        BookingWrite::Applied(released)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| eyre!("Memory store lock poisoned"))
    }
}

fn sort_by_slot_time(slots: &mut [Slot]) {
    slots.sort_by(|a, b| (a.date, a.start_time, a.id).cmp(&(b.date, b.start_time, b.id)));
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn insert_slots(&self, slots: Vec<NewSlot>) -> Result<Vec<Slot>> {
        let mut state = self.lock()?;
        if let Some(duplicate) = slots.iter().find(|slot| state.slots.contains_key(&slot.id)) {
            return Err(eyre!("Slot {} already exists", duplicate.id));
        }

        let now = Utc::now();
        let inserted: Vec<Slot> = slots
            .into_iter()
            .map(|new_slot| Slot {
                id: new_slot.id,
                provider_id: new_slot.provider_id,
                date: new_slot.date,
                start_time: new_slot.start_time,
                end_time: new_slot.end_time,
                duration_minutes: new_slot.duration_minutes,
                is_available: true,
                bound_booking_id: None,
                created_at: now,
            })
            .collect();

        for slot in &inserted {
            state.slots.insert(slot.id, slot.clone());
        }
        Ok(inserted)
    }

    async fn get_slot(&self, id: Uuid) -> Result<Option<Slot>> {
        Ok(self.lock()?.slots.get(&id).cloned())
    }

    async fn list_slots(&self, query: SlotQuery) -> Result<Vec<Slot>> {
        let state = self.lock()?;
        let mut slots: Vec<Slot> = state
            .slots
            .values()
            .filter(|slot| slot.provider_id == query.provider_id)
            .filter(|slot| query.window.contains(slot.date))
            .filter(|slot| !query.only_available || slot.is_available)
            .cloned()
            .collect();
        sort_by_slot_time(&mut slots);
        Ok(slots)
    }

    async fn reschedule_slot(&self, id: Uuid, times: SlotTimes) -> Result<SlotWrite<Slot>> {
        let mut state = self.lock()?;
        let Some(slot) = state.slots.get_mut(&id) else {
            return Ok(SlotWrite::Missing);
        };
        if !slot.is_available {
            return Ok(SlotWrite::Bound);
        }

        slot.date = times.date;
        slot.start_time = times.start_time;
        slot.end_time = times.end_time;
        slot.duration_minutes = times.duration_minutes;
        Ok(SlotWrite::Done(slot.clone()))
    }

    async fn delete_slot(&self, id: Uuid) -> Result<SlotWrite<()>> {
        let mut state = self.lock()?;
        match state.slots.get(&id) {
            None => return Ok(SlotWrite::Missing),
            Some(slot) if !slot.is_available => return Ok(SlotWrite::Bound),
            Some(_) => {}
        }

        state.slots.remove(&id);
        // Cancelled bookings go with their slot.
        state.bookings.retain(|_, booking| booking.slot_id != id);
        Ok(SlotWrite::Done(()))
    }

    async fn claim_slot(
        &self,
        slot_id: Uuid,
        requester_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<ClaimOutcome> {
        let mut guard = self.lock()?;
        let MemoryState { slots, bookings } = &mut *guard;

        let Some(slot) = slots.get_mut(&slot_id) else {
            return Ok(ClaimOutcome::Missing);
        };

        if !slot.is_available {
            let holder = slot.bound_booking_id.and_then(|id| bookings.get(&id));
            return Ok(match holder {
                Some(booking) if booking.requester_id == requester_id && booking.is_active() => {
                    ClaimOutcome::AlreadyHeld(booking.clone())
                }
                _ => ClaimOutcome::Taken,
            });
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            requester_id,
            provider_id: slot.provider_id,
            slot_id,
            status: BookingStatus::Confirmed,
            created_at: at,
            updated_at: at,
        };
        slot.is_available = false;
        slot.bound_booking_id = Some(booking.id);
        bookings.insert(booking.id, booking.clone());
        Ok(ClaimOutcome::Claimed(booking))
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        Ok(self.lock()?.bookings.get(&id).cloned())
    }

    async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<Booking>> {
        let state = self.lock()?;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|booking| match filter {
                BookingFilter::Requester(id) => booking.requester_id == id,
                BookingFilter::Provider(id) => booking.provider_id == id,
                BookingFilter::All => true,
            })
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(bookings)
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<BookingWrite> {
        let mut state = self.lock()?;
        if status == BookingStatus::Cancelled {
            return Ok(state.release(id, at));
        }

        let Some(booking) = state.bookings.get_mut(&id) else {
            return Ok(BookingWrite::Missing);
        };
        if booking.status.is_terminal() {
            return Ok(BookingWrite::Unchanged(booking.clone()));
        }
        booking.status = status;
        booking.updated_at = at;
        Ok(BookingWrite::Applied(booking.clone()))
    }

    async fn release_booking(&self, id: Uuid, at: DateTime<Utc>) -> Result<BookingWrite> {
        Ok(self.lock()?.release(id, at))
    }

    async fn delete_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        let mut state = self.lock()?;
        let Some(booking) = state.bookings.remove(&id) else {
            return Ok(None);
        };
        state.reopen_slot(booking.slot_id, booking.id);
        Ok(Some(booking))
    }

    async fn confirmed_visits(&self, window: DateWindow) -> Result<Vec<Visit>> {
        let state = self.lock()?;
        let mut visits: Vec<Visit> = state
            .bookings
            .values()
            .filter(|booking| booking.status == BookingStatus::Confirmed)
            .filter_map(|booking| {
                let slot = state.slots.get(&booking.slot_id)?;
                window.contains(slot.date).then(|| Visit {
                    booking: booking.clone(),
                    slot: slot.clone(),
                })
            })
            .collect();
        visits.sort_by(|a, b| {
            (a.slot.date, a.slot.start_time, a.booking.id)
                .cmp(&(b.slot.date, b.slot.start_time, b.booking.id))
        });
        Ok(visits)
    }
}
