use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clinicslot_core::models::{
    Booking, BookingFilter, BookingStatus, DateWindow, NewSlot, Slot, SlotTimes, Visit,
};
use clinicslot_core::store::{BookingWrite, ClaimOutcome, ReservationStore, SlotQuery, SlotWrite};
use eyre::Result;
use uuid::Uuid;

use crate::models::{into_bookings, into_slots};
use crate::repositories::{self, DbClaim, RowWrite};
use crate::DbPool;

/// PostgreSQL-backed [`ReservationStore`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn booking_write(write: RowWrite<crate::models::DbBooking>) -> Result<BookingWrite> {
    Ok(match write {
        RowWrite::Applied(row) => BookingWrite::Applied(row.try_into()?),
        RowWrite::Unchanged(row) => BookingWrite::Unchanged(row.try_into()?),
        RowWrite::Missing => BookingWrite::Missing,
    })
}

#[async_trait]
impl ReservationStore for PgStore {
    async fn insert_slots(&self, slots: Vec<NewSlot>) -> Result<Vec<Slot>> {
        let rows = repositories::slot::insert_slots(&self.pool, &slots).await?;
        into_slots(rows)
    }

    async fn get_slot(&self, id: Uuid) -> Result<Option<Slot>> {
        repositories::slot::get_slot_by_id(&self.pool, id)
            .await?
            .map(Slot::try_from)
            .transpose()
    }

    async fn list_slots(&self, query: SlotQuery) -> Result<Vec<Slot>> {
        let rows = repositories::slot::list_slots(
            &self.pool,
            query.provider_id,
            query.window.from,
            query.window.to,
            query.only_available,
        )
        .await?;
        into_slots(rows)
    }

    async fn reschedule_slot(&self, id: Uuid, times: SlotTimes) -> Result<SlotWrite<Slot>> {
        if let Some(row) =
            repositories::slot::reschedule_available_slot(&self.pool, id, &times).await?
        {
            return Ok(SlotWrite::Done(row.try_into()?));
        }
        Ok(match repositories::slot::get_slot_by_id(&self.pool, id).await? {
            Some(_) => SlotWrite::Bound,
            None => SlotWrite::Missing,
        })
    }

    async fn delete_slot(&self, id: Uuid) -> Result<SlotWrite<()>> {
        if repositories::slot::delete_available_slot(&self.pool, id).await? {
            return Ok(SlotWrite::Done(()));
        }
        Ok(match repositories::slot::get_slot_by_id(&self.pool, id).await? {
            Some(_) => SlotWrite::Bound,
            None => SlotWrite::Missing,
        })
    }

    async fn claim_slot(
        &self,
        slot_id: Uuid,
        requester_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<ClaimOutcome> {
        Ok(
            match repositories::booking::claim_slot(&self.pool, slot_id, requester_id, at).await? {
                DbClaim::Claimed(row) => ClaimOutcome::Claimed(row.try_into()?),
                DbClaim::Bound(Some(row))
                    if row.requester_id == requester_id && row.status != "cancelled" =>
                {
                    ClaimOutcome::AlreadyHeld(row.try_into()?)
                }
                DbClaim::Bound(_) => ClaimOutcome::Taken,
                DbClaim::Missing => ClaimOutcome::Missing,
            },
        )
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        repositories::booking::get_booking_by_id(&self.pool, id)
            .await?
            .map(Booking::try_from)
            .transpose()
    }

    async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<Booking>> {
        let rows = match filter {
            BookingFilter::Requester(requester_id) => {
                repositories::booking::get_bookings_by_requester_id(&self.pool, requester_id)
                    .await?
            }
            BookingFilter::Provider(provider_id) => {
                repositories::booking::get_bookings_by_provider_id(&self.pool, provider_id).await?
            }
            BookingFilter::All => repositories::booking::get_all_bookings(&self.pool).await?,
        };
        into_bookings(rows)
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<BookingWrite> {
        if status == BookingStatus::Cancelled {
            return self.release_booking(id, at).await;
        }
        let write =
            repositories::booking::update_booking_status(&self.pool, id, status.as_str(), at)
                .await?;
        booking_write(write)
    }

    async fn release_booking(&self, id: Uuid, at: DateTime<Utc>) -> Result<BookingWrite> {
        let write = repositories::booking::release_booking(&self.pool, id, at).await?;
        booking_write(write)
    }

    async fn delete_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        repositories::booking::delete_booking(&self.pool, id)
            .await?
            .map(Booking::try_from)
            .transpose()
    }

    async fn confirmed_visits(&self, window: DateWindow) -> Result<Vec<Visit>> {
        repositories::booking::get_confirmed_visits(&self.pool, window.from, window.to)
            .await?
            .into_iter()
            .map(Visit::try_from)
            .collect()
    }
}
