use crate::models::{DbBooking, DbVisit};
use crate::repositories::slot::get_slot_by_id;
use crate::repositories::{DbClaim, RowWrite};
use chrono::{DateTime, NaiveDate, Utc};
use eyre::Result;
use sqlx::{PgExecutor, Pool, Postgres};
use tracing::{debug, warn};
use uuid::Uuid;

pub async fn get_booking_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<DbBooking>> {
    let booking = sqlx::query_as::<_, DbBooking>(
        r#"
        SELECT id, requester_id, provider_id, slot_id, status, created_at, updated_at
        FROM bookings
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(booking)
}

/// Claims a slot for a requester.
///
/// The slot row is flipped to unavailable by a conditional update, so of
/// several concurrent claims only the first to take the row lock sees
/// `is_available` and the rest match zero rows. The booking is inserted in
/// the same transaction; the partial unique index on active bookings rejects
/// anything that slips past.
pub async fn claim_slot(
    pool: &Pool<Postgres>,
    slot_id: Uuid,
    requester_id: Uuid,
    at: DateTime<Utc>,
) -> Result<DbClaim> {
    let booking_id = Uuid::new_v4();
    let mut tx = pool.begin().await?;

    let claimed_provider = sqlx::query_scalar::<_, Uuid>(
        r#"
        UPDATE slots
        SET is_available = FALSE, bound_booking_id = $2
        WHERE id = $1 AND is_available
        RETURNING provider_id
        "#,
    )
    .bind(slot_id)
    .bind(booking_id)
    .fetch_optional(&mut *tx)
    .await?;

    match claimed_provider {
        Some(provider_id) => {
            let inserted = sqlx::query_as::<_, DbBooking>(
                r#"
                INSERT INTO bookings (id, requester_id, provider_id, slot_id, status, created_at, updated_at)
                VALUES ($1, $2, $3, $4, 'confirmed', $5, $5)
                RETURNING id, requester_id, provider_id, slot_id, status, created_at, updated_at
                "#,
            )
            .bind(booking_id)
            .bind(requester_id)
            .bind(provider_id)
            .bind(slot_id)
            .bind(at)
            .fetch_one(&mut *tx)
            .await;

            match inserted {
                Ok(booking) => {
                    tx.commit().await?;
                    debug!("Slot {} claimed by booking {}", slot_id, booking.id);
                    return Ok(DbClaim::Claimed(booking));
                }
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                    warn!("Active booking already exists for slot {}", slot_id);
                    tx.rollback().await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
        None => tx.rollback().await?,
    }

    // The claim did not apply; report who holds the slot, if anyone.
    let Some(slot) = get_slot_by_id(pool, slot_id).await? else {
        return Ok(DbClaim::Missing);
    };
    let holder = match slot.bound_booking_id {
        Some(bound_id) => get_booking_by_id(pool, bound_id).await?,
        None => None,
    };
    Ok(DbClaim::Bound(holder))
}

/// Cancels a booking that is not yet terminal and reopens its slot in the
/// same transaction.
pub async fn release_booking(
    pool: &Pool<Postgres>,
    id: Uuid,
    at: DateTime<Utc>,
) -> Result<RowWrite<DbBooking>> {
    let mut tx = pool.begin().await?;

    let cancelled = sqlx::query_as::<_, DbBooking>(
        r#"
        UPDATE bookings
        SET status = 'cancelled', updated_at = $2
        WHERE id = $1 AND status NOT IN ('cancelled', 'completed')
        RETURNING id, requester_id, provider_id, slot_id, status, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(at)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(booking) = cancelled else {
        tx.rollback().await?;
        return Ok(match get_booking_by_id(pool, id).await? {
            Some(booking) => RowWrite::Unchanged(booking),
            None => RowWrite::Missing,
        });
    };

    sqlx::query(
        r#"
        UPDATE slots
        SET is_available = TRUE, bound_booking_id = NULL
        WHERE id = $1 AND bound_booking_id = $2
        "#,
    )
    .bind(booking.slot_id)
    .bind(booking.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    debug!("Booking {} cancelled, slot {} reopened", booking.id, booking.slot_id);
    Ok(RowWrite::Applied(booking))
}

/// Sets a status other than `cancelled` on a booking that is not yet terminal.
pub async fn update_booking_status(
    pool: &Pool<Postgres>,
    id: Uuid,
    status: &str,
    at: DateTime<Utc>,
) -> Result<RowWrite<DbBooking>> {
    let updated = sqlx::query_as::<_, DbBooking>(
        r#"
        UPDATE bookings
        SET status = $2, updated_at = $3
        WHERE id = $1 AND status NOT IN ('cancelled', 'completed')
        RETURNING id, requester_id, provider_id, slot_id, status, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(at)
    .fetch_optional(pool)
    .await?;

    if let Some(booking) = updated {
        return Ok(RowWrite::Applied(booking));
    }
    Ok(match get_booking_by_id(pool, id).await? {
        Some(booking) => RowWrite::Unchanged(booking),
        None => RowWrite::Missing,
    })
}

/// Deletes a booking and, if it held its slot, reopens the slot.
pub async fn delete_booking(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbBooking>> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query_as::<_, DbBooking>(
        r#"
        DELETE FROM bookings
        WHERE id = $1
        RETURNING id, requester_id, provider_id, slot_id, status, created_at, updated_at
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some(booking) = &deleted {
        sqlx::query(
            r#"
            UPDATE slots
            SET is_available = TRUE, bound_booking_id = NULL
            WHERE id = $1 AND bound_booking_id = $2
            "#,
        )
        .bind(booking.slot_id)
        .bind(booking.id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(deleted)
}

pub async fn get_bookings_by_requester_id(
    pool: &Pool<Postgres>,
    requester_id: Uuid,
) -> Result<Vec<DbBooking>> {
    let bookings = sqlx::query_as::<_, DbBooking>(
        r#"
        SELECT id, requester_id, provider_id, slot_id, status, created_at, updated_at
        FROM bookings
        WHERE requester_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(requester_id)
    .fetch_all(pool)
    .await?;

    Ok(bookings)
}

pub async fn get_bookings_by_provider_id(
    pool: &Pool<Postgres>,
    provider_id: Uuid,
) -> Result<Vec<DbBooking>> {
    let bookings = sqlx::query_as::<_, DbBooking>(
        r#"
        SELECT id, requester_id, provider_id, slot_id, status, created_at, updated_at
        FROM bookings
        WHERE provider_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(provider_id)
    .fetch_all(pool)
    .await?;

    Ok(bookings)
}

pub async fn get_all_bookings(pool: &Pool<Postgres>) -> Result<Vec<DbBooking>> {
    let bookings = sqlx::query_as::<_, DbBooking>(
        r#"
        SELECT id, requester_id, provider_id, slot_id, status, created_at, updated_at
        FROM bookings
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(bookings)
}

pub async fn get_confirmed_visits(
    pool: &Pool<Postgres>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<DbVisit>> {
    let visits = sqlx::query_as::<_, DbVisit>(
        r#"
        SELECT b.id, b.requester_id, b.provider_id, b.slot_id, b.status, b.created_at, b.updated_at,
               s.slot_date AS s_slot_date,
               s.start_minute AS s_start_minute,
               s.end_minute AS s_end_minute,
               s.duration_minutes AS s_duration_minutes,
               s.is_available AS s_is_available,
               s.bound_booking_id AS s_bound_booking_id,
               s.created_at AS s_created_at
        FROM bookings b
        JOIN slots s ON s.id = b.slot_id
        WHERE b.status = 'confirmed'
          AND ($1::date IS NULL OR s.slot_date >= $1)
          AND ($2::date IS NULL OR s.slot_date <= $2)
        ORDER BY s.slot_date ASC, s.start_minute ASC
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(visits)
}
