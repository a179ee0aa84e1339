use crate::models::DbSlot;
use chrono::NaiveDate;
use clinicslot_core::models::{NewSlot, SlotTimes};
use eyre::Result;
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

/// Inserts every slot in one transaction, so a grid is created whole or not at all.
pub async fn insert_slots(pool: &Pool<Postgres>, slots: &[NewSlot]) -> Result<Vec<DbSlot>> {
    let mut tx = pool.begin().await?;
    let mut inserted = Vec::with_capacity(slots.len());

    for slot in slots {
        let row = sqlx::query_as::<_, DbSlot>(
            r#"
            INSERT INTO slots (id, provider_id, slot_date, start_minute, end_minute, duration_minutes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, provider_id, slot_date, start_minute, end_minute, duration_minutes,
                      is_available, bound_booking_id, created_at
            "#,
        )
        .bind(slot.id)
        .bind(slot.provider_id)
        .bind(slot.date)
        .bind(i32::from(slot.start_time.minutes()))
        .bind(i32::from(slot.end_time.minutes()))
        .bind(i32::from(slot.duration_minutes))
        .fetch_one(&mut *tx)
        .await?;
        inserted.push(row);
    }

    tx.commit().await?;
    tracing::debug!("Inserted {} slots", inserted.len());
    Ok(inserted)
}

pub async fn get_slot_by_id<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<Option<DbSlot>> {
    let slot = sqlx::query_as::<_, DbSlot>(
        r#"
        SELECT id, provider_id, slot_date, start_minute, end_minute, duration_minutes,
               is_available, bound_booking_id, created_at
        FROM slots
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(slot)
}

pub async fn list_slots(
    pool: &Pool<Postgres>,
    provider_id: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    only_available: bool,
) -> Result<Vec<DbSlot>> {
    let slots = sqlx::query_as::<_, DbSlot>(
        r#"
        SELECT id, provider_id, slot_date, start_minute, end_minute, duration_minutes,
               is_available, bound_booking_id, created_at
        FROM slots
        WHERE provider_id = $1
          AND ($2::date IS NULL OR slot_date >= $2)
          AND ($3::date IS NULL OR slot_date <= $3)
          AND (NOT $4 OR is_available)
        ORDER BY slot_date ASC, start_minute ASC
        "#,
    )
    .bind(provider_id)
    .bind(from)
    .bind(to)
    .bind(only_available)
    .fetch_all(pool)
    .await?;

    Ok(slots)
}

/// Rewrites the times of a slot while it is available. `None` when no
/// available slot with this id exists.
pub async fn reschedule_available_slot(
    pool: &Pool<Postgres>,
    id: Uuid,
    times: &SlotTimes,
) -> Result<Option<DbSlot>> {
    let slot = sqlx::query_as::<_, DbSlot>(
        r#"
        UPDATE slots
        SET slot_date = $2, start_minute = $3, end_minute = $4, duration_minutes = $5
        WHERE id = $1 AND is_available
        RETURNING id, provider_id, slot_date, start_minute, end_minute, duration_minutes,
                  is_available, bound_booking_id, created_at
        "#,
    )
    .bind(id)
    .bind(times.date)
    .bind(i32::from(times.start_time.minutes()))
    .bind(i32::from(times.end_time.minutes()))
    .bind(i32::from(times.duration_minutes))
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}

/// Deletes a slot while it is available. Returns whether a row was removed.
pub async fn delete_available_slot(pool: &Pool<Postgres>, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM slots
        WHERE id = $1 AND is_available
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
