use eyre::Result;
use sqlx::{Executor, Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create slots table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS slots (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            provider_id UUID NOT NULL,
            slot_date DATE NOT NULL,
            start_minute INTEGER NOT NULL,
            end_minute INTEGER NOT NULL,
            duration_minutes INTEGER NOT NULL,
            is_available BOOLEAN NOT NULL DEFAULT TRUE,
            bound_booking_id UUID NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_slot_range CHECK (
                start_minute >= 0 AND end_minute <= 1440 AND end_minute > start_minute
            ),
            CONSTRAINT valid_slot_duration CHECK (duration_minutes BETWEEN 15 AND 240),
            CONSTRAINT slot_binding_consistent CHECK (is_available = (bound_booking_id IS NULL))
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create bookings table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bookings (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            requester_id UUID NOT NULL,
            provider_id UUID NOT NULL,
            slot_id UUID NOT NULL REFERENCES slots(id) ON DELETE CASCADE,
            status VARCHAR(16) NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_booking_status CHECK (
                status IN ('confirmed', 'completed', 'cancelled', 'rescheduled')
            )
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Back-reference from a slot to the booking holding it. Deferred so the
    // slot can be bound before the booking row is written in the same
    // transaction.
    sqlx::query(
        r#"
        DO $$
        BEGIN
            IF NOT EXISTS (
                SELECT 1 FROM pg_constraint WHERE conname = 'slots_bound_booking_fk'
            ) THEN
                ALTER TABLE slots
                    ADD CONSTRAINT slots_bound_booking_fk
                    FOREIGN KEY (bound_booking_id) REFERENCES bookings(id)
                    DEFERRABLE INITIALLY DEFERRED;
            END IF;
        END
        $$;
        "#,
    )
    .execute(pool)
    .await?;

    // At most one active booking per slot
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS uq_bookings_active_slot
            ON bookings(provider_id, slot_id)
            WHERE status <> 'cancelled';
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes (several statements, so sent over the simple query protocol)
    pool.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_slots_provider_date ON slots(provider_id, slot_date, start_minute);
        CREATE INDEX IF NOT EXISTS idx_slots_available ON slots(provider_id, slot_date) WHERE is_available;
        CREATE INDEX IF NOT EXISTS idx_bookings_requester_id ON bookings(requester_id);
        CREATE INDEX IF NOT EXISTS idx_bookings_provider_id ON bookings(provider_id);
        CREATE INDEX IF NOT EXISTS idx_bookings_slot_id ON bookings(slot_id);
        "#,
    )
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
