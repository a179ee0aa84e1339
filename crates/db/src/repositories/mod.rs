pub mod booking;
pub mod slot;

use crate::models::DbBooking;

/// Result of a conditional write on a single row.
#[derive(Debug, Clone)]
pub enum RowWrite<T> {
    Applied(T),
    /// The condition did not hold; the row as currently stored.
    Unchanged(T),
    Missing,
}

/// Result of a conditional slot claim.
#[derive(Debug, Clone)]
pub enum DbClaim {
    Claimed(DbBooking),
    /// The slot exists but was not available; carries the booking bound to
    /// it, if it could still be read.
    Bound(Option<DbBooking>),
    Missing,
}
