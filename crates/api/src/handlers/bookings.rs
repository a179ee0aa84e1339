//! # Booking Handlers
//!
//! Every endpoint here needs caller headers. Patients see their own bookings,
//! providers see bookings on their slots and admins see everything.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use clinicslot_core::{
    ledger,
    models::{booking::TransitionStatusRequest, Booking},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    middleware::{auth::AuthenticatedCaller, error_handling::AppError},
    ApiState,
};

/// Lists the bookings visible to the caller, newest first.
///
/// # Endpoint
///
/// ```text
/// GET /api/bookings
/// ```
#[axum::debug_handler]
pub async fn list_bookings(
    State(state): State<Arc<ApiState>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = ledger::list_bookings(state.store.as_ref(), &caller).await?;
    Ok(Json(bookings))
}

/// # Endpoint
///
/// ```text
/// GET /api/bookings/:booking_id
/// ```
///
/// Answers `403` unless the caller is a party to the booking or an admin.
#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<ApiState>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = ledger::get_booking(state.store.as_ref(), &caller, booking_id).await?;
    Ok(Json(booking))
}

/// Removes a booking and reopens its slot. Admin only.
///
/// # Endpoint
///
/// ```text
/// DELETE /api/bookings/:booking_id
/// ```
///
/// # Returns
///
/// The removed booking.
#[axum::debug_handler]
pub async fn delete_booking(
    State(state): State<Arc<ApiState>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = ledger::delete_booking(state.store.as_ref(), &caller, booking_id).await?;
    Ok(Json(booking))
}

/// Moves a booking to a new status.
///
/// # Endpoint
///
/// ```text
/// PATCH /api/bookings/:booking_id/status
/// { "status": "completed" }
/// ```
///
/// `cancelled` releases the slot. A completed or cancelled booking cannot
/// move again.
#[axum::debug_handler]
pub async fn transition_status(
    State(state): State<Arc<ApiState>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(booking_id): Path<Uuid>,
    payload: Result<Json<TransitionStatusRequest>, JsonRejection>,
) -> Result<Json<Booking>, AppError> {
    let Json(request) = payload?;
    let booking =
        ledger::transition_status(state.store.as_ref(), &caller, booking_id, &request.status)
            .await?;
    Ok(Json(booking))
}

/// Cancels the booking and puts its slot back on offer.
///
/// # Endpoint
///
/// ```text
/// POST /api/bookings/:booking_id/release
/// ```
///
/// Releasing an already cancelled booking returns it unchanged.
#[axum::debug_handler]
pub async fn release_booking(
    State(state): State<Arc<ApiState>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = ledger::release_slot(state.store.as_ref(), &caller, booking_id).await?;
    Ok(Json(booking))
}
