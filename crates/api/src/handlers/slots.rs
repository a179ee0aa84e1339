//! # Slot Handlers
//!
//! Providers publish and maintain their own slots here; patients claim them.
//! Listing and reading slots needs no caller headers, every write does.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use clinicslot_core::{
    catalog, ledger,
    models::{
        slot::{CreateGridRequest, CreateGridResponse, CreateSlotRequest, RescheduleSlotRequest},
        ClaimReceipt, Slot,
    },
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    middleware::{auth::AuthenticatedCaller, error_handling::AppError},
    ApiState,
};

/// Lists every slot the provider has published, open or bound.
///
/// # Endpoint
///
/// ```text
/// GET /api/providers/:provider_id/slots
/// ```
#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<Arc<ApiState>>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Vec<Slot>>, AppError> {
    let slots = catalog::list_slots(state.store.as_ref(), provider_id).await?;
    Ok(Json(slots))
}

/// Publishes a single slot. The provider may only publish for themselves.
///
/// # Endpoint
///
/// ```text
/// POST /api/providers/:provider_id/slots
/// { "date": "2025-03-10", "startTime": "09:00", "endTime": "09:45" }
/// ```
///
/// # Returns
///
/// `201 Created` with the new slot. `endTime` defaults to 45 minutes after
/// `startTime`.
#[axum::debug_handler]
pub async fn create_slot(
    State(state): State<Arc<ApiState>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(provider_id): Path<Uuid>,
    payload: Result<Json<CreateSlotRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Slot>), AppError> {
    let Json(request) = payload?;
    let slot = catalog::create_slot(state.store.as_ref(), &caller, provider_id, request).await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

/// Publishes a day of back-to-back slots, 09:00 to 17:00 hourly unless the
/// request says otherwise.
///
/// # Endpoint
///
/// ```text
/// POST /api/providers/:provider_id/slots/grid
/// ```
///
/// # Returns
///
/// `201 Created` with `{ "created": n, "slots": [...] }`. A range shorter
/// than one interval creates nothing.
#[axum::debug_handler]
pub async fn create_grid(
    State(state): State<Arc<ApiState>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(provider_id): Path<Uuid>,
    payload: Result<Json<CreateGridRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateGridResponse>), AppError> {
    let Json(request) = payload?;
    let slots =
        catalog::create_hourly_grid(state.store.as_ref(), &caller, provider_id, request).await?;
    let response = CreateGridResponse {
        created: slots.len(),
        slots,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// # Endpoint
///
/// ```text
/// GET /api/slots/:slot_id
/// ```
#[axum::debug_handler]
pub async fn get_slot(
    State(state): State<Arc<ApiState>>,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<Slot>, AppError> {
    let slot = catalog::get_slot(state.store.as_ref(), slot_id).await?;
    Ok(Json(slot))
}

/// Moves an open slot. Fields left out of the body keep their value.
///
/// # Endpoint
///
/// ```text
/// PATCH /api/slots/:slot_id
/// ```
///
/// Answers `409` while the slot is bound to a booking.
#[axum::debug_handler]
pub async fn reschedule_slot(
    State(state): State<Arc<ApiState>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(slot_id): Path<Uuid>,
    payload: Result<Json<RescheduleSlotRequest>, JsonRejection>,
) -> Result<Json<Slot>, AppError> {
    let Json(request) = payload?;
    let slot = catalog::reschedule_slot(state.store.as_ref(), &caller, slot_id, request).await?;
    Ok(Json(slot))
}

/// Withdraws an open slot.
///
/// # Endpoint
///
/// ```text
/// DELETE /api/slots/:slot_id
/// ```
///
/// # Returns
///
/// `204 No Content`, or `409` if a patient holds the slot.
#[axum::debug_handler]
pub async fn delete_slot(
    State(state): State<Arc<ApiState>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(slot_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    catalog::delete_slot(state.store.as_ref(), &caller, slot_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Books the slot for the caller. A repeated claim by the same caller answers
/// `200` with the existing booking instead of `201`.
///
/// # Endpoint
///
/// ```text
/// POST /api/slots/:slot_id/claim
/// ```
///
/// Losing the race for a slot answers `409` with `"kind": "conflict"`.
#[axum::debug_handler]
pub async fn claim_slot(
    State(state): State<Arc<ApiState>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(slot_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ClaimReceipt>), AppError> {
    let receipt = ledger::claim_slot(state.store.as_ref(), slot_id, caller.id).await?;
    let status = if receipt.already_booked {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(receipt)))
}
