use axum::http::StatusCode;
use clinicslot_core::models::{Booking, BookingStatus, Slot};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::test_utils::{admin, patient, provider, with_caller, TestContext};

#[test_log::test(tokio::test)]
async fn test_admin_cancel_reopens_slot() {
    let ctx = TestContext::new();
    let doctor = provider();
    let alice = patient();
    let slot = ctx.create_slot(&doctor, "09:00", "10:00").await;
    let receipt = ctx.claim(&alice, slot.id).await;

    let booked: Slot = ctx.server.get(&format!("/api/slots/{}", slot.id)).await.json();
    assert!(!booked.is_available);
    assert_eq!(booked.bound_booking_id, Some(receipt.booking.id));

    let response = with_caller(
        ctx.server
            .patch(&format!("/api/bookings/{}/status", receipt.booking.id)),
        &admin(),
    )
    .json(&json!({ "status": "cancelled" }))
    .await;
    response.assert_status_ok();
    let cancelled: Booking = response.json();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    let reopened: Slot = ctx.server.get(&format!("/api/slots/{}", slot.id)).await.json();
    assert!(reopened.is_available);
    assert_eq!(reopened.bound_booking_id, None);

    // Someone else can take the freed slot.
    let next = ctx.claim(&patient(), slot.id).await;
    assert!(!next.already_booked);
}

#[test_log::test(tokio::test)]
async fn test_release_twice_is_noop() {
    let ctx = TestContext::new();
    let alice = patient();
    let slot = ctx.create_slot(&provider(), "09:00", "10:00").await;
    let receipt = ctx.claim(&alice, slot.id).await;
    let path = format!("/api/bookings/{}/release", receipt.booking.id);

    with_caller(ctx.server.post(&path), &alice)
        .await
        .assert_status_ok();
    let second = with_caller(ctx.server.post(&path), &alice).await;
    second.assert_status_ok();
    let booking: Booking = second.json();
    assert_eq!(booking.status, BookingStatus::Cancelled);

    let slot: Slot = ctx.server.get(&format!("/api/slots/{}", slot.id)).await.json();
    assert!(slot.is_available);
}

#[test_log::test(tokio::test)]
async fn test_release_by_stranger_is_forbidden() {
    let ctx = TestContext::new();
    let slot = ctx.create_slot(&provider(), "09:00", "10:00").await;
    let receipt = ctx.claim(&patient(), slot.id).await;

    let response = with_caller(
        ctx.server
            .post(&format!("/api/bookings/{}/release", receipt.booking.id)),
        &patient(),
    )
    .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let slot: Slot = ctx.server.get(&format!("/api/slots/{}", slot.id)).await.json();
    assert!(!slot.is_available);
}

#[test_log::test(tokio::test)]
async fn test_pending_status_is_rejected() {
    let ctx = TestContext::new();
    let doctor = provider();
    let slot = ctx.create_slot(&doctor, "09:00", "10:00").await;
    let receipt = ctx.claim(&patient(), slot.id).await;

    let response = with_caller(
        ctx.server
            .patch(&format!("/api/bookings/{}/status", receipt.booking.id)),
        &doctor,
    )
    .json(&json!({ "status": "pending" }))
    .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "validation");
}

#[test_log::test(tokio::test)]
async fn test_completed_booking_cannot_be_cancelled() {
    let ctx = TestContext::new();
    let doctor = provider();
    let alice = patient();
    let slot = ctx.create_slot(&doctor, "09:00", "10:00").await;
    let receipt = ctx.claim(&alice, slot.id).await;
    let status_path = format!("/api/bookings/{}/status", receipt.booking.id);

    let response = with_caller(ctx.server.patch(&status_path), &doctor)
        .json(&json!({ "status": "completed" }))
        .await;
    response.assert_status_ok();

    let response = with_caller(
        ctx.server
            .post(&format!("/api/bookings/{}/release", receipt.booking.id)),
        &alice,
    )
    .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = with_caller(ctx.server.patch(&status_path), &doctor)
        .json(&json!({ "status": "confirmed" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[test_log::test(tokio::test)]
async fn test_list_bookings_is_scoped_by_role() {
    let ctx = TestContext::new();
    let doctor = provider();
    let other_doctor = provider();
    let alice = patient();
    let bob = patient();

    let slot_a = ctx.create_slot(&doctor, "09:00", "10:00").await;
    let slot_b = ctx.create_slot(&other_doctor, "09:00", "10:00").await;
    ctx.claim(&alice, slot_a.id).await;
    ctx.claim(&bob, slot_b.id).await;

    let alice_view: Vec<Booking> = with_caller(ctx.server.get("/api/bookings"), &alice)
        .await
        .json();
    assert_eq!(alice_view.len(), 1);
    assert_eq!(alice_view[0].requester_id, alice.id);

    let doctor_view: Vec<Booking> = with_caller(ctx.server.get("/api/bookings"), &doctor)
        .await
        .json();
    assert_eq!(doctor_view.len(), 1);
    assert_eq!(doctor_view[0].slot_id, slot_a.id);

    let admin_view: Vec<Booking> = with_caller(ctx.server.get("/api/bookings"), &admin())
        .await
        .json();
    assert_eq!(admin_view.len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_get_booking_visibility() {
    let ctx = TestContext::new();
    let doctor = provider();
    let alice = patient();
    let slot = ctx.create_slot(&doctor, "09:00", "10:00").await;
    let receipt = ctx.claim(&alice, slot.id).await;
    let path = format!("/api/bookings/{}", receipt.booking.id);

    with_caller(ctx.server.get(&path), &alice)
        .await
        .assert_status_ok();
    with_caller(ctx.server.get(&path), &doctor)
        .await
        .assert_status_ok();
    with_caller(ctx.server.get(&path), &patient())
        .await
        .assert_status(StatusCode::FORBIDDEN);
    ctx.server
        .get(&path)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[test_log::test(tokio::test)]
async fn test_delete_booking_is_admin_only() {
    let ctx = TestContext::new();
    let alice = patient();
    let slot = ctx.create_slot(&provider(), "09:00", "10:00").await;
    let receipt = ctx.claim(&alice, slot.id).await;
    let path = format!("/api/bookings/{}", receipt.booking.id);

    with_caller(ctx.server.delete(&path), &alice)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = with_caller(ctx.server.delete(&path), &admin()).await;
    response.assert_status_ok();
    let deleted: Booking = response.json();
    assert_eq!(deleted.id, receipt.booking.id);

    let slot: Slot = ctx.server.get(&format!("/api/slots/{}", slot.id)).await.json();
    assert!(slot.is_available);
    with_caller(ctx.server.get(&path), &admin())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn test_delete_booking_hides_existence_from_non_admins() {
    let ctx = TestContext::new();
    let path = format!("/api/bookings/{}", uuid::Uuid::new_v4());

    with_caller(ctx.server.delete(&path), &patient())
        .await
        .assert_status(StatusCode::FORBIDDEN);
    with_caller(ctx.server.delete(&path), &admin())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
