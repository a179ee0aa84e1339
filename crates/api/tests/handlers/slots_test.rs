use axum::http::{HeaderName, HeaderValue, StatusCode};
use clinicslot_core::models::{slot::CreateGridResponse, ClaimReceipt, Slot};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::test_utils::{admin, patient, provider, with_caller, TestContext, TEST_DATE};

#[test_log::test(tokio::test)]
async fn test_create_slot_and_list() {
    let ctx = TestContext::new();
    let doctor = provider();

    let created = ctx.create_slot(&doctor, "09:00", "09:30").await;
    assert_eq!(created.provider_id, doctor.id);
    assert_eq!(created.duration_minutes, 30);
    assert!(created.is_available);

    let response = ctx
        .server
        .get(&format!("/api/providers/{}/slots", doctor.id))
        .await;
    response.assert_status_ok();
    let slots: Vec<Slot> = response.json();
    assert_eq!(slots, vec![created]);
}

#[test_log::test(tokio::test)]
async fn test_create_slot_without_caller_is_unauthorized() {
    let ctx = TestContext::new();
    let doctor = provider();

    let response = ctx
        .server
        .post(&format!("/api/providers/{}/slots", doctor.id))
        .json(&json!({ "date": TEST_DATE, "startTime": "09:00", "endTime": "10:00" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["kind"], "authentication");
}

#[test_log::test(tokio::test)]
async fn test_unknown_role_is_unauthorized() {
    let ctx = TestContext::new();
    let doctor = provider();

    let response = ctx
        .server
        .post(&format!("/api/providers/{}/slots", doctor.id))
        .add_header(
            HeaderName::from_static("x-caller-id"),
            HeaderValue::from_str(&doctor.id.to_string()).unwrap(),
        )
        .add_header(
            HeaderName::from_static("x-caller-role"),
            HeaderValue::from_static("nurse"),
        )
        .json(&json!({ "date": TEST_DATE, "startTime": "09:00", "endTime": "10:00" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[test_log::test(tokio::test)]
async fn test_create_slot_with_reversed_times_is_rejected() {
    let ctx = TestContext::new();
    let doctor = provider();

    let response = with_caller(
        ctx.server.post(&format!("/api/providers/{}/slots", doctor.id)),
        &doctor,
    )
    .json(&json!({ "date": TEST_DATE, "startTime": "10:00", "endTime": "09:00" }))
    .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "validation");
}

#[test_log::test(tokio::test)]
async fn test_create_slot_with_malformed_time_is_rejected() {
    let ctx = TestContext::new();
    let doctor = provider();

    let response = with_caller(
        ctx.server.post(&format!("/api/providers/{}/slots", doctor.id)),
        &doctor,
    )
    .json(&json!({ "date": TEST_DATE, "startTime": "9am", "endTime": "10:00" }))
    .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn test_create_slot_for_another_provider_is_forbidden() {
    let ctx = TestContext::new();
    let doctor = provider();
    let other = provider();

    let response = with_caller(
        ctx.server.post(&format!("/api/providers/{}/slots", other.id)),
        &doctor,
    )
    .json(&json!({ "date": TEST_DATE, "startTime": "09:00", "endTime": "10:00" }))
    .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[test_log::test(tokio::test)]
async fn test_grid_defaults_to_hourly_working_day() {
    let ctx = TestContext::new();
    let doctor = provider();

    let response = with_caller(
        ctx.server
            .post(&format!("/api/providers/{}/slots/grid", doctor.id)),
        &doctor,
    )
    .json(&json!({ "date": TEST_DATE }))
    .await;

    response.assert_status(StatusCode::CREATED);
    let grid: CreateGridResponse = response.json();
    assert_eq!(grid.created, 8);
    let starts: Vec<String> = grid.slots.iter().map(|s| s.start_time.to_string()).collect();
    assert_eq!(starts.first().map(String::as_str), Some("09:00"));
    assert_eq!(starts.last().map(String::as_str), Some("16:00"));
}

#[test_log::test(tokio::test)]
async fn test_grid_drops_partial_tail() {
    let ctx = TestContext::new();
    let doctor = provider();

    let response = with_caller(
        ctx.server
            .post(&format!("/api/providers/{}/slots/grid", doctor.id)),
        &doctor,
    )
    .json(&json!({
        "date": TEST_DATE,
        "rangeStart": "13:00",
        "rangeEnd": "14:50",
        "durationMinutes": 30,
    }))
    .await;

    response.assert_status(StatusCode::CREATED);
    let grid: CreateGridResponse = response.json();
    assert_eq!(grid.created, 3);
    assert_eq!(grid.slots[2].end_time.to_string(), "14:30");
}

#[test_log::test(tokio::test)]
async fn test_get_missing_slot_is_not_found() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .get(&format!("/api/slots/{}", uuid::Uuid::new_v4()))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["kind"], "not_found");
}

#[test_log::test(tokio::test)]
async fn test_reschedule_open_slot() {
    let ctx = TestContext::new();
    let doctor = provider();
    let slot = ctx.create_slot(&doctor, "09:00", "10:00").await;

    let response = with_caller(ctx.server.patch(&format!("/api/slots/{}", slot.id)), &doctor)
        .json(&json!({ "startTime": "11:00", "endTime": "12:00" }))
        .await;

    response.assert_status_ok();
    let updated: Slot = response.json();
    assert_eq!(updated.start_time.to_string(), "11:00");
    assert_eq!(updated.date, slot.date);
    assert!(updated.is_available);
}

#[test_log::test(tokio::test)]
async fn test_reschedule_booked_slot_is_conflict() {
    let ctx = TestContext::new();
    let doctor = provider();
    let slot = ctx.create_slot(&doctor, "09:00", "10:00").await;
    ctx.claim(&patient(), slot.id).await;

    let response = with_caller(ctx.server.patch(&format!("/api/slots/{}", slot.id)), &doctor)
        .json(&json!({ "startTime": "11:00", "endTime": "12:00" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[test_log::test(tokio::test)]
async fn test_claim_then_reclaim_then_lose() {
    let ctx = TestContext::new();
    let doctor = provider();
    let alice = patient();
    let bob = patient();
    let slot = ctx.create_slot(&doctor, "09:00", "10:00").await;

    let first = ctx.claim(&alice, slot.id).await;
    assert!(!first.already_booked);
    assert_eq!(first.booking.requester_id, alice.id);
    assert_eq!(first.booking.provider_id, doctor.id);

    let again = with_caller(ctx.server.post(&format!("/api/slots/{}/claim", slot.id)), &alice).await;
    again.assert_status_ok();
    let receipt: ClaimReceipt = again.json();
    assert!(receipt.already_booked);
    assert_eq!(receipt.booking.id, first.booking.id);

    let lost = with_caller(ctx.server.post(&format!("/api/slots/{}/claim", slot.id)), &bob).await;
    lost.assert_status(StatusCode::CONFLICT);
    let body: Value = lost.json();
    assert_eq!(body["kind"], "conflict");
}

#[test_log::test(tokio::test)]
async fn test_claim_missing_slot() {
    let ctx = TestContext::new();

    let response = with_caller(
        ctx.server
            .post(&format!("/api/slots/{}/claim", uuid::Uuid::new_v4())),
        &patient(),
    )
    .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn test_delete_slot_guard() {
    let ctx = TestContext::new();
    let doctor = provider();
    let booked = ctx.create_slot(&doctor, "09:00", "10:00").await;
    let open = ctx.create_slot(&doctor, "10:00", "11:00").await;
    ctx.claim(&patient(), booked.id).await;

    let response = with_caller(ctx.server.delete(&format!("/api/slots/{}", booked.id)), &admin()).await;
    response.assert_status(StatusCode::CONFLICT);

    let response = with_caller(ctx.server.delete(&format!("/api/slots/{}", open.id)), &provider()).await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = with_caller(ctx.server.delete(&format!("/api/slots/{}", open.id)), &doctor).await;
    response.assert_status(StatusCode::NO_CONTENT);

    ctx.server
        .get(&format!("/api/slots/{}", open.id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
