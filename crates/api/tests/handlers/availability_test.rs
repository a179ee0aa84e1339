use axum::http::StatusCode;
use clinicslot_core::models::{Slot, Visit};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::test_utils::{admin, patient, provider, with_caller, TestContext};

#[test_log::test(tokio::test)]
async fn test_availability_hides_claimed_slots_and_keeps_order() {
    let ctx = TestContext::new();
    let doctor = provider();
    let late = ctx.create_slot(&doctor, "15:00", "16:00").await;
    let early = ctx.create_slot(&doctor, "09:00", "10:00").await;
    let middle = ctx.create_slot(&doctor, "11:00", "12:00").await;
    ctx.claim(&patient(), middle.id).await;

    let response = ctx
        .server
        .get(&format!("/api/providers/{}/availability", doctor.id))
        .await;

    response.assert_status_ok();
    let slots: Vec<Slot> = response.json();
    let ids: Vec<_> = slots.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![early.id, late.id]);
}

#[test_log::test(tokio::test)]
async fn test_availability_window_is_inclusive() {
    let ctx = TestContext::new();
    let doctor = provider();
    for date in ["2025-03-09", "2025-03-10", "2025-03-11", "2025-03-12"] {
        with_caller(
            ctx.server
                .post(&format!("/api/providers/{}/slots", doctor.id)),
            &doctor,
        )
        .json(&json!({ "date": date, "startTime": "09:00", "endTime": "10:00" }))
        .await
        .assert_status(StatusCode::CREATED);
    }

    let response = ctx
        .server
        .get(&format!("/api/providers/{}/availability", doctor.id))
        .add_query_param("from", "2025-03-10")
        .add_query_param("to", "2025-03-11")
        .await;

    response.assert_status_ok();
    let slots: Vec<Slot> = response.json();
    let dates: Vec<String> = slots.iter().map(|s| s.date.to_string()).collect();
    assert_eq!(dates, vec!["2025-03-10", "2025-03-11"]);
}

#[test_log::test(tokio::test)]
async fn test_availability_rejects_reversed_window() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .get(&format!("/api/providers/{}/availability", uuid::Uuid::new_v4()))
        .add_query_param("from", "2025-03-12")
        .add_query_param("to", "2025-03-10")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "validation");
}

#[test_log::test(tokio::test)]
async fn test_availability_rejects_malformed_date() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .get(&format!("/api/providers/{}/availability", uuid::Uuid::new_v4()))
        .add_query_param("from", "next tuesday")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn test_upcoming_visits_for_admin() {
    let ctx = TestContext::new();
    let doctor = provider();
    let alice = patient();
    let kept = ctx.create_slot(&doctor, "10:00", "11:00").await;
    let dropped = ctx.create_slot(&doctor, "09:00", "10:00").await;
    ctx.create_slot(&doctor, "12:00", "13:00").await;

    let kept_receipt = ctx.claim(&alice, kept.id).await;
    let dropped_receipt = ctx.claim(&patient(), dropped.id).await;
    with_caller(
        ctx.server
            .post(&format!("/api/bookings/{}/release", dropped_receipt.booking.id)),
        &admin(),
    )
    .await
    .assert_status_ok();

    let response = with_caller(ctx.server.get("/api/reminders/upcoming"), &admin())
        .add_query_param("from", "2025-03-10")
        .add_query_param("to", "2025-03-10")
        .await;

    response.assert_status_ok();
    let visits: Vec<Visit> = response.json();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].booking.id, kept_receipt.booking.id);
    assert_eq!(visits[0].slot.id, kept.id);
}

#[test_log::test(tokio::test)]
async fn test_upcoming_visits_requires_admin() {
    let ctx = TestContext::new();

    with_caller(ctx.server.get("/api/reminders/upcoming"), &provider())
        .await
        .assert_status(StatusCode::FORBIDDEN);
    ctx.server
        .get("/api/reminders/upcoming")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}
