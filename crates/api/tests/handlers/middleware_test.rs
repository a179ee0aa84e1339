use axum::http::{Request, StatusCode};
use clinicslot_api::middleware::auth::caller_from_parts;
use axum::response::IntoResponse;
use clinicslot_api::middleware::error_handling::{panic_response, AppError};
use clinicslot_core::errors::BookingError;
use clinicslot_core::models::Role;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::Value;

use crate::test_utils::TestContext;

#[rstest]
#[case(BookingError::NotFound("missing".to_string()), StatusCode::NOT_FOUND)]
#[case(BookingError::Validation("bad".to_string()), StatusCode::BAD_REQUEST)]
#[case(BookingError::Authentication("who".to_string()), StatusCode::UNAUTHORIZED)]
#[case(BookingError::Forbidden("no".to_string()), StatusCode::FORBIDDEN)]
#[case(BookingError::Conflict("taken".to_string()), StatusCode::CONFLICT)]
#[case(BookingError::Database(eyre::eyre!("down")), StatusCode::INTERNAL_SERVER_ERROR)]
#[case(
    BookingError::Internal(Box::new(std::io::Error::other("boom"))),
    StatusCode::INTERNAL_SERVER_ERROR
)]
fn test_error_status_mapping(#[case] error: BookingError, #[case] expected: StatusCode) {
    let response = AppError(error).into_response();
    assert_eq!(response.status(), expected);
}

#[tokio::test]
async fn test_panic_becomes_internal_error() {
    let response = panic_response(Box::new("slot index out of range"));
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["kind"], "internal");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("slot index out of range"));
}

#[test]
fn test_caller_headers_parse() {
    let id = uuid::Uuid::new_v4();
    let (parts, _) = Request::builder()
        .header("x-caller-id", id.to_string())
        .header("x-caller-role", "doctor")
        .body(())
        .unwrap()
        .into_parts();

    let caller = caller_from_parts(&parts).unwrap();
    assert_eq!(caller.id, id);
    assert_eq!(caller.role, Role::Provider);
}

#[rstest]
#[case(None, Some("admin"))]
#[case(Some("not-a-uuid"), Some("admin"))]
#[case(Some("7d9f3c1e-8a4b-4f2e-9c6d-1b2a3c4d5e6f"), None)]
#[case(Some("7d9f3c1e-8a4b-4f2e-9c6d-1b2a3c4d5e6f"), Some("janitor"))]
fn test_caller_headers_rejected(#[case] id: Option<&str>, #[case] role: Option<&str>) {
    let mut builder = Request::builder();
    if let Some(id) = id {
        builder = builder.header("x-caller-id", id);
    }
    if let Some(role) = role {
        builder = builder.header("x-caller-role", role);
    }
    let (parts, _) = builder.body(()).unwrap().into_parts();

    let error = caller_from_parts(&parts).unwrap_err();
    assert_eq!(error.kind(), "authentication");
}

#[test_log::test(tokio::test)]
async fn test_health_and_version() {
    let ctx = TestContext::new();

    let health: Value = ctx.server.get("/health").await.json();
    assert_eq!(health["status"], "ok");

    let version: Value = ctx.server.get("/version").await.json();
    assert_eq!(version["name"], "clinicslot-api");
    assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
}
