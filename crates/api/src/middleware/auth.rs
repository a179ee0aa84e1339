//! # Caller Identity
//!
//! The service sits behind an identity provider that authenticates users and
//! forwards who they are in two trusted headers:
//!
//! - `x-caller-id`: the caller's UUID
//! - `x-caller-role`: `patient`, `provider` or `admin` (`user` and `doctor`
//!   are accepted as aliases)
//!
//! Handlers that take an [`AuthenticatedCaller`] reject requests with missing
//! or malformed headers with `401 Unauthorized`.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use clinicslot_core::{
    errors::BookingError,
    models::{Caller, Role},
};
use uuid::Uuid;

use super::error_handling::AppError;

pub const CALLER_ID_HEADER: &str = "x-caller-id";
pub const CALLER_ROLE_HEADER: &str = "x-caller-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedCaller(pub Caller);

fn header_value<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, BookingError> {
    parts
        .headers
        .get(name)
        .ok_or_else(|| BookingError::Authentication(format!("Missing {} header", name)))?
        .to_str()
        .map_err(|_| BookingError::Authentication(format!("Malformed {} header", name)))
}

/// Reads the caller identity from request headers.
pub fn caller_from_parts(parts: &Parts) -> Result<Caller, BookingError> {
    let id = Uuid::parse_str(header_value(parts, CALLER_ID_HEADER)?.trim()).map_err(|_| {
        BookingError::Authentication(format!("{} must be a UUID", CALLER_ID_HEADER))
    })?;
    let role: Role = header_value(parts, CALLER_ROLE_HEADER)?.parse()?;
    Ok(Caller::new(id, role))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedCaller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let caller = caller_from_parts(parts).map_err(|e| {
            tracing::debug!("Rejected request without a valid caller: {}", e);
            AppError(e)
        })?;
        Ok(AuthenticatedCaller(caller))
    }
}
