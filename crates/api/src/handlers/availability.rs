//! # Availability Handlers
//!
//! Read side for patients looking for an appointment. Both endpoints take an
//! optional inclusive `from`/`to` date window as query parameters
//! (`YYYY-MM-DD`); a window that starts after it ends is rejected with `400`.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use clinicslot_core::{
    availability,
    models::{DateWindow, Slot},
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{middleware::error_handling::AppError, ApiState};

/// Query parameters selecting a date window
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRangeQuery {
    pub fn window(&self) -> Result<DateWindow, AppError> {
        Ok(DateWindow::new(self.from, self.to)?)
    }
}

/// Lists the provider's open slots in time order.
///
/// # Endpoint
///
/// ```text
/// GET /api/providers/:provider_id/availability?from=2025-03-10&to=2025-03-14
/// ```
#[axum::debug_handler]
pub async fn list_available(
    State(state): State<Arc<ApiState>>,
    Path(provider_id): Path<Uuid>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> Result<Json<Vec<Slot>>, AppError> {
    let Query(range) = query?;
    let window = range.window()?;
    let slots = availability::list_available(state.store.as_ref(), provider_id, Some(window)).await?;
    Ok(Json(slots))
}
