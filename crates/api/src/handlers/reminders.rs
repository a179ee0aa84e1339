use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use clinicslot_core::{availability, models::Visit};
use std::sync::Arc;

use super::availability::DateRangeQuery;
use crate::{
    middleware::{auth::AuthenticatedCaller, error_handling::AppError},
    ApiState,
};

/// Confirmed visits in the window, for the reminder sender. Admin only.
#[axum::debug_handler]
pub async fn upcoming_visits(
    State(state): State<Arc<ApiState>>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> Result<Json<Vec<Visit>>, AppError> {
    let Query(range) = query?;
    let window = range.window()?;
    let visits = availability::upcoming_visits(state.store.as_ref(), &caller, window).await?;
    Ok(Json(visits))
}
