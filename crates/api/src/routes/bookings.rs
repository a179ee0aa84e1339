use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/bookings", get(handlers::bookings::list_bookings))
        .route(
            "/api/bookings/:booking_id",
            get(handlers::bookings::get_booking).delete(handlers::bookings::delete_booking),
        )
        .route(
            "/api/bookings/:booking_id/status",
            patch(handlers::bookings::transition_status),
        )
        .route(
            "/api/bookings/:booking_id/release",
            post(handlers::bookings::release_booking),
        )
}
