use axum::{routing::get, Router};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new().route(
        "/api/reminders/upcoming",
        get(handlers::reminders::upcoming_visits),
    )
}
