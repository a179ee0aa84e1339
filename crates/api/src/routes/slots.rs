use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/providers/:provider_id/slots",
            get(handlers::slots::list_slots).post(handlers::slots::create_slot),
        )
        .route(
            "/api/providers/:provider_id/slots/grid",
            post(handlers::slots::create_grid),
        )
        .route(
            "/api/slots/:slot_id",
            get(handlers::slots::get_slot)
                .patch(handlers::slots::reschedule_slot)
                .delete(handlers::slots::delete_slot),
        )
        .route("/api/slots/:slot_id/claim", post(handlers::slots::claim_slot))
}
