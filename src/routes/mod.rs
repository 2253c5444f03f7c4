use axum::routing::{get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::create_cors_layer;
use crate::handlers::{health_check, holds, seats, tickets};
use crate::state::AppState;

pub fn create_routes(state: AppState, cors_allowed_origins: &str) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/events/:event_id/schedules/:schedule_id/unavailable-seats",
            get(seats::unavailable_seats),
        )
        .route(
            "/events/:event_id/schedules/:schedule_id/seat-map",
            get(seats::seat_map),
        )
        .route(
            "/events/:event_id/schedules/:schedule_id/holds",
            get(holds::list_active_holds),
        )
        .route("/holds", post(holds::create_hold))
        .route("/holds/:hold_id", get(holds::get_hold))
        .route("/holds/:hold_id/close", post(holds::close_hold))
        .route(
            "/tickets/:ticket_id/seat",
            put(tickets::assign_seat).delete(tickets::unassign_seat),
        )
        .route("/tickets/:ticket_id/swap", post(tickets::swap_seat))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_allowed_origins)),
        )
        .with_state(state)
}
