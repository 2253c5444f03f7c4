use std::collections::BTreeSet;

use axum::extract::{Path, State};
use axum::response::Response;
use serde::Serialize;
use uuid::Uuid;

use crate::services::SeatAvailability;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Serialize)]
struct UnavailableSeats {
    event_id: Uuid,
    schedule_id: String,
    seats: BTreeSet<String>,
}

#[derive(Serialize)]
struct SeatMap {
    event_id: Uuid,
    schedule_id: String,
    seats: Vec<SeatAvailability>,
}

pub async fn unavailable_seats(
    State(state): State<AppState>,
    Path((event_id, schedule_id)): Path<(Uuid, String)>,
) -> Result<Response, AppError> {
    let seats = state.index.unavailable_seats(event_id, &schedule_id).await?;
    Ok(success(
        UnavailableSeats {
            event_id,
            schedule_id,
            seats,
        },
        "Unavailable seats loaded",
    ))
}

pub async fn seat_map(
    State(state): State<AppState>,
    Path((event_id, schedule_id)): Path<(Uuid, String)>,
) -> Result<Response, AppError> {
    let seats = state.index.seat_map(event_id, &schedule_id).await?;
    Ok(success(
        SeatMap {
            event_id,
            schedule_id,
            seats,
        },
        "Seat map loaded",
    ))
}
