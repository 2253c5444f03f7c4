use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::services::SwapRequest;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Deserialize)]
pub struct AssignSeatBody {
    /// `null` clears the assignment.
    pub seat: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SwapSeatBody {
    pub seat: String,
    pub event_id: Uuid,
    pub schedule_id: String,
    pub price_category_id: i32,
}

pub async fn assign_seat(
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<AssignSeatBody>,
) -> Result<Response, AppError> {
    let ticket = state
        .allocation
        .assign_seat(ticket_id, body.seat.as_deref())
        .await?;
    Ok(success(ticket, "Seat assignment updated"))
}

pub async fn unassign_seat(
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let ticket = state.allocation.unassign_seat(ticket_id).await?;
    Ok(success(ticket, "Seat released"))
}

pub async fn swap_seat(
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<SwapSeatBody>,
) -> Result<Response, AppError> {
    let ticket = state
        .allocation
        .swap_seat(SwapRequest {
            ticket_id,
            seat: body.seat,
            event_id: body.event_id,
            schedule_id: body.schedule_id,
            price_category_id: body.price_category_id,
        })
        .await?;
    Ok(success(ticket, "Seat swapped"))
}
