use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::SeatList;
use crate::services::CreateHold;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Debug, Deserialize)]
pub struct CreateHoldBody {
    pub event_id: Uuid,
    pub schedule_id: String,
    pub seats: SeatList,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub user_info: serde_json::Value,
    pub ttl_seconds: Option<i64>,
}

/// First hop of `X-Forwarded-For`, else `X-Real-IP`. Diagnostic only.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    forwarded
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(str::to_string)
}

pub async fn create_hold(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateHoldBody>,
) -> Result<Response, AppError> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let holding = state
        .holds
        .create_hold(CreateHold {
            event_id: body.event_id,
            schedule_id: body.schedule_id,
            seats: body.seats.into_labels(),
            code: body.code,
            user_info: body.user_info,
            ttl_secs: body.ttl_seconds,
            ip: client_ip(&headers),
            user_agent,
        })
        .await?;

    Ok(created(holding, "Seats held"))
}

pub async fn list_active_holds(
    State(state): State<AppState>,
    Path((event_id, schedule_id)): Path<(Uuid, String)>,
) -> Result<Response, AppError> {
    let holdings = state
        .holds
        .list_active_holds(event_id, &schedule_id)
        .await?;
    Ok(success(holdings, "Active seat holds loaded"))
}

pub async fn get_hold(
    State(state): State<AppState>,
    Path(hold_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let holding = state.holds.get_hold(hold_id).await?;
    Ok(success(holding, "Seat hold loaded"))
}

pub async fn close_hold(
    State(state): State<AppState>,
    Path(hold_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let holding = state.holds.close_hold(hold_id).await?;
    Ok(success(holding, "Seat hold closed"))
}
