use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Temporary claim on seats during checkout, before any order exists.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SeatHolding {
    pub id: Uuid,
    pub seats: Vec<String>,
    pub event_id: Uuid,
    pub schedule_id: String,
    pub code: String,
    pub user_info: Json<serde_json::Value>,
    pub expire_time: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SeatHolding {
    /// A hold counts toward unavailability only while open and unexpired.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.closed_at.is_none() && self.expire_time > now
    }
}

/// Everything needed to insert a hold row.
#[derive(Debug, Clone)]
pub struct NewSeatHolding {
    pub seats: Vec<String>,
    pub event_id: Uuid,
    pub schedule_id: String,
    pub code: String,
    pub user_info: serde_json::Value,
    pub expire_time: DateTime<Utc>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}
