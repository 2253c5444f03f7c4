use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgTypeInfo, PgValueRef};
use sqlx::types::Json;
use sqlx::{Decode, FromRow, Postgres, Type};
use thiserror::Error;
use uuid::Uuid;

use super::event::PriceCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Booked,
    PendingPayment,
    Hold,
    Cancelled,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Booked => "booked",
            TicketStatus::PendingPayment => "pending_payment",
            TicketStatus::Hold => "hold",
            TicketStatus::Cancelled => "cancelled",
        }
    }

    /// Whether a ticket in this status keeps its seat out of circulation.
    pub fn occupies_seat(&self) -> bool {
        !matches!(self, TicketStatus::Cancelled)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown ticket status '{0}'")]
pub struct UnknownTicketStatus(pub String);

impl FromStr for TicketStatus {
    type Err = UnknownTicketStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booked" => Ok(TicketStatus::Booked),
            "pending_payment" => Ok(TicketStatus::PendingPayment),
            "hold" => Ok(TicketStatus::Hold),
            "cancelled" => Ok(TicketStatus::Cancelled),
            other => Err(UnknownTicketStatus(other.to_string())),
        }
    }
}

// Stored as plain TEXT guarded by a CHECK constraint.
impl Type<Postgres> for TicketStatus {
    fn type_info() -> PgTypeInfo {
        <&str as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <&str as Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for TicketStatus {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let raw = <&str as Decode<Postgres>>::decode(value)?;
        Ok(raw.parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub event_id: Uuid,
    pub event_schedule_id: String,
    pub seat: Option<String>,
    /// Price snapshot taken at sale time. Only the allocation engine
    /// rewrites these three fields.
    pub ticket_price_id: Option<i32>,
    pub ticket_price_name: Option<String>,
    pub ticket_price: Option<Json<PriceCategory>>,
    pub status: TicketStatus,
    pub attendee_name: Option<String>,
    pub attendee_email: Option<String>,
    pub order_item_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Non-null, non-cancelled seat this ticket keeps unavailable.
    pub fn occupied_seat(&self) -> Option<&str> {
        if self.status.occupies_seat() {
            self.seat.as_deref()
        } else {
            None
        }
    }
}

/// Fields the allocation engine is allowed to write on a ticket.
/// `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketUpdate {
    pub seat: Option<Option<String>>,
    pub event_schedule_id: Option<String>,
    pub price: Option<PriceCategory>,
}

impl TicketUpdate {
    pub fn apply(&self, ticket: &mut Ticket, now: DateTime<Utc>) {
        if let Some(seat) = &self.seat {
            ticket.seat = seat.clone();
        }
        if let Some(schedule_id) = &self.event_schedule_id {
            ticket.event_schedule_id = schedule_id.clone();
        }
        if let Some(price) = &self.price {
            ticket.ticket_price_id = Some(price.id);
            ticket.ticket_price_name = Some(price.name.clone());
            ticket.ticket_price = Some(Json(price.clone()));
        }
        ticket.updated_at = now;
    }
}
