use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::Ticket;

/// Order line a ticket was minted from. Keeps its own copy of the seat and
/// price name so order history survives later ticket edits.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub seat: Option<String>,
    pub ticket_price_id: Option<i32>,
    pub ticket_price_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderItemUpdate {
    pub seat: Option<Option<String>>,
    pub ticket_price_id: Option<i32>,
    pub ticket_price_name: Option<String>,
}

impl OrderItemUpdate {
    /// Copies the ticket's seat onto its order item.
    pub fn seat_of(ticket: &Ticket) -> Self {
        Self {
            seat: Some(ticket.seat.clone()),
            ..Self::default()
        }
    }

    /// Copies the ticket's seat and price snapshot, as written, onto its
    /// order item.
    pub fn mirroring(ticket: &Ticket) -> Self {
        Self {
            seat: Some(ticket.seat.clone()),
            ticket_price_id: ticket.ticket_price_id,
            ticket_price_name: ticket.ticket_price_name.clone(),
        }
    }

    pub fn apply(&self, item: &mut OrderItem, now: DateTime<Utc>) {
        if let Some(seat) = &self.seat {
            item.seat = seat.clone();
        }
        if let Some(id) = self.ticket_price_id {
            item.ticket_price_id = Some(id);
        }
        if let Some(name) = &self.ticket_price_name {
            item.ticket_price_name = Some(name.clone());
        }
        item.updated_at = now;
    }
}
