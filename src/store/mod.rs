//! Persistence seams for seat state.
//!
//! The engine only talks to these traits. [`postgres::PgStore`] is the
//! production backend; [`memory::MemoryStore`] backs tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Event, NewSeatHolding, OrderItem, OrderItemUpdate, SeatHolding, Ticket, TicketUpdate,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    /// A write collided with the per-schedule seat uniqueness rule.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("row not found")]
    NotFound,

    #[error("store unavailable: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err
                    .constraint()
                    .map(str::to_string)
                    .unwrap_or_else(|| db_err.message().to_string());
                return StoreError::UniqueViolation(constraint);
            }
        }
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Database(other),
        }
    }
}

/// Ticket and order-item persistence.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn find_ticket_by_id(&self, id: Uuid) -> Result<Option<Ticket>, StoreError>;

    /// All tickets of one schedule, whatever their status or seat.
    async fn find_tickets_by_schedule(
        &self,
        event_id: Uuid,
        schedule_id: &str,
    ) -> Result<Vec<Ticket>, StoreError>;

    async fn begin(&self) -> Result<Box<dyn TicketTransaction>, StoreError>;
}

/// Writes that become visible together on [`commit`](Self::commit) or not
/// at all. Dropping a transaction without committing rolls it back.
#[async_trait]
pub trait TicketTransaction: Send {
    async fn update_ticket(
        &mut self,
        id: Uuid,
        update: &TicketUpdate,
    ) -> Result<Ticket, StoreError>;

    async fn update_order_item(
        &mut self,
        id: Uuid,
        update: &OrderItemUpdate,
    ) -> Result<OrderItem, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

#[async_trait]
pub trait EventDirectory: Send + Sync {
    async fn get_event(&self, id: Uuid) -> Result<Option<Event>, StoreError>;
}

/// Seat holding rows. Expiry is never swept here; callers pass `now` and
/// the store filters on it.
#[async_trait]
pub trait HoldStore: Send + Sync {
    async fn insert_hold(
        &self,
        hold: NewSeatHolding,
        now: DateTime<Utc>,
    ) -> Result<SeatHolding, StoreError>;

    async fn get_hold(&self, id: Uuid) -> Result<Option<SeatHolding>, StoreError>;

    /// Sets `closed_at` unless already set. `None` if the hold does not exist.
    async fn close_hold(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<SeatHolding>, StoreError>;

    async fn list_active_holds(
        &self,
        event_id: Uuid,
        schedule_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<SeatHolding>, StoreError>;

    /// Deletes holds closed or expired before `before`. Returns rows removed.
    async fn reap_holds(&self, before: DateTime<Utc>) -> Result<u64, StoreError>;
}
