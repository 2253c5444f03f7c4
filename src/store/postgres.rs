use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{EventDirectory, HoldStore, StoreError, TicketStore, TicketTransaction};
use crate::models::{
    Event, NewSeatHolding, OrderItem, OrderItemUpdate, SeatHolding, Ticket, TicketUpdate,
};

/// Postgres-backed implementation of every store trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.pool).await
    }
}

#[async_trait]
impl TicketStore for PgStore {
    async fn find_ticket_by_id(&self, id: Uuid) -> Result<Option<Ticket>, StoreError> {
        let ticket = sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(ticket)
    }

    async fn find_tickets_by_schedule(
        &self,
        event_id: Uuid,
        schedule_id: &str,
    ) -> Result<Vec<Ticket>, StoreError> {
        let tickets = sqlx::query_as::<_, Ticket>(
            "SELECT * FROM tickets WHERE event_id = $1 AND event_schedule_id = $2",
        )
        .bind(event_id)
        .bind(schedule_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tickets)
    }

    async fn begin(&self) -> Result<Box<dyn TicketTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTicketTransaction { tx }))
    }
}

pub struct PgTicketTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TicketTransaction for PgTicketTransaction {
    async fn update_ticket(
        &mut self,
        id: Uuid,
        update: &TicketUpdate,
    ) -> Result<Ticket, StoreError> {
        let price = update.price.as_ref();
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET seat = CASE WHEN $2 THEN $3 ELSE seat END,
                event_schedule_id = COALESCE($4, event_schedule_id),
                ticket_price_id = CASE WHEN $5 THEN $6 ELSE ticket_price_id END,
                ticket_price_name = CASE WHEN $5 THEN $7 ELSE ticket_price_name END,
                ticket_price = CASE WHEN $5 THEN $8 ELSE ticket_price END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.seat.is_some())
        .bind(update.seat.clone().flatten())
        .bind(update.event_schedule_id.as_deref())
        .bind(price.is_some())
        .bind(price.map(|p| p.id))
        .bind(price.map(|p| p.name.clone()))
        .bind(price.map(|p| Json(p.clone())))
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(StoreError::NotFound)?;
        Ok(ticket)
    }

    async fn update_order_item(
        &mut self,
        id: Uuid,
        update: &OrderItemUpdate,
    ) -> Result<OrderItem, StoreError> {
        let item = sqlx::query_as::<_, OrderItem>(
            r#"
            UPDATE order_items
            SET seat = CASE WHEN $2 THEN $3 ELSE seat END,
                ticket_price_id = COALESCE($4, ticket_price_id),
                ticket_price_name = COALESCE($5, ticket_price_name),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.seat.is_some())
        .bind(update.seat.clone().flatten())
        .bind(update.ticket_price_id)
        .bind(update.ticket_price_name.as_deref())
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(StoreError::NotFound)?;
        Ok(item)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl EventDirectory for PgStore {
    async fn get_event(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }
}

#[async_trait]
impl HoldStore for PgStore {
    async fn insert_hold(
        &self,
        hold: NewSeatHolding,
        now: DateTime<Utc>,
    ) -> Result<SeatHolding, StoreError> {
        let holding = sqlx::query_as::<_, SeatHolding>(
            r#"
            INSERT INTO seat_holdings
                (id, seats, event_id, schedule_id, code, user_info,
                 expire_time, ip, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&hold.seats)
        .bind(hold.event_id)
        .bind(&hold.schedule_id)
        .bind(&hold.code)
        .bind(Json(hold.user_info.clone()))
        .bind(hold.expire_time)
        .bind(hold.ip.as_deref())
        .bind(hold.user_agent.as_deref())
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(holding)
    }

    async fn get_hold(&self, id: Uuid) -> Result<Option<SeatHolding>, StoreError> {
        let holding =
            sqlx::query_as::<_, SeatHolding>("SELECT * FROM seat_holdings WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(holding)
    }

    async fn close_hold(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<SeatHolding>, StoreError> {
        let holding = sqlx::query_as::<_, SeatHolding>(
            r#"
            UPDATE seat_holdings
            SET closed_at = COALESCE(closed_at, $2)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(holding)
    }

    async fn list_active_holds(
        &self,
        event_id: Uuid,
        schedule_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<SeatHolding>, StoreError> {
        let holdings = sqlx::query_as::<_, SeatHolding>(
            r#"
            SELECT * FROM seat_holdings
            WHERE event_id = $1
              AND schedule_id = $2
              AND closed_at IS NULL
              AND expire_time > $3
            "#,
        )
        .bind(event_id)
        .bind(schedule_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(holdings)
    }

    async fn reap_holds(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM seat_holdings WHERE closed_at < $1 OR expire_time < $1",
        )
        .bind(before)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
