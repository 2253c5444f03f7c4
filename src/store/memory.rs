//! In-process store used by tests and `STORE_BACKEND=memory`.
//!
//! Transactions stage their writes and apply them under the state lock on
//! commit. The live-seat uniqueness rule is checked both when a write is
//! staged and again at commit, mirroring the partial unique index in the
//! Postgres schema.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::types::Json;
use uuid::Uuid;

use super::{EventDirectory, HoldStore, StoreError, TicketStore, TicketTransaction};
use crate::models::{
    normalize_seat_label, Event, NewSeatHolding, OrderItem, OrderItemUpdate, SeatHolding, Ticket,
    TicketUpdate,
};

#[derive(Debug, Default)]
struct MemoryState {
    events: HashMap<Uuid, Event>,
    tickets: HashMap<Uuid, Ticket>,
    order_items: HashMap<Uuid, OrderItem>,
    holds: HashMap<Uuid, SeatHolding>,
}

#[derive(Debug, Default)]
struct Faults {
    order_item_updates: AtomicBool,
    hold_queries: AtomicBool,
}

/// Fixture file accepted by [`MemoryStore::from_seed_file`].
#[derive(Debug, Default, Deserialize)]
pub struct MemorySeed {
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    #[serde(default)]
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Faults>,
}

fn lock(state: &Mutex<MemoryState>) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
    state
        .lock()
        .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
}

/// Does `candidate` claim a seat some other live ticket already occupies?
fn seat_collision<'a>(
    candidate: &Ticket,
    others: impl IntoIterator<Item = &'a Ticket>,
) -> Option<Uuid> {
    let seat = normalize_seat_label(candidate.occupied_seat()?);
    others
        .into_iter()
        .filter(|other| other.id != candidate.id)
        .filter(|other| {
            other.event_id == candidate.event_id
                && other.event_schedule_id == candidate.event_schedule_id
        })
        .find(|other| {
            other
                .occupied_seat()
                .is_some_and(|s| normalize_seat_label(s) == seat)
        })
        .map(|other| other.id)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: MemorySeed) -> Result<Self, StoreError> {
        let store = Self::new();
        for event in seed.events {
            store.insert_event(event)?;
        }
        for item in seed.order_items {
            store.insert_order_item(item)?;
        }
        for ticket in seed.tickets {
            store.insert_ticket(ticket)?;
        }
        Ok(store)
    }

    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Backend(format!("reading {}: {e}", path.display())))?;
        let seed: MemorySeed = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Backend(format!("parsing {}: {e}", path.display())))?;
        Self::from_seed(seed)
    }

    pub fn insert_event(&self, event: Event) -> Result<(), StoreError> {
        lock(&self.state)?.events.insert(event.id, event);
        Ok(())
    }

    pub fn insert_order_item(&self, item: OrderItem) -> Result<(), StoreError> {
        lock(&self.state)?.order_items.insert(item.id, item);
        Ok(())
    }

    /// Inserts a ticket, refusing a seat already taken on the same schedule.
    pub fn insert_ticket(&self, ticket: Ticket) -> Result<(), StoreError> {
        let mut state = lock(&self.state)?;
        if let Some(holder) = seat_collision(&ticket, state.tickets.values()) {
            return Err(StoreError::UniqueViolation(format!(
                "seat already held by ticket {holder}"
            )));
        }
        state.tickets.insert(ticket.id, ticket);
        Ok(())
    }

    pub fn ticket(&self, id: Uuid) -> Option<Ticket> {
        lock(&self.state).ok()?.tickets.get(&id).cloned()
    }

    pub fn order_item(&self, id: Uuid) -> Option<OrderItem> {
        lock(&self.state).ok()?.order_items.get(&id).cloned()
    }

    pub fn tickets(&self) -> Vec<Ticket> {
        lock(&self.state)
            .map(|state| state.tickets.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn hold_count(&self) -> usize {
        lock(&self.state).map(|state| state.holds.len()).unwrap_or(0)
    }

    /// Makes every subsequent order-item update fail.
    pub fn fail_order_item_updates(&self, fail: bool) {
        self.faults.order_item_updates.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent hold read fail, as if the store were down.
    pub fn fail_hold_queries(&self, fail: bool) {
        self.faults.hold_queries.store(fail, Ordering::SeqCst);
    }

    fn check_hold_faults(&self) -> Result<(), StoreError> {
        if self.faults.hold_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("hold store unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn find_ticket_by_id(&self, id: Uuid) -> Result<Option<Ticket>, StoreError> {
        Ok(lock(&self.state)?.tickets.get(&id).cloned())
    }

    async fn find_tickets_by_schedule(
        &self,
        event_id: Uuid,
        schedule_id: &str,
    ) -> Result<Vec<Ticket>, StoreError> {
        let state = lock(&self.state)?;
        Ok(state
            .tickets
            .values()
            .filter(|t| t.event_id == event_id && t.event_schedule_id == schedule_id)
            .cloned()
            .collect())
    }

    async fn begin(&self) -> Result<Box<dyn TicketTransaction>, StoreError> {
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            faults: Arc::clone(&self.faults),
            tickets: HashMap::new(),
            order_items: HashMap::new(),
        }))
    }
}

pub struct MemoryTransaction {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Faults>,
    tickets: HashMap<Uuid, Ticket>,
    order_items: HashMap<Uuid, OrderItem>,
}

#[async_trait]
impl TicketTransaction for MemoryTransaction {
    async fn update_ticket(
        &mut self,
        id: Uuid,
        update: &TicketUpdate,
    ) -> Result<Ticket, StoreError> {
        let state = lock(&self.state)?;
        let mut ticket = match self.tickets.get(&id) {
            Some(staged) => staged.clone(),
            None => state.tickets.get(&id).cloned().ok_or(StoreError::NotFound)?,
        };
        update.apply(&mut ticket, Utc::now());

        let visible = state
            .tickets
            .values()
            .filter(|t| !self.tickets.contains_key(&t.id))
            .chain(self.tickets.values());
        if let Some(holder) = seat_collision(&ticket, visible) {
            return Err(StoreError::UniqueViolation(format!(
                "seat already held by ticket {holder}"
            )));
        }
        drop(state);

        self.tickets.insert(id, ticket.clone());
        Ok(ticket)
    }

    async fn update_order_item(
        &mut self,
        id: Uuid,
        update: &OrderItemUpdate,
    ) -> Result<OrderItem, StoreError> {
        if self.faults.order_item_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(
                "order item update rejected by store".to_string(),
            ));
        }
        let mut item = match self.order_items.get(&id) {
            Some(staged) => staged.clone(),
            None => lock(&self.state)?
                .order_items
                .get(&id)
                .cloned()
                .ok_or(StoreError::NotFound)?,
        };
        update.apply(&mut item, Utc::now());
        self.order_items.insert(id, item.clone());
        Ok(item)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let shared = Arc::clone(&self.state);
        let mut state = lock(&shared)?;
        // Another transaction may have committed since our writes were staged.
        for ticket in self.tickets.values() {
            let others = state
                .tickets
                .values()
                .filter(|t| !self.tickets.contains_key(&t.id))
                .chain(self.tickets.values());
            if let Some(holder) = seat_collision(ticket, others) {
                return Err(StoreError::UniqueViolation(format!(
                    "seat already held by ticket {holder}"
                )));
            }
        }
        let MemoryTransaction {
            tickets,
            order_items,
            ..
        } = *self;
        state.tickets.extend(tickets);
        state.order_items.extend(order_items);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl EventDirectory for MemoryStore {
    async fn get_event(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        Ok(lock(&self.state)?.events.get(&id).cloned())
    }
}

#[async_trait]
impl HoldStore for MemoryStore {
    async fn insert_hold(
        &self,
        hold: NewSeatHolding,
        now: DateTime<Utc>,
    ) -> Result<SeatHolding, StoreError> {
        self.check_hold_faults()?;
        let holding = SeatHolding {
            id: Uuid::new_v4(),
            seats: hold.seats,
            event_id: hold.event_id,
            schedule_id: hold.schedule_id,
            code: hold.code,
            user_info: Json(hold.user_info),
            expire_time: hold.expire_time,
            closed_at: None,
            ip: hold.ip,
            user_agent: hold.user_agent,
            created_at: now,
        };
        lock(&self.state)?
            .holds
            .insert(holding.id, holding.clone());
        Ok(holding)
    }

    async fn get_hold(&self, id: Uuid) -> Result<Option<SeatHolding>, StoreError> {
        self.check_hold_faults()?;
        Ok(lock(&self.state)?.holds.get(&id).cloned())
    }

    async fn close_hold(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<SeatHolding>, StoreError> {
        self.check_hold_faults()?;
        let mut state = lock(&self.state)?;
        Ok(state.holds.get_mut(&id).map(|holding| {
            holding.closed_at.get_or_insert(now);
            holding.clone()
        }))
    }

    async fn list_active_holds(
        &self,
        event_id: Uuid,
        schedule_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<SeatHolding>, StoreError> {
        self.check_hold_faults()?;
        let state = lock(&self.state)?;
        Ok(state
            .holds
            .values()
            .filter(|h| h.event_id == event_id && h.schedule_id == schedule_id)
            .filter(|h| h.is_active(now))
            .cloned()
            .collect())
    }

    async fn reap_holds(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        self.check_hold_faults()?;
        let mut state = lock(&self.state)?;
        let initial = state.holds.len();
        state.holds.retain(|_, h| {
            let closed_early = h.closed_at.is_some_and(|closed| closed < before);
            !(closed_early || h.expire_time < before)
        });
        Ok((initial - state.holds.len()) as u64)
    }
}
