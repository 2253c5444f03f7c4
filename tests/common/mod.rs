#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use seating_server::clock::ManualClock;
use seating_server::config::HoldConfig;
use seating_server::models::{
    Event, OrderItem, PriceCategory, Schedule, Ticket, TicketStatus,
};
use seating_server::services::{NotificationError, Notifier, SeatCatalog};
use seating_server::state::AppState;
use seating_server::store::MemoryStore;
use sqlx::types::Json;
use tokio::sync::mpsc;
use uuid::Uuid;

pub const EVENT_ID: &str = "0b7a5e1c-3f0d-4a55-9a6e-2a8f4c9d1e01";
pub const ZONE1_ID: i32 = 1;
pub const ZONE2_ID: i32 = 2;

pub fn event_id() -> Uuid {
    EVENT_ID.parse().unwrap()
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

pub fn zone1() -> PriceCategory {
    PriceCategory {
        id: ZONE1_ID,
        name: "Stalls".to_string(),
        price: Decimal::new(6000, 2),
        category: "zone1".to_string(),
    }
}

pub fn zone2() -> PriceCategory {
    PriceCategory {
        id: ZONE2_ID,
        name: "Balcony".to_string(),
        price: Decimal::new(4500, 2),
        category: "zone2".to_string(),
    }
}

pub fn event() -> Event {
    Event {
        id: event_id(),
        title: "Winter Gala".to_string(),
        schedules: Json(vec![
            Schedule {
                id: "S1".to_string(),
                date: start_time(),
            },
            Schedule {
                id: "S2".to_string(),
                date: start_time() + chrono::Duration::days(1),
            },
        ]),
        price_categories: Json(vec![zone1(), zone2()]),
        created_at: start_time(),
        updated_at: start_time(),
    }
}

pub fn catalog() -> SeatCatalog {
    SeatCatalog::from_json(&format!(
        r#"{{"events": [{{"event_id": "{EVENT_ID}", "zones": [
            {{"category": "zone1", "seats": ["A1", "B5", "C1"], "rows": [{{"row": "D", "from": 1, "to": 10}}]}},
            {{"category": "zone2", "seats": ["A2"], "rows": [{{"row": "E", "from": 1, "to": 10}}]}}
        ]}}]}}"#
    ))
    .unwrap()
}

/// Records which tickets a reconfirmation was sent for.
#[derive(Clone)]
pub struct RecordingNotifier {
    sent: mpsc::UnboundedSender<Uuid>,
}

impl RecordingNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Uuid>) {
        let (sent, received) = mpsc::unbounded_channel();
        (Self { sent }, received)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_reconfirmation(
        &self,
        ticket: &Ticket,
        _event: &Event,
    ) -> Result<(), NotificationError> {
        self.sent
            .send(ticket.id)
            .map_err(|e| NotificationError::Delivery(e.to_string()))
    }
}

/// A mail relay that is always down.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send_reconfirmation(
        &self,
        _ticket: &Ticket,
        _event: &Event,
    ) -> Result<(), NotificationError> {
        Err(NotificationError::Delivery("smtp relay refused".to_string()))
    }
}

pub struct Harness {
    pub store: MemoryStore,
    pub clock: ManualClock,
    pub state: AppState,
    pub notifications: mpsc::UnboundedReceiver<Uuid>,
}

pub fn harness() -> Harness {
    harness_with(HoldConfig::default())
}

pub fn harness_with(hold_config: HoldConfig) -> Harness {
    let store = MemoryStore::new();
    store.insert_event(event()).unwrap();
    let clock = ManualClock::new(start_time());
    let (notifier, notifications) = RecordingNotifier::new();
    let state = AppState::new(
        Arc::new(store.clone()),
        catalog(),
        Arc::new(clock.clone()),
        Arc::new(notifier),
        hold_config,
    );
    Harness {
        store,
        clock,
        state,
        notifications,
    }
}

/// Seeds a booked ticket (with its order item) on schedule S1.
pub fn booked_ticket(store: &MemoryStore, seat: &str, category: &PriceCategory) -> Ticket {
    ticket_with_status(store, "S1", Some(seat), category, TicketStatus::Booked)
}

pub fn ticket_with_status(
    store: &MemoryStore,
    schedule_id: &str,
    seat: Option<&str>,
    category: &PriceCategory,
    status: TicketStatus,
) -> Ticket {
    let item = OrderItem {
        id: Uuid::new_v4(),
        order_id: Uuid::new_v4(),
        seat: seat.map(str::to_string),
        ticket_price_id: Some(category.id),
        ticket_price_name: Some(category.name.clone()),
        created_at: start_time(),
        updated_at: start_time(),
    };
    let ticket = Ticket {
        id: Uuid::new_v4(),
        event_id: event_id(),
        event_schedule_id: schedule_id.to_string(),
        seat: seat.map(str::to_string),
        ticket_price_id: Some(category.id),
        ticket_price_name: Some(category.name.clone()),
        ticket_price: Some(Json(category.clone())),
        status,
        attendee_name: Some("Grace Hopper".to_string()),
        attendee_email: Some("grace@example.com".to_string()),
        order_item_id: Some(item.id),
        user_id: None,
        created_at: start_time(),
        updated_at: start_time(),
    };
    store.insert_order_item(item).unwrap();
    store.insert_ticket(ticket.clone()).unwrap();
    ticket
}
