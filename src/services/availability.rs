//! The booked-seat index: the one place that decides which seats of a
//! performance are off the table.
//!
//! A seat is unavailable when a live ticket sits on it (booked, awaiting
//! payment, or a hold-status ticket) or when an active seat holding claims
//! it. Nothing is cached; every call reads the stores again.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::models::normalize_seat_label;
use crate::services::catalog::SeatCatalog;
use crate::store::{HoldStore, StoreError, TicketStore};
use crate::utils::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatState {
    Free,
    Held,
    Booked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatAvailability {
    pub label: String,
    /// Zone from the seat catalog; `None` for seats sold outside the map.
    pub category: Option<String>,
    pub state: SeatState,
}

#[derive(Clone)]
pub struct BookedSeatIndex {
    tickets: Arc<dyn TicketStore>,
    holds: Arc<dyn HoldStore>,
    catalog: Arc<SeatCatalog>,
    clock: Arc<dyn Clock>,
}

impl BookedSeatIndex {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        holds: Arc<dyn HoldStore>,
        catalog: Arc<SeatCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tickets,
            holds,
            catalog,
            clock,
        }
    }

    /// Normalised labels that a new booking or swap must not target.
    ///
    /// Any store failure is returned to the caller, which must then treat
    /// the seat as unavailable.
    pub async fn unavailable_seats(
        &self,
        event_id: Uuid,
        schedule_id: &str,
    ) -> Result<BTreeSet<String>, AppError> {
        let mut unavailable = self.booked_seats(event_id, schedule_id).await?;
        unavailable.extend(self.held_seats(event_id, schedule_id).await?);

        debug!(
            event_id = %event_id,
            schedule_id,
            unavailable = unavailable.len(),
            "Computed unavailable seats"
        );
        Ok(unavailable)
    }

    /// Per-seat state for display. A failing hold store degrades to "no
    /// holds" instead of failing the request.
    pub async fn seat_map(
        &self,
        event_id: Uuid,
        schedule_id: &str,
    ) -> Result<Vec<SeatAvailability>, AppError> {
        let booked = self.booked_seats(event_id, schedule_id).await?;
        let held = match self.held_seats(event_id, schedule_id).await {
            Ok(held) => held,
            Err(e) => {
                warn!(
                    event_id = %event_id,
                    schedule_id,
                    error = %e,
                    "Hold store unavailable, showing seat map without holds"
                );
                BTreeSet::new()
            }
        };

        let state_of = |label: &str| {
            if booked.contains(label) {
                SeatState::Booked
            } else if held.contains(label) {
                SeatState::Held
            } else {
                SeatState::Free
            }
        };

        let mut seats: Vec<SeatAvailability> = self
            .catalog
            .seats_for(event_id)
            .iter()
            .map(|entry| SeatAvailability {
                label: entry.label.clone(),
                category: Some(entry.category.clone()),
                state: state_of(&entry.label),
            })
            .collect();

        // Seats sold before (or without) a seat map still show up.
        let off_map = booked
            .iter()
            .chain(held.iter())
            .filter(|label| !self.catalog.contains(event_id, label))
            .collect::<BTreeSet<_>>();
        seats.extend(off_map.into_iter().map(|label| SeatAvailability {
            label: label.clone(),
            category: None,
            state: state_of(label),
        }));

        Ok(seats)
    }

    async fn booked_seats(
        &self,
        event_id: Uuid,
        schedule_id: &str,
    ) -> Result<BTreeSet<String>, StoreError> {
        let tickets = self
            .tickets
            .find_tickets_by_schedule(event_id, schedule_id)
            .await?;
        Ok(tickets
            .iter()
            .filter_map(|ticket| ticket.occupied_seat())
            .map(normalize_seat_label)
            .filter(|label| !label.is_empty())
            .collect())
    }

    async fn held_seats(
        &self,
        event_id: Uuid,
        schedule_id: &str,
    ) -> Result<BTreeSet<String>, StoreError> {
        let holds = self
            .holds
            .list_active_holds(event_id, schedule_id, self.clock.now())
            .await?;
        Ok(holds
            .iter()
            .flat_map(|hold| hold.seats.iter())
            .map(|label| normalize_seat_label(label))
            .filter(|label| !label.is_empty())
            .collect())
    }
}
