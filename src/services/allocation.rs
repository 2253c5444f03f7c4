//! Seat assignment on tickets: administrative assign/unassign and the
//! transactional seat swap.
//!
//! Ticket and order-item rows are always written together in one
//! transaction so the order history never disagrees with the live ticket.
//! The availability check happens before the transaction opens; a writer
//! that races past it is stopped by the store's live-seat uniqueness rule,
//! which surfaces here as [`AppError::SeatConflict`] as well.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{
    normalize_seat_label, OrderItemUpdate, Ticket, TicketStatus, TicketUpdate,
};
use crate::services::availability::BookedSeatIndex;
use crate::services::catalog::SeatCatalog;
use crate::services::notify::{dispatch_reconfirmation, Notifier};
use crate::store::{EventDirectory, StoreError, TicketStore, TicketTransaction};
use crate::utils::error::AppError;

#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub ticket_id: Uuid,
    pub seat: String,
    pub event_id: Uuid,
    pub schedule_id: String,
    pub price_category_id: i32,
}

#[derive(Clone)]
pub struct AllocationEngine {
    tickets: Arc<dyn TicketStore>,
    events: Arc<dyn EventDirectory>,
    index: BookedSeatIndex,
    catalog: Arc<SeatCatalog>,
    notifier: Arc<dyn Notifier>,
}

impl AllocationEngine {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        events: Arc<dyn EventDirectory>,
        index: BookedSeatIndex,
        catalog: Arc<SeatCatalog>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            tickets,
            events,
            index,
            catalog,
            notifier,
        }
    }

    /// Writes `seat` onto the ticket, or clears it when `None` or blank.
    ///
    /// Admin-only: availability is not re-checked here, the caller is
    /// expected to have consulted the index. The store still refuses a
    /// seat another live ticket occupies.
    pub async fn assign_seat(
        &self,
        ticket_id: Uuid,
        seat: Option<&str>,
    ) -> Result<Ticket, AppError> {
        let seat = seat
            .map(normalize_seat_label)
            .filter(|label| !label.is_empty());
        let ticket = self.load_ticket(ticket_id).await?;

        if let Some(label) = &seat {
            if self.catalog.has_seat_map(ticket.event_id)
                && !self.catalog.contains(ticket.event_id, label)
            {
                return Err(AppError::ValidationError(format!(
                    "seat {label} is not part of this event's seat map"
                )));
            }
        }

        let ticket_update = TicketUpdate {
            seat: Some(seat),
            ..TicketUpdate::default()
        };
        let item_sync = ticket.order_item_id.map(|id| (id, ItemSync::Seat));

        let updated = self
            .write_atomically(ticket_id, &ticket_update, item_sync)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => {
                    AppError::NotFound(format!("Ticket '{}' was not found", ticket_id))
                }
                other => AppError::from(other),
            })?;

        info!(
            ticket_id = %ticket_id,
            from = ticket.seat.as_deref().unwrap_or("-"),
            to = updated.seat.as_deref().unwrap_or("-"),
            "Seat assignment updated"
        );
        Ok(updated)
    }

    pub async fn unassign_seat(&self, ticket_id: Uuid) -> Result<Ticket, AppError> {
        self.assign_seat(ticket_id, None).await
    }

    /// Moves a ticket to another seat, possibly on another schedule of the
    /// same event, re-pricing it from the event's own category list.
    pub async fn swap_seat(&self, request: SwapRequest) -> Result<Ticket, AppError> {
        let seat = normalize_seat_label(&request.seat);
        if seat.is_empty() {
            return Err(AppError::ValidationError("target seat is required".into()));
        }
        if request.schedule_id.trim().is_empty() {
            return Err(AppError::ValidationError("target schedule is required".into()));
        }

        // Re-read: never act on the caller's copy of the ticket.
        let ticket = self.load_ticket(request.ticket_id).await?;
        if ticket.status != TicketStatus::Booked {
            return Err(AppError::ValidationError(format!(
                "only booked tickets can change seats, this one is {}",
                ticket.status
            )));
        }
        if ticket.event_id != request.event_id {
            return Err(AppError::ValidationError(
                "a ticket can only move within its own event".into(),
            ));
        }

        let event = self
            .events
            .get_event(request.event_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Event '{}' was not found", request.event_id))
            })?;
        if event.schedule(&request.schedule_id).is_none() {
            return Err(AppError::ValidationError(format!(
                "event has no schedule '{}'",
                request.schedule_id
            )));
        }
        let category = event
            .price_category(request.price_category_id)
            .cloned()
            .ok_or_else(|| {
                AppError::ValidationError(format!(
                    "unknown price category {}",
                    request.price_category_id
                ))
            })?;

        if self.catalog.has_seat_map(event.id) {
            match self.catalog.category_of(event.id, &seat) {
                None => {
                    return Err(AppError::ValidationError(format!(
                        "seat {seat} is not part of this event's seat map"
                    )))
                }
                Some(zone) if zone != category.category => {
                    return Err(AppError::ValidationError(format!(
                        "seat {seat} belongs to {zone}, not {}",
                        category.category
                    )))
                }
                Some(_) => {}
            }
        }

        let unavailable = self
            .index
            .unavailable_seats(event.id, &request.schedule_id)
            .await?;
        let own_seat = ticket.event_schedule_id == request.schedule_id
            && ticket.seat.as_deref().map(normalize_seat_label).as_deref() == Some(seat.as_str());
        if unavailable.contains(&seat) && !own_seat {
            warn!(
                ticket_id = %ticket.id,
                seat = %seat,
                schedule_id = %request.schedule_id,
                "Swap target is booked or held"
            );
            return Err(AppError::SeatConflict(format!(
                "seat {seat} is unavailable on schedule {}",
                request.schedule_id
            )));
        }

        let reprice = ticket.ticket_price_id != Some(category.id);
        let ticket_update = TicketUpdate {
            seat: Some(Some(seat.clone())),
            event_schedule_id: Some(request.schedule_id.clone()),
            price: reprice.then(|| category.clone()),
        };
        let item_sync = ticket.order_item_id.map(|id| (id, ItemSync::SeatAndPrice));

        let updated = self
            .write_atomically(ticket.id, &ticket_update, item_sync)
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(detail) => {
                    warn!(ticket_id = %ticket.id, seat = %seat, "Swap lost a race for the seat");
                    AppError::SeatConflict(detail)
                }
                other => AppError::SwapFailed(other.to_string()),
            })?;

        info!(
            ticket_id = %updated.id,
            from_seat = ticket.seat.as_deref().unwrap_or("-"),
            from_schedule = %ticket.event_schedule_id,
            to_seat = %seat,
            to_schedule = %request.schedule_id,
            repriced = reprice,
            "Seat swapped"
        );

        if updated.attendee_email.is_some() {
            dispatch_reconfirmation(Arc::clone(&self.notifier), updated.clone(), event);
        }

        Ok(updated)
    }

    async fn load_ticket(&self, ticket_id: Uuid) -> Result<Ticket, AppError> {
        self.tickets
            .find_ticket_by_id(ticket_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' was not found", ticket_id)))
    }

    /// Applies both writes inside one transaction. Nothing is visible
    /// unless both succeed and the commit goes through.
    async fn write_atomically(
        &self,
        ticket_id: Uuid,
        ticket_update: &TicketUpdate,
        item_sync: Option<(Uuid, ItemSync)>,
    ) -> Result<Ticket, StoreError> {
        let mut tx = self.tickets.begin().await?;

        match apply_writes(tx.as_mut(), ticket_id, ticket_update, item_sync).await {
            Ok(ticket) => {
                tx.commit().await?;
                Ok(ticket)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(
                        ticket_id = %ticket_id,
                        error = %rollback_err,
                        "Rollback failed after seat write error"
                    );
                }
                Err(e)
            }
        }
    }
}

/// Which ticket fields the order item is brought in line with.
#[derive(Debug, Clone, Copy)]
enum ItemSync {
    Seat,
    SeatAndPrice,
}

/// Order item fields are copied from the ticket row as written.
async fn apply_writes(
    tx: &mut dyn TicketTransaction,
    ticket_id: Uuid,
    ticket_update: &TicketUpdate,
    item_sync: Option<(Uuid, ItemSync)>,
) -> Result<Ticket, StoreError> {
    let ticket = tx.update_ticket(ticket_id, ticket_update).await?;
    if let Some((item_id, sync)) = item_sync {
        let update = match sync {
            ItemSync::Seat => OrderItemUpdate::seat_of(&ticket),
            ItemSync::SeatAndPrice => OrderItemUpdate::mirroring(&ticket),
        };
        tx.update_order_item(item_id, &update).await?;
    }
    Ok(ticket)
}
