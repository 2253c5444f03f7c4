//! Seat-change notifications. Delivery is best effort: a failure is
//! logged and never reaches the caller of the seat operation.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::models::{Event, Ticket};

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("ticket {0} has no recipient email")]
    NoRecipient(uuid::Uuid),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Re-sends the ticket confirmation after its seat changed.
    async fn send_reconfirmation(
        &self,
        ticket: &Ticket,
        event: &Event,
    ) -> Result<(), NotificationError>;
}

/// Writes notifications to the log instead of sending mail.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_reconfirmation(
        &self,
        ticket: &Ticket,
        event: &Event,
    ) -> Result<(), NotificationError> {
        let recipient = ticket
            .attendee_email
            .as_deref()
            .ok_or(NotificationError::NoRecipient(ticket.id))?;
        info!(
            ticket_id = %ticket.id,
            recipient,
            event = %event.title,
            seat = ticket.seat.as_deref().unwrap_or("-"),
            "Reconfirmation email queued"
        );
        Ok(())
    }
}

/// Fire-and-forget delivery on a background task.
pub fn dispatch_reconfirmation(
    notifier: Arc<dyn Notifier>,
    ticket: Ticket,
    event: Event,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = notifier.send_reconfirmation(&ticket, &event).await {
            warn!(ticket_id = %ticket.id, error = %e, "Reconfirmation email not sent");
        }
    })
}
