use std::sync::Arc;

use crate::clock::Clock;
use crate::config::HoldConfig;
use crate::services::{AllocationEngine, BookedSeatIndex, HoldService, Notifier, SeatCatalog};
use crate::store::{EventDirectory, HoldStore, TicketStore};

/// Everything the request handlers need, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub index: BookedSeatIndex,
    pub holds: HoldService,
    pub allocation: AllocationEngine,
}

impl AppState {
    /// Wires the services over a single backend that implements every store.
    pub fn new<S>(
        store: Arc<S>,
        catalog: SeatCatalog,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        hold_config: HoldConfig,
    ) -> Self
    where
        S: TicketStore + EventDirectory + HoldStore + 'static,
    {
        let tickets: Arc<dyn TicketStore> = store.clone();
        let events: Arc<dyn EventDirectory> = store.clone();
        let hold_store: Arc<dyn HoldStore> = store;
        let catalog = Arc::new(catalog);

        let index = BookedSeatIndex::new(
            Arc::clone(&tickets),
            Arc::clone(&hold_store),
            Arc::clone(&catalog),
            Arc::clone(&clock),
        );
        let holds = HoldService::new(
            hold_store,
            index.clone(),
            Arc::clone(&catalog),
            clock,
            hold_config,
        );
        let allocation = AllocationEngine::new(tickets, events, index.clone(), catalog, notifier);

        Self {
            index,
            holds,
            allocation,
        }
    }
}
