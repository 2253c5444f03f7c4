pub mod allocation;
pub mod availability;
pub mod catalog;
pub mod holds;
pub mod notify;

pub use allocation::{AllocationEngine, SwapRequest};
pub use availability::{BookedSeatIndex, SeatAvailability, SeatState};
pub use catalog::{CatalogError, SeatCatalog, SeatEntry};
pub use holds::{CreateHold, HoldService};
pub use notify::{LogNotifier, NotificationError, Notifier};
