pub mod event;
pub mod order_item;
pub mod seat;
pub mod seat_holding;
pub mod ticket;

pub use event::{Event, PriceCategory, Schedule};
pub use order_item::{OrderItem, OrderItemUpdate};
pub use seat::{normalize_seat_label, SeatList};
pub use seat_holding::{NewSeatHolding, SeatHolding};
pub use ticket::{Ticket, TicketStatus, TicketUpdate};
