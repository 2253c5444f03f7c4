//! Seat holding and booking consistency for event ticketing.
//!
//! Tracks temporary seat holds, derives the unavailable-seat set of a
//! performance, and moves tickets between seats without ever letting two
//! live tickets share one.

pub mod clock;
pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;
