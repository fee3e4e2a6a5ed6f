//! DRT Scheduler - insertion-based dial-a-ride scheduling
//!
//! Trip requests are assigned, one at a time, to the vehicle itinerary where
//! they add the least travel time while keeping every pickup and dropoff
//! inside its time window and every vehicle within capacity.

pub mod defaults;
pub mod error;
pub mod services;
pub mod types;

pub use error::{Result, SchedulerError};
