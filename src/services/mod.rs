//! Scheduling services

pub mod database;
pub mod geo;
pub mod itinerary;
pub mod loader;
pub mod request_generator;
pub mod scheduler;
pub mod stats;
pub mod status;
pub mod timeline;

pub use database::{Database, DistanceTimeMatrices, MatrixDatabase};
pub use itinerary::{InsertionCandidate, Itinerary};
pub use loader::{build_scheduler, SchedulerSettings};
pub use scheduler::{CandidateSelection, Decision, Scheduler, SchedulerPolicy, SchedulingOrder};
pub use status::{RunProgress, SchedulerPhase, StatusHandle};
