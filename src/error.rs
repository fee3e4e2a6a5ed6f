//! Error types for the scheduling core

use thiserror::Error;

use crate::types::{PassengerId, StopId, VehicleId};

/// Errors raised by the scheduling core.
///
/// An infeasible request is not an error: it ends up in the unserved set.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchedulerError {
    /// Malformed input record (inverted window, empty party, bad capacity, ...)
    #[error("validation failed for {subject}: {reason}")]
    Validation { subject: String, reason: String },

    /// Coordinates or identifiers that do not match any catalogued stop
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// Travel data missing for a referenced stop pair
    #[error("no travel data from stop {from} to stop {to}")]
    DataIntegrity { from: StopId, to: StopId },

    /// The candidate no longer fits the itinerary it was evaluated against
    #[error("stale insertion candidate for passenger {passenger_id} on vehicle {vehicle_id}")]
    StaleCandidate {
        vehicle_id: VehicleId,
        passenger_id: PassengerId,
    },
}

impl SchedulerError {
    pub fn validation(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        SchedulerError::Validation {
            subject: subject.into(),
            reason: reason.into(),
        }
    }

    /// Errors that make the whole run meaningless.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SchedulerError::DataIntegrity { .. })
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
