//! Trip requests

use std::hash::{Hash, Hasher};

use serde::Serialize;

use super::{Minutes, PassengerId, StopId, TimeWindow};
use crate::error::{Result, SchedulerError};

/// One trip demand: `npass` passengers travelling from `origin_id` to
/// `destination_id`, picked up within `origin_window` and dropped off within
/// `destination_window`.
///
/// Immutable once built; equality and hashing go by `passenger_id`.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    passenger_id: PassengerId,
    origin_id: StopId,
    destination_id: StopId,
    origin_window: TimeWindow,
    destination_window: TimeWindow,
    npass: u32,
    /// Dwell time at each of the request's stops (boarding / alighting)
    service_minutes: Minutes,
}

impl Request {
    pub fn new(
        passenger_id: PassengerId,
        origin_id: StopId,
        destination_id: StopId,
        origin_window: TimeWindow,
        destination_window: TimeWindow,
        npass: u32,
        service_minutes: Minutes,
    ) -> Result<Self> {
        let subject = format!("request {passenger_id}");
        for (label, w) in [("origin", &origin_window), ("destination", &destination_window)] {
            if !w.start.is_finite() || !w.end.is_finite() || w.start > w.end {
                return Err(SchedulerError::validation(
                    subject,
                    format!("{label} window [{}, {}] is inverted or unbounded", w.start, w.end),
                ));
            }
        }
        if npass < 1 {
            return Err(SchedulerError::validation(subject, "npass must be at least 1"));
        }
        if !service_minutes.is_finite() || service_minutes < 0.0 {
            return Err(SchedulerError::validation(
                subject,
                format!("service time {service_minutes} must be a non-negative number"),
            ));
        }

        Ok(Self {
            passenger_id,
            origin_id,
            destination_id,
            origin_window,
            destination_window,
            npass,
            service_minutes,
        })
    }

    pub fn passenger_id(&self) -> &PassengerId {
        &self.passenger_id
    }

    pub fn origin_id(&self) -> StopId {
        self.origin_id
    }

    pub fn destination_id(&self) -> StopId {
        self.destination_id
    }

    pub fn origin_window(&self) -> TimeWindow {
        self.origin_window
    }

    pub fn destination_window(&self) -> TimeWindow {
        self.destination_window
    }

    pub fn origin_time_ini(&self) -> Minutes {
        self.origin_window.start
    }

    pub fn npass(&self) -> u32 {
        self.npass
    }

    pub fn service_minutes(&self) -> Minutes {
        self.service_minutes
    }
}

impl PartialEq for Request {
    fn eq(&self, other: &Self) -> bool {
        self.passenger_id == other.passenger_id
    }
}

impl Eq for Request {}

impl Hash for Request {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.passenger_id.hash(state);
    }
}
