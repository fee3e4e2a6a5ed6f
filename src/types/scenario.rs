//! Scenario input records
//!
//! Typed counterparts of the stop catalogue, route table, transport and
//! customer dictionaries. Every required field is enumerated; a missing or
//! malformed field fails at load time.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Coordinates, Minutes};
use crate::error::{Result, SchedulerError};

/// A catalogued stop location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub coordinates: Coordinates,
}

/// Known road route between two catalogued stops
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRecord {
    pub from: String,
    pub to: String,
    /// Distance in meters
    pub distance: u64,
    /// Duration in seconds
    pub duration: u64,
}

/// Fleet vehicle definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    pub name: String,
    /// Depot where the shift starts
    pub position: Coordinates,
    /// Depot where the shift must end
    pub destination: Coordinates,
    pub capacity: u32,
    pub start_time: Minutes,
    pub end_time: Minutes,
}

/// Customer trip demand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerConfig {
    pub name: String,
    pub position: Coordinates,
    pub destination: Coordinates,
    pub npass: u32,
    pub origin_time_ini: Minutes,
    /// Derived from the maximum waiting time when absent
    #[serde(default)]
    pub origin_time_end: Option<Minutes>,
    pub destination_time_ini: Minutes,
    pub destination_time_end: Minutes,
}

/// A complete problem instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub stops: Vec<StopRecord>,
    /// When absent, travel data is estimated from coordinates
    #[serde(default)]
    pub routes: Option<Vec<RouteRecord>>,
    pub transports: Vec<TransportConfig>,
    #[serde(default)]
    pub customers: Vec<CustomerConfig>,
}

impl Scenario {
    /// Structural checks that do not need the database.
    pub fn validate(&self) -> Result<()> {
        if self.stops.is_empty() {
            return Err(SchedulerError::validation("scenario", "stop catalogue is empty"));
        }
        if self.transports.is_empty() {
            return Err(SchedulerError::validation("scenario", "no transports defined"));
        }

        let mut stop_ids = HashSet::new();
        for stop in &self.stops {
            if !stop_ids.insert(stop.id.as_str()) {
                return Err(SchedulerError::validation(
                    format!("stop {}", stop.id),
                    "duplicate stop id",
                ));
            }
        }

        let mut names = HashSet::new();
        for t in &self.transports {
            let subject = format!("transport {}", t.name);
            if !names.insert(t.name.as_str()) {
                return Err(SchedulerError::validation(subject, "duplicate transport name"));
            }
            if t.capacity == 0 {
                return Err(SchedulerError::validation(subject, "capacity must be positive"));
            }
            if !t.start_time.is_finite() || !t.end_time.is_finite() || t.start_time > t.end_time {
                return Err(SchedulerError::validation(
                    subject,
                    format!("shift [{}, {}] is inverted or unbounded", t.start_time, t.end_time),
                ));
            }
        }

        let mut customers = HashSet::new();
        for c in &self.customers {
            if !customers.insert(c.name.as_str()) {
                return Err(SchedulerError::validation(
                    format!("customer {}", c.name),
                    "duplicate customer name",
                ));
            }
        }

        Ok(())
    }
}
