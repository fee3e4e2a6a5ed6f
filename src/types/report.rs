//! Run outputs consumed by the reporting layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Minutes, PassengerId, StopId, StopRole, VehicleId};

/// Coarse run state exposed to the control layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Idle,
    Running,
    Done,
}

impl RunStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Done => "done",
        }
    }
}

/// Accepted insertion, kept per vehicle for audit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertionRecord {
    pub passenger_id: PassengerId,
    /// Pickup was spliced after this index of the pre-insertion route
    pub pickup_index: usize,
    /// Dropoff was spliced after this index of the pre-insertion route
    pub dropoff_index: usize,
    pub marginal_cost: Minutes,
    /// Itinerary cost right after the commit
    pub cost_after: Minutes,
}

/// One visited stop of a vehicle trace
#[derive(Debug, Clone, Serialize)]
pub struct StopTrace {
    /// Catalogue id of the location
    pub stop_id: String,
    pub stop_ref: StopId,
    pub role: StopRole,
    pub passenger_id: Option<PassengerId>,
    /// Travel time to the next stop
    pub leg_time: Minutes,
    pub arrival: Minutes,
    pub service_start: Minutes,
    pub departure: Minutes,
    /// Passengers on board when leaving the stop
    pub load: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleStats {
    pub vehicle_id: VehicleId,
    pub capacity: u32,
    pub num_stops: usize,
    pub cost: Minutes,
    pub traveled_km: f64,
    pub begin_time: Minutes,
    pub end_time: Minutes,
    /// Length of the shift
    pub total_time: Minutes,
    /// Travelling plus servicing
    pub busy_time: Minutes,
    /// Idle at stops waiting for windows to open
    pub wait_time: Minutes,
    pub usage_percent: f64,
    pub served_requests: usize,
    pub avg_customer_wait: Minutes,
    pub stops: Vec<StopTrace>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerStats {
    pub passenger_id: PassengerId,
    pub vehicle_id: VehicleId,
    /// From the start of the pickup window to the pickup
    pub wait: Minutes,
    pub on_board: Minutes,
    pub trip_km: f64,
    /// Direct origin to destination distance, when the pair has travel data
    pub direct_km: Option<f64>,
}

/// Aggregate statistics of a scheduling run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub total_requests: usize,
    pub served_requests: usize,
    pub served_percent: f64,
    pub unserved: Vec<PassengerId>,
    pub total_cost: Minutes,
    pub total_km: f64,
    pub vehicles: Vec<VehicleStats>,
    pub customers: Vec<CustomerStats>,
}
