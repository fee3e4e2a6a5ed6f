//! Scenario to scheduler wiring.
//!
//! Builds the database, one itinerary per transport and one request per
//! customer. Every record is validated here so a bad scenario fails before
//! any scheduling happens.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::database::{Database, MatrixDatabase};
use super::itinerary::Itinerary;
use super::scheduler::{Scheduler, SchedulerPolicy};
use crate::defaults;
use crate::error::{Result, SchedulerError};
use crate::types::{CustomerConfig, Minutes, Request, Scenario, TimeWindow, TransportConfig};

/// Tunables applied while building a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Dwell time per boarding or alighting passenger
    pub service_minutes_per_passenger: Minutes,
    /// Longest a customer waits past `origin_time_ini` (plus boarding)
    pub max_waiting_minutes: Minutes,
    /// Cap explicit pickup windows at the maximum waiting time
    pub clamp_pickup_window: bool,
    /// Coordinate to stop resolution radius
    pub coordinate_tolerance_m: f64,
    /// Estimated database: road distance over straight-line distance
    pub road_coefficient: f64,
    /// Estimated database: average driving speed
    pub average_speed_kmh: f64,
    pub policy: SchedulerPolicy,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            service_minutes_per_passenger: defaults::DEFAULT_SERVICE_MINUTES_PER_PASSENGER,
            max_waiting_minutes: defaults::DEFAULT_MAX_WAITING_MINUTES,
            clamp_pickup_window: false,
            coordinate_tolerance_m: defaults::DEFAULT_COORDINATE_TOLERANCE_M,
            road_coefficient: defaults::DEFAULT_ROAD_COEFFICIENT,
            average_speed_kmh: defaults::DEFAULT_AVERAGE_SPEED_KMH,
            policy: SchedulerPolicy::default(),
        }
    }
}

/// Route table when the scenario has one, estimate from coordinates
/// otherwise.
pub fn build_database(scenario: &Scenario, settings: &SchedulerSettings) -> Result<Arc<MatrixDatabase>> {
    let stops = scenario.stops.clone();
    let db = match &scenario.routes {
        Some(routes) => MatrixDatabase::from_routes(stops, routes, settings.coordinate_tolerance_m)?,
        None => MatrixDatabase::estimated(
            stops,
            settings.road_coefficient,
            settings.average_speed_kmh,
            settings.coordinate_tolerance_m,
        )?,
    };
    info!("Database {} loaded with {} stops", db.name(), db.stop_count());
    Ok(Arc::new(db))
}

pub fn build_itinerary(transport: &TransportConfig, db: Arc<dyn Database>) -> Result<Itinerary> {
    let start = db.resolve(&transport.position)?;
    let end = db.resolve(&transport.destination)?;
    Itinerary::new(
        transport.name.as_str().into(),
        transport.capacity,
        transport.start_time,
        transport.end_time,
        start,
        end,
        db,
    )
}

/// Request for a customer. The pickup window closes `service + max_wait`
/// after it opens unless the customer gives its own end.
pub fn build_request(customer: &CustomerConfig, db: &dyn Database, settings: &SchedulerSettings) -> Result<Request> {
    let subject = format!("customer {}", customer.name);
    if customer.npass == 0 {
        return Err(SchedulerError::validation(subject, "npass must be at least 1"));
    }
    let origin = db.resolve(&customer.position)?;
    let destination = db.resolve(&customer.destination)?;

    let service_minutes = settings.service_minutes_per_passenger * customer.npass as f64;
    let latest_pickup = customer.origin_time_ini + service_minutes + settings.max_waiting_minutes;
    let origin_time_end = match customer.origin_time_end {
        Some(end) if settings.clamp_pickup_window => end.min(latest_pickup),
        Some(end) => end,
        None => latest_pickup,
    };

    let origin_window = TimeWindow::new(customer.origin_time_ini, origin_time_end)
        .map_err(|e| SchedulerError::validation(subject.as_str(), format!("origin window: {e}")))?;
    let destination_window = TimeWindow::new(customer.destination_time_ini, customer.destination_time_end)
        .map_err(|e| SchedulerError::validation(subject.as_str(), format!("destination window: {e}")))?;

    Request::new(
        customer.name.as_str().into(),
        origin,
        destination,
        origin_window,
        destination_window,
        customer.npass,
        service_minutes,
    )
}

/// Scheduler with every transport and customer of the scenario loaded.
pub fn build_scheduler(scenario: &Scenario, settings: &SchedulerSettings) -> Result<Scheduler> {
    scenario.validate()?;
    let db: Arc<dyn Database> = build_database(scenario, settings)?;

    let itineraries = scenario
        .transports
        .iter()
        .map(|t| build_itinerary(t, db.clone()))
        .collect::<Result<Vec<_>>>()?;

    let mut scheduler = Scheduler::new(itineraries, settings.policy)?;
    for customer in &scenario.customers {
        let request = build_request(customer, db.as_ref(), settings)?;
        debug!(
            "Request {}: {} -> {}, pickup [{:.1}, {:.1}], dropoff [{:.1}, {:.1}]",
            request.passenger_id(),
            request.origin_id(),
            request.destination_id(),
            request.origin_window().start,
            request.origin_window().end,
            request.destination_window().start,
            request.destination_window().end
        );
        scheduler.add_request(request)?;
    }

    info!(
        "Scenario loaded: {} transports, {} customers",
        scenario.transports.len(),
        scenario.customers.len()
    );
    Ok(scheduler)
}
