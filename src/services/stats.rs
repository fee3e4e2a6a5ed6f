//! Per-vehicle and per-customer statistics

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::itinerary::Itinerary;
use crate::error::{Result, SchedulerError};
use crate::types::{CustomerStats, Minutes, PassengerId, RunReport, StopRole, StopTrace, VehicleStats};

/// Ordered stop trace of an itinerary with computed times.
pub fn stop_traces(itinerary: &Itinerary) -> Vec<StopTrace> {
    let db = itinerary.database();
    itinerary
        .stops()
        .iter()
        .zip(itinerary.schedule())
        .map(|(stop, t)| StopTrace {
            stop_id: db
                .stop_code(stop.stop_ref())
                .map(str::to_string)
                .unwrap_or_else(|| stop.stop_ref().to_string()),
            stop_ref: stop.stop_ref(),
            role: stop.role(),
            passenger_id: stop.passenger_id().cloned(),
            leg_time: stop.leg_time(),
            arrival: t.arrival,
            service_start: t.service_start,
            departure: t.departure,
            load: t.load,
        })
        .collect()
}

/// Ride statistics for every passenger served by the itinerary.
pub fn customer_stats(itinerary: &Itinerary) -> Result<Vec<CustomerStats>> {
    let db = itinerary.database();
    let stops = itinerary.stops();
    let times = itinerary.schedule();
    let mut customers = Vec::new();

    for passenger_id in itinerary.passengers() {
        let (pu, sd) = itinerary
            .positions_of(passenger_id)
            .ok_or_else(|| SchedulerError::Lookup(format!("passenger {passenger_id} has no dropoff")))?;

        let trip_km = stops[pu..=sd]
            .windows(2)
            .map(|pair| db.distance_km(pair[0].stop_ref(), pair[1].stop_ref()))
            .sum::<Result<f64>>()?;
        let direct_km = match db.distance_km(stops[pu].stop_ref(), stops[sd].stop_ref()) {
            Ok(km) => Some(km),
            Err(SchedulerError::DataIntegrity { .. }) => None,
            Err(e) => return Err(e),
        };

        customers.push(CustomerStats {
            passenger_id: passenger_id.clone(),
            vehicle_id: itinerary.vehicle_id().clone(),
            wait: times[pu].service_start - stops[pu].window().start,
            on_board: times[sd].departure - times[pu].departure,
            trip_km,
            direct_km,
        });
    }

    Ok(customers)
}

/// Utilisation and cost figures for one vehicle.
pub fn vehicle_stats(itinerary: &Itinerary) -> Result<VehicleStats> {
    let stops = itinerary.stops();
    let times = itinerary.schedule();
    let customers = customer_stats(itinerary)?;

    let total_time = itinerary.end_time() - itinerary.start_time();
    let service: Minutes = stops.iter().map(|s| s.service_minutes()).sum();
    let busy_time = itinerary.cost() + service;
    let wait_time: Minutes = times.iter().map(|t| t.wait()).sum();
    let usage_percent = if total_time > 0.0 {
        (busy_time + wait_time) / total_time * 100.0
    } else {
        0.0
    };
    let avg_customer_wait = if customers.is_empty() {
        0.0
    } else {
        customers.iter().map(|c| c.wait).sum::<Minutes>() / customers.len() as f64
    };

    Ok(VehicleStats {
        vehicle_id: itinerary.vehicle_id().clone(),
        capacity: itinerary.capacity(),
        num_stops: stops.len(),
        cost: itinerary.cost(),
        traveled_km: itinerary.traveled_km()?,
        begin_time: times.first().map_or(itinerary.start_time(), |t| t.departure),
        end_time: times.last().map_or(itinerary.end_time(), |t| t.arrival),
        total_time,
        busy_time,
        wait_time,
        usage_percent,
        served_requests: stops.iter().filter(|s| s.role() == StopRole::Pickup).count(),
        avg_customer_wait,
        stops: stop_traces(itinerary),
    })
}

/// Aggregate report over the fleet.
pub fn build_report(
    run_id: Uuid,
    started_at: DateTime<Utc>,
    itineraries: &[Itinerary],
    unserved: &[PassengerId],
    total_requests: usize,
) -> Result<RunReport> {
    let mut vehicles = Vec::with_capacity(itineraries.len());
    let mut customers = Vec::new();
    for itinerary in itineraries {
        customers.extend(customer_stats(itinerary)?);
        vehicles.push(vehicle_stats(itinerary)?);
    }

    let served_requests = customers.len();
    let completed_at = Utc::now();

    Ok(RunReport {
        run_id,
        started_at,
        completed_at,
        duration_ms: (completed_at - started_at).num_milliseconds().max(0) as u64,
        total_requests,
        served_requests,
        served_percent: if total_requests == 0 {
            0.0
        } else {
            served_requests as f64 / total_requests as f64 * 100.0
        },
        unserved: unserved.to_vec(),
        total_cost: vehicles.iter().map(|v| v.cost).sum(),
        total_km: vehicles.iter().map(|v| v.traveled_km).sum(),
        vehicles,
        customers,
    })
}
