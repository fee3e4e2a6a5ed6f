//! Read-only travel data collaborator
//!
//! The scheduling core only ever reads from a [`Database`]: stop
//! coordinates, pairwise travel times and distances, neighbour queries and
//! coordinate resolution. Implementations are loaded once and shared by
//! `Arc` across the scheduler and every itinerary.

mod matrix;
#[cfg(test)]
pub(crate) mod testing;

pub use matrix::MatrixDatabase;

use crate::error::{Result, SchedulerError};
use crate::types::{Coordinates, Minutes, StopId};

/// Distance and time matrices between catalogued stops.
///
/// Entries are `None` when no route is known for the pair.
#[derive(Debug, Clone)]
pub struct DistanceTimeMatrices {
    /// Distance in meters [i][j] from stop i to stop j
    pub distances: Vec<Vec<Option<u64>>>,
    /// Duration in seconds [i][j] from stop i to stop j
    pub durations: Vec<Vec<Option<u64>>>,
    /// Number of stops
    pub size: usize,
}

impl DistanceTimeMatrices {
    /// Matrices with only the zero diagonal known
    pub fn unknown(size: usize) -> Self {
        let mut distances = vec![vec![None; size]; size];
        let mut durations = vec![vec![None; size]; size];
        for i in 0..size {
            distances[i][i] = Some(0);
            durations[i][i] = Some(0);
        }
        Self {
            distances,
            durations,
            size,
        }
    }

    pub fn set(&mut self, from: usize, to: usize, distance_m: u64, duration_s: u64) {
        self.distances[from][to] = Some(distance_m);
        self.durations[from][to] = Some(duration_s);
    }

    /// Get distance from stop i to stop j in meters
    pub fn distance(&self, from: usize, to: usize) -> Option<u64> {
        self.distances.get(from)?.get(to).copied().flatten()
    }

    /// Get duration from stop i to stop j in seconds
    pub fn duration(&self, from: usize, to: usize) -> Option<u64> {
        self.durations.get(from)?.get(to).copied().flatten()
    }

    fn is_square(&self) -> bool {
        self.distances.len() == self.size
            && self.durations.len() == self.size
            && self.distances.iter().all(|row| row.len() == self.size)
            && self.durations.iter().all(|row| row.len() == self.size)
    }
}

/// Read-only travel data provider
pub trait Database: Send + Sync {
    /// Travel time in minutes. Zero for the same stop.
    fn travel_time(&self, from: StopId, to: StopId) -> Result<Minutes>;

    /// Route distance in kilometers. Zero for the same stop.
    fn distance_km(&self, from: StopId, to: StopId) -> Result<f64>;

    /// Canonical stop at `coordinates`, within the configured tolerance
    fn resolve(&self, coordinates: &Coordinates) -> Result<StopId>;

    fn coordinates(&self, stop: StopId) -> Result<Coordinates>;

    /// Catalogue id of a stop
    fn stop_code(&self, stop: StopId) -> Option<&str>;

    fn stop_count(&self) -> usize;

    /// Get service name for logging
    fn name(&self) -> &str;

    /// Other stops within `max_distance_km` route distance of `stop`,
    /// closest first.
    fn neighbors(&self, stop: StopId, max_distance_km: f64) -> Result<Vec<(StopId, f64)>> {
        if stop.index() >= self.stop_count() {
            return Err(SchedulerError::Lookup(format!("unknown stop {stop}")));
        }
        let mut found = Vec::new();
        for other in (0..self.stop_count()).map(StopId) {
            if other == stop {
                continue;
            }
            let km = match self.distance_km(stop, other) {
                Ok(km) => km,
                Err(SchedulerError::DataIntegrity { .. }) => continue,
                Err(e) => return Err(e),
            };
            if km <= max_distance_km {
                found.push((other, km));
            }
        }
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        Ok(found)
    }
}
