//! In-memory matrix-backed database

use std::collections::HashMap;

use tracing::{debug, info};

use super::{Database, DistanceTimeMatrices};
use crate::error::{Result, SchedulerError};
use crate::services::geo::{estimate_leg, haversine_distance};
use crate::types::{Coordinates, Minutes, RouteRecord, StopId, StopRecord};

/// Stop catalogue plus dense distance/time matrices.
///
/// Built once, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct MatrixDatabase {
    name: &'static str,
    stops: Vec<StopRecord>,
    index: HashMap<String, StopId>,
    matrices: DistanceTimeMatrices,
    /// Maximum distance in meters for coordinate resolution
    tolerance_m: f64,
}

impl MatrixDatabase {
    /// Build from ready matrices. Matrix positions follow catalogue order.
    pub fn from_matrices(
        stops: Vec<StopRecord>,
        matrices: DistanceTimeMatrices,
        tolerance_m: f64,
    ) -> Result<Self> {
        if matrices.size != stops.len() || !matrices.is_square() {
            return Err(SchedulerError::validation(
                "travel matrices",
                format!(
                    "expected {n}x{n} matrices for {n} stops, got size {}",
                    matrices.size,
                    n = stops.len()
                ),
            ));
        }
        let index = Self::build_index(&stops)?;
        Ok(Self {
            name: "MatrixDatabase",
            stops,
            index,
            matrices,
            tolerance_m,
        })
    }

    /// Build from an explicit route table. Pairs without a route stay
    /// unknown and fail on use.
    pub fn from_routes(stops: Vec<StopRecord>, routes: &[RouteRecord], tolerance_m: f64) -> Result<Self> {
        let index = Self::build_index(&stops)?;
        let mut matrices = DistanceTimeMatrices::unknown(stops.len());

        for route in routes {
            let from = Self::lookup(&index, &route.from)?;
            let to = Self::lookup(&index, &route.to)?;
            if from == to {
                continue;
            }
            matrices.set(from.index(), to.index(), route.distance, route.duration);
        }

        let known = matrices
            .durations
            .iter()
            .flatten()
            .filter(|d| d.is_some())
            .count();
        info!(
            "Loaded {} routes for {} stops ({} of {} pairs known)",
            routes.len(),
            stops.len(),
            known,
            stops.len() * stops.len()
        );

        Ok(Self {
            name: "RouteTable",
            stops,
            index,
            matrices,
            tolerance_m,
        })
    }

    /// Estimate every pair from straight-line distance × road coefficient at
    /// an average speed.
    pub fn estimated(
        stops: Vec<StopRecord>,
        road_coefficient: f64,
        average_speed_kmh: f64,
        tolerance_m: f64,
    ) -> Result<Self> {
        if road_coefficient <= 0.0 || average_speed_kmh <= 0.0 {
            return Err(SchedulerError::validation(
                "travel estimate",
                "road coefficient and average speed must be positive",
            ));
        }
        let index = Self::build_index(&stops)?;
        let n = stops.len();
        let mut matrices = DistanceTimeMatrices::unknown(n);

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let (distance_m, duration_s) = estimate_leg(
                        &stops[i].coordinates,
                        &stops[j].coordinates,
                        road_coefficient,
                        average_speed_kmh,
                    );
                    matrices.set(i, j, distance_m, duration_s);
                }
            }
        }
        debug!("Estimated travel matrices for {} stops", n);

        Ok(Self {
            name: "Estimated",
            stops,
            index,
            matrices,
            tolerance_m,
        })
    }

    /// Canonical id of a catalogued stop code
    pub fn stop_id(&self, code: &str) -> Result<StopId> {
        Self::lookup(&self.index, code)
    }

    pub fn stops(&self) -> &[StopRecord] {
        &self.stops
    }

    fn build_index(stops: &[StopRecord]) -> Result<HashMap<String, StopId>> {
        let mut index = HashMap::with_capacity(stops.len());
        for (i, stop) in stops.iter().enumerate() {
            if index.insert(stop.id.clone(), StopId(i)).is_some() {
                return Err(SchedulerError::validation(
                    format!("stop {}", stop.id),
                    "duplicate stop id",
                ));
            }
        }
        Ok(index)
    }

    fn lookup(index: &HashMap<String, StopId>, code: &str) -> Result<StopId> {
        index
            .get(code)
            .copied()
            .ok_or_else(|| SchedulerError::Lookup(format!("stop id {code:?} is not in the catalogue")))
    }

    fn check(&self, stop: StopId) -> Result<()> {
        if stop.index() < self.stops.len() {
            Ok(())
        } else {
            Err(SchedulerError::Lookup(format!("unknown stop {stop}")))
        }
    }
}

impl Database for MatrixDatabase {
    fn travel_time(&self, from: StopId, to: StopId) -> Result<Minutes> {
        self.check(from)?;
        self.check(to)?;
        self.matrices
            .duration(from.index(), to.index())
            .map(|s| s as f64 / 60.0)
            .ok_or(SchedulerError::DataIntegrity { from, to })
    }

    fn distance_km(&self, from: StopId, to: StopId) -> Result<f64> {
        self.check(from)?;
        self.check(to)?;
        self.matrices
            .distance(from.index(), to.index())
            .map(|m| m as f64 / 1000.0)
            .ok_or(SchedulerError::DataIntegrity { from, to })
    }

    fn resolve(&self, coordinates: &Coordinates) -> Result<StopId> {
        self.stops
            .iter()
            .enumerate()
            .map(|(i, s)| (i, haversine_distance(&s.coordinates, coordinates) * 1000.0))
            .filter(|(_, m)| *m <= self.tolerance_m)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| StopId(i))
            .ok_or_else(|| {
                SchedulerError::Lookup(format!(
                    "no stop within {} m of ({}, {})",
                    self.tolerance_m, coordinates.lat, coordinates.lng
                ))
            })
    }

    fn coordinates(&self, stop: StopId) -> Result<Coordinates> {
        self.check(stop)?;
        Ok(self.stops[stop.index()].coordinates)
    }

    fn stop_code(&self, stop: StopId) -> Option<&str> {
        self.stops.get(stop.index()).map(|s| s.id.as_str())
    }

    fn stop_count(&self) -> usize {
        self.stops.len()
    }

    fn name(&self) -> &str {
        self.name
    }
}
