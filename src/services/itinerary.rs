//! Vehicle itineraries and insertion evaluation.
//!
//! An itinerary is one vehicle's ordered stop chain, from its start depot to
//! its end depot. Requests are added by splicing a pickup and a dropoff into
//! the chain; committed stops are never re-ordered or removed.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::database::Database;
use super::timeline::{self, Violation, Visit, VisitTimes, TIME_EPSILON};
use crate::error::{Result, SchedulerError};
use crate::types::{Leg, Minutes, PassengerId, Request, Stop, StopId, StopRole, TimeWindow, VehicleId};

/// A feasible way of adding one request to one itinerary.
///
/// The pickup goes right after `pickup_index` and the dropoff right after
/// `dropoff_index` of the sequence the candidate was evaluated against.
/// Equal indices put the dropoff immediately after the pickup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertionCandidate {
    pub vehicle_id: VehicleId,
    pub pickup_index: usize,
    pub dropoff_index: usize,
    /// Added travel minutes
    pub marginal_cost: Minutes,
}

impl InsertionCandidate {
    /// Selection order: cheapest first, then lowest vehicle id, pickup index
    /// and dropoff index.
    pub fn rank(&self, other: &Self) -> Ordering {
        self.marginal_cost
            .total_cmp(&other.marginal_cost)
            .then_with(|| self.vehicle_id.cmp(&other.vehicle_id))
            .then(self.pickup_index.cmp(&other.pickup_index))
            .then(self.dropoff_index.cmp(&other.dropoff_index))
    }
}

/// One vehicle's route.
#[derive(Clone)]
pub struct Itinerary {
    vehicle_id: VehicleId,
    capacity: u32,
    start_time: Minutes,
    end_time: Minutes,
    stops: Vec<Stop>,
    /// Schedule of `stops`, recomputed on every commit
    times: Vec<VisitTimes>,
    cost: Minutes,
    db: Arc<dyn Database>,
}

impl fmt::Debug for Itinerary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Itinerary")
            .field("vehicle_id", &self.vehicle_id)
            .field("capacity", &self.capacity)
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .field("stops", &self.stops)
            .field("cost", &self.cost)
            .field("db", &self.db.name())
            .finish()
    }
}

impl Itinerary {
    /// Empty itinerary: start depot followed by end depot.
    ///
    /// Fails when the shift is malformed or too short to drive from one
    /// depot to the other.
    pub fn new(
        vehicle_id: VehicleId,
        capacity: u32,
        start_time: Minutes,
        end_time: Minutes,
        start_depot: StopId,
        end_depot: StopId,
        db: Arc<dyn Database>,
    ) -> Result<Self> {
        let subject = format!("vehicle {vehicle_id}");
        if capacity == 0 {
            return Err(SchedulerError::validation(subject, "capacity must be positive"));
        }
        let shift = TimeWindow::new(start_time, end_time).map_err(|_| {
            SchedulerError::validation(
                subject.as_str(),
                format!("shift [{start_time}, {end_time}] is inverted or unbounded"),
            )
        })?;

        let mut itinerary = Self {
            vehicle_id,
            capacity,
            start_time,
            end_time,
            stops: vec![
                Stop::depot(start_depot, TimeWindow::open_from(start_time)),
                Stop::depot(end_depot, shift),
            ],
            times: Vec::new(),
            cost: 0.0,
            db,
        };
        let leg = itinerary.travel(start_depot, end_depot)?;
        itinerary.stops[0].leg_time = leg;
        itinerary.times = itinerary.propagate(&itinerary.stops).map_err(|v| {
            SchedulerError::validation(subject, format!("end depot unreachable within the shift: {v}"))
        })?;
        itinerary.cost = total_cost(&itinerary.stops);

        Ok(itinerary)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn start_time(&self) -> Minutes {
        self.start_time
    }

    pub fn end_time(&self) -> Minutes {
        self.end_time
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Sum of all leg times
    pub fn cost(&self) -> Minutes {
        self.cost
    }

    /// Arrival, service start, departure and load per stop
    pub fn schedule(&self) -> &[VisitTimes] {
        &self.times
    }

    pub fn database(&self) -> &Arc<dyn Database> {
        &self.db
    }

    /// Passengers on board when leaving each stop
    pub fn load_profile(&self) -> Vec<u32> {
        self.times.iter().map(|t| t.load).collect()
    }

    /// Reporting projection of the chain, one leg per stop.
    pub fn legs(&self) -> Vec<Leg> {
        self.stops
            .iter()
            .enumerate()
            .map(|(k, stop)| Leg::from_stops(&self.vehicle_id, stop, self.stops.get(k + 1)))
            .collect()
    }

    pub fn traveled_km(&self) -> Result<f64> {
        self.stops
            .windows(2)
            .map(|pair| self.db.distance_km(pair[0].stop_ref, pair[1].stop_ref))
            .sum()
    }

    /// Passengers served, in pickup order
    pub fn passengers(&self) -> impl Iterator<Item = &PassengerId> {
        self.stops
            .iter()
            .filter(|s| s.role == StopRole::Pickup)
            .filter_map(|s| s.passenger_id.as_ref())
    }

    pub fn serves(&self, passenger_id: &PassengerId) -> bool {
        self.passengers().any(|p| p == passenger_id)
    }

    /// Indices of a passenger's pickup and dropoff stops
    pub fn positions_of(&self, passenger_id: &PassengerId) -> Option<(usize, usize)> {
        let find = |role: StopRole| {
            self.stops
                .iter()
                .position(|s| s.role == role && s.passenger_id.as_ref() == Some(passenger_id))
        };
        Some((find(StopRole::Pickup)?, find(StopRole::Dropoff)?))
    }

    // -----------------------------------------------------------------------
    // Insertion
    // -----------------------------------------------------------------------

    /// All feasible insertions of `request`. Read-only.
    ///
    /// Fails only when travel data is missing for a pair the search needs.
    pub fn evaluate_insertion(&self, request: &Request) -> Result<Vec<InsertionCandidate>> {
        let npass = request.npass();
        let mut candidates = Vec::new();
        if npass > self.capacity {
            return Ok(candidates);
        }

        let origin = request.origin_id();
        let destination = request.destination_id();
        let pickup = Visit {
            window: request.origin_window(),
            service_minutes: request.service_minutes(),
            load_delta: npass as i64,
        };
        let dropoff = Visit {
            window: request.destination_window(),
            service_minutes: request.service_minutes(),
            load_delta: -(npass as i64),
        };
        let last = self.stops.len() - 1;

        for i in 0..last {
            let before = &self.times[i];
            // Service starts never decrease along the prefix
            if before.service_start > pickup.window.end + TIME_EPSILON {
                break;
            }
            if before.load + npass > self.capacity {
                continue;
            }

            let to_pickup = self.travel(self.stops[i].stop_ref, origin)?;
            let Ok(at_pickup) = timeline::step(before, to_pickup, &pickup, self.capacity, i + 1) else {
                continue;
            };

            // `cursor` is the visit right before the dropoff, `pickup_delta`
            // the cost change of splicing the pickup alone once j > i.
            let mut cursor = at_pickup;
            let mut pickup_delta = 0.0;

            for j in i..last {
                if j > i {
                    // Loads do not depend on travel times, so the old profile
                    // is exact here. Times are not: the pickup detour can make
                    // stop j earlier when the matrix is not metric.
                    if self.times[j].load + npass > self.capacity {
                        break;
                    }
                    let leg = if j == i + 1 {
                        let from_pickup = self.travel(origin, self.stops[j].stop_ref)?;
                        pickup_delta = to_pickup + from_pickup - self.stops[i].leg_time;
                        from_pickup
                    } else {
                        self.stops[j - 1].leg_time
                    };
                    match timeline::step(&cursor, leg, &Visit::from(&self.stops[j]), self.capacity, j + 1) {
                        Ok(t) => cursor = t,
                        Err(_) => break,
                    }
                    // Staged service starts never decrease from here on
                    if cursor.service_start > dropoff.window.end + TIME_EPSILON {
                        break;
                    }
                }

                let to_dropoff = if j == i {
                    self.travel(origin, destination)?
                } else {
                    self.travel(self.stops[j].stop_ref, destination)?
                };
                let back = self.travel(destination, self.stops[j + 1].stop_ref)?;
                let marginal_cost = if j == i {
                    to_pickup + to_dropoff + back - self.stops[i].leg_time
                } else {
                    pickup_delta + to_dropoff + back - self.stops[j].leg_time
                };

                let Ok(at_dropoff) = timeline::step(&cursor, to_dropoff, &dropoff, self.capacity, j + 2) else {
                    continue;
                };
                if !self.tail_fits(at_dropoff, back, j + 1) {
                    continue;
                }

                candidates.push(InsertionCandidate {
                    vehicle_id: self.vehicle_id.clone(),
                    pickup_index: i,
                    dropoff_index: j,
                    marginal_cost,
                });
            }
        }

        Ok(candidates)
    }

    /// Apply a candidate produced by [`Itinerary::evaluate_insertion`].
    ///
    /// The new chain is staged and validated before it replaces the current
    /// one; on any error the itinerary is unchanged.
    pub fn commit(&mut self, candidate: &InsertionCandidate, request: &Request) -> Result<()> {
        let (i, j) = (candidate.pickup_index, candidate.dropoff_index);
        let last = self.stops.len() - 1;
        if candidate.vehicle_id != self.vehicle_id || i > j || j >= last {
            return Err(self.stale(request));
        }
        if self.serves(request.passenger_id()) {
            return Err(SchedulerError::validation(
                format!("request {}", request.passenger_id()),
                format!("already scheduled on vehicle {}", self.vehicle_id),
            ));
        }

        let mut staged = self.stops.clone();
        staged.insert(i + 1, Stop::pickup(request));
        staged.insert(j + 2, Stop::dropoff(request));
        for k in [i, i + 1, j + 1, j + 2] {
            let leg = self.travel(staged[k].stop_ref, staged[k + 1].stop_ref)?;
            staged[k].leg_time = leg;
        }

        let times = match self.propagate(&staged) {
            Ok(times) => times,
            Err(violation) => {
                debug!(
                    "Vehicle {}: candidate ({}, {}) for {} no longer fits: {}",
                    self.vehicle_id,
                    i,
                    j,
                    request.passenger_id(),
                    violation
                );
                return Err(self.stale(request));
            }
        };

        self.cost = total_cost(&staged);
        self.stops = staged;
        self.times = times;

        if let Err(problem) = self.check_invariants() {
            panic!("itinerary {} is corrupt after commit: {problem}", self.vehicle_id);
        }
        Ok(())
    }

    /// Structural and schedule invariants of the chain.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let n = self.stops.len();
        if n < 2 || !self.stops[0].is_depot() || !self.stops[n - 1].is_depot() {
            return Err("route must start and end at a depot".to_string());
        }
        if self.stops[1..n - 1].iter().any(Stop::is_depot) {
            return Err("depot stop inside the route".to_string());
        }
        if self.stops[n - 1].leg_time != 0.0 {
            return Err("terminal stop has a leg".to_string());
        }
        if (self.cost - total_cost(&self.stops)).abs() > 1e-6 {
            return Err(format!("cached cost {} is stale", self.cost));
        }
        if self.times.len() != n {
            return Err("schedule out of sync with stops".to_string());
        }

        let mut pickups: HashMap<&PassengerId, usize> = HashMap::new();
        for (k, stop) in self.stops.iter().enumerate() {
            let t = &self.times[k];
            if t.service_start + TIME_EPSILON < stop.window.start || t.service_start > stop.window.end + TIME_EPSILON {
                return Err(format!("stop {k} served at {} outside its window", t.service_start));
            }
            if t.load > self.capacity {
                return Err(format!("load {} at stop {k} exceeds capacity", t.load));
            }
            match (stop.role, stop.passenger_id.as_ref()) {
                (StopRole::Pickup, Some(p)) => {
                    if pickups.insert(p, k).is_some() {
                        return Err(format!("passenger {p} picked up twice"));
                    }
                }
                (StopRole::Dropoff, Some(p)) => match pickups.remove(p) {
                    Some(at) if at < k => {}
                    _ => return Err(format!("passenger {p} dropped off before pickup")),
                },
                (StopRole::Depot, None) => {}
                _ => return Err(format!("stop {k} has a malformed passenger binding")),
            }
        }
        if let Some(p) = pickups.keys().next() {
            return Err(format!("passenger {p} is never dropped off"));
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn travel(&self, from: StopId, to: StopId) -> Result<Minutes> {
        let minutes = self.db.travel_time(from, to)?;
        assert!(minutes >= 0.0, "negative travel time {minutes} from stop {from} to stop {to}");
        Ok(minutes)
    }

    fn propagate(&self, stops: &[Stop]) -> std::result::Result<Vec<VisitTimes>, Violation> {
        let visits: Vec<Visit> = stops.iter().map(Visit::from).collect();
        let legs: Vec<Minutes> = stops.iter().map(|s| s.leg_time).collect();
        timeline::propagate(self.start_time, &visits, &legs, self.capacity)
    }

    /// Re-walk the existing stops from `start` after the dropoff. Stops as
    /// soon as a service start is no later than before, since everything
    /// after it can then only stay the same or get earlier.
    fn tail_fits(&self, mut prev: VisitTimes, first_leg: Minutes, start: usize) -> bool {
        for k in start..self.stops.len() {
            let leg = if k == start { first_leg } else { self.stops[k - 1].leg_time };
            match timeline::step(&prev, leg, &Visit::from(&self.stops[k]), self.capacity, k + 2) {
                Ok(t) if t.service_start <= self.times[k].service_start => return true,
                Ok(t) => prev = t,
                Err(_) => return false,
            }
        }
        true
    }

    fn stale(&self, request: &Request) -> SchedulerError {
        SchedulerError::StaleCandidate {
            vehicle_id: self.vehicle_id.clone(),
            passenger_id: request.passenger_id().clone(),
        }
    }
}

fn total_cost(stops: &[Stop]) -> Minutes {
    stops.iter().map(|s| s.leg_time).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::database::testing::{symmetric_db, uniform_db};
    use crate::types::DEPOT_ATTRIBUTION;

    fn request(id: &str, origin: usize, destination: usize, pickup: (f64, f64), dropoff: (f64, f64), npass: u32) -> Request {
        Request::new(
            id.into(),
            StopId(origin),
            StopId(destination),
            TimeWindow::new(pickup.0, pickup.1).unwrap(),
            TimeWindow::new(dropoff.0, dropoff.1).unwrap(),
            npass,
            1.0,
        )
        .unwrap()
    }

    fn itinerary(db: Arc<dyn Database>, capacity: u32, end_time: f64) -> Itinerary {
        Itinerary::new("bus-1".into(), capacity, 0.0, end_time, StopId(0), StopId(0), db).unwrap()
    }

    fn best(candidates: &[InsertionCandidate]) -> InsertionCandidate {
        candidates.iter().min_by(|a, b| a.rank(b)).cloned().unwrap()
    }

    fn insert_best(it: &mut Itinerary, r: &Request) -> InsertionCandidate {
        let c = best(&it.evaluate_insertion(r).unwrap());
        it.commit(&c, r).unwrap();
        c
    }

    fn roles(it: &Itinerary) -> Vec<StopRole> {
        it.stops().iter().map(Stop::role).collect()
    }

    // ── construction ──

    #[test]
    fn test_new_itinerary_is_depot_to_depot() {
        let db = uniform_db(3, 10);
        let it = Itinerary::new("bus-1".into(), 4, 0.0, 100.0, StopId(0), StopId(2), db).unwrap();

        assert_eq!(roles(&it), vec![StopRole::Depot, StopRole::Depot]);
        assert_eq!(it.cost(), 10.0);
        assert_eq!(it.schedule()[1].arrival, 10.0);
        it.check_invariants().unwrap();
    }

    #[test]
    fn test_shift_too_short_rejected() {
        let err = Itinerary::new("bus-1".into(), 4, 0.0, 5.0, StopId(0), StopId(1), uniform_db(2, 10)).unwrap_err();
        assert!(err.to_string().contains("end depot unreachable"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = Itinerary::new("bus-1".into(), 0, 0.0, 50.0, StopId(0), StopId(0), uniform_db(2, 10)).unwrap_err();
        assert!(matches!(err, SchedulerError::Validation { .. }));
    }

    // ── evaluation ──

    #[test]
    fn test_single_candidate_on_empty_itinerary() {
        let it = itinerary(uniform_db(3, 10), 4, 100.0);
        let r = request("p1", 1, 2, (0.0, 30.0), (0.0, 90.0), 1);

        let candidates = it.evaluate_insertion(&r).unwrap();
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!((c.pickup_index, c.dropoff_index), (0, 0));
        // depot -> 1 -> 2 -> depot
        assert_eq!(c.marginal_cost, 30.0);
    }

    #[test]
    fn test_evaluation_is_read_only() {
        let it = itinerary(uniform_db(3, 10), 4, 100.0);
        let before = it.stops().to_vec();
        let _ = it.evaluate_insertion(&request("p1", 1, 2, (0.0, 30.0), (0.0, 90.0), 1)).unwrap();
        assert_eq!(it.stops(), before.as_slice());
        assert_eq!(it.cost(), 0.0);
    }

    #[test]
    fn test_identical_requests_share_the_ride() {
        let mut it = itinerary(uniform_db(3, 10), 2, 100.0);
        let r1 = request("p1", 1, 2, (0.0, 30.0), (0.0, 90.0), 1);
        let r2 = request("p2", 1, 2, (0.0, 30.0), (0.0, 90.0), 1);

        insert_best(&mut it, &r1);
        let c = insert_best(&mut it, &r2);

        assert_eq!(c.marginal_cost, 0.0);
        assert_eq!(
            roles(&it),
            vec![
                StopRole::Depot,
                StopRole::Pickup,
                StopRole::Pickup,
                StopRole::Dropoff,
                StopRole::Dropoff,
                StopRole::Depot
            ]
        );
        // depot -> 1, 1 -> 2, 2 -> depot
        assert_eq!(it.cost(), 30.0);
        assert_eq!(it.load_profile(), vec![0, 1, 2, 1, 0, 0]);
        it.check_invariants().unwrap();
    }

    #[test]
    fn test_capacity_forces_sequential_rides() {
        let mut it = itinerary(uniform_db(3, 10), 1, 200.0);
        let r1 = request("p1", 1, 2, (0.0, 60.0), (0.0, 120.0), 1);
        let r2 = request("p2", 1, 2, (0.0, 60.0), (0.0, 120.0), 1);

        insert_best(&mut it, &r1);
        let candidates = it.evaluate_insertion(&r2).unwrap();
        assert!(!candidates.is_empty());
        for c in &candidates {
            // Never both on board: the new pair must not straddle the old one
            assert!(c.pickup_index == c.dropoff_index, "{c:?}");
        }

        insert_best(&mut it, &r2);
        assert!(it.load_profile().iter().all(|&l| l <= 1));
        it.check_invariants().unwrap();
    }

    #[test]
    fn test_zero_width_window_is_infeasible() {
        let it = itinerary(uniform_db(3, 10), 4, 100.0);
        let r = request("p1", 1, 2, (10.0, 10.0), (10.0, 10.0), 1);
        assert!(it.evaluate_insertion(&r).unwrap().is_empty());
        assert_eq!(it.stops().len(), 2);
    }

    #[test]
    fn test_party_larger_than_capacity_has_no_candidates() {
        let it = itinerary(uniform_db(3, 10), 3, 100.0);
        let r = request("p1", 1, 2, (0.0, 30.0), (0.0, 90.0), 4);
        assert!(it.evaluate_insertion(&r).unwrap().is_empty());
    }

    #[test]
    fn test_late_return_excludes_candidate() {
        // Trip itself fits the windows but the bus cannot get home in time
        let it = itinerary(uniform_db(3, 10), 4, 25.0);
        let r = request("p1", 1, 2, (0.0, 30.0), (0.0, 90.0), 1);
        assert!(it.evaluate_insertion(&r).unwrap().is_empty());
    }

    #[test]
    fn test_missing_travel_data_is_an_error() {
        // Stop 2 has no routes at all
        let db = symmetric_db(3, &[(0, 1, 1000, 5)]);
        let it = itinerary(db, 4, 100.0);
        let err = it
            .evaluate_insertion(&request("p1", 1, 2, (0.0, 30.0), (0.0, 90.0), 1))
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_marginal_cost_matches_commit() {
        // Line 0 - 1 - 2 - 3 with 5 minutes per hop
        let db = symmetric_db(
            4,
            &[
                (0, 1, 5000, 5),
                (1, 2, 5000, 5),
                (2, 3, 5000, 5),
                (0, 2, 10000, 10),
                (1, 3, 10000, 10),
                (0, 3, 15000, 15),
            ],
        );
        let mut base = itinerary(db, 3, 300.0);
        insert_best(&mut base, &request("p1", 1, 3, (0.0, 100.0), (0.0, 200.0), 1));
        insert_best(&mut base, &request("p2", 2, 1, (0.0, 100.0), (0.0, 200.0), 1));

        let r = request("p3", 3, 2, (0.0, 150.0), (0.0, 250.0), 1);
        let candidates = base.evaluate_insertion(&r).unwrap();
        assert!(!candidates.is_empty());
        for c in &candidates {
            let mut it = base.clone();
            it.commit(c, &r).unwrap();
            assert!(
                (it.cost() - base.cost() - c.marginal_cost).abs() < 1e-9,
                "candidate {c:?}"
            );
            let (pu, sd) = it.positions_of(r.passenger_id()).unwrap();
            assert_eq!((pu, sd), (c.pickup_index + 1, c.dropoff_index + 2));
        }
    }

    #[test]
    fn test_shortcut_through_new_pickup_is_found() {
        // Going 0 -> 3 -> 1 is far quicker than 0 -> 1 directly, so picking
        // p2 up first makes the existing stop 1 earlier.
        let db = symmetric_db(
            5,
            &[
                (0, 1, 100_000, 100),
                (0, 2, 100_000, 100),
                (0, 3, 1000, 1),
                (0, 4, 100_000, 100),
                (1, 2, 1000, 1),
                (1, 3, 1000, 1),
                (1, 4, 1000, 1),
                (2, 3, 100_000, 100),
                (2, 4, 1000, 1),
                (3, 4, 100_000, 100),
            ],
        );
        let mut it = itinerary(db, 2, 500.0);
        insert_best(&mut it, &request("p1", 1, 2, (0.0, 200.0), (0.0, 300.0), 1));
        assert_eq!(it.schedule()[1].service_start, 100.0);

        let r = request("p2", 3, 4, (0.0, 10.0), (0.0, 20.0), 1);
        let candidates = it.evaluate_insertion(&r).unwrap();
        let c = candidates
            .iter()
            .find(|c| (c.pickup_index, c.dropoff_index) == (0, 1))
            .cloned()
            .unwrap();
        assert_eq!(best(&candidates), c);

        let before = it.cost();
        it.commit(&c, &r).unwrap();
        let refs: Vec<usize> = it.stops().iter().map(|s| s.stop_ref().index()).collect();
        assert_eq!(refs, vec![0, 3, 1, 4, 2, 0]);
        assert_eq!(it.cost(), 104.0);
        assert!((it.cost() - before - c.marginal_cost).abs() < 1e-9);
        it.check_invariants().unwrap();
    }

    #[test]
    fn test_ties_break_on_lowest_indices() {
        let a = InsertionCandidate {
            vehicle_id: "a".into(),
            pickup_index: 1,
            dropoff_index: 2,
            marginal_cost: 5.0,
        };
        let b = InsertionCandidate {
            vehicle_id: "b".into(),
            pickup_index: 0,
            dropoff_index: 0,
            marginal_cost: 5.0,
        };
        let c = InsertionCandidate {
            pickup_index: 1,
            dropoff_index: 1,
            ..a.clone()
        };
        assert_eq!(a.rank(&b), Ordering::Less);
        assert_eq!(c.rank(&a), Ordering::Less);
    }

    // ── commit ──

    #[test]
    fn test_stale_candidate_leaves_itinerary_unchanged() {
        let mut it = itinerary(uniform_db(3, 10), 1, 200.0);
        let ra = request("a", 1, 2, (10.0, 11.0), (20.0, 22.0), 1);
        let rb = request("b", 1, 2, (10.0, 11.0), (20.0, 22.0), 1);

        let for_a = best(&it.evaluate_insertion(&ra).unwrap());
        insert_best(&mut it, &rb);

        let stops = it.stops().to_vec();
        let cost = it.cost();
        let err = it.commit(&for_a, &ra).unwrap_err();
        assert!(matches!(err, SchedulerError::StaleCandidate { .. }));
        assert_eq!(it.stops(), stops.as_slice());
        assert_eq!(it.cost(), cost);
    }

    #[test]
    fn test_out_of_range_candidate_is_stale() {
        let mut it = itinerary(uniform_db(3, 10), 2, 100.0);
        let r = request("p1", 1, 2, (0.0, 30.0), (0.0, 90.0), 1);
        let c = InsertionCandidate {
            vehicle_id: "bus-1".into(),
            pickup_index: 0,
            dropoff_index: 1,
            marginal_cost: 0.0,
        };
        assert!(matches!(it.commit(&c, &r), Err(SchedulerError::StaleCandidate { .. })));

        let other = InsertionCandidate {
            vehicle_id: "bus-2".into(),
            dropoff_index: 0,
            ..c
        };
        assert!(matches!(it.commit(&other, &r), Err(SchedulerError::StaleCandidate { .. })));
        assert_eq!(it.stops().len(), 2);
    }

    #[test]
    fn test_same_passenger_cannot_be_committed_twice() {
        let mut it = itinerary(uniform_db(3, 10), 2, 200.0);
        let r = request("p1", 1, 2, (0.0, 60.0), (0.0, 120.0), 1);
        let c = insert_best(&mut it, &r);
        let err = it.commit(&c, &r).unwrap_err();
        assert!(matches!(err, SchedulerError::Validation { .. }));
    }

    // ── projections ──

    #[test]
    fn test_legs_and_distance() {
        let mut it = itinerary(uniform_db(3, 10), 2, 100.0);
        insert_best(&mut it, &request("p1", 1, 2, (0.0, 30.0), (0.0, 90.0), 1));

        let legs = it.legs();
        let attribution: Vec<&str> = legs.iter().map(|l| l.passenger_id.as_str()).collect();
        assert_eq!(attribution, vec![DEPOT_ATTRIBUTION, "p1", "p1", DEPOT_ATTRIBUTION]);
        assert_eq!(legs.iter().map(|l| l.cost).sum::<f64>(), it.cost());
        assert_eq!(legs[3].target, None);

        // uniform fixture: 1 km per minute
        assert_eq!(it.traveled_km().unwrap(), 30.0);
        assert_eq!(it.passengers().count(), 1);
    }

    #[test]
    fn test_schedule_waits_for_windows() {
        let mut it = itinerary(uniform_db(3, 10), 2, 200.0);
        insert_best(&mut it, &request("p1", 1, 2, (30.0, 50.0), (0.0, 90.0), 1));

        let pickup = it.schedule()[1];
        assert_eq!(pickup.arrival, 10.0);
        assert_eq!(pickup.service_start, 30.0);
        assert_eq!(pickup.departure, 31.0);
        assert_eq!(it.schedule()[2].service_start, 41.0);
    }
}
