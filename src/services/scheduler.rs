//! Fleet-wide request scheduling.
//!
//! The scheduler owns the pending queue and every itinerary. Each request is
//! evaluated against the whole fleet, the winning candidate is committed on
//! its itinerary and the decision is logged. Requests no vehicle can take are
//! recorded as unserved; a missing travel pair aborts the run.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::itinerary::{InsertionCandidate, Itinerary};
use super::stats;
use super::status::{SchedulerPhase, StatusHandle};
use crate::error::{Result, SchedulerError};
use crate::types::{InsertionRecord, PassengerId, Request, RunReport, RunStatus, VehicleId};

/// Order in which the pending queue is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingOrder {
    /// One request at a time, by earliest pickup
    #[default]
    TimeOrder,
    /// Repeatedly the cheapest insertion over all pending requests
    MinimalCost,
}

/// How the winning candidate is chosen for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSelection {
    /// Cheapest candidate over the whole fleet
    #[default]
    BestFit,
    /// Cheapest candidate of the first vehicle, by id, that admits the request
    FirstFit,
}

impl SchedulingOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            SchedulingOrder::TimeOrder => "time_order",
            SchedulingOrder::MinimalCost => "minimal_cost",
        }
    }
}

impl CandidateSelection {
    pub const fn as_str(self) -> &'static str {
        match self {
            CandidateSelection::BestFit => "best_fit",
            CandidateSelection::FirstFit => "first_fit",
        }
    }
}

impl fmt::Display for SchedulingOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CandidateSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedulingOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "time_order" => Ok(SchedulingOrder::TimeOrder),
            "minimal_cost" => Ok(SchedulingOrder::MinimalCost),
            other => Err(format!("unknown scheduling order '{other}' (expected time_order or minimal_cost)")),
        }
    }
}

impl FromStr for CandidateSelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "best_fit" => Ok(CandidateSelection::BestFit),
            "first_fit" => Ok(CandidateSelection::FirstFit),
            other => Err(format!("unknown candidate selection '{other}' (expected best_fit or first_fit)")),
        }
    }
}

/// Scheduling policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchedulerPolicy {
    pub order: SchedulingOrder,
    pub selection: CandidateSelection,
}

/// Outcome of scheduling one request
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Scheduled(InsertionCandidate),
    Unserved,
}

pub struct Scheduler {
    pending: VecDeque<Request>,
    /// Sorted by vehicle id
    itineraries: Vec<Itinerary>,
    insertion_log: BTreeMap<VehicleId, Vec<InsertionRecord>>,
    scheduled: Vec<PassengerId>,
    unserved: Vec<Request>,
    policy: SchedulerPolicy,
    phase: SchedulerPhase,
    run_id: Uuid,
    started_at: Option<DateTime<Utc>>,
    status: StatusHandle,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("run_id", &self.run_id)
            .field("policy", &self.policy)
            .field("phase", &self.phase)
            .field("itineraries", &self.itineraries)
            .field("pending", &self.pending.len())
            .field("scheduled", &self.scheduled)
            .field("unserved", &self.unserved.len())
            .finish()
    }
}

impl Scheduler {
    /// Scheduler over a fleet. Vehicle ids must be unique.
    pub fn new(mut itineraries: Vec<Itinerary>, policy: SchedulerPolicy) -> Result<Self> {
        if itineraries.is_empty() {
            return Err(SchedulerError::validation("fleet", "at least one vehicle is required"));
        }
        itineraries.sort_by(|a, b| a.vehicle_id().cmp(b.vehicle_id()));
        if let Some(pair) = itineraries.windows(2).find(|w| w[0].vehicle_id() == w[1].vehicle_id()) {
            return Err(SchedulerError::validation(
                format!("vehicle {}", pair[0].vehicle_id()),
                "duplicate vehicle id",
            ));
        }

        let insertion_log = itineraries
            .iter()
            .map(|it| (it.vehicle_id().clone(), Vec::new()))
            .collect();
        let run_id = Uuid::new_v4();

        info!(
            "Scheduler {} ready: {} vehicles, order {}, selection {}",
            run_id,
            itineraries.len(),
            policy.order,
            policy.selection
        );

        Ok(Self {
            pending: VecDeque::new(),
            itineraries,
            insertion_log,
            scheduled: Vec::new(),
            unserved: Vec::new(),
            policy,
            phase: SchedulerPhase::Idle,
            run_id,
            started_at: None,
            status: StatusHandle::new(run_id),
        })
    }

    /// Enqueue a request. Passenger ids must be unique over the whole run
    /// and both stops must exist in the database.
    pub fn add_request(&mut self, request: Request) -> Result<()> {
        let passenger_id = request.passenger_id();
        let known = self.pending.iter().any(|r| r.passenger_id() == passenger_id)
            || self.scheduled.contains(passenger_id)
            || self.unserved.iter().any(|r| r.passenger_id() == passenger_id);
        if known {
            return Err(SchedulerError::validation(
                format!("request {passenger_id}"),
                "duplicate passenger id",
            ));
        }

        let stop_count = self.itineraries[0].database().stop_count();
        for stop in [request.origin_id(), request.destination_id()] {
            if stop.index() >= stop_count {
                return Err(SchedulerError::Lookup(format!(
                    "request {passenger_id} references unknown stop {stop}"
                )));
            }
        }

        self.pending.push_back(request);
        if self.phase == SchedulerPhase::Done {
            self.set_phase(SchedulerPhase::Idle);
        }
        self.status.update(|p| p.total += 1);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn itineraries(&self) -> &[Itinerary] {
        &self.itineraries
    }

    pub fn itinerary(&self, vehicle_id: &VehicleId) -> Option<&Itinerary> {
        self.itineraries.iter().find(|it| it.vehicle_id() == vehicle_id)
    }

    pub fn pending_requests(&self) -> impl Iterator<Item = &Request> {
        self.pending.iter()
    }

    pub fn insertion_log(&self) -> &BTreeMap<VehicleId, Vec<InsertionRecord>> {
        &self.insertion_log
    }

    /// Passenger ids served, in commit order
    pub fn scheduled(&self) -> &[PassengerId] {
        &self.scheduled
    }

    pub fn unserved(&self) -> &[Request] {
        &self.unserved
    }

    pub fn policy(&self) -> SchedulerPolicy {
        self.policy
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn status(&self) -> RunStatus {
        self.status.status()
    }

    pub fn status_handle(&self) -> StatusHandle {
        self.status.clone()
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Drain the queue with the configured order and report.
    ///
    /// Blocking. With an empty queue this only rebuilds the report.
    pub fn run_to_completion(&mut self) -> Result<RunReport> {
        let started_at = *self.started_at.get_or_insert_with(Utc::now);
        self.status.update(|p| {
            p.status = RunStatus::Running;
            p.started_at = Some(started_at);
            p.error = None;
        });

        let outcome = match self.policy.order {
            SchedulingOrder::TimeOrder => self.schedule_all_requests_by_time_order(),
            SchedulingOrder::MinimalCost => self.schedule_all_requests_by_minimal_cost(),
        };
        if let Err(e) = outcome {
            warn!("Run {} aborted: {}", self.run_id, e);
            self.status.update(|p| {
                p.status = RunStatus::Done;
                p.error = Some(e.to_string());
            });
            return Err(e);
        }

        debug_assert!(double_booked(&self.itineraries).is_empty());
        let unserved: Vec<PassengerId> = self.unserved.iter().map(|r| r.passenger_id().clone()).collect();
        let total = self.scheduled.len() + self.unserved.len();
        let report = stats::build_report(self.run_id, started_at, &self.itineraries, &unserved, total)?;
        self.status.update(|p| p.status = RunStatus::Done);

        info!(
            "Run {} complete: {}/{} requests served, total cost {:.2} min, {:.2} km",
            self.run_id, report.served_requests, report.total_requests, report.total_cost, report.total_km
        );
        Ok(report)
    }

    /// Consume the queue by ascending `origin_time_ini`, ties by passenger
    /// id, committing each request where the selection policy puts it.
    pub fn schedule_all_requests_by_time_order(&mut self) -> Result<()> {
        self.sort_pending();
        while let Some(request) = self.pending.front().cloned() {
            self.schedule_request(&request)?;
            self.pending.pop_front();
        }
        self.set_phase(SchedulerPhase::Done);
        Ok(())
    }

    /// Repeatedly commit the cheapest insertion over all pending requests.
    /// Stops when no pending request has a candidate left; those become
    /// unserved.
    pub fn schedule_all_requests_by_minimal_cost(&mut self) -> Result<()> {
        self.sort_pending();
        while !self.pending.is_empty() {
            self.set_phase(SchedulerPhase::Searching);

            let mut best: Option<(usize, InsertionCandidate)> = None;
            for (k, request) in self.pending.iter().enumerate() {
                let Some(candidate) = self.search(request)? else {
                    continue;
                };
                // Strict: equal ranks keep the earlier request
                let better = best
                    .as_ref()
                    .map_or(true, |(_, b)| candidate.rank(b) == std::cmp::Ordering::Less);
                if better {
                    best = Some((k, candidate));
                }
            }

            let Some((k, candidate)) = best else {
                break;
            };
            let Some(request) = self.pending.remove(k) else {
                break;
            };
            self.set_phase(SchedulerPhase::Committing);
            if let Err(e) = self.commit(&candidate, &request) {
                self.pending.insert(k, request);
                self.set_phase(SchedulerPhase::Idle);
                return Err(e);
            }
            self.set_phase(SchedulerPhase::Idle);
        }

        while let Some(request) = self.pending.pop_front() {
            self.reject(request);
        }
        self.set_phase(SchedulerPhase::Done);
        Ok(())
    }

    /// Search the fleet for one request and apply the decision. The request
    /// is not taken from the queue.
    pub fn schedule_request(&mut self, request: &Request) -> Result<Decision> {
        self.set_phase(SchedulerPhase::Searching);
        let decision = match self.search(request) {
            Ok(Some(candidate)) => {
                self.set_phase(SchedulerPhase::Committing);
                match self.commit(&candidate, request) {
                    Ok(()) => Decision::Scheduled(candidate),
                    Err(e) => {
                        self.set_phase(SchedulerPhase::Idle);
                        return Err(e);
                    }
                }
            }
            Ok(None) => {
                self.reject(request.clone());
                Decision::Unserved
            }
            Err(e) => {
                self.set_phase(SchedulerPhase::Idle);
                return Err(e);
            }
        };
        self.set_phase(SchedulerPhase::Idle);
        Ok(decision)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn sort_pending(&mut self) {
        self.pending.make_contiguous().sort_by(|a, b| {
            a.origin_time_ini()
                .total_cmp(&b.origin_time_ini())
                .then_with(|| a.passenger_id().cmp(b.passenger_id()))
        });
    }

    /// Winning candidate for `request` under the selection policy.
    fn search(&self, request: &Request) -> Result<Option<InsertionCandidate>> {
        let mut best: Option<InsertionCandidate> = None;
        for itinerary in &self.itineraries {
            let candidates = itinerary.evaluate_insertion(request)?;
            let local = candidates.into_iter().min_by(|a, b| a.rank(b));
            best = match (best, local) {
                (Some(b), Some(l)) if l.rank(&b) == std::cmp::Ordering::Less => Some(l),
                (None, l) => l,
                (b, _) => b,
            };
            if best.is_some() && self.policy.selection == CandidateSelection::FirstFit {
                break;
            }
        }
        Ok(best)
    }

    fn commit(&mut self, candidate: &InsertionCandidate, request: &Request) -> Result<()> {
        let itinerary = self
            .itineraries
            .iter_mut()
            .find(|it| it.vehicle_id() == &candidate.vehicle_id)
            .ok_or_else(|| SchedulerError::Lookup(format!("unknown vehicle {}", candidate.vehicle_id)))?;

        itinerary.commit(candidate, request)?;
        let cost_after = itinerary.cost();

        debug!(
            "Request {} -> vehicle {} at ({}, {}), +{:.2} min (route {:.2} min)",
            request.passenger_id(),
            candidate.vehicle_id,
            candidate.pickup_index,
            candidate.dropoff_index,
            candidate.marginal_cost,
            cost_after
        );

        self.insertion_log
            .entry(candidate.vehicle_id.clone())
            .or_default()
            .push(InsertionRecord {
                passenger_id: request.passenger_id().clone(),
                pickup_index: candidate.pickup_index,
                dropoff_index: candidate.dropoff_index,
                marginal_cost: candidate.marginal_cost,
                cost_after,
            });
        self.scheduled.push(request.passenger_id().clone());
        self.status.update(|p| {
            p.processed += 1;
            p.served += 1;
        });
        Ok(())
    }

    fn reject(&mut self, request: Request) {
        warn!(
            "Request {} cannot be served by any vehicle (pickup [{:.1}, {:.1}], {} pax)",
            request.passenger_id(),
            request.origin_window().start,
            request.origin_window().end,
            request.npass()
        );
        self.unserved.push(request);
        self.status.update(|p| {
            p.processed += 1;
            p.unserved += 1;
        });
    }

    fn set_phase(&mut self, phase: SchedulerPhase) {
        self.phase = phase;
        self.status.update(|p| p.phase = phase);
    }
}

/// Passenger ids present in more than one itinerary. Empty for a healthy
/// fleet.
pub fn double_booked(itineraries: &[Itinerary]) -> Vec<PassengerId> {
    let mut seen = HashSet::new();
    let mut doubles = Vec::new();
    for itinerary in itineraries {
        for passenger in itinerary.passengers() {
            if !seen.insert(passenger.clone()) {
                doubles.push(passenger.clone());
            }
        }
    }
    doubles
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::services::database::testing::{symmetric_db, uniform_db};
    use crate::services::database::Database;
    use crate::types::{StopId, TimeWindow};

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

    fn vehicle(db: &Arc<dyn Database>, id: &str, capacity: u32, depot: usize) -> Itinerary {
        Itinerary::new(id.into(), capacity, 0.0, 200.0, StopId(depot), StopId(depot), db.clone()).unwrap()
    }

    fn fleet(db: Arc<dyn Database>, specs: &[(&str, u32, usize)], policy: SchedulerPolicy) -> Scheduler {
        let itineraries = specs.iter().map(|&(id, cap, depot)| vehicle(&db, id, cap, depot)).collect();
        Scheduler::new(itineraries, policy).unwrap()
    }

    fn assert_healthy(s: &Scheduler) {
        for it in s.itineraries() {
            it.check_invariants().unwrap();
        }
        assert!(double_booked(s.itineraries()).is_empty());
    }

    #[test]
    fn test_requests_processed_in_time_order() {
        let mut s = fleet(uniform_db(4, 5), &[("bus-1", 4, 0)], SchedulerPolicy::default());
        s.add_request(request("late", 1, 2, (50.0, 80.0), (50.0, 150.0), 1)).unwrap();
        s.add_request(request("b", 2, 3, (10.0, 40.0), (10.0, 150.0), 1)).unwrap();
        s.add_request(request("a", 1, 3, (10.0, 40.0), (10.0, 150.0), 1)).unwrap();

        s.schedule_all_requests_by_time_order().unwrap();

        let order: Vec<&str> = s.scheduled().iter().map(|p| p.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "late"]);
        assert_eq!(s.phase(), SchedulerPhase::Done);
        assert_eq!(s.pending_requests().count(), 0);
        assert_healthy(&s);
    }

    #[test]
    fn test_best_fit_picks_nearest_vehicle() {
        // bus-1 parked at stop 0, bus-2 at stop 3; request is 3 -> 2
        let db = symmetric_db(
            4,
            &[
                (0, 1, 1000, 1),
                (0, 2, 20000, 20),
                (0, 3, 30000, 30),
                (1, 2, 20000, 20),
                (1, 3, 30000, 30),
                (2, 3, 2000, 2),
            ],
        );
        let mut s = fleet(db, &[("bus-1", 4, 0), ("bus-2", 4, 3)], SchedulerPolicy::default());
        s.add_request(request("p1", 3, 2, (0.0, 100.0), (0.0, 150.0), 1)).unwrap();
        s.schedule_all_requests_by_time_order().unwrap();

        assert_eq!(s.insertion_log()[&VehicleId::new("bus-2")].len(), 1);
        assert!(s.insertion_log()[&VehicleId::new("bus-1")].is_empty());
        assert_eq!(s.itinerary(&"bus-2".into()).unwrap().cost(), 4.0);
    }

    #[test]
    fn test_first_fit_takes_first_vehicle_by_id() {
        let db = symmetric_db(
            4,
            &[
                (0, 1, 1000, 1),
                (0, 2, 20000, 20),
                (0, 3, 30000, 30),
                (1, 2, 20000, 20),
                (1, 3, 30000, 30),
                (2, 3, 2000, 2),
            ],
        );
        let policy = SchedulerPolicy {
            selection: CandidateSelection::FirstFit,
            ..Default::default()
        };
        let mut s = fleet(db, &[("bus-2", 4, 3), ("bus-1", 4, 0)], policy);
        s.add_request(request("p1", 3, 2, (0.0, 100.0), (0.0, 150.0), 1)).unwrap();
        s.schedule_all_requests_by_time_order().unwrap();

        assert_eq!(s.insertion_log()[&VehicleId::new("bus-1")].len(), 1);
    }

    #[test]
    fn test_cost_tie_goes_to_lowest_vehicle_id() {
        let db = uniform_db(3, 10);
        let mut s = fleet(db, &[("van-b", 4, 0), ("van-a", 4, 0)], SchedulerPolicy::default());

        let decision = s.schedule_request(&request("p1", 1, 2, (0.0, 50.0), (0.0, 150.0), 1)).unwrap();
        match decision {
            Decision::Scheduled(c) => assert_eq!(c.vehicle_id.as_str(), "van-a"),
            Decision::Unserved => panic!("request should fit"),
        }
    }

    #[test]
    fn test_oversized_party_unserved_fleet_wide() {
        let db = uniform_db(3, 10);
        let mut s = fleet(db, &[("bus-1", 2, 0), ("bus-2", 3, 0)], SchedulerPolicy::default());
        s.add_request(request("group", 1, 2, (0.0, 50.0), (0.0, 150.0), 4)).unwrap();

        let report = s.run_to_completion().unwrap();

        assert_eq!(report.served_requests, 0);
        assert_eq!(report.unserved, vec![PassengerId::new("group")]);
        for it in s.itineraries() {
            assert_eq!(it.stops().len(), 2);
        }
    }

    #[test]
    fn test_zero_width_window_unserved_without_mutation() {
        let db = uniform_db(3, 10);
        let mut s = fleet(db, &[("bus-1", 4, 0), ("bus-2", 4, 0)], SchedulerPolicy::default());
        s.add_request(request("tight", 1, 2, (30.0, 30.0), (30.0, 30.0), 1)).unwrap();

        s.schedule_all_requests_by_time_order().unwrap();

        assert_eq!(s.unserved().len(), 1);
        assert!(s.scheduled().is_empty());
        for it in s.itineraries() {
            assert_eq!(it.stops().len(), 2);
            assert_eq!(it.cost(), 0.0);
        }
    }

    #[test]
    fn test_rerun_with_empty_queue_is_noop() {
        let db = uniform_db(3, 10);
        let mut s = fleet(db, &[("bus-1", 2, 0)], SchedulerPolicy::default());
        s.add_request(request("p1", 1, 2, (0.0, 50.0), (0.0, 150.0), 1)).unwrap();

        let first = s.run_to_completion().unwrap();
        let stops = s.itineraries()[0].stops().to_vec();
        let second = s.run_to_completion().unwrap();

        assert_eq!(s.itineraries()[0].stops(), stops.as_slice());
        assert_eq!(first.served_requests, second.served_requests);
        assert_eq!(first.total_cost, second.total_cost);
        assert_eq!(first.run_id, second.run_id);
        assert_eq!(s.status(), RunStatus::Done);
    }

    #[test]
    fn test_duplicate_passenger_rejected() {
        let db = uniform_db(3, 10);
        let mut s = fleet(db, &[("bus-1", 2, 0)], SchedulerPolicy::default());
        s.add_request(request("p1", 1, 2, (0.0, 50.0), (0.0, 150.0), 1)).unwrap();
        let err = s.add_request(request("p1", 2, 1, (0.0, 50.0), (0.0, 150.0), 1)).unwrap_err();
        assert!(matches!(err, SchedulerError::Validation { .. }));

        s.schedule_all_requests_by_time_order().unwrap();
        assert!(s.add_request(request("p1", 2, 1, (0.0, 50.0), (0.0, 150.0), 1)).is_err());
    }

    #[test]
    fn test_unknown_stop_rejected_on_add() {
        let mut s = fleet(uniform_db(3, 10), &[("bus-1", 2, 0)], SchedulerPolicy::default());
        let err = s.add_request(request("p1", 1, 9, (0.0, 50.0), (0.0, 150.0), 1)).unwrap_err();
        assert!(matches!(err, SchedulerError::Lookup(_)));
    }

    #[test]
    fn test_duplicate_vehicle_rejected() {
        let db: Arc<dyn Database> = uniform_db(2, 10);
        let itineraries = vec![vehicle(&db, "bus-1", 2, 0), vehicle(&db, "bus-1", 4, 1)];
        assert!(Scheduler::new(itineraries, SchedulerPolicy::default()).is_err());
        assert!(Scheduler::new(Vec::new(), SchedulerPolicy::default()).is_err());
    }

    #[test]
    fn test_missing_travel_data_aborts_run() {
        // Stop 3 is only reachable from stop 2
        let db = symmetric_db(4, &[(0, 1, 1000, 5), (0, 2, 1000, 5), (1, 2, 1000, 5), (2, 3, 1000, 5)]);
        let mut s = fleet(db, &[("bus-1", 2, 0)], SchedulerPolicy::default());
        s.add_request(request("ok", 1, 2, (0.0, 50.0), (0.0, 150.0), 1)).unwrap();
        s.add_request(request("broken", 3, 1, (60.0, 90.0), (0.0, 150.0), 1)).unwrap();

        let err = s.run_to_completion().unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(s.scheduled(), &[PassengerId::new("ok")]);
        // The failing request stays queued
        assert_eq!(s.pending_requests().count(), 1);
        assert_eq!(s.status(), RunStatus::Done);
        assert!(s.status_handle().snapshot().error.is_some());
    }

    #[test]
    fn test_minimal_cost_order() {
        let db = uniform_db(4, 10);
        let policy = SchedulerPolicy {
            order: SchedulingOrder::MinimalCost,
            ..Default::default()
        };
        let mut s = fleet(db, &[("bus-1", 1, 0)], policy);
        // Both fit alone, never together: capacity 1 and overlapping windows
        s.add_request(request("first", 1, 2, (0.0, 15.0), (0.0, 25.0), 1)).unwrap();
        s.add_request(request("second", 3, 2, (0.0, 15.0), (0.0, 25.0), 1)).unwrap();
        s.add_request(request("never", 1, 3, (0.0, 0.0), (0.0, 0.0), 1)).unwrap();

        s.schedule_all_requests_by_minimal_cost().unwrap();

        // Equal costs: the earlier request in time order wins
        assert_eq!(s.scheduled(), &[PassengerId::new("first")]);
        let unserved: Vec<&str> = s.unserved().iter().map(|r| r.passenger_id().as_str()).collect();
        assert_eq!(unserved, vec!["never", "second"]);
        assert_healthy(&s);
    }

    #[test]
    fn test_status_handle_tracks_progress() {
        let db = uniform_db(3, 10);
        let mut s = fleet(db, &[("bus-1", 2, 0)], SchedulerPolicy::default());
        let handle = s.status_handle();
        s.add_request(request("p1", 1, 2, (0.0, 50.0), (0.0, 150.0), 1)).unwrap();
        s.add_request(request("p2", 1, 2, (5.0, 5.0), (5.0, 5.0), 1)).unwrap();
        assert_eq!(handle.status(), RunStatus::Idle);

        s.run_to_completion().unwrap();

        let progress = handle.snapshot();
        assert_eq!(progress.status, RunStatus::Done);
        assert_eq!(progress.phase, SchedulerPhase::Done);
        assert_eq!((progress.total, progress.processed), (2, 2));
        assert_eq!((progress.served, progress.unserved), (1, 1));
    }

    #[test]
    fn test_debug_lists_fleet_and_queue() {
        let mut s = fleet(uniform_db(3, 10), &[("bus-1", 2, 0)], SchedulerPolicy::default());
        s.add_request(request("p1", 1, 2, (0.0, 50.0), (0.0, 150.0), 1)).unwrap();

        let debug = format!("{s:?}");
        assert!(debug.contains("bus-1"));
        assert!(debug.contains("pending: 1"));

        let empty = Scheduler::new(Vec::new(), SchedulerPolicy::default());
        assert!(matches!(empty.unwrap_err(), SchedulerError::Validation { .. }));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("minimal_cost".parse::<SchedulingOrder>().unwrap(), SchedulingOrder::MinimalCost);
        assert_eq!("first-fit".parse::<CandidateSelection>().unwrap(), CandidateSelection::FirstFit);
        assert!("cheapest".parse::<SchedulingOrder>().is_err());
        assert_eq!(SchedulingOrder::TimeOrder.to_string(), "time_order");
    }
}
