//! Forward time propagation through a stop sequence.
//!
//! Given an ordered list of visits and the travel time of each leg, this
//! module walks the route from the start depot and computes arrival, service
//! start and departure for every visit, together with the on-board load when
//! leaving it. It never re-orders anything: it only answers whether a given
//! sequence is feasible and when each visit happens.

use serde::Serialize;

use crate::types::{Minutes, Stop, TimeWindow};

/// Slack allowed when comparing a service start against a window end.
/// Travel times come from seconds / 60 and accumulate rounding noise.
pub const TIME_EPSILON: Minutes = 1e-9;

/// What the propagation needs to know about a stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visit {
    pub window: TimeWindow,
    pub service_minutes: Minutes,
    /// Change in on-board passengers when leaving the visit
    pub load_delta: i64,
}

impl From<&Stop> for Visit {
    fn from(stop: &Stop) -> Self {
        Self {
            window: stop.window(),
            service_minutes: stop.service_minutes(),
            load_delta: stop.load_delta(),
        }
    }
}

/// Computed times for a single visit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisitTimes {
    pub arrival: Minutes,
    pub service_start: Minutes,
    pub departure: Minutes,
    /// Passengers on board when leaving the visit
    pub load: u32,
}

impl VisitTimes {
    /// Time spent at the stop before service could begin.
    pub fn wait(&self) -> Minutes {
        self.service_start - self.arrival
    }
}

/// First constraint broken while walking a sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Violation {
    /// Service would start after the window closed
    LateService {
        position: usize,
        service_start: Minutes,
        latest: Minutes,
    },
    /// More passengers on board than seats
    OverCapacity {
        position: usize,
        load: i64,
        capacity: u32,
    },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::LateService {
                position,
                service_start,
                latest,
            } => write!(
                f,
                "service at position {position} starts at {service_start:.2}, window closes at {latest:.2}"
            ),
            Violation::OverCapacity {
                position,
                load,
                capacity,
            } => write!(f, "load {load} at position {position} exceeds capacity {capacity}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Times at the start depot: the vehicle leaves at `start_time` empty.
pub fn depart(start_time: Minutes, depot: &Visit) -> VisitTimes {
    let service_start = depot.window.service_start(start_time);
    VisitTimes {
        arrival: start_time,
        service_start,
        departure: service_start + depot.service_minutes,
        load: 0,
    }
}

/// Advance one leg: leave `prev`, travel `leg_time`, serve `visit`.
///
/// # Panics
///
/// On a negative leg time or a negative load; both mean the caller built a
/// broken sequence.
pub fn step(
    prev: &VisitTimes,
    leg_time: Minutes,
    visit: &Visit,
    capacity: u32,
    position: usize,
) -> Result<VisitTimes, Violation> {
    assert!(
        leg_time >= 0.0,
        "negative leg time {leg_time} into position {position}"
    );

    let arrival = prev.departure + leg_time;
    let service_start = visit.window.service_start(arrival);
    if service_start > visit.window.end + TIME_EPSILON {
        return Err(Violation::LateService {
            position,
            service_start,
            latest: visit.window.end,
        });
    }

    let load = prev.load as i64 + visit.load_delta;
    assert!(load >= 0, "negative load {load} at position {position}");
    if load > capacity as i64 {
        return Err(Violation::OverCapacity {
            position,
            load,
            capacity,
        });
    }

    Ok(VisitTimes {
        arrival,
        service_start,
        departure: service_start + visit.service_minutes,
        load: load as u32,
    })
}

/// Propagate a whole sequence. `legs[k]` is the travel time from visit `k`
/// to visit `k + 1`; the first visit is the start depot.
pub fn propagate(
    start_time: Minutes,
    visits: &[Visit],
    legs: &[Minutes],
    capacity: u32,
) -> Result<Vec<VisitTimes>, Violation> {
    let Some(first) = visits.first() else {
        return Ok(Vec::new());
    };
    assert!(
        legs.len() + 1 >= visits.len(),
        "{} legs cannot connect {} visits",
        legs.len(),
        visits.len()
    );

    let mut times = Vec::with_capacity(visits.len());
    times.push(depart(start_time, first));

    for (k, visit) in visits.iter().enumerate().skip(1) {
        let next = step(&times[k - 1], legs[k - 1], visit, capacity, k)?;
        times.push(next);
    }

    Ok(times)
}

// ===========================================================================
// Tests
// ===========================================================================
