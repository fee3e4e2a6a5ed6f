//! Route primitives: stops and the legs between them

use serde::{Deserialize, Serialize};

use super::{Minutes, PassengerId, Request, StopId, TimeWindow, VehicleId};

/// Passenger attribution reported for legs leaving a depot, and for the
/// terminal leg of an itinerary.
pub const DEPOT_ATTRIBUTION: &str = "depot";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopRole {
    Depot,
    Pickup,
    Dropoff,
}

impl StopRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            StopRole::Depot => "depot",
            StopRole::Pickup => "pickup",
            StopRole::Dropoff => "dropoff",
        }
    }
}

/// A visit to a location inside an itinerary.
///
/// Pickup and dropoff stops carry a copy of the bound request's applicable
/// window, party size and dwell time. The same location may appear as
/// several stops of one route.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub(crate) stop_ref: StopId,
    pub(crate) role: StopRole,
    pub(crate) passenger_id: Option<PassengerId>,
    pub(crate) window: TimeWindow,
    pub(crate) npass: u32,
    pub(crate) service_minutes: Minutes,
    /// Travel time to the next stop of the owning itinerary (0 at the end)
    pub(crate) leg_time: Minutes,
}

impl Stop {
    pub(crate) fn depot(stop_ref: StopId, window: TimeWindow) -> Self {
        Self {
            stop_ref,
            role: StopRole::Depot,
            passenger_id: None,
            window,
            npass: 0,
            service_minutes: 0.0,
            leg_time: 0.0,
        }
    }

    pub(crate) fn pickup(request: &Request) -> Self {
        Self {
            stop_ref: request.origin_id(),
            role: StopRole::Pickup,
            passenger_id: Some(request.passenger_id().clone()),
            window: request.origin_window(),
            npass: request.npass(),
            service_minutes: request.service_minutes(),
            leg_time: 0.0,
        }
    }

    pub(crate) fn dropoff(request: &Request) -> Self {
        Self {
            stop_ref: request.destination_id(),
            role: StopRole::Dropoff,
            passenger_id: Some(request.passenger_id().clone()),
            window: request.destination_window(),
            npass: request.npass(),
            service_minutes: request.service_minutes(),
            leg_time: 0.0,
        }
    }

    pub fn stop_ref(&self) -> StopId {
        self.stop_ref
    }

    pub fn role(&self) -> StopRole {
        self.role
    }

    pub fn passenger_id(&self) -> Option<&PassengerId> {
        self.passenger_id.as_ref()
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn npass(&self) -> u32 {
        self.npass
    }

    pub fn service_minutes(&self) -> Minutes {
        self.service_minutes
    }

    pub fn leg_time(&self) -> Minutes {
        self.leg_time
    }

    pub fn is_depot(&self) -> bool {
        self.role == StopRole::Depot
    }

    /// Change in on-board passengers when leaving this stop.
    pub fn load_delta(&self) -> i64 {
        match self.role {
            StopRole::Depot => 0,
            StopRole::Pickup => self.npass as i64,
            StopRole::Dropoff => -(self.npass as i64),
        }
    }
}

/// Travel segment between two consecutive stops. Reporting only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leg {
    pub vehicle_id: VehicleId,
    pub source: StopId,
    /// `None` for the terminal leg
    pub target: Option<StopId>,
    /// Passenger of the source stop, or [`DEPOT_ATTRIBUTION`]
    pub passenger_id: String,
    pub cost: Minutes,
}

impl Leg {
    pub(crate) fn from_stops(vehicle_id: &VehicleId, source: &Stop, target: Option<&Stop>) -> Self {
        let passenger_id = match (source.passenger_id(), target) {
            (Some(p), Some(_)) => p.to_string(),
            _ => DEPOT_ATTRIBUTION.to_string(),
        };
        Self {
            vehicle_id: vehicle_id.clone(),
            source: source.stop_ref,
            target: target.map(|t| t.stop_ref),
            passenger_id,
            cost: source.leg_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request {
        Request::new(
            "p1".into(),
            StopId(3),
            StopId(7),
            TimeWindow { start: 0.0, end: 10.0 },
            TimeWindow { start: 5.0, end: 40.0 },
            2,
            1.5,
        )
        .unwrap()
    }

    #[test]
    fn test_pickup_and_dropoff_bind_request() {
        let r = request();
        let pu = Stop::pickup(&r);
        let sd = Stop::dropoff(&r);

        assert_eq!(pu.stop_ref(), StopId(3));
        assert_eq!(pu.role(), StopRole::Pickup);
        assert_eq!(pu.window().end, 10.0);
        assert_eq!(pu.load_delta(), 2);

        assert_eq!(sd.stop_ref(), StopId(7));
        assert_eq!(sd.window().start, 5.0);
        assert_eq!(sd.load_delta(), -2);
        assert_eq!(sd.passenger_id().map(|p| p.as_str()), Some("p1"));
    }

    #[test]
    fn test_depot_has_no_passenger() {
        let d = Stop::depot(StopId(0), TimeWindow::open_from(0.0));
        assert!(d.is_depot());
        assert!(d.passenger_id().is_none());
        assert_eq!(d.load_delta(), 0);
    }

    #[test]
    fn test_leg_attribution() {
        let vehicle = VehicleId::new("bus-1");
        let mut pu = Stop::pickup(&request());
        pu.leg_time = 4.0;
        let depot = Stop::depot(StopId(0), TimeWindow::open_from(0.0));

        let leg = Leg::from_stops(&vehicle, &pu, Some(&depot));
        assert_eq!(leg.passenger_id, "p1");
        assert_eq!(leg.cost, 4.0);
        assert_eq!(leg.target, Some(StopId(0)));

        let terminal = Leg::from_stops(&vehicle, &depot, None);
        assert_eq!(terminal.passenger_id, DEPOT_ATTRIBUTION);
        assert_eq!(terminal.target, None);
    }
}
