//! Geographic and temporal primitives

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};

/// Time in minutes since the start of the service day.
pub type Minutes = f64;

/// Coordinates. Serialized as `[lat, lng]`, the layout of the scenario files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for Coordinates {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(c: Coordinates) -> Self {
        [c.lat, c.lng]
    }
}

/// Closed interval `[start, end]` in which a pickup or dropoff must begin.
///
/// Deserialization goes through [`TimeWindow::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeWindow")]
pub struct TimeWindow {
    pub start: Minutes,
    pub end: Minutes,
}

#[derive(Deserialize)]
struct RawTimeWindow {
    start: Minutes,
    end: Minutes,
}

impl TryFrom<RawTimeWindow> for TimeWindow {
    type Error = SchedulerError;

    fn try_from(raw: RawTimeWindow) -> Result<Self> {
        Self::new(raw.start, raw.end)
    }
}

impl TimeWindow {
    pub fn new(start: Minutes, end: Minutes) -> Result<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(SchedulerError::validation(
                "time window",
                format!("bounds must be finite, got [{start}, {end}]"),
            ));
        }
        if start > end {
            return Err(SchedulerError::validation(
                "time window",
                format!("start {start} is after end {end}"),
            ));
        }
        Ok(Self { start, end })
    }

    /// Window with no upper bound, used for the start depot.
    pub const fn open_from(start: Minutes) -> Self {
        Self {
            start,
            end: f64::INFINITY,
        }
    }

    pub fn width(&self) -> Minutes {
        self.end - self.start
    }

    pub fn contains(&self, t: Minutes) -> bool {
        t >= self.start && t <= self.end
    }

    /// Time at which service can begin for a vehicle arriving at `arrival`.
    pub fn service_start(&self, arrival: Minutes) -> Minutes {
        arrival.max(self.start)
    }
}
