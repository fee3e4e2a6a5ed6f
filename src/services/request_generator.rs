//! Synthetic customer demand.
//!
//! Draws random points inside the bounding box of the stop catalogue and
//! snaps each to its closest stop, so the generated customers always resolve
//! against the same database.

use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::database::Database;
use super::geo::{bounding_box, haversine_distance};
use crate::error::{Result, SchedulerError};
use crate::types::{Coordinates, CustomerConfig, Minutes, StopId};

/// Seconds between two candidate issue times
const ISSUE_SLOT_SECONDS: usize = 30;
/// First issue time, in seconds
const FIRST_ISSUE_SECOND: usize = 10;
/// Direct travel time multiplier for the dropoff deadline
const DETOUR_FACTOR: f64 = 2.5;
/// Bounding-box draws for a destination before falling back to a uniform
/// pick among the other locations
const MAX_DESTINATION_DRAWS: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSettings {
    pub count: usize,
    /// Issue times are spread over `[0, duration_minutes)`
    pub duration_minutes: Minutes,
    /// Pickup window width is drawn from this range
    pub pickup_window_minutes: (Minutes, Minutes),
    pub npass: u32,
    /// Fixed seed for reproducible demand
    pub seed: Option<u64>,
    /// Prefix of generated customer names
    pub name_prefix: String,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            count: 20,
            duration_minutes: 20.0,
            pickup_window_minutes: (30.0, 45.0),
            npass: 1,
            seed: None,
            name_prefix: "auto_generated_request".to_string(),
        }
    }
}

/// Generate `settings.count` customers over the database's catalogue.
pub fn generate_customers(db: &dyn Database, settings: &GeneratorSettings) -> Result<Vec<CustomerConfig>> {
    if db.stop_count() < 2 {
        return Err(SchedulerError::validation(
            "request generator",
            "at least two stops are needed",
        ));
    }
    let (low, high) = settings.pickup_window_minutes;
    if !(low >= 0.0 && low <= high) || settings.npass == 0 {
        return Err(SchedulerError::validation(
            "request generator",
            format!("pickup window range [{low}, {high}] or party size {} is invalid", settings.npass),
        ));
    }

    let catalogue = (0..db.stop_count())
        .map(|i| db.coordinates(StopId(i)))
        .collect::<Result<Vec<_>>>()?;
    let (min, max) = bounding_box(&catalogue)
        .ok_or_else(|| SchedulerError::validation("request generator", "empty catalogue"))?;

    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Distinct issue times on a fixed 30 s grid
    let duration_s = (settings.duration_minutes * 60.0).max(0.0) as usize;
    let slots: Vec<usize> = (FIRST_ISSUE_SECOND..duration_s).step_by(ISSUE_SLOT_SECONDS).collect();
    if settings.count > slots.len() {
        return Err(SchedulerError::validation(
            "request generator",
            format!(
                "{} requests do not fit in {} minutes ({} issue slots)",
                settings.count,
                settings.duration_minutes,
                slots.len()
            ),
        ));
    }
    let mut issue_times: Vec<Minutes> = index::sample(&mut rng, slots.len(), settings.count)
        .into_iter()
        .map(|k| slots[k] as f64 / 60.0)
        .collect();
    issue_times.sort_by(|a, b| a.total_cmp(b));

    let mut customers = Vec::with_capacity(settings.count);
    for (i, issue_time) in issue_times.into_iter().enumerate() {
        let origin = random_stop(&mut rng, &catalogue, min, max);
        let destination = random_destination(&mut rng, &catalogue, min, max, origin).ok_or_else(|| {
            SchedulerError::validation(
                "request generator",
                "every catalogued stop shares the same coordinates",
            )
        })?;

        let travel = db.travel_time(origin, destination)?;
        let origin_time_ini = issue_time;
        let origin_time_end = origin_time_ini + rng.gen_range(low..=high);

        customers.push(CustomerConfig {
            name: format!("{}_{i}", settings.name_prefix),
            position: catalogue[origin.index()],
            destination: catalogue[destination.index()],
            npass: settings.npass,
            origin_time_ini,
            origin_time_end: Some(origin_time_end),
            destination_time_ini: origin_time_ini + travel,
            destination_time_end: origin_time_end + travel * DETOUR_FACTOR,
        });
    }

    info!("Generated {} customers over {} stops", customers.len(), catalogue.len());
    Ok(customers)
}

/// A stop at different coordinates than `origin`, or `None` when the whole
/// catalogue sits on one point.
fn random_destination(
    rng: &mut StdRng,
    catalogue: &[Coordinates],
    min: Coordinates,
    max: Coordinates,
    origin: StopId,
) -> Option<StopId> {
    let at_origin = catalogue[origin.index()];
    for _ in 0..MAX_DESTINATION_DRAWS {
        let stop = random_stop(rng, catalogue, min, max);
        if catalogue[stop.index()] != at_origin {
            return Some(stop);
        }
    }
    let others: Vec<usize> = (0..catalogue.len()).filter(|&k| catalogue[k] != at_origin).collect();
    others.choose(rng).map(|&k| StopId(k))
}

/// Closest catalogued stop to a uniform point of the bounding box
fn random_stop(rng: &mut StdRng, catalogue: &[Coordinates], min: Coordinates, max: Coordinates) -> StopId {
    let point = Coordinates::new(
        if min.lat < max.lat { rng.gen_range(min.lat..max.lat) } else { min.lat },
        if min.lng < max.lng { rng.gen_range(min.lng..max.lng) } else { min.lng },
    );
    let closest = catalogue
        .iter()
        .enumerate()
        .min_by(|a, b| haversine_distance(a.1, &point).total_cmp(&haversine_distance(b.1, &point)))
        .map_or(0, |(i, _)| i);
    StopId(closest)
}
