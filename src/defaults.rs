//! Default tunables, shared by the settings and the environment config

use crate::types::Minutes;

pub const DEFAULT_SERVICE_MINUTES_PER_PASSENGER: Minutes = 1.0;
pub const DEFAULT_MAX_WAITING_MINUTES: Minutes = 20.0;
pub const DEFAULT_COORDINATE_TOLERANCE_M: f64 = 5.0;
/// Road distance over straight-line distance for estimated travel data
pub const DEFAULT_ROAD_COEFFICIENT: f64 = 1.3;
pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 40.0;
pub const DEFAULT_LOGS_DIR: &str = "logs";
pub const DEFAULT_LOG_FILTER: &str = "info,drt_scheduler=debug";
