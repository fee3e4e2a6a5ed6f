//! Configuration management

use std::str::FromStr;

use anyhow::{self, Context, Result};
use drt_scheduler::defaults;
use drt_scheduler::services::{CandidateSelection, SchedulerSettings, SchedulingOrder};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for the rolling log files
    pub logs_dir: String,

    /// Write the log file as JSON lines (LOG_FORMAT=json)
    pub log_json: bool,

    /// Scheduling tunables and policies
    pub settings: SchedulerSettings,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let logs_dir = get("LOGS_DIR").unwrap_or_else(|| defaults::DEFAULT_LOGS_DIR.to_string());

        let log_json = match get("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("text") => false,
            Some("json") => true,
            Some(other) => anyhow::bail!("LOG_FORMAT must be text or json, got {other:?}"),
        };

        let mut settings = SchedulerSettings::default();
        settings.service_minutes_per_passenger = number(
            &get,
            "DRT_SERVICE_MINUTES_PER_PASSENGER",
            defaults::DEFAULT_SERVICE_MINUTES_PER_PASSENGER,
        )?;
        settings.max_waiting_minutes = number(&get, "DRT_MAX_WAITING_MINUTES", defaults::DEFAULT_MAX_WAITING_MINUTES)?;
        settings.coordinate_tolerance_m =
            number(&get, "DRT_COORDINATE_TOLERANCE_M", defaults::DEFAULT_COORDINATE_TOLERANCE_M)?;
        settings.road_coefficient = number(&get, "DRT_ROAD_COEFFICIENT", defaults::DEFAULT_ROAD_COEFFICIENT)?;
        settings.average_speed_kmh = number(&get, "DRT_AVERAGE_SPEED_KMH", defaults::DEFAULT_AVERAGE_SPEED_KMH)?;

        if let Some(value) = get("DRT_CLAMP_PICKUP_WINDOW") {
            settings.clamp_pickup_window = value
                .trim()
                .to_ascii_lowercase()
                .parse::<bool>()
                .with_context(|| format!("DRT_CLAMP_PICKUP_WINDOW must be true or false, got {value:?}"))?;
        }
        if let Some(value) = get("DRT_SCHEDULING_ORDER") {
            settings.policy.order = policy::<SchedulingOrder>("DRT_SCHEDULING_ORDER", &value)?;
        }
        if let Some(value) = get("DRT_CANDIDATE_SELECTION") {
            settings.policy.selection = policy::<CandidateSelection>("DRT_CANDIDATE_SELECTION", &value)?;
        }

        if settings.service_minutes_per_passenger < 0.0 || settings.max_waiting_minutes < 0.0 {
            anyhow::bail!("service and waiting minutes must not be negative");
        }
        if settings.road_coefficient <= 0.0 || settings.average_speed_kmh <= 0.0 {
            anyhow::bail!(
                "DRT_ROAD_COEFFICIENT and DRT_AVERAGE_SPEED_KMH must be positive (got {} and {})",
                settings.road_coefficient,
                settings.average_speed_kmh
            );
        }

        Ok(Self {
            logs_dir,
            log_json,
            settings,
        })
    }
}

fn number(get: &impl Fn(&str) -> Option<String>, key: &str, default: f64) -> Result<f64> {
    match get(key) {
        Some(value) => {
            let parsed = value
                .trim()
                .parse::<f64>()
                .with_context(|| format!("{key} must be a number, got {value:?}"))?;
            if !parsed.is_finite() {
                anyhow::bail!("{key} must be finite, got {value:?}");
            }
            Ok(parsed)
        }
        None => Ok(default),
    }
}

fn policy<T: FromStr<Err = String>>(key: &str, value: &str) -> Result<T> {
    value.parse::<T>().map_err(|e| anyhow::anyhow!("{key}: {e}"))
}
