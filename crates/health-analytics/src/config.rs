//! # Analytics Configuration
//!
//! Tunables for the engine, with environment-variable overrides.

use crate::error::AnalyticsError;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Seed used for unlisted-city offsets when none is configured.
pub const DEFAULT_SEED: u64 = 42;

/// What to do with a city that has no entry in the regional variation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownCityPolicy {
    /// Deterministic offset in [-5, 5] derived from the seed and city name
    Seeded(u64),
    /// Use the baseline rate unchanged
    Zero,
    /// Leave the city out of the analysis
    Skip,
}

impl Default for UnknownCityPolicy {
    fn default() -> Self {
        Self::Seeded(DEFAULT_SEED)
    }
}

impl FromStr for UnknownCityPolicy {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        match value.as_str() {
            "zero" => Ok(Self::Zero),
            "skip" => Ok(Self::Skip),
            "seeded" => Ok(Self::Seeded(DEFAULT_SEED)),
            _ => value
                .strip_prefix("seeded:")
                .and_then(|seed| seed.parse().ok())
                .map(Self::Seeded)
                .ok_or_else(|| {
                    AnalyticsError::InvalidParameter(format!("unknown city policy '{s}'"))
                }),
        }
    }
}

impl fmt::Display for UnknownCityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seeded(seed) => write!(f, "seeded:{seed}"),
            Self::Zero => f.write_str("zero"),
            Self::Skip => f.write_str("skip"),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsConfig {
    /// Vaccination rate assumed when no record carries one
    pub baseline_vaccination_rate: f64,

    /// Minimum number of real points for a correlation to count as real
    pub min_data_points: usize,

    /// Mean city AQI above which a city counts as vulnerable
    pub vulnerable_aqi_threshold: f64,

    /// Density used when the caller's lookup has no entry for a location
    pub default_population_density: f64,

    /// Handling of cities missing from the regional variation table
    pub unknown_city_policy: UnknownCityPolicy,

    /// Substitute the illustrative six-point fixture when real data is sparse
    pub synthesize_when_sparse: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            baseline_vaccination_rate: 70.0,
            min_data_points: 3,
            vulnerable_aqi_threshold: 150.0,
            default_population_density: 5000.0,
            unknown_city_policy: UnknownCityPolicy::default(),
            synthesize_when_sparse: false,
        }
    }
}

impl AnalyticsConfig {
    /// Load configuration from environment variables, keeping defaults for
    /// anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            baseline_vaccination_rate: env_or(
                "HEALTH_BASELINE_VACCINATION_RATE",
                defaults.baseline_vaccination_rate,
            ),
            min_data_points: env_or("HEALTH_MIN_DATA_POINTS", defaults.min_data_points),
            vulnerable_aqi_threshold: env_or(
                "HEALTH_VULNERABLE_AQI",
                defaults.vulnerable_aqi_threshold,
            ),
            default_population_density: env_or(
                "HEALTH_DEFAULT_DENSITY",
                defaults.default_population_density,
            ),
            unknown_city_policy: env_or("HEALTH_UNKNOWN_CITY", defaults.unknown_city_policy),
            synthesize_when_sparse: env::var("HEALTH_ILLUSTRATIVE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.synthesize_when_sparse),
        }
    }

    /// Builder-style override of the unknown-city policy.
    #[must_use]
    pub const fn with_unknown_city_policy(mut self, policy: UnknownCityPolicy) -> Self {
        self.unknown_city_policy = policy;
        self
    }

    /// Builder-style toggle for the illustrative fixture.
    #[must_use]
    pub const fn with_illustrative_fallback(mut self, enabled: bool) -> Self {
        self.synthesize_when_sparse = enabled;
        self
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparseable setting");
            default
        }),
        Err(_) => default,
    }
}
