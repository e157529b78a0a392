//! Vaccination rate vs. air quality correlation.
//!
//! Vaccination data is daily history while AQI data is a near real-time
//! snapshot, so the two are compared across cities rather than across
//! time. Each city contributes one point: its mean AQI against a
//! vaccination rate derived from the latest national rate plus a
//! regional offset.

use crate::config::{AnalyticsConfig, DEFAULT_SEED, UnknownCityPolicy};
use crate::error::{AnalyticsError, Result};
use health_domain::{
    AirQualityRecord, CorrelationAnalysis, CorrelationDataPoint, Significance, VaccinationRecord,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

const MIN_CITY_RATE: f64 = 30.0;
const MAX_CITY_RATE: f64 = 95.0;
const UNKNOWN_CITY_SPREAD: f64 = 5.0;
const T_EPSILON: f64 = 1e-4;

/// Illustrative (label, vaccination, aqi) combinations.
const ILLUSTRATIVE_POINTS: [(&str, f64, f64); 6] = [
    ("High Vacc / Low AQI", 85.0, 45.0),
    ("High Vacc / Med AQI", 80.0, 95.0),
    ("Med Vacc / High AQI", 65.0, 150.0),
    ("Med Vacc / Med AQI", 70.0, 110.0),
    ("Low Vacc / High AQI", 55.0, 180.0),
    ("Low Vacc / Med AQI", 50.0, 120.0),
];

/// Regional deviation of a city's vaccination rate from the national rate.
pub trait RegionalVariation {
    /// Offset in percentage points, or `None` for an unlisted city.
    fn offset(&self, city: &str) -> Option<f64>;
}

impl RegionalVariation for HashMap<String, f64> {
    fn offset(&self, city: &str) -> Option<f64> {
        self.get(city).copied()
    }
}

/// City name to offset lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionalOffsetTable {
    offsets: HashMap<String, f64>,
}

impl RegionalOffsetTable {
    /// Table with no entries; every city is unlisted.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            offsets: HashMap::new(),
        }
    }

    /// Add or replace a city's offset.
    #[must_use]
    pub fn with(mut self, city: impl Into<String>, offset: f64) -> Self {
        self.offsets.insert(city.into(), offset);
        self
    }

    /// Number of listed cities
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether no city is listed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

impl Default for RegionalOffsetTable {
    fn default() -> Self {
        [
            ("Delhi", -8.0),
            ("Mumbai", 5.0),
            ("Kolkata", -5.0),
            ("Chennai", 3.0),
            ("Bangalore", 8.0),
            ("Hyderabad", 4.0),
            ("Pune", 6.0),
            ("Ahmedabad", -3.0),
            ("Jaipur", -6.0),
            ("Lucknow", -7.0),
            ("New York", 12.0),
            ("Los Angeles", 10.0),
            ("Chicago", 8.0),
            ("Houston", 5.0),
            ("London", 15.0),
            ("Paris", 12.0),
            ("Tokyo", 18.0),
            ("Sydney", 14.0),
            ("Berlin", 13.0),
            ("São Paulo", -2.0),
        ]
        .into_iter()
        .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for RegionalOffsetTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            offsets: iter
                .into_iter()
                .map(|(city, offset)| (city.into(), offset))
                .collect(),
        }
    }
}

impl RegionalVariation for RegionalOffsetTable {
    fn offset(&self, city: &str) -> Option<f64> {
        self.offsets.get(city).copied()
    }
}

/// Result of a correlation run, tagged by where its points came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorrelationOutcome {
    /// Computed from real city data only
    Real(CorrelationAnalysis),
    /// Too few real points; nothing was computed
    #[serde(rename_all = "camelCase")]
    Insufficient {
        /// Minimum number of points that was required
        required: usize,
        /// The real points that were available
        data_points: Vec<CorrelationDataPoint>,
        /// Cities left out under [`UnknownCityPolicy::Skip`]
        skipped_cities: Vec<String>,
    },
    /// Real points padded with the illustrative fixture
    #[serde(rename_all = "camelCase")]
    Illustrative {
        /// Analysis over real and illustrative points together
        #[serde(flatten)]
        analysis: CorrelationAnalysis,
        /// Cities left out under [`UnknownCityPolicy::Skip`]
        skipped_cities: Vec<String>,
    },
}

impl CorrelationOutcome {
    /// The analysis to display; neutral for insufficient data.
    #[must_use]
    pub fn analysis(&self) -> CorrelationAnalysis {
        match self {
            Self::Real(analysis) | Self::Illustrative { analysis, .. } => analysis.clone(),
            Self::Insufficient { .. } => CorrelationAnalysis::neutral(),
        }
    }

    /// The computed analysis, or [`AnalyticsError::InsufficientData`].
    pub fn into_result(self) -> Result<CorrelationAnalysis> {
        match self {
            Self::Real(analysis) | Self::Illustrative { analysis, .. } => Ok(analysis),
            Self::Insufficient {
                required,
                data_points,
                ..
            } => Err(AnalyticsError::InsufficientData {
                required,
                available: data_points.len(),
            }),
        }
    }

    /// Whether every point came from the caller's data
    #[must_use]
    pub const fn is_real(&self) -> bool {
        matches!(self, Self::Real(_))
    }
}

/// Correlate vaccination rate with mean AQI across cities.
///
/// The national rate is `peopleVaccinatedPerHundred` of the record with the
/// greatest `date` (the configured baseline when absent). City rates are
/// that rate plus the city's regional offset, clamped to `[30, 95]`.
pub fn calculate_correlation(
    vaccinations: &[VaccinationRecord],
    air_quality: &[AirQualityRecord],
    variation: &dyn RegionalVariation,
    config: &AnalyticsConfig,
) -> CorrelationOutcome {
    let base_rate = latest_vaccination_rate(vaccinations).unwrap_or_else(|| {
        tracing::warn!(
            baseline = config.baseline_vaccination_rate,
            "No latest vaccination rate, using baseline"
        );
        config.baseline_vaccination_rate
    });

    let mut city_values: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in air_quality {
        if record.city.is_empty() || !record.value.is_finite() {
            continue;
        }
        city_values.entry(record.city.as_str()).or_default().push(record.value);
    }

    let mut data_points = Vec::with_capacity(city_values.len());
    let mut skipped_cities = Vec::new();
    for (city, values) in city_values {
        let offset = match variation.offset(city) {
            Some(offset) => offset,
            None => match config.unknown_city_policy {
                UnknownCityPolicy::Seeded(seed) => seeded_offset(seed, city),
                UnknownCityPolicy::Zero => 0.0,
                UnknownCityPolicy::Skip => {
                    skipped_cities.push(city.to_string());
                    continue;
                }
            },
        };

        data_points.push(CorrelationDataPoint {
            date: city.to_string(),
            vaccination: (base_rate + offset).clamp(MIN_CITY_RATE, MAX_CITY_RATE),
            aqi: values.iter().mean(),
        });
    }

    tracing::debug!(
        base_rate,
        points = data_points.len(),
        skipped = skipped_cities.len(),
        "Built city correlation points"
    );

    if data_points.len() >= config.min_data_points {
        return CorrelationOutcome::Real(analyze(data_points));
    }

    if config.synthesize_when_sparse {
        let seed = match config.unknown_city_policy {
            UnknownCityPolicy::Seeded(seed) => seed,
            UnknownCityPolicy::Zero | UnknownCityPolicy::Skip => DEFAULT_SEED,
        };
        tracing::warn!(
            real_points = data_points.len(),
            skipped = ?skipped_cities,
            "Sparse city data, padding with illustrative points"
        );
        data_points.extend(illustrative_points(seed));
        return CorrelationOutcome::Illustrative {
            analysis: analyze(data_points),
            skipped_cities,
        };
    }

    CorrelationOutcome::Insufficient {
        required: config.min_data_points,
        data_points,
        skipped_cities,
    }
}

/// Pearson correlation plus coarse significance over `data_points`.
///
/// Fewer than two points yield the neutral analysis with no points.
#[must_use]
pub fn analyze(data_points: Vec<CorrelationDataPoint>) -> CorrelationAnalysis {
    if data_points.len() < 2 {
        return CorrelationAnalysis::neutral();
    }

    let correlation = pearson(&data_points);
    let (p_value, significance) = approximate_significance(correlation, data_points.len());

    CorrelationAnalysis {
        correlation,
        p_value,
        significance,
        data_points,
    }
}

/// Pearson coefficient of vaccination against AQI.
///
/// Returns 0 when either variable has no variance or the result is NaN.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pearson(data_points: &[CorrelationDataPoint]) -> f64 {
    let n = data_points.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2, mut sum_y2) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for point in data_points {
        let (x, y) = (point.vaccination, point.aqi);
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
        sum_y2 += y * y;
    }

    let numerator = n.mul_add(sum_xy, -(sum_x * sum_y));
    let denominator =
        (n.mul_add(sum_x2, -(sum_x * sum_x)) * n.mul_add(sum_y2, -(sum_y * sum_y))).sqrt();

    if denominator == 0.0 {
        return 0.0;
    }
    let correlation = numerator / denominator;
    if correlation.is_nan() { 0.0 } else { correlation }
}

/// Bucket the t-statistic of `correlation` over `n` points into a p-value.
///
/// |t| > 2.5 gives 0.01, |t| > 2 gives 0.05, anything else 0.1. Only
/// p < 0.05 counts as significant.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn approximate_significance(correlation: f64, n: usize) -> (f64, Significance) {
    let degrees = n.saturating_sub(2) as f64;
    let t = correlation * (degrees / (1.0 - correlation.powi(2) + T_EPSILON)).sqrt();

    let p_value = if t.abs() > 2.5 {
        0.01
    } else if t.abs() > 2.0 {
        0.05
    } else {
        0.1
    };
    let significance = if p_value < 0.05 {
        Significance::Significant
    } else {
        Significance::NotSignificant
    };
    (p_value, significance)
}

/// The six illustrative points with seeded jitter (±3 vaccination, ±10 AQI).
#[must_use]
pub fn illustrative_points(seed: u64) -> Vec<CorrelationDataPoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    ILLUSTRATIVE_POINTS
        .iter()
        .map(|&(label, vaccination, aqi)| CorrelationDataPoint {
            date: label.to_string(),
            vaccination: vaccination + rng.gen_range(-3.0..3.0),
            aqi: aqi + rng.gen_range(-10.0..10.0),
        })
        .collect()
}

/// Rate of the record with the greatest date; first one wins ties.
fn latest_vaccination_rate(vaccinations: &[VaccinationRecord]) -> Option<f64> {
    vaccinations
        .iter()
        .reduce(|latest, record| if record.date > latest.date { record } else { latest })
        .and_then(|latest| latest.people_vaccinated_per_hundred)
        .filter(|rate| rate.is_finite() && *rate != 0.0)
}

/// Deterministic offset in `[-5, 5]` for an unlisted city.
fn seeded_offset(seed: u64, city: &str) -> f64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    city.hash(&mut hasher);
    StdRng::seed_from_u64(hasher.finish()).gen_range(-UNKNOWN_CITY_SPREAD..=UNKNOWN_CITY_SPREAD)
}
