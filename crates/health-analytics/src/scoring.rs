//! Vulnerability scoring and risk classification.

use crate::config::AnalyticsConfig;
use crate::countries::CountryTable;
use crate::error::{AnalyticsError, Result};
use health_domain::{AirQualityRecord, RiskCategory, VaccinationRecord, VulnerabilityScore};
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, HashMap};

const VACCINATION_MAX: f64 = 100.0;
const AQI_MAX: f64 = 500.0;
const DENSITY_MAX: f64 = 10_000.0;

const VACCINATION_WEIGHT: f64 = 0.4;
const AQI_WEIGHT: f64 = 0.4;
const DENSITY_WEIGHT: f64 = 0.2;

/// Composite vulnerability index in `[0, 100]`, higher is worse.
///
/// Each input is divided by its expected maximum (100 %, AQI 500,
/// 10 000 people per unit area) and saturated into `[0, 1]`. Low
/// vaccination and high AQI each weigh 0.4, density weighs 0.2.
///
/// NaN inputs are not rejected; the saturating cast turns them into 0.
/// Use [`try_vulnerability_score`] to reject them instead.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn calculate_vulnerability_score(
    vaccination_rate: f64,
    aqi_level: f64,
    population_density: f64,
) -> i32 {
    let vaccination = normalize(vaccination_rate, VACCINATION_MAX);
    let aqi = normalize(aqi_level, AQI_MAX);
    let density = normalize(population_density, DENSITY_MAX);

    let vulnerability = (1.0 - vaccination) * VACCINATION_WEIGHT
        + aqi * AQI_WEIGHT
        + density * DENSITY_WEIGHT;

    (vulnerability * 100.0).round() as i32
}

/// Like [`calculate_vulnerability_score`] but rejects non-finite inputs.
pub fn try_vulnerability_score(
    vaccination_rate: f64,
    aqi_level: f64,
    population_density: f64,
) -> Result<i32> {
    for (name, value) in [
        ("vaccination_rate", vaccination_rate),
        ("aqi_level", aqi_level),
        ("population_density", population_density),
    ] {
        if !value.is_finite() {
            return Err(AnalyticsError::InvalidParameter(format!(
                "{name} must be finite, got {value}"
            )));
        }
    }
    Ok(calculate_vulnerability_score(
        vaccination_rate,
        aqi_level,
        population_density,
    ))
}

/// Map a vulnerability index onto its risk band.
#[must_use]
pub const fn get_risk_category(vulnerability_index: i32) -> RiskCategory {
    RiskCategory::from_index(vulnerability_index)
}

fn normalize(value: f64, max: f64) -> f64 {
    (value / max).clamp(0.0, 1.0)
}

/// Source of population density per location.
pub trait DensityLookup {
    /// Density for `location`, or `None` when unknown.
    fn density(&self, location: &str) -> Option<f64>;
}

impl DensityLookup for HashMap<String, f64> {
    fn density(&self, location: &str) -> Option<f64> {
        self.get(location).copied()
    }
}

impl DensityLookup for BTreeMap<String, f64> {
    fn density(&self, location: &str) -> Option<f64> {
        self.get(location).copied()
    }
}

/// Same density for every location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformDensity(pub f64);

impl DensityLookup for UniformDensity {
    fn density(&self, _location: &str) -> Option<f64> {
        Some(self.0)
    }
}

/// Score every city that appears in `air_quality`, most vulnerable first.
///
/// A city's vaccination rate is the highest `peopleVaccinatedPerHundred`
/// reported for its country, then the highest rate overall, then the
/// configured baseline. The station's country code is expanded through
/// `countries` and matched against each record's location name and ISO code.
pub fn score_locations(
    vaccinations: &[VaccinationRecord],
    air_quality: &[AirQualityRecord],
    densities: &dyn DensityLookup,
    countries: &CountryTable,
    config: &AnalyticsConfig,
) -> Vec<VulnerabilityScore> {
    let mut country_rates: HashMap<&str, f64> = HashMap::new();
    let mut overall_rate: Option<f64> = None;
    for record in vaccinations {
        let Some(rate) = record.people_vaccinated_per_hundred else {
            continue;
        };
        for key in [record.location.as_str(), record.iso_code.as_str()] {
            if key.is_empty() {
                continue;
            }
            let entry = country_rates.entry(key).or_insert(rate);
            *entry = entry.max(rate);
        }
        overall_rate = Some(overall_rate.map_or(rate, |r: f64| r.max(rate)));
    }

    let mut city_values: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in air_quality {
        if record.city.is_empty() || !record.value.is_finite() {
            continue;
        }
        city_values.entry(record.city.as_str()).or_default().push(record.value);
    }

    let fallback_rate = overall_rate.unwrap_or_else(|| {
        tracing::warn!(
            baseline = config.baseline_vaccination_rate,
            "No vaccination rates supplied, scoring against baseline"
        );
        config.baseline_vaccination_rate
    });

    let city_countries: HashMap<&str, &str> = air_quality
        .iter()
        .map(|r| (r.city.as_str(), r.country.as_str()))
        .collect();

    let mut scores: Vec<VulnerabilityScore> = city_values
        .into_iter()
        .map(|(city, values)| {
            let aqi_level = values.iter().mean();
            let country = city_countries.get(city).copied().unwrap_or_default();
            let vaccination_rate = countries
                .spellings(country)
                .into_iter()
                .filter_map(|key| country_rates.get(key).copied())
                .reduce(f64::max)
                .unwrap_or_else(|| {
                    if overall_rate.is_some() {
                        tracing::warn!(
                            city,
                            country,
                            rate = fallback_rate,
                            "No vaccination rate for country, using highest overall"
                        );
                    }
                    fallback_rate
                });
            let population_density = densities
                .density(city)
                .unwrap_or(config.default_population_density);
            let vulnerability_index =
                calculate_vulnerability_score(vaccination_rate, aqi_level, population_density);

            VulnerabilityScore {
                location: city.to_string(),
                vaccination_rate,
                aqi_level,
                population_density,
                vulnerability_index,
                risk_category: get_risk_category(vulnerability_index),
            }
        })
        .collect();

    scores.sort_by(|a, b| {
        b.vulnerability_index
            .cmp(&a.vulnerability_index)
            .then_with(|| a.location.cmp(&b.location))
    });

    tracing::debug!(locations = scores.len(), "Scored locations");
    scores
}
