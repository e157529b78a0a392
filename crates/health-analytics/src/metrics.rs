//! Headline dashboard metrics.

use crate::config::AnalyticsConfig;
use chrono::{DateTime, Utc};
use health_domain::{AirQualityRecord, DashboardMetrics, VaccinationRecord};
use statrs::statistics::Statistics;
use std::collections::HashMap;

/// Summary figures over already-filtered records.
///
/// Vaccination figures use the latest record per location; a missing rate
/// counts as 0. Average AQI covers every measurement, and a city counts as
/// vulnerable when its mean AQI exceeds the configured threshold. With no
/// vaccination records every figure is zero.
#[must_use]
pub fn dashboard_metrics(
    vaccinations: &[VaccinationRecord],
    air_quality: &[AirQualityRecord],
    config: &AnalyticsConfig,
    as_of: DateTime<Utc>,
) -> DashboardMetrics {
    if vaccinations.is_empty() {
        return DashboardMetrics::empty(as_of);
    }

    let mut latest_by_location: HashMap<&str, &VaccinationRecord> = HashMap::new();
    for record in vaccinations {
        latest_by_location
            .entry(record.location.as_str())
            .and_modify(|latest| {
                if record.date > latest.date {
                    *latest = record;
                }
            })
            .or_insert(record);
    }

    let vaccination_rate = latest_by_location
        .values()
        .map(|r| r.people_vaccinated_per_hundred.unwrap_or(0.0))
        .mean();
    let total_vaccinations: f64 = latest_by_location
        .values()
        .map(|r| r.total_vaccinations.unwrap_or(0.0))
        .sum();

    let average_aqi = if air_quality.is_empty() {
        0.0
    } else {
        air_quality.iter().map(|r| r.value).mean()
    };

    let mut city_values: HashMap<&str, Vec<f64>> = HashMap::new();
    for record in air_quality {
        city_values.entry(record.city.as_str()).or_default().push(record.value);
    }
    let vulnerable_locations = city_values
        .values()
        .filter(|values| values.iter().mean() > config.vulnerable_aqi_threshold)
        .count();

    tracing::debug!(
        locations = latest_by_location.len(),
        vulnerable_locations,
        "Computed dashboard metrics"
    );

    DashboardMetrics {
        total_vaccinations,
        vaccination_rate,
        average_aqi,
        vulnerable_locations,
        last_updated: as_of,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn vaccination(location: &str, date: &str, rate: Option<f64>, total: f64) -> VaccinationRecord {
        VaccinationRecord {
            location: location.to_string(),
            date: date.to_string(),
            people_vaccinated_per_hundred: rate,
            total_vaccinations: Some(total),
            ..Default::default()
        }
    }

    fn aqi(city: &str, value: f64) -> AirQualityRecord {
        AirQualityRecord {
            city: city.to_string(),
            value,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_vaccinations_gives_empty_metrics() {
        let metrics = dashboard_metrics(
            &[],
            &[aqi("Delhi", 300.0)],
            &AnalyticsConfig::default(),
            as_of(),
        );
        assert_eq!(metrics, DashboardMetrics::empty(as_of()));
    }

    #[test]
    fn test_metrics_use_latest_record_per_location() {
        let vaccinations = vec![
            vaccination("India", "2024-01-01", Some(50.0), 1_000.0),
            vaccination("India", "2024-02-01", Some(60.0), 2_000.0),
            vaccination("France", "2024-01-15", None, 500.0),
        ];
        let air_quality = vec![
            aqi("Delhi", 200.0),
            aqi("Delhi", 180.0),
            aqi("Paris", 40.0),
            aqi("Lyon", 160.0),
        ];

        let metrics = dashboard_metrics(
            &vaccinations,
            &air_quality,
            &AnalyticsConfig::default(),
            as_of(),
        );
        assert_eq!(metrics.total_vaccinations, 2_500.0);
        assert_eq!(metrics.vaccination_rate, 30.0);
        assert_eq!(metrics.average_aqi, 145.0);
        assert_eq!(metrics.vulnerable_locations, 2);
        assert_eq!(metrics.last_updated, as_of());
    }

    #[test]
    fn test_vulnerable_threshold_is_exclusive() {
        let vaccinations = vec![vaccination("India", "2024-01-01", Some(50.0), 1.0)];
        let metrics = dashboard_metrics(
            &vaccinations,
            &[aqi("Delhi", 150.0)],
            &AnalyticsConfig::default(),
            as_of(),
        );
        assert_eq!(metrics.vulnerable_locations, 0);
    }
}
