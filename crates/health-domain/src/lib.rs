//! # Vaccination & Air Quality Analytics - Domain Model
//!
//! Value records shared by the analytics engine and its callers. Raw
//! records serialize with camelCase field names and also accept the
//! snake_case names of the upstream vaccination feed; derived records are
//! created fresh per computation and owned by the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// RAW RECORDS
// =============================================================================

/// One day of vaccination statistics for a country.
///
/// `date` is an ISO-8601 date string; ISO strings order correctly under
/// plain string comparison, which is how the latest record is selected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccinationRecord {
    pub location: String,
    #[serde(alias = "iso_code")]
    pub iso_code: String,
    pub date: String,
    #[serde(default, alias = "total_vaccinations", skip_serializing_if = "Option::is_none")]
    pub total_vaccinations: Option<f64>,
    #[serde(default, alias = "people_vaccinated", skip_serializing_if = "Option::is_none")]
    pub people_vaccinated: Option<f64>,
    #[serde(
        default,
        alias = "people_fully_vaccinated",
        skip_serializing_if = "Option::is_none"
    )]
    pub people_fully_vaccinated: Option<f64>,
    #[serde(default, alias = "total_boosters", skip_serializing_if = "Option::is_none")]
    pub total_boosters: Option<f64>,
    #[serde(default, alias = "daily_vaccinations", skip_serializing_if = "Option::is_none")]
    pub daily_vaccinations: Option<f64>,
    #[serde(
        default,
        alias = "total_vaccinations_per_hundred",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_vaccinations_per_hundred: Option<f64>,
    #[serde(
        default,
        alias = "people_vaccinated_per_hundred",
        skip_serializing_if = "Option::is_none"
    )]
    pub people_vaccinated_per_hundred: Option<f64>,
    #[serde(
        default,
        alias = "people_fully_vaccinated_per_hundred",
        skip_serializing_if = "Option::is_none"
    )]
    pub people_fully_vaccinated_per_hundred: Option<f64>,
}

/// Measurement timestamp pair reported by the air quality API.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MeasurementTime {
    pub utc: String,
    pub local: String,
}

/// Station coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A single pollutant or AQI measurement from a monitoring station.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityRecord {
    pub location_id: i64,
    pub location: String,
    /// Measured parameter, e.g. `pm25` or `aqi`
    pub parameter: String,
    pub value: f64,
    pub unit: String,
    pub country: String,
    pub city: String,
    pub date: MeasurementTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPoint>,
}

// =============================================================================
// ENUMS
// =============================================================================

/// Risk band derived from a vulnerability index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
    Severe,
}

impl RiskCategory {
    /// Classify a vulnerability index. Each band includes its lower bound.
    #[must_use]
    pub const fn from_index(vulnerability_index: i32) -> Self {
        if vulnerability_index < 25 {
            Self::Low
        } else if vulnerability_index < 50 {
            Self::Moderate
        } else if vulnerability_index < 75 {
            Self::High
        } else {
            Self::Severe
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Severe => "severe",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse significance label attached to a correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    Significant,
    NotSignificant,
}

impl Significance {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Significant => "significant",
            Self::NotSignificant => "not_significant",
        }
    }
}

/// Bucket width for time aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    #[default]
    Daily,
    /// Weeks start on Sunday
    Weekly,
    Monthly,
}

impl Timeframe {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl FromStr for Timeframe {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(DomainError::UnknownVariant {
                kind: "timeframe",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// US EPA AQI band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    /// Classify an AQI value. Upper bounds are inclusive.
    #[must_use]
    pub fn from_value(value: f64) -> Self {
        if value <= 50.0 {
            Self::Good
        } else if value <= 100.0 {
            Self::Moderate
        } else if value <= 150.0 {
            Self::UnhealthyForSensitiveGroups
        } else if value <= 200.0 {
            Self::Unhealthy
        } else if value <= 300.0 {
            Self::VeryUnhealthy
        } else {
            Self::Hazardous
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very Unhealthy",
            Self::Hazardous => "Hazardous",
        }
    }

    /// Hex colour used by the dashboard legend
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Good => "#00e400",
            Self::Moderate => "#ffff00",
            Self::UnhealthyForSensitiveGroups => "#ff7e00",
            Self::Unhealthy => "#ff0000",
            Self::VeryUnhealthy => "#8f3f97",
            Self::Hazardous => "#7e0023",
        }
    }
}

// =============================================================================
// DERIVED RECORDS
// =============================================================================

/// Per-location vulnerability assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityScore {
    pub location: String,
    pub vaccination_rate: f64,
    pub aqi_level: f64,
    pub population_density: f64,
    pub vulnerability_index: i32,
    pub risk_category: RiskCategory,
}

/// One point of the vaccination/AQI scatter.
///
/// `date` carries the location label; the field name is kept for
/// compatibility with the chart components that consume it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationDataPoint {
    pub date: String,
    pub vaccination: f64,
    pub aqi: f64,
}

/// Cross-sectional correlation between vaccination rate and AQI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationAnalysis {
    pub correlation: f64,
    pub p_value: f64,
    pub significance: Significance,
    pub data_points: Vec<CorrelationDataPoint>,
}

impl CorrelationAnalysis {
    /// Neutral result used when no correlation can be computed.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            correlation: 0.0,
            p_value: 1.0,
            significance: Significance::NotSignificant,
            data_points: Vec::new(),
        }
    }
}

/// Headline figures for the dashboard summary cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_vaccinations: f64,
    pub vaccination_rate: f64,
    pub average_aqi: f64,
    pub vulnerable_locations: usize,
    pub last_updated: DateTime<Utc>,
}

impl DashboardMetrics {
    #[must_use]
    pub const fn empty(as_of: DateTime<Utc>) -> Self {
        Self {
            total_vaccinations: 0.0,
            vaccination_rate: 0.0,
            average_aqi: 0.0,
            vulnerable_locations: 0,
            last_updated: as_of,
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Domain-level errors
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}
