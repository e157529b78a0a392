//! # Health Analytics
//!
//! Pure analytics over vaccination and air quality records.
//!
//! ## Features
//!
//! - Vulnerability scoring and risk classification
//! - Cross-sectional vaccination/AQI correlation with a coarse significance label
//! - Daily, weekly and monthly bucket aggregation of heterogeneous records
//! - Headline dashboard metrics
//!
//! Every operation is synchronous and reads nothing but its arguments, so
//! callers may invoke them concurrently without coordination.

#![forbid(unsafe_code)]
#![warn(clippy::all, missing_docs)]

pub mod aggregation;
pub mod config;
pub mod correlation;
pub mod countries;
pub mod error;
pub mod metrics;
pub mod scoring;

pub use aggregation::{AggregatedBucket, aggregate_by_timeframe, aggregate_records};
pub use config::{AnalyticsConfig, UnknownCityPolicy};
pub use correlation::{
    CorrelationOutcome, RegionalOffsetTable, RegionalVariation, calculate_correlation,
};
pub use countries::{CountryCodes, CountryTable};
pub use error::{AnalyticsError, Result};
pub use metrics::dashboard_metrics;
pub use scoring::{
    DensityLookup, UniformDensity, calculate_vulnerability_score, get_risk_category, score_locations,
    try_vulnerability_score,
};
