//! Daily, weekly and monthly bucketing of heterogeneous records.
//!
//! Records are JSON objects so vaccination rows, AQI measurements and
//! anything else the dashboard charts can share one code path. A fixed set
//! of numeric fields is averaged per bucket; every other field keeps the
//! first non-null value seen in the bucket.

use crate::error::{AnalyticsError, Result};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, Utc};
use health_domain::Timeframe;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Fields averaged across a bucket.
pub const NUMERIC_FIELDS: [&str; 4] = [
    "value",
    "totalVaccinations",
    "peopleVaccinated",
    "dailyVaccinations",
];

/// Default location of the record date.
pub const DEFAULT_DATE_FIELD: &str = "date";

/// One aggregated bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedBucket {
    /// Bucket key: `YYYY-MM-DD` for daily and weekly, `YYYY-MM` for monthly
    pub date: String,
    /// Averaged numeric fields plus representative descriptive fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl AggregatedBucket {
    /// Numeric field as `f64`, if present.
    #[must_use]
    pub fn number(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(Value::as_f64)
    }

    /// Any field by name
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Group `records` into `timeframe` buckets keyed on the date found at
/// `date_field`, returned in ascending key order.
///
/// `date_field` may be a dotted path such as `date.utc`. A record that is
/// not an object, lacks the date or carries an unparseable one fails the
/// whole call with [`AnalyticsError::InvalidInput`].
pub fn aggregate_by_timeframe(
    records: &[Value],
    timeframe: Timeframe,
    date_field: &str,
) -> Result<Vec<AggregatedBucket>> {
    let mut grouped: BTreeMap<String, Vec<&Map<String, Value>>> = BTreeMap::new();

    for (index, record) in records.iter().enumerate() {
        let object = record.as_object().ok_or_else(|| AnalyticsError::InvalidInput {
            index,
            reason: "record is not an object".to_string(),
        })?;
        let raw = lookup(object, date_field)
            .and_then(Value::as_str)
            .ok_or_else(|| AnalyticsError::InvalidInput {
                index,
                reason: format!("missing date field '{date_field}'"),
            })?;
        let date = parse_record_date(raw).ok_or_else(|| AnalyticsError::InvalidInput {
            index,
            reason: format!("unparseable date '{raw}'"),
        })?;
        let key = bucket_key(date, timeframe).ok_or_else(|| AnalyticsError::InvalidInput {
            index,
            reason: format!("date '{raw}' has no representable {timeframe} bucket"),
        })?;

        grouped.entry(key).or_default().push(object);
    }

    let buckets: Vec<AggregatedBucket> = grouped
        .into_iter()
        .map(|(date, items)| AggregatedBucket {
            date,
            fields: aggregate_items(&items),
        })
        .collect();

    tracing::debug!(
        records = records.len(),
        buckets = buckets.len(),
        timeframe = %timeframe,
        "Aggregated records"
    );
    Ok(buckets)
}

/// [`aggregate_by_timeframe`] over typed records, serialized first.
pub fn aggregate_records<T: Serialize>(
    records: &[T],
    timeframe: Timeframe,
    date_field: &str,
) -> Result<Vec<AggregatedBucket>> {
    let values = records
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    aggregate_by_timeframe(&values, timeframe, date_field)
}

/// Bucket key of `date`. Weeks start on the preceding (or same) Sunday.
///
/// `None` when that Sunday falls before the earliest representable date.
#[must_use]
pub fn bucket_key(date: NaiveDate, timeframe: Timeframe) -> Option<String> {
    match timeframe {
        Timeframe::Daily => Some(date.format("%Y-%m-%d").to_string()),
        Timeframe::Weekly => {
            let back = Days::new(u64::from(date.weekday().num_days_from_sunday()));
            date.checked_sub_days(back)
                .map(|sunday| sunday.format("%Y-%m-%d").to_string())
        }
        Timeframe::Monthly => Some(format!("{:04}-{:02}", date.year(), date.month())),
    }
}

/// Calendar date (UTC) of an ISO date or timestamp string.
#[must_use]
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc).date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|timestamp| timestamp.date())
}

fn lookup<'a>(object: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = object.get(segments.next()?)?;
    segments.try_fold(first, |value, segment| value.get(segment))
}

fn aggregate_items(items: &[&Map<String, Value>]) -> Map<String, Value> {
    let mut result = Map::new();

    for field in NUMERIC_FIELDS {
        let values: Vec<f64> = items
            .iter()
            .filter_map(|item| item.get(field).and_then(Value::as_f64))
            .collect();
        if !values.is_empty() {
            result.insert(field.to_string(), Value::from(values.iter().mean()));
        }
    }

    let Some(first) = items.first() else {
        return result;
    };
    for key in first.keys() {
        // The bucket key owns `date`
        if NUMERIC_FIELDS.contains(&key.as_str()) || key == DEFAULT_DATE_FIELD {
            continue;
        }
        if let Some(value) = items
            .iter()
            .find_map(|item| item.get(key).filter(|v| !v.is_null()))
        {
            result.insert(key.clone(), value.clone());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_domain::{AirQualityRecord, MeasurementTime, VaccinationRecord};
    use serde_json::json;

    #[test]
    fn test_single_record_per_bucket_is_unchanged() {
        let records = vec![
            json!({"date": "2024-01-01", "value": 42.5, "location": "Delhi"}),
            json!({"date": "2024-01-02", "value": 17.0, "location": "Delhi"}),
            json!({"date": "2024-01-03", "totalVaccinations": 1000, "location": "Pune"}),
        ];

        let buckets = aggregate_by_timeframe(&records, Timeframe::Daily, "date").unwrap();
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].date, "2024-01-01");
        assert_eq!(buckets[0].number("value"), Some(42.5));
        assert_eq!(buckets[1].number("value"), Some(17.0));
        assert_eq!(buckets[2].number("totalVaccinations"), Some(1000.0));
        assert_eq!(buckets[2].get("location"), Some(&json!("Pune")));
        assert!(buckets[2].get("value").is_none());
    }

    #[test]
    fn test_weekly_buckets_start_on_sunday() {
        // 2024-01-07 is a Sunday
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        for day in 0..7 {
            let date = sunday + Days::new(day);
            assert_eq!(bucket_key(date, Timeframe::Weekly).unwrap(), "2024-01-07");
        }
        let next_sunday = sunday + Days::new(7);
        assert_eq!(bucket_key(next_sunday, Timeframe::Weekly).unwrap(), "2024-01-14");
    }

    #[test]
    fn test_weekly_bucket_crosses_month_boundary() {
        // Thursday 2024-02-01 belongs to the week of Sunday 2024-01-28
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(bucket_key(date, Timeframe::Weekly).unwrap(), "2024-01-28");
    }

    #[test]
    fn test_week_start_before_earliest_date_is_rejected() {
        let raw = "-262143-01-01";
        let date = parse_record_date(raw).unwrap();
        assert!(bucket_key(date, Timeframe::Weekly).is_none());
        assert!(bucket_key(date, Timeframe::Daily).is_some());

        let records = vec![
            json!({"date": "2024-01-01", "value": 1.0}),
            json!({"date": raw, "value": 2.0}),
        ];
        let err = aggregate_by_timeframe(&records, Timeframe::Weekly, "date").unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidInput { index: 1, .. }));
        assert!(aggregate_by_timeframe(&records, Timeframe::Monthly, "date").is_ok());
    }

    #[test]
    fn test_custom_date_field_is_kept_in_bucket() {
        let records = vec![
            json!({"timestamp": "2024-04-02T08:00:00Z", "value": 4.0, "date": "ignored"}),
            json!({"timestamp": "2024-04-02T20:00:00Z", "value": 8.0}),
        ];

        let buckets = aggregate_by_timeframe(&records, Timeframe::Daily, "timestamp").unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].date, "2024-04-02");
        assert_eq!(buckets[0].number("value"), Some(6.0));
        assert_eq!(buckets[0].get("timestamp"), Some(&json!("2024-04-02T08:00:00Z")));
        assert!(buckets[0].get("date").is_none());
    }

    #[test]
    fn test_monthly_buckets() {
        let records = vec![
            json!({"date": "2024-01-05", "value": 10.0}),
            json!({"date": "2024-01-28", "value": 30.0}),
            json!({"date": "2024-02-01", "value": 50.0}),
        ];

        let buckets = aggregate_by_timeframe(&records, Timeframe::Monthly, "date").unwrap();
        let keys: Vec<&str> = buckets.iter().map(|b| b.date.as_str()).collect();
        assert_eq!(keys, ["2024-01", "2024-02"]);
        assert_eq!(buckets[0].number("value"), Some(20.0));
        assert_eq!(buckets[1].number("value"), Some(50.0));
    }

    #[test]
    fn test_mean_ignores_records_without_the_field() {
        let records = vec![
            json!({"date": "2024-03-01", "dailyVaccinations": 100, "location": null}),
            json!({"date": "2024-03-01", "dailyVaccinations": "n/a", "location": "India"}),
            json!({"date": "2024-03-01", "dailyVaccinations": 300}),
        ];

        let buckets = aggregate_by_timeframe(&records, Timeframe::Daily, "date").unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].number("dailyVaccinations"), Some(200.0));
        assert_eq!(buckets[0].get("location"), Some(&json!("India")));
    }

    #[test]
    fn test_buckets_sorted_and_key_wins_over_record_date() {
        let records = vec![
            json!({"date": "2024-05-09", "value": 1.0}),
            json!({"date": "2024-01-09", "value": 2.0}),
        ];

        let buckets = aggregate_by_timeframe(&records, Timeframe::Monthly, "date").unwrap();
        assert_eq!(buckets[0].date, "2024-01");
        assert_eq!(buckets[1].date, "2024-05");

        let json = serde_json::to_value(&buckets[0]).unwrap();
        assert_eq!(json["date"], "2024-01");
        assert_eq!(json["value"], 2.0);
    }

    #[test]
    fn test_timestamps_and_dotted_date_path() {
        let records = vec![
            AirQualityRecord {
                city: "Delhi".to_string(),
                parameter: "pm25".to_string(),
                value: 80.0,
                date: MeasurementTime {
                    utc: "2024-06-03T23:30:00Z".to_string(),
                    local: "2024-06-04T05:00:00+05:30".to_string(),
                },
                ..Default::default()
            },
            AirQualityRecord {
                city: "Delhi".to_string(),
                parameter: "pm25".to_string(),
                value: 120.0,
                date: MeasurementTime {
                    utc: "2024-06-03T01:00:00.000Z".to_string(),
                    local: "2024-06-03T06:30:00+05:30".to_string(),
                },
                ..Default::default()
            },
        ];

        let buckets = aggregate_records(&records, Timeframe::Daily, "date.utc").unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].date, "2024-06-03");
        assert_eq!(buckets[0].number("value"), Some(100.0));
        assert_eq!(buckets[0].get("city"), Some(&json!("Delhi")));
        assert!(buckets[0].get("date").is_none());
    }

    #[test]
    fn test_typed_vaccination_records() {
        let records: Vec<VaccinationRecord> = ["2024-01-01", "2024-01-02"]
            .iter()
            .zip([100.0, 300.0])
            .map(|(date, total)| VaccinationRecord {
                location: "India".to_string(),
                iso_code: "IND".to_string(),
                date: (*date).to_string(),
                total_vaccinations: Some(total),
                ..Default::default()
            })
            .collect();

        let buckets = aggregate_records(&records, Timeframe::Weekly, DEFAULT_DATE_FIELD).unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].date, "2023-12-31");
        assert_eq!(buckets[0].number("totalVaccinations"), Some(200.0));
        assert_eq!(buckets[0].get("isoCode"), Some(&json!("IND")));
    }

    #[test]
    fn test_invalid_dates_are_rejected() {
        let records = vec![
            json!({"date": "2024-01-01", "value": 1.0}),
            json!({"date": "yesterday", "value": 2.0}),
        ];
        let err = aggregate_by_timeframe(&records, Timeframe::Daily, "date").unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidInput { index: 1, .. }));

        let missing = vec![json!({"value": 1.0})];
        assert!(aggregate_by_timeframe(&missing, Timeframe::Daily, "date").is_err());

        let not_object = vec![json!(5)];
        assert!(aggregate_by_timeframe(&not_object, Timeframe::Daily, "date").is_err());
    }

    #[test]
    fn test_empty_input() {
        let buckets = aggregate_by_timeframe(&[], Timeframe::Weekly, "date").unwrap();
        assert!(buckets.is_empty());
    }
}
