//! JSON input loading.

use anyhow::{Context, Result, bail};
use health_domain::{AirQualityRecord, VaccinationRecord};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Read a JSON array of `T` from `path`.
pub fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let records: Vec<T> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", path.display()))?;
    tracing::info!(path = %path.display(), records = records.len(), "Loaded input");
    Ok(records)
}

/// Vaccination records from a JSON array file.
pub fn load_vaccinations(path: &Path) -> Result<Vec<VaccinationRecord>> {
    load_records(path)
}

/// Air quality measurements from a JSON array file.
pub fn load_air_quality(path: &Path) -> Result<Vec<AirQualityRecord>> {
    load_records(path)
}

/// City name to population density, from a JSON object such as
/// `{"Delhi": 11320, "Pune": 5600}`.
pub fn load_densities(path: &Path) -> Result<HashMap<String, f64>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Untyped records for aggregation. The file must hold a JSON array.
pub fn load_values(path: &Path) -> Result<Vec<Value>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", path.display()))?;
    match value {
        Value::Array(records) => {
            tracing::info!(path = %path.display(), records = records.len(), "Loaded input");
            Ok(records)
        }
        other => bail!(
            "{} must contain a JSON array, found {}",
            path.display(),
            kind(&other)
        ),
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_vaccinations() {
        let file = write_temp(
            r#"[{"location": "India", "isoCode": "IND", "date": "2024-01-01",
                 "peopleVaccinatedPerHundred": 71.2}]"#,
        );
        let records = load_vaccinations(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].people_vaccinated_per_hundred, Some(71.2));
    }

    #[test]
    fn test_load_air_quality() {
        let file = write_temp(
            r#"[{"locationId": 7, "location": "Anand Vihar", "parameter": "pm25",
                 "value": 180.0, "unit": "µg/m³", "country": "IN", "city": "Delhi",
                 "date": {"utc": "2024-01-01T00:00:00Z", "local": "2024-01-01T05:30:00+05:30"}}]"#,
        );
        let records = load_air_quality(file.path()).unwrap();
        assert_eq!(records[0].city, "Delhi");
        assert!(records[0].coordinates.is_none());
    }

    #[test]
    fn test_load_values_rejects_non_array() {
        let file = write_temp(r#"{"date": "2024-01-01"}"#);
        let err = load_values(file.path()).unwrap_err();
        assert!(err.to_string().contains("must contain a JSON array"));
    }

    #[test]
    fn test_load_densities() {
        let file = write_temp(r#"{"Delhi": 11320, "Pune": 5600.5}"#);
        let densities = load_densities(file.path()).unwrap();
        assert_eq!(densities["Delhi"], 11_320.0);
        assert_eq!(densities["Pune"], 5_600.5);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_vaccinations(Path::new("/nonexistent/vaccinations.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/vaccinations.json"));
    }
}
