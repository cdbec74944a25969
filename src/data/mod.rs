pub mod entry;
pub mod panels;
pub mod refresh;
pub mod repository;
pub mod series;
pub mod table;

pub use panels::PanelSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type SensorId = i64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Sensor {
    #[serde(alias = "sensorId")]
    pub sensor_id: SensorId,
    #[serde(alias = "name", default)]
    pub name: String,
    #[serde(alias = "unit", default)]
    pub unit: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Reading {
    #[serde(alias = "sensorId")]
    pub sensor_id: SensorId,
    /// Raw value as sent by the API; may be non-numeric or null.
    #[serde(alias = "value", default)]
    pub value: Value,
    #[serde(alias = "timestamp", default)]
    pub timestamp: String,
}

impl Reading {
    pub fn numeric_value(&self) -> Option<f64> {
        numeric(&self.value)
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Numeric view of a raw reading value. Numeric strings count.
pub fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Accepts RFC 3339 as well as offset-less ISO-8601, which is read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Display name for a sensor id, tolerating ids the sensor list doesn't know.
pub fn sensor_name(sensors: &[Sensor], id: SensorId) -> String {
    sensors
        .iter()
        .find(|s| s.sensor_id == id)
        .map(|s| s.name.as_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Sensor ID {id}"))
}
