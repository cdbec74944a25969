use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::series::{build_series, Series, SeriesOptions};
use super::{sensor_name, PanelSet, Reading, Sensor, SensorId};
use crate::gateway::{
    FetchError, Gateway, Method, CREATE_READING_PATH, READINGS_PATH, SENSORS_PATH,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub sensors: String,
    pub readings: String,
    pub create_reading: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            sensors: SENSORS_PATH.to_string(),
            readings: READINGS_PATH.to_string(),
            create_reading: CREATE_READING_PATH.to_string(),
        }
    }
}

/// One consistent view of both collections.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub sensors: Vec<Sensor>,
    pub readings: Vec<Reading>,
    /// Problems with response shape that were absorbed rather than raised.
    pub warnings: Vec<String>,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Latest reading of one sensor, for the overview.
#[derive(Clone, Debug, PartialEq)]
pub struct LatestReading<'a> {
    pub sensor: &'a Sensor,
    pub reading: Option<&'a Reading>,
}

/// Cloneable handle that performs the two collection reads. It owns no
/// state, so it can be moved onto the runtime while the UI keeps the
/// repository.
#[derive(Clone)]
pub struct SnapshotFetcher {
    gateway: Arc<dyn Gateway>,
    endpoints: Endpoints,
}

impl SnapshotFetcher {
    pub async fn fetch(&self) -> Result<Snapshot, FetchError> {
        let (sensors, readings) = tokio::try_join!(
            self.fetch_records(self.endpoints.sensors.clone()),
            self.fetch_records(self.endpoints.readings.clone()),
        )?;

        let mut warnings = Vec::new();
        let sensors = decode_collection::<Sensor>("sensors", sensors, &mut warnings);
        let readings = decode_collection::<Reading>("readings", readings, &mut warnings);
        for warning in &warnings {
            log::warn!("{warning}");
        }

        Ok(Snapshot {
            sensors,
            readings,
            warnings,
            fetched_at: Some(Utc::now()),
        })
    }

    async fn fetch_records(&self, resource: String) -> Result<RawCollection, FetchError> {
        let gateway = Arc::clone(&self.gateway);
        let result = tokio::task::spawn_blocking(move || {
            gateway.fetch(&resource, Method::Get, None, None)
        })
        .await
        .map_err(|e| FetchError::Transport(format!("fetch task failed: {e}")))?;

        match result {
            Ok(records) => Ok(RawCollection {
                records,
                format_error: None,
            }),
            Err(FetchError::Format(msg)) => Ok(RawCollection {
                records: Vec::new(),
                format_error: Some(msg),
            }),
            Err(e) => Err(e),
        }
    }
}

struct RawCollection {
    records: Vec<Value>,
    format_error: Option<String>,
}

fn decode_collection<T: DeserializeOwned>(
    name: &str,
    raw: RawCollection,
    warnings: &mut Vec<String>,
) -> Vec<T> {
    if let Some(msg) = raw.format_error {
        warnings.push(format!("{name}: {msg}"));
    }
    let total = raw.records.len();
    let decoded: Vec<T> = raw
        .records
        .into_iter()
        .filter_map(|record| serde_json::from_value(record).ok())
        .collect();
    let skipped = total - decoded.len();
    if skipped > 0 {
        warnings.push(format!("{name}: skipped {skipped} malformed record(s)"));
    }
    decoded
}

/// In-memory sensors and readings, replaced wholesale on every refresh.
pub struct ReadingRepository {
    fetcher: SnapshotFetcher,
    snapshot: Snapshot,
}

impl ReadingRepository {
    pub fn new(gateway: Arc<dyn Gateway>, endpoints: Endpoints) -> Self {
        Self {
            fetcher: SnapshotFetcher {
                gateway,
                endpoints,
            },
            snapshot: Snapshot::default(),
        }
    }

    /// Same data, new gateway. Used when the API base URL changes.
    pub fn with_gateway(&self, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            fetcher: SnapshotFetcher {
                gateway,
                endpoints: self.fetcher.endpoints.clone(),
            },
            snapshot: self.snapshot.clone(),
        }
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.fetcher.gateway
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.fetcher.endpoints
    }

    pub fn fetcher(&self) -> SnapshotFetcher {
        self.fetcher.clone()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.snapshot.sensors
    }

    pub fn readings(&self) -> &[Reading] {
        &self.snapshot.readings
    }

    /// Fetches both collections concurrently and swaps them in together.
    /// On error the current snapshot is kept.
    pub async fn refresh(&mut self) -> Result<&Snapshot, FetchError> {
        let snapshot = self.fetcher.fetch().await?;
        self.install(snapshot);
        Ok(&self.snapshot)
    }

    pub fn install(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
    }

    pub fn sensor(&self, id: SensorId) -> Option<&Sensor> {
        self.snapshot.sensors.iter().find(|s| s.sensor_id == id)
    }

    pub fn sensor_name(&self, id: SensorId) -> String {
        sensor_name(&self.snapshot.sensors, id)
    }

    pub fn series(&self, id: SensorId, options: SeriesOptions) -> Series {
        build_series(&self.snapshot.readings, id, &self.sensor_name(id), options)
    }

    /// One series per visible panel, in panel order.
    pub fn panel_series(&self, panels: &PanelSet, options: SeriesOptions) -> Vec<Series> {
        panels
            .ids()
            .iter()
            .map(|&id| self.series(id, options))
            .collect()
    }

    pub fn latest_readings(&self) -> Vec<LatestReading<'_>> {
        self.snapshot
            .sensors
            .iter()
            .map(|sensor| {
                let reading = self
                    .snapshot
                    .readings
                    .iter()
                    .filter(|r| r.sensor_id == sensor.sensor_id)
                    .max_by_key(|r| r.time());
                LatestReading { sensor, reading }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockGateway;
    use serde_json::json;

    fn sensors_json() -> Value {
        json!([
            {"SensorId": 1, "Name": "pH", "Unit": ""},
            {"SensorId": 2, "Name": "Water Temp", "Unit": "C"}
        ])
    }

    fn readings_json() -> Value {
        json!([
            {"SensorId": 1, "Value": 20, "Timestamp": "2024-01-01T10:00:00Z"},
            {"SensorId": 1, "Value": 22, "Timestamp": "2024-01-01T09:00:00Z"},
            {"SensorId": 2, "Value": 5, "Timestamp": "2024-01-01T10:00:00Z"}
        ])
    }

    fn repository(gateway: Arc<MockGateway>) -> ReadingRepository {
        ReadingRepository::new(gateway, Endpoints::default())
    }

    #[tokio::test]
    async fn refresh_replaces_both_collections() {
        let gateway = Arc::new(MockGateway::new());
        gateway.respond(SENSORS_PATH, Ok(sensors_json()));
        gateway.respond(READINGS_PATH, Ok(readings_json()));

        let mut repo = repository(gateway.clone());
        let snapshot = repo.refresh().await.unwrap();
        assert_eq!(snapshot.sensors.len(), 2);
        assert_eq!(snapshot.readings.len(), 3);
        assert!(snapshot.warnings.is_empty());
        assert!(snapshot.fetched_at.is_some());
        assert_eq!(gateway.call_count(), 2);

        gateway.respond(SENSORS_PATH, Ok(json!([{"SensorId": 3, "Name": "EC"}])));
        gateway.respond(READINGS_PATH, Ok(json!([])));
        repo.refresh().await.unwrap();
        assert_eq!(repo.sensors().len(), 1);
        assert!(repo.readings().is_empty());
    }

    #[tokio::test]
    async fn failed_read_keeps_previous_snapshot() {
        let gateway = Arc::new(MockGateway::new());
        gateway.respond(SENSORS_PATH, Ok(sensors_json()));
        gateway.respond(READINGS_PATH, Ok(readings_json()));
        let mut repo = repository(gateway.clone());
        repo.refresh().await.unwrap();
        let before = repo.snapshot().clone();

        gateway.respond(SENSORS_PATH, Ok(json!([{"SensorId": 9, "Name": "new"}])));
        gateway.respond(READINGS_PATH, Err(FetchError::Timeout(5000)));
        let err = repo.refresh().await.unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(repo.snapshot(), &before);
    }

    #[tokio::test]
    async fn single_object_response_is_one_record() {
        let gateway = Arc::new(MockGateway::new());
        gateway.respond(SENSORS_PATH, Ok(json!({"SensorId": 4, "Name": "DO", "Unit": "mg/L"})));
        gateway.respond(READINGS_PATH, Ok(json!({})));
        let mut repo = repository(gateway);
        repo.refresh().await.unwrap();
        assert_eq!(repo.sensors().len(), 1);
        assert_eq!(repo.sensors()[0].unit, "mg/L");
        assert!(repo.readings().is_empty());
    }

    #[tokio::test]
    async fn format_problems_become_warnings() {
        let gateway = Arc::new(MockGateway::new());
        gateway.respond(SENSORS_PATH, Ok(json!("maintenance")));
        gateway.respond(
            READINGS_PATH,
            Ok(json!([
                {"SensorId": 1, "Value": 3, "Timestamp": "2024-01-01T10:00:00Z"},
                {"Value": 3}
            ])),
        );
        let mut repo = repository(gateway);
        let snapshot = repo.refresh().await.unwrap();
        assert!(snapshot.sensors.is_empty());
        assert_eq!(snapshot.readings.len(), 1);
        assert_eq!(snapshot.warnings.len(), 2);
        assert!(snapshot.warnings[0].starts_with("sensors:"));
        assert!(snapshot.warnings[1].contains("skipped 1"));
    }

    #[tokio::test]
    async fn series_use_sensor_names_and_tolerate_unknown_ids() {
        let gateway = Arc::new(MockGateway::new());
        gateway.respond(SENSORS_PATH, Ok(json!([{"SensorId": 1, "Name": "pH"}])));
        gateway.respond(READINGS_PATH, Ok(readings_json()));
        let mut repo = repository(gateway);
        repo.refresh().await.unwrap();

        let panels = PanelSet::from_ids([2, 1]);
        let series = repo.panel_series(&panels, SeriesOptions::default());
        assert_eq!(series[0].sensor_name, "Sensor ID 2");
        assert_eq!(series[1].sensor_name, "pH");
        assert_eq!(series[1].values, vec![Some(22.0), Some(20.0)]);
    }

    #[tokio::test]
    async fn latest_reading_per_sensor() {
        let gateway = Arc::new(MockGateway::new());
        gateway.respond(SENSORS_PATH, Ok(sensors_json()));
        gateway.respond(READINGS_PATH, Ok(readings_json()));
        let mut repo = repository(gateway);
        repo.refresh().await.unwrap();

        let latest = repo.latest_readings();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].reading.map(|r| r.value.clone()), Some(json!(20)));
        assert_eq!(latest[1].reading.map(|r| r.value.clone()), Some(json!(5)));
    }

    #[test]
    fn with_gateway_keeps_snapshot() {
        let repo = {
            let mut repo = repository(Arc::new(MockGateway::new()));
            repo.install(Snapshot {
                sensors: vec![Sensor {
                    sensor_id: 1,
                    name: "pH".into(),
                    unit: String::new(),
                }],
                ..Default::default()
            });
            repo
        };
        let moved = repo.with_gateway(Arc::new(MockGateway::new()));
        assert_eq!(moved.snapshot(), repo.snapshot());
        assert_eq!(moved.endpoints(), repo.endpoints());
    }
}
