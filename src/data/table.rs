use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::repository::ReadingRepository;
use super::series::format_full;
use super::SensorId;
use crate::util::{contains_ignore_ascii_case, format_value};

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ReadingSortField {
    Time,
    Sensor,
    Value,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReadingRow {
    pub sensor_id: SensorId,
    pub sensor: String,
    pub value: String,
    pub numeric: Option<f64>,
    pub time: Option<DateTime<Utc>>,
    pub time_label: String,
}

/// Sort and filter state for the raw readings table.
pub struct ReadingTable {
    pub sort_field: ReadingSortField,
    pub sort_ascending: bool,
    pub filter: String,
}

impl ReadingTable {
    pub fn new() -> Self {
        Self {
            sort_field: ReadingSortField::Time,
            sort_ascending: false,
            filter: String::new(),
        }
    }

    pub fn set_sort_field(&mut self, field: ReadingSortField) {
        if self.sort_field == field {
            self.sort_ascending = !self.sort_ascending;
        } else {
            self.sort_field = field;
            self.sort_ascending = field != ReadingSortField::Time;
        }
    }

    pub fn rows(&self, repo: &ReadingRepository) -> Vec<ReadingRow> {
        let mut rows: Vec<ReadingRow> = repo
            .readings()
            .iter()
            .map(|r| {
                let time = r.time();
                ReadingRow {
                    sensor_id: r.sensor_id,
                    sensor: repo.sensor_name(r.sensor_id),
                    value: format_value(&r.value),
                    numeric: r.numeric_value(),
                    time_label: time
                        .as_ref()
                        .map(format_full)
                        .unwrap_or_else(|| r.timestamp.clone()),
                    time,
                }
            })
            .filter(|row| contains_ignore_ascii_case(&row.sensor, &self.filter))
            .collect();

        let ascending = self.sort_ascending;
        rows.sort_by(|a, b| {
            let cmp = match self.sort_field {
                ReadingSortField::Time => a.time.cmp(&b.time),
                ReadingSortField::Sensor => a
                    .sensor
                    .to_ascii_lowercase()
                    .cmp(&b.sensor.to_ascii_lowercase())
                    .then(a.time.cmp(&b.time)),
                ReadingSortField::Value => a
                    .numeric
                    .partial_cmp(&b.numeric)
                    .unwrap_or(Ordering::Equal),
            };
            if ascending {
                cmp
            } else {
                cmp.reverse()
            }
        });
        rows
    }
}

impl Default for ReadingTable {
    fn default() -> Self {
        Self::new()
    }
}
