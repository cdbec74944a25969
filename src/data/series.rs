use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{numeric, parse_timestamp, Reading, SensorId};

pub const DEFAULT_WINDOW: usize = 15;
pub const DEFAULT_LABEL_STRIDE: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeriesOptions {
    /// Most recent points kept per series.
    pub window: usize,
    /// Every `label_stride`-th point carries an axis label, the rest are blank.
    pub label_stride: usize,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            label_stride: DEFAULT_LABEL_STRIDE,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SeriesPoint {
    pub value: Value,
    pub timestamp_full: String,
    pub timestamp_short: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub sensor_id: SensorId,
    pub sensor_name: String,
    pub points: Vec<SeriesPoint>,
    pub labels: Vec<String>,
    /// Numeric view of each point; `None` where the raw value isn't a number.
    pub values: Vec<Option<f64>>,
}

impl Series {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// `(index, value)` pairs for plotting, skipping non-numeric points.
    pub fn chart_points(&self) -> Vec<(f64, f64)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
            .collect()
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        let mut iter = self.values.iter().flatten().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }
}

pub fn format_full(time: &DateTime<Utc>) -> String {
    time.format("%d %b, %H:%M").to_string()
}

pub fn format_short(time: &DateTime<Utc>) -> String {
    time.format("%d %b").to_string()
}

/// Builds the display series for one sensor out of the raw reading list.
///
/// Readings are filtered to `sensor_id`, stable-sorted by timestamp (entries
/// whose timestamp can't be parsed sort first, in their original order) and
/// cut down to the most recent `options.window`. Never fails.
pub fn build_series(
    readings: &[Reading],
    sensor_id: SensorId,
    sensor_name: &str,
    options: SeriesOptions,
) -> Series {
    let mut matching: Vec<(Option<DateTime<Utc>>, &Reading)> = readings
        .iter()
        .filter(|r| r.sensor_id == sensor_id)
        .map(|r| (parse_timestamp(&r.timestamp), r))
        .collect();
    // `sort_by_key` is stable, so equal timestamps keep their input order.
    matching.sort_by_key(|(time, _)| *time);

    let skip = matching.len().saturating_sub(options.window);
    let recent = &matching[skip..];

    let points: Vec<SeriesPoint> = recent
        .iter()
        .map(|(time, reading)| match time {
            Some(t) => SeriesPoint {
                value: reading.value.clone(),
                timestamp_full: format_full(t),
                timestamp_short: format_short(t),
            },
            None => SeriesPoint {
                value: reading.value.clone(),
                timestamp_full: reading.timestamp.clone(),
                timestamp_short: reading.timestamp.clone(),
            },
        })
        .collect();

    let stride = options.label_stride.max(1);
    let labels = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if i % stride == 0 {
                p.timestamp_full.clone()
            } else {
                String::new()
            }
        })
        .collect();

    let values = points.iter().map(|p| numeric(&p.value)).collect();

    Series {
        sensor_id,
        sensor_name: sensor_name.to_string(),
        points,
        labels,
        values,
    }
}
