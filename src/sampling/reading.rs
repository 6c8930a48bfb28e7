use std::fmt;

use chrono::{DateTime, Local};

use super::{format::format_reading, Metric};

/// Name of the leading timestamp column
pub const TIME_COLUMN: &str = "time";

/// The outcome of querying one [Metric] once
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub metric_key: &'static str,
    /// Data bytes as the adapter printed them
    pub raw_value: Option<String>,
    /// Decoded quantity; `None` when the vehicle did not provide one
    pub numeric_value: Option<f64>,
}

impl Reading {
    pub fn available(metric_key: &'static str, raw_value: impl Into<String>, value: f64) -> Self {
        Self {
            metric_key,
            raw_value: Some(raw_value.into()),
            numeric_value: Some(value),
        }
    }

    pub fn unavailable(metric_key: &'static str) -> Self {
        Self {
            metric_key,
            raw_value: None,
            numeric_value: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.numeric_value.is_some()
    }
}

/// Wall clock time of a sample, in local time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(DateTime<Local>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Local::now())
    }

    /// Form used in the `time` column, e.g. `2024-05-01 14:03:27.512345`
    pub fn row_format(&self) -> String {
        self.0.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }

    /// Form used to name output files, e.g. `01-05-2024_14-03-27`
    pub fn file_stem(&self) -> String {
        self.0.format("%d-%m-%Y_%H-%M-%S").to_string()
    }
}

impl From<DateTime<Local>> for Timestamp {
    fn from(time: DateTime<Local>) -> Self {
        Self(time)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.row_format())
    }
}

/// One cycle's readings, in metric order
#[derive(Debug, Clone)]
pub struct Sample {
    pub timestamp: Timestamp,
    pub readings: Vec<Reading>,
}

impl Sample {
    /// The timestamp followed by one formatted cell per metric
    ///
    /// `metrics` must be the list the readings were taken for.
    pub fn to_row(&self, metrics: &[Metric]) -> Vec<String> {
        std::iter::once(self.timestamp.row_format())
            .chain(
                metrics
                    .iter()
                    .zip(&self.readings)
                    .map(|(metric, reading)| format_reading(reading, metric.precision)),
            )
            .collect()
    }

    pub fn unavailable_count(&self) -> usize {
        self.readings.iter().filter(|r| !r.is_available()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::metrics;
    use chrono::TimeZone;

    fn timestamp() -> Timestamp {
        Local
            .with_ymd_and_hms(2024, 5, 1, 14, 3, 27)
            .single()
            .unwrap()
            .into()
    }

    #[test]
    fn test_timestamp_formats() {
        let ts = timestamp();
        assert_eq!(ts.row_format(), "2024-05-01 14:03:27.000000");
        assert_eq!(ts.file_stem(), "01-05-2024_14-03-27");
        assert_eq!(ts.to_string(), ts.row_format());
    }

    #[test]
    fn test_row_keeps_metric_order() {
        let metrics = metrics::select(&["velocidade", "rpm", "combustivel"]).unwrap();
        let sample = Sample {
            timestamp: timestamp(),
            readings: vec![
                Reading::available("velocidade", "0C", 12.0),
                Reading::unavailable("rpm"),
                Reading::available("combustivel", "80", 128.0 * 100.0 / 255.0),
            ],
        };

        assert_eq!(
            sample.to_row(&metrics),
            vec!["2024-05-01 14:03:27.000000", "12", "undefined", "50.2"]
        );
        assert_eq!(sample.unavailable_count(), 1);
    }
}
