//! Canonical text form of readings, shared by the CSV rows and the progress lines

use super::Reading;

/// Cell written for a reading the vehicle did not provide
pub const UNDEFINED: &str = "undefined";

/// How many decimals a metric is rendered with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Integer,
    Decimals(u8),
}

/// Render `value` with a fixed number of decimals
///
/// Non-finite values render as [UNDEFINED] and negative zero as plain zero, so the same value
/// always produces the same cell.
pub fn format_value(value: f64, precision: Precision) -> String {
    if !value.is_finite() {
        return UNDEFINED.to_owned();
    }

    let text = match precision {
        Precision::Integer => format!("{:.0}", value),
        Precision::Decimals(n) => format!("{:.*}", usize::from(n), value),
    };

    match text.strip_prefix('-') {
        Some(magnitude) if magnitude.chars().all(|c| c == '0' || c == '.') => magnitude.to_owned(),
        _ => text,
    }
}

pub fn format_reading(reading: &Reading, precision: Precision) -> String {
    match reading.numeric_value {
        Some(value) => format_value(value, precision),
        None => UNDEFINED.to_owned(),
    }
}
