//! The metric catalog compiled into the logger

use crate::{
    commands::{pids, PidCommand},
    Error, Result,
};

use super::{format::Precision, reading::TIME_COLUMN};

/// A named quantity to sample every cycle
#[derive(Debug, Clone, Copy)]
pub struct Metric {
    /// CSV column name
    pub key: &'static str,
    /// Name shown on progress lines
    pub label: &'static str,
    /// What to ask the vehicle for
    pub query: PidCommand,
    pub precision: Precision,
}

impl Metric {
    pub const fn new(
        key: &'static str,
        label: &'static str,
        query: PidCommand,
        precision: Precision,
    ) -> Self {
        Self {
            key,
            label,
            query,
            precision,
        }
    }

    pub fn unit(&self) -> &'static str {
        self.query.unit
    }
}

/// Every metric the logger can sample; the keys match the columns of the original data files
pub const CATALOG: &[Metric] = &[
    Metric::new("rpm", "RPM", pids::ENGINE_RPM, Precision::Integer),
    Metric::new("velocidade", "Velocidade", pids::VEHICLE_SPEED, Precision::Integer),
    Metric::new("temperatura", "Temperatura", pids::COOLANT_TEMPERATURE, Precision::Integer),
    Metric::new("combustivel", "Combustivel", pids::FUEL_LEVEL, Precision::Decimals(1)),
    Metric::new("carga", "Carga do motor", pids::ENGINE_LOAD, Precision::Decimals(1)),
    Metric::new("acelerador", "Acelerador", pids::THROTTLE_POSITION, Precision::Decimals(1)),
    Metric::new(
        "temp_admissao",
        "Temperatura de admissao",
        pids::INTAKE_AIR_TEMPERATURE,
        Precision::Integer,
    ),
    Metric::new("maf", "MAF", pids::MAF_AIR_FLOW_RATE, Precision::Decimals(2)),
    Metric::new(
        "tensao",
        "Tensao do modulo",
        pids::CONTROL_MODULE_VOLTAGE,
        Precision::Decimals(2),
    ),
];

/// Metrics sampled when none are selected
pub const DEFAULT_KEYS: &[&str] = &["rpm", "velocidade", "temperatura", "combustivel"];

pub fn find(key: &str) -> Option<Metric> {
    CATALOG.iter().find(|m| m.key == key).copied()
}

/// Pick metrics from the catalog, keeping the order of `keys`
pub fn select<S: AsRef<str>>(keys: &[S]) -> Result<Vec<Metric>> {
    let mut selected: Vec<Metric> = Vec::with_capacity(keys.len());
    for key in keys {
        let key = key.as_ref().trim();
        let metric = find(key).ok_or_else(|| {
            Error::Config(format!(
                "unknown metric `{}` (known: {})",
                key,
                CATALOG.iter().map(|m| m.key).collect::<Vec<_>>().join(", ")
            ))
        })?;
        if selected.iter().any(|m| m.key == metric.key) {
            return Err(Error::Config(format!("metric `{}` selected twice", key)));
        }
        selected.push(metric);
    }
    check(&selected)?;
    Ok(selected)
}

pub fn defaults() -> Vec<Metric> {
    CATALOG
        .iter()
        .filter(|m| DEFAULT_KEYS.contains(&m.key))
        .copied()
        .collect()
}

/// Reject metric lists that could not produce a well formed header
pub fn check(metrics: &[Metric]) -> Result<()> {
    if metrics.is_empty() {
        return Err(Error::Config("no metrics selected".to_owned()));
    }
    for (i, metric) in metrics.iter().enumerate() {
        if metric.key == TIME_COLUMN {
            return Err(Error::Config(format!(
                "metric key `{}` is reserved for the timestamp",
                TIME_COLUMN
            )));
        }
        if metrics[..i].iter().any(|m| m.key == metric.key) {
            return Err(Error::Config(format!("duplicate metric key `{}`", metric.key)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let keys: Vec<_> = defaults().iter().map(|m| m.key).collect();
        assert_eq!(keys, DEFAULT_KEYS);
    }

    #[test]
    fn test_select_keeps_order() {
        let keys: Vec<_> = select(&["tensao", "rpm"])
            .unwrap()
            .iter()
            .map(|m| m.key)
            .collect();
        assert_eq!(keys, vec!["tensao", "rpm"]);
    }

    #[test]
    fn test_select_unknown() {
        assert!(matches!(select(&["rpm", "boost"]), Err(Error::Config(_))));
    }

    #[test]
    fn test_select_duplicate() {
        assert!(matches!(select(&["rpm", "rpm"]), Err(Error::Config(_))));
    }

    #[test]
    fn test_select_empty() {
        let none: &[&str] = &[];
        assert!(select(none).is_err());
    }

    #[test]
    fn test_catalog_keys_are_unique() {
        assert!(check(CATALOG).is_ok());
    }

    #[test]
    fn test_reserved_key() {
        let time = Metric::new(TIME_COLUMN, "Time", pids::ENGINE_RPM, Precision::Integer);
        assert!(check(&[time]).is_err());
    }

    #[test]
    fn test_fuel_level_is_fractional() {
        let fuel = find("combustivel").unwrap();
        assert_eq!(fuel.precision, Precision::Decimals(1));
        assert_eq!(fuel.unit(), "%");
    }
}
