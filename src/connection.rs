//! The query capability the sampling loop depends on

use log::{debug, info, warn};

use crate::{
    commands::{Obd2DataRetrieval, SupportedPids},
    sampling::{Metric, Reading},
    Error, Obd2Device, Result,
};

/// Something that can read a [Metric] from the vehicle
///
/// Queries take `&mut self`: the link is a single serial channel and requests can not be
/// interleaved.
pub trait Connection {
    /// Read `metric` once
    ///
    /// An unsupported PID or an unanswered request is an [unavailable](Reading::unavailable)
    /// reading, not an error. Errors are left for failures of the link itself; the caller decides
    /// how far they escalate.
    fn query(&mut self, metric: &Metric) -> Result<Reading>;

    /// Whether the adapter is reachable and talking to the vehicle
    fn is_connected(&mut self) -> bool;
}

/// [Connection] backed by an OBD-II device
///
/// The vehicle's supported PIDs are fetched by [is_connected](Connection::is_connected) and
/// cached, so PIDs the vehicle is known not to support are never put on the bus.
pub struct ObdConnection<D: Obd2Device> {
    device: D,
    supported: Option<SupportedPids>,
}

impl<D: Obd2Device> ObdConnection<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            supported: None,
        }
    }

    /// Supported PIDs of service 0x01, once [is_connected](Connection::is_connected) succeeded
    pub fn supported_pids(&self) -> Option<&SupportedPids> {
        self.supported.as_ref()
    }
}

impl<D: Obd2Device> Connection for ObdConnection<D> {
    fn query(&mut self, metric: &Metric) -> Result<Reading> {
        let command = &metric.query;

        if let Some(false) = self
            .supported
            .as_ref()
            .and_then(|s| s.supports(command.pid))
        {
            debug!("{}: PID {} not supported by the vehicle", metric.key, command);
            return Ok(Reading::unavailable(metric.key));
        }

        match self.device.read_pid(command) {
            Ok(value) => Ok(Reading::available(
                metric.key,
                value.raw_hex(),
                value.value,
            )),
            Err(Error::NoData) => {
                debug!("{}: no data for PID {}", metric.key, command);
                Ok(Reading::unavailable(metric.key))
            }
            Err(e) => Err(e),
        }
    }

    fn is_connected(&mut self) -> bool {
        match self.device.get_supported_pids(0x01) {
            Ok(supported) => {
                info!(
                    "Vehicle supports PIDs {:02X?}",
                    supported.iter().collect::<Vec<_>>()
                );
                self.supported = Some(supported);
                true
            }
            Err(e) => {
                warn!("Adapter is not talking to the vehicle: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::metrics;
    use std::collections::HashMap;

    /// Answers from a fixed table and counts what was asked
    struct TableDevice {
        answers: HashMap<(u8, u8), Vec<u8>>,
        asked: Vec<u8>,
    }

    impl TableDevice {
        fn new(answers: &[((u8, u8), &[u8])]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(k, v)| (*k, v.to_vec()))
                    .collect(),
                asked: Vec::new(),
            }
        }
    }

    impl Obd2Device for TableDevice {
        fn obd_command(&mut self, mode: u8, pid: u8) -> Result<Vec<Vec<u8>>> {
            self.asked.push(pid);
            match self.answers.get(&(mode, pid)) {
                Some(data) => Ok(vec![data.clone()]),
                None => Err(Error::NoData),
            }
        }
    }

    fn metric(key: &str) -> Metric {
        metrics::find(key).unwrap()
    }

    #[test]
    fn test_query_available() {
        let mut conn = ObdConnection::new(TableDevice::new(&[((0x01, 0x0C), &[0x0D, 0x48])]));

        let reading = conn.query(&metric("rpm")).unwrap();
        assert_eq!(reading.metric_key, "rpm");
        assert_eq!(reading.numeric_value, Some(850.0));
        assert_eq!(reading.raw_value.as_deref(), Some("0D 48"));
    }

    #[test]
    fn test_no_data_is_unavailable() {
        let mut conn = ObdConnection::new(TableDevice::new(&[]));

        let reading = conn.query(&metric("combustivel")).unwrap();
        assert!(!reading.is_available());
    }

    #[test]
    fn test_unsupported_pid_is_not_requested() {
        let mut conn = ObdConnection::new(TableDevice::new(&[
            ((0x01, 0x00), &[0x00, 0x18, 0x00, 0x00]),
            ((0x01, 0x0C), &[0x0D, 0x48]),
        ]));
        assert!(conn.is_connected());
        conn.device.asked.clear();

        let reading = conn.query(&metric("temperatura")).unwrap();
        assert!(!reading.is_available());
        assert!(conn.device.asked.is_empty());

        assert!(conn.query(&metric("rpm")).unwrap().is_available());
        assert_eq!(conn.device.asked, vec![0x0C]);
    }

    #[test]
    fn test_unknown_range_is_still_requested() {
        let mut conn = ObdConnection::new(TableDevice::new(&[
            ((0x01, 0x00), &[0x00, 0x18, 0x00, 0x01]),
            ((0x01, 0x2F), &[0x80]),
        ]));
        assert!(conn.is_connected());

        let reading = conn.query(&metric("combustivel")).unwrap();
        assert!(reading.is_available());
    }

    #[test]
    fn test_not_connected() {
        let mut conn = ObdConnection::new(TableDevice::new(&[]));
        assert!(!conn.is_connected());
        assert!(conn.supported_pids().is_none());
    }

    #[test]
    fn test_link_errors_are_returned() {
        struct Broken;
        impl Obd2Device for Broken {
            fn obd_command(&mut self, _: u8, _: u8) -> Result<Vec<Vec<u8>>> {
                Err(Error::Timeout)
            }
        }

        let mut conn = ObdConnection::new(Broken);
        assert!(matches!(conn.query(&metric("rpm")), Err(Error::Timeout)));
    }
}
