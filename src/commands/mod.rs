//! High level OBD-II interface

#[macro_use]
mod macros;

mod implementation;

pub mod pids;

mod types;
pub use types::{PidCommand, PidValue, SupportedPids};

use crate::Result;

/// Trait for devices that can retrieve data over OBD-II
///
/// Automatically implemented for implementors of [Obd2Device](crate::Obd2Device).
pub trait Obd2DataRetrieval: private::Sealed {
    /// Check which PIDs of `service` the current vehicle supports
    ///
    /// Queries PID 0x00 and then every following bitmask PID the vehicle says is available. Only
    /// a failure of the first query is an error.
    fn get_supported_pids(&mut self, service: u8) -> Result<SupportedPids>;

    /// Request one PID and decode the first ECU's answer
    ///
    /// Fails with [Error::NoData](crate::Error::NoData) when the vehicle does not answer it, and
    /// with [Error::IncorrectResponseLength](crate::Error::IncorrectResponseLength) when the
    /// answer is too short for the formula.
    fn read_pid(&mut self, command: &PidCommand) -> Result<PidValue>;
}

impl<T: crate::Obd2Device> Obd2DataRetrieval for T {
    fn get_supported_pids(&mut self, service: u8) -> Result<SupportedPids> {
        implementation::get_supported_pids(self, service)
    }

    fn read_pid(&mut self, command: &PidCommand) -> Result<PidValue> {
        implementation::read_pid(self, command)
    }
}

mod private {
    pub trait Sealed {}
    impl<T: crate::Obd2Device> Sealed for T {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Obd2Device};
    use std::collections::HashMap;

    /// Answers from a fixed table of (mode, pid) -> per-ECU data bytes
    struct TableDevice(HashMap<(u8, u8), Vec<Vec<u8>>>);

    impl Obd2Device for TableDevice {
        fn obd_command(&mut self, mode: u8, pid: u8) -> Result<Vec<Vec<u8>>> {
            self.0.get(&(mode, pid)).cloned().ok_or(Error::NoData)
        }
    }

    #[test]
    fn test_read_pid_decodes_first_ecu() {
        let mut device = TableDevice(HashMap::from([(
            (0x01, 0x0C),
            vec![vec![0x0D, 0x48], vec![0x00, 0x00]],
        )]));

        let value = device.read_pid(&pids::ENGINE_RPM).unwrap();
        assert_eq!(value.value, 850.0);
        assert_eq!(value.raw, vec![0x0D, 0x48]);
    }

    #[test]
    fn test_read_pid_short_response() {
        let mut device = TableDevice(HashMap::from([((0x01, 0x0C), vec![vec![0x0D]])]));

        assert!(matches!(
            device.read_pid(&pids::ENGINE_RPM),
            Err(Error::IncorrectResponseLength("ENGINE_RPM", 2, 1))
        ));
    }

    #[test]
    fn test_read_pid_unanswered() {
        let mut device = TableDevice(HashMap::new());
        assert!(matches!(
            device.read_pid(&pids::FUEL_LEVEL),
            Err(Error::NoData)
        ));
    }

    #[test]
    fn test_supported_pids_follow_chain() {
        let mut device = TableDevice(HashMap::from([
            ((0x01, 0x00), vec![vec![0xBE, 0x1F, 0xA8, 0x13]]),
            ((0x01, 0x20), vec![vec![0x00, 0x02, 0x00, 0x01]]),
            ((0x01, 0x40), vec![vec![0x40, 0x00, 0x00, 0x00]]),
        ]));

        let supported = device.get_supported_pids(0x01).unwrap();
        assert_eq!(supported.supports(pids::ENGINE_RPM.pid), Some(true));
        assert_eq!(supported.supports(pids::FUEL_LEVEL.pid), Some(true));
        assert_eq!(supported.supports(pids::CONTROL_MODULE_VOLTAGE.pid), Some(true));
        assert_eq!(supported.supports(0x41), Some(false));
        assert_eq!(supported.supports(0x61), None);
    }

    #[test]
    fn test_supported_pids_merge_ecus() {
        let mut device = TableDevice(HashMap::from([(
            (0x01, 0x00),
            vec![vec![0x80, 0x00, 0x00, 0x00], vec![0x00, 0x10, 0x00, 0x00]],
        )]));

        let supported = device.get_supported_pids(0x01).unwrap();
        assert_eq!(supported.iter().collect::<Vec<_>>(), vec![0x01, 0x0C]);
    }

    #[test]
    fn test_supported_pids_without_answer() {
        let mut device = TableDevice(HashMap::new());
        assert!(device.get_supported_pids(0x01).is_err());
    }

    #[test]
    fn test_pid_table() {
        assert_eq!(pids::ALL.len(), 9);
        assert_eq!(pids::FUEL_LEVEL.to_string(), "012F");
        assert!(pids::ALL.iter().all(|c| c.service == 0x01));
    }
}
