use log::debug;

use crate::{Error, Obd2Device, Result};

use super::{PidCommand, PidValue, SupportedPids};

/// Service 0x01 bitmask PIDs chain through the lowest bit; stop after the last possible range
const LAST_SUPPORT_RANGE: u8 = 0xE0;

pub(super) fn get_supported_pids<T: Obd2Device>(
    device: &mut T,
    service: u8,
) -> Result<SupportedPids> {
    let mut supported = SupportedPids::default();
    let mut base = 0x00;
    loop {
        let responses = match device.obd_command_len::<4>(service, base) {
            Ok(r) => r,
            Err(e) if base == 0x00 => return Err(e),
            Err(e) => {
                debug!("get_supported_pids: range {:02X} unavailable: {}", base, e);
                break;
            }
        };

        // several ECUs may answer; a PID is usable if any of them supports it
        let mask = responses
            .iter()
            .fold(0u32, |acc, r| acc | u32::from_be_bytes(*r));
        supported.insert_range(base, mask);

        if mask & 1 == 0 || base == LAST_SUPPORT_RANGE {
            break;
        }
        base += 0x20;
    }
    Ok(supported)
}

pub(super) fn read_pid<T: Obd2Device>(device: &mut T, command: &PidCommand) -> Result<PidValue> {
    let raw = device.first_response(command.service, command.pid)?;

    if raw.len() < command.response_len {
        return Err(Error::IncorrectResponseLength(
            command.name,
            command.response_len,
            raw.len(),
        ));
    }

    let value = (command.decode)(&raw[..command.response_len]);
    Ok(PidValue { raw, value })
}

/// Standard SAE J1979 formulas, `a` being the first data byte and `b` the second
pub(super) mod decode {
    fn word(b: &[u8]) -> f64 {
        f64::from(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn rpm(b: &[u8]) -> f64 {
        word(b) / 4.0
    }

    pub fn byte(b: &[u8]) -> f64 {
        f64::from(b[0])
    }

    pub fn temperature(b: &[u8]) -> f64 {
        f64::from(b[0]) - 40.0
    }

    pub fn percent(b: &[u8]) -> f64 {
        f64::from(b[0]) * 100.0 / 255.0
    }

    pub fn air_flow(b: &[u8]) -> f64 {
        word(b) / 100.0
    }

    pub fn voltage(b: &[u8]) -> f64 {
        word(b) / 1000.0
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_formulas() {
            assert_eq!(rpm(&[0x0D, 0x48]), 850.0);
            assert_eq!(byte(&[0x0C]), 12.0);
            assert_eq!(temperature(&[0x7B]), 83.0);
            assert_eq!(temperature(&[0x00]), -40.0);
            assert_eq!(percent(&[0xFF]), 100.0);
            assert_eq!(air_flow(&[0x01, 0xF4]), 5.0);
            assert_eq!(voltage(&[0x36, 0xB0]), 14.0);
        }
    }
}
