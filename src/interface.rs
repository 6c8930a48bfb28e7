use log::{debug, trace, warn};

use super::{device::Obd2BaseDevice, Error, Obd2Device, Result};

/// Status messages the ELM327 prints in place of response data
const ADAPTER_ERRORS: &[&str] = &[
    "UNABLE TO CONNECT",
    "CAN ERROR",
    "BUS BUSY",
    "BUS ERROR",
    "DATA ERROR",
    "FB ERROR",
    "LV RESET",
    "BUFFER FULL",
    "STOPPED",
    "ERR",
];

/// An OBD-II interface
///
/// Wraps an implementer of [Obd2BaseDevice] to allow for higher-level usage of the OBD-II
/// interface.
pub struct Obd2<T: Obd2BaseDevice> {
    device: T,
}

impl<T: Obd2BaseDevice> Obd2Device for Obd2<T> {
    fn obd_command(&mut self, mode: u8, pid: u8) -> Result<Vec<Vec<u8>>> {
        let result = self.command(&[mode, pid])?;

        result
            .iter()
            .map(|response| {
                if response.first() != Some(&(0x40 | mode)) {
                    return Err(Error::Other(format!(
                        "response {:02X?} does not match mode {:02X}",
                        response, mode
                    )));
                }
                if response.get(1) != Some(&pid) {
                    return Err(Error::Other(format!(
                        "response {:02X?} does not match PID {:02X}",
                        response, pid
                    )));
                }
                Ok(response[2..].to_vec())
            })
            .collect()
    }
}

impl<T: Obd2BaseDevice> Obd2<T> {
    pub fn new(device: T) -> Self {
        Self { device }
    }

    fn command(&mut self, command: &[u8]) -> Result<Vec<Vec<u8>>> {
        let Some(response) = self.device.cmd(command)? else {
            warn!("No prompt after OBD command {:02X?}", command);
            // whatever did arrive belongs to this command, not the next one
            self.device.flush()?;
            return Err(Error::Timeout);
        };

        trace!(
            "Sent OBD command {:02X?} and got response {:?}",
            command,
            response
        );

        Self::check_status(&response)?;

        let data = if response.contains("0:") {
            vec![Self::parse_command_multiline(&response)?]
        } else {
            Self::parse_command(&response)?
        };

        debug!("Sent OBD command {:02X?} and got data {:?}", command, data);

        data.iter()
            .map(|l| {
                l.iter()
                    .map(|s| u8::from_str_radix(s, 16).map_err(Error::from))
                    .collect::<Result<Vec<u8>>>()
            })
            .collect()
    }

    fn check_status(response: &str) -> Result<()> {
        let upper = response.to_ascii_uppercase();
        if upper.contains("NO DATA") {
            return Err(Error::NoData);
        }
        if upper.lines().any(|l| l.trim() == "?") {
            return Err(Error::Adapter("unrecognized command".to_owned()));
        }
        // `BUS INIT: ...OK` comes before normal data, only a failed init is an error
        if let Some(init) = upper
            .lines()
            .map(str::trim)
            .find(|l| l.starts_with("BUS INIT") && l.ends_with("ERROR"))
        {
            return Err(Error::Adapter(init.to_owned()));
        }
        if let Some(status) = ADAPTER_ERRORS.iter().find(|s| upper.contains(*s)) {
            return Err(Error::Adapter((*status).to_owned()));
        }
        Ok(())
    }

    fn data_lines(response: &str) -> impl Iterator<Item = &str> {
        response
            .split('\n')
            .map(str::trim)
            .filter(|l| {
                let upper = l.to_ascii_uppercase();
                !l.is_empty()
                    && !upper.starts_with("SEARCHING")
                    && !upper.starts_with("BUS INIT")
            })
    }

    fn parse_command(response: &str) -> Result<Vec<Vec<String>>> {
        let result: Vec<Vec<String>> = Self::data_lines(response)
            .map(|l| l.split_whitespace().map(|s| s.to_owned()).collect())
            .collect();

        if !result.is_empty() {
            Ok(result)
        } else {
            Err(Error::Other("parse_command: found no responses".to_owned()))
        }
    }

    /// Join an ISO-TP style response, where each frame is prefixed by its index (`0:`, `1:`...)
    /// and the first line holds the total byte count
    fn parse_command_multiline(response: &str) -> Result<Vec<String>> {
        let mut n_idx = 0u8;
        let mut out = Vec::new();
        for (idx, data) in Self::data_lines(response).filter_map(|l| l.split_once(':')) {
            if u8::from_str_radix(idx.trim(), 16) != Ok(n_idx) {
                return Err(Error::Other(format!(
                    "multiline response frame {} out of order, expected {:X}",
                    idx, n_idx
                )));
            }
            n_idx = (n_idx + 1) % 0x10;
            out.extend(data.split_whitespace().map(|s| s.to_owned()));
        }
        Ok(out)
    }
}
