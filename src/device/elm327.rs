use log::{debug, info, trace};
use std::{collections::VecDeque, thread, time};

use super::{Error, Obd2BaseDevice, Obd2Reader, Result, SerialComm};

/// How long to wait for a complete response before giving up
pub const DEFAULT_TIMEOUT: time::Duration = time::Duration::from_secs(5);

/// Pause between the steps of the reset sequence
pub const DEFAULT_SETTLE_TIME: time::Duration = time::Duration::from_millis(500);

/// An ELM327 OBD-II adapter
///
/// It communicates with the computer over UART, either through a USB-to-UART converter or a
/// Bluetooth serial link. Commands to the device itself are indicated by sending "AT" followed by
/// the command, while plain strings of hex data indicate OBD-II requests to be sent to the
/// vehicle. The responses of the vehicle are echoed back as hex characters. Capitalization and
/// spaces are always ignored.
///
/// [Datasheet for v1.4b](https://github.com/rsammelson/obd2/blob/master/docs/ELM327DSH.pdf), and
/// the [source](https://www.elmelectronics.com/products/dsheets/).
pub struct Elm327<C: SerialComm> {
    device: C,
    buffer: VecDeque<u8>,
    timeout: time::Duration,
    settle_time: time::Duration,
}

impl<C: SerialComm> Obd2BaseDevice for Elm327<C> {
    fn reset(&mut self) -> Result<()> {
        self.flush_buffers()?;
        self.reset_ic()?;
        thread::sleep(self.settle_time);
        self.reset_protocol()?;
        Ok(())
    }

    /// Flush the device's buffer
    fn flush(&mut self) -> Result<()> {
        thread::sleep(self.settle_time);
        self.read_into_queue()?;
        self.buffer.clear();
        Ok(())
    }

    fn send_cmd(&mut self, data: &[u8]) -> Result<()> {
        trace!("send_cmd: sending {:02X?}", data);
        self.send_serial_str(
            data.iter()
                .map(|v| format!("{:02X}", v))
                .collect::<String>()
                .as_str(),
        )
    }
}

impl<C: SerialComm> Obd2Reader for Elm327<C> {
    fn get_line(&mut self) -> Result<Option<Vec<u8>>> {
        self.get_until(b'\n', false)
    }

    /// Read data until the ELM327's prompt character is printed
    ///
    /// This will receive the entire OBD-II response. The prompt signifies that the ELM327 is ready
    /// for another command. If this is not called after each OBD-II command is sent, the prompt
    /// character will come out of the receive queue later and because it is not valid hex this
    /// could cause problems. If a timeout occurs, `Ok(None)` will be returned.
    fn get_response(&mut self) -> Result<Option<Vec<u8>>> {
        self.get_until(b'>', true)
    }
}

impl<C: SerialComm> Elm327<C> {
    /// Take over an opened serial link and bring the adapter to a known state
    pub fn new(device: C) -> Result<Self> {
        Self::with_timing(device, DEFAULT_TIMEOUT, DEFAULT_SETTLE_TIME)
    }

    /// Like [new](Self::new), with an explicit response timeout and reset settle time
    pub fn with_timing(
        device: C,
        timeout: time::Duration,
        settle_time: time::Duration,
    ) -> Result<Self> {
        let mut elm = Elm327 {
            device,
            buffer: VecDeque::new(),
            timeout,
            settle_time,
        };

        elm.connect()?;
        elm.flush()?;

        Ok(elm)
    }

    fn flush_buffers(&mut self) -> Result<()> {
        self.device.purge_buffers()?;
        Ok(())
    }

    fn connect(&mut self) -> Result<()> {
        self.flush_buffers()?;
        thread::sleep(self.settle_time);
        self.serial_cmd(" ")?;
        thread::sleep(self.settle_time);

        self.reset()
    }

    fn reset_ic(&mut self) -> Result<()> {
        info!("Performing IC reset");
        self.send_serial_str("ATZ")?;
        debug!(
            "reset_ic: got response {:?}",
            self.get_response()?
                .as_ref()
                .map(|l| String::from_utf8_lossy(l.as_slice()).into_owned())
        );
        Ok(())
    }

    fn reset_protocol(&mut self) -> Result<()> {
        info!("Performing protocol reset");
        debug!(
            "reset_protocol: got response {:?}",
            self.serial_cmd("ATSP0")?
        );
        debug!(
            "reset_protocol: got OBD response {:?}",
            self.cmd(&[0x01, 0x00])?
        );
        self.flush_buffers()?;
        Ok(())
    }

    fn get_until(&mut self, end_byte: u8, allow_empty: bool) -> Result<Option<Vec<u8>>> {
        trace!("get_until: getting until {}", end_byte);

        let mut buf = Vec::new();
        let start = time::Instant::now();
        while start.elapsed() < self.timeout {
            let Some(b) = self.get_byte()? else { continue };
            let b = match b {
                b'\r' => Some(b'\n'),
                b'\n' => None, // no push here
                _ => Some(b),
            };
            if let Some(b) = b {
                buf.push(b);
                if b == end_byte {
                    break;
                }
            }
        }

        trace!("get_until: got {:?}", String::from_utf8_lossy(&buf));

        match buf.pop() {
            Some(b) if b == end_byte => {
                if allow_empty || !buf.is_empty() {
                    Ok(Some(buf))
                } else {
                    // empty line, try again
                    self.get_until(end_byte, allow_empty)
                }
            }
            Some(f) => {
                // incomplete line read
                for b in buf.iter().rev() {
                    self.buffer.push_front(*b);
                }
                self.buffer.push_front(f);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn get_byte(&mut self) -> Result<Option<u8>> {
        match self.buffer.pop_front() {
            Some(b'\0') => Ok(None),
            Some(b) => Ok(Some(b)),
            None => {
                self.read_into_queue()?;
                Ok(None)
            }
        }
    }

    fn read_into_queue(&mut self) -> Result<()> {
        let mut buf = [0u8; 16];
        loop {
            let len = self.device.read(&mut buf)?;
            if len > 0 {
                self.buffer.extend(&buf[0..len]);
                trace!(
                    "read_into_queue: values {:?}",
                    String::from_utf8_lossy(&buf[0..len])
                );
            } else {
                trace!("read_into_queue: no values left to read");
                break;
            }
        }
        Ok(())
    }

    fn serial_cmd(&mut self, cmd: &str) -> Result<Option<String>> {
        self.send_serial_str(cmd)?;
        self.get_response()
            .map(|o| o.and_then(|resp| String::from_utf8(resp).ok()))
    }

    /// Function for sending a raw string, without encoding into ASCII hex
    fn send_serial_str(&mut self, data: &str) -> Result<()> {
        trace!("send_serial_str: sending {:?}", data);

        let data = data.as_bytes();

        self.device.write_all(data)?;
        self.device.write_all(b"\r\n")?;
        let line = self.get_line()?;
        if line.as_ref().is_some_and(|v| v == data) {
            Ok(())
        } else {
            Err(Error::Communication(format!(
                "send_serial_str: got {:?} instead of echoed command ({:?})",
                line.as_ref().map(|l| String::from_utf8_lossy(l)),
                String::from_utf8_lossy(data)
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::serial_comm::mock::MockElm;

    fn connect(mock: MockElm) -> Elm327<MockElm> {
        Elm327::with_timing(
            mock,
            time::Duration::from_millis(100),
            time::Duration::ZERO,
        )
        .unwrap()
    }

    #[test]
    fn test_connect_sequence() {
        let elm = connect(MockElm::new());
        assert_eq!(elm.device.sent, vec![" ", "ATZ", "ATSP0", "0100"]);
        assert!(elm.buffer.is_empty());
    }

    #[test]
    fn test_command_is_sent_as_hex() {
        let mut mock = MockElm::new();
        mock.respond("010C", "41 0C 0D 48");
        let mut elm = connect(mock);

        let response = elm.cmd(&[0x01, 0x0C]).unwrap();
        assert_eq!(elm.device.sent.last().map(String::as_str), Some("010C"));
        assert_eq!(response.as_deref().map(str::trim), Some("41 0C 0D 48"));
    }

    #[test]
    fn test_missing_prompt_times_out() {
        let mut mock = MockElm::new();
        mock.stall("010D");
        let mut elm = connect(mock);

        let started = time::Instant::now();
        assert_eq!(elm.cmd(&[0x01, 0x0D]).unwrap(), None);
        // bounded by the 100 ms timeout given to with_timing
        assert!(started.elapsed() >= time::Duration::from_millis(100));
        assert!(started.elapsed() < time::Duration::from_secs(2));
    }

    #[test]
    fn test_missing_echo_is_a_communication_error() {
        let mut mock = MockElm::new();
        mock.mute("0105");
        let mut elm = connect(mock);

        let err = elm.send_cmd(&[0x01, 0x05]).unwrap_err();
        assert!(matches!(err, Error::Communication(_)), "got {:?}", err);
    }
}
