use super::serial_comm::SerialComm;
use super::Result;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

/// Communicate with a serial device using the
/// serialport library
///
/// /dev/tty* or similar on unix-like systems, including /dev/rfcomm* for adapters paired over
/// Bluetooth. COM devices on Windows systems.
pub struct SerialPort {
    device: Box<dyn serialport::SerialPort>,
}

impl SerialPort {
    /// Creates a new instance of a SerialPort
    pub fn new(path: &str, baud_rate: u32) -> Result<Self> {
        let device = serialport::new(path, baud_rate)
            .timeout(Duration::from_millis(10))
            .parity(serialport::Parity::None)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .open()?;

        Ok(Self { device })
    }
}

impl SerialComm for SerialPort {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        Ok(self.device.write_all(data)?)
    }

    fn read(&mut self, data: &mut [u8]) -> Result<usize> {
        match self.device.read(data) {
            Ok(n) => Ok(n),
            // the short port timeout only means nothing is waiting yet
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn purge_buffers(&mut self) -> Result<()> {
        Ok(self.device.clear(serialport::ClearBuffer::All)?)
    }
}
