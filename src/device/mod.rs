//! Low level OBD-II adapters and the serial transports they run over

mod elm327;
pub use elm327::{Elm327, DEFAULT_SETTLE_TIME, DEFAULT_TIMEOUT};

pub(crate) mod serial_comm;
pub use serial_comm::{SerialComm, DEFAULT_BAUD_RATE};

#[cfg(feature = "serialport_comm")]
mod serialport_comm;
#[cfg(feature = "serialport_comm")]
pub use serialport_comm::SerialPort;

#[cfg(feature = "ftdi_comm")]
mod ftdi_comm;
#[cfg(feature = "ftdi_comm")]
pub use ftdi_comm::FTDIDevice;

type Result<T> = std::result::Result<T, Error>;

/// A device that can pass OBD-II requests to a vehicle
pub trait Obd2BaseDevice: Obd2Reader {
    /// Reset the adapter and let it pick the vehicle's protocol again
    fn reset(&mut self) -> Result<()>;

    /// Drop anything left in the receive queue
    fn flush(&mut self) -> Result<()>;

    /// Send the raw OBD-II request bytes (mode, then PID if any)
    fn send_cmd(&mut self, data: &[u8]) -> Result<()>;

    /// Send an OBD-II request and wait for the full response
    ///
    /// `Ok(None)` means the adapter did not finish responding before its timeout.
    fn cmd(&mut self, cmd: &[u8]) -> Result<Option<String>> {
        self.send_cmd(cmd)?;
        self.get_response()
            .map(|o| o.and_then(|resp| String::from_utf8(resp).ok()))
    }
}

pub trait Obd2Reader {
    fn get_line(&mut self) -> Result<Option<Vec<u8>>>;
    fn get_response(&mut self) -> Result<Option<Vec<u8>>>;
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[cfg(feature = "ftdi_comm")]
    #[error("FTDI error: `{0:?}`")]
    Ftdi(ftdi::Error),
    #[cfg(feature = "serialport_comm")]
    #[error("Serial port error: `{0:?}`")]
    Serial(serialport::Error),
    #[error("IO error: `{0:?}`")]
    IO(std::io::Error),
    #[error("Communication error: `{0}`")]
    Communication(String),
}

#[cfg(feature = "ftdi_comm")]
impl From<ftdi::Error> for Error {
    fn from(e: ftdi::Error) -> Self {
        Error::Ftdi(e)
    }
}

#[cfg(feature = "serialport_comm")]
impl From<serialport::Error> for Error {
    fn from(e: serialport::Error) -> Self {
        Error::Serial(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IO(e)
    }
}
