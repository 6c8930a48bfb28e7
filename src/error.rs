use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// An error while talking to the vehicle or logging its readings
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An error occurred in the [Obd2BaseDevice](crate::device::Obd2BaseDevice)
    #[error("Device error: `{0:?}`")]
    Device(DeviceError),

    /// Some part of the response (described by the `&str`) was not the expected length
    #[error("Incorrect length (`{0}`): expected `{1}`, got `{2}`")]
    IncorrectResponseLength(&'static str, usize, usize),

    /// The vehicle did not answer the request, usually because the PID is unsupported
    #[error("No data returned by the vehicle")]
    NoData,

    /// The adapter did not finish its response before the read timeout
    #[error("Timed out waiting for the adapter")]
    Timeout,

    /// The adapter answered with one of its status messages instead of data
    #[error("Adapter reported `{0}`")]
    Adapter(String),

    /// The adapter could not be reached when the run started
    #[error("OBD-II connection unavailable: {0}")]
    ConnectionUnavailable(String),

    /// The output file could not be created
    #[error("Could not open sink `{}`: {source}", path.display())]
    SinkOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row could not be appended to an already open sink
    #[error("Could not write to sink: {0}")]
    SinkWrite(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid metric selection or sampler settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Another error occurred
    #[error("Other OBD2 error: `{0}`")]
    Other(String),
}

#[derive(Debug)]
pub struct DeviceError(crate::device::Error);

impl From<super::device::Error> for Error {
    fn from(e: super::device::Error) -> Self {
        Error::Device(DeviceError(e))
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(e: std::num::ParseIntError) -> Self {
        Error::Other(format!("invalid data received: {:?}", e))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Error::Other(format!("invalid string received: {:?}", e))
    }
}
