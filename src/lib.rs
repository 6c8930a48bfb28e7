//! Periodic OBD-II telemetry logger
//!
//! Samples a configurable list of vehicle metrics through an ELM327 adapter at a fixed period
//! and appends one timestamped CSV row per cycle.
//!
//! # Usage
//! ```no_run
//! use obd_logger::{
//!     connection::ObdConnection,
//!     device::{Elm327, SerialPort},
//!     sampling::{metrics, CsvSink, SamplerConfig, SamplingLoop, Timestamp},
//!     Obd2,
//! };
//!
//! fn main() -> Result<(), obd_logger::Error> {
//!     let port = SerialPort::new("/dev/rfcomm0", 38_400)?;
//!     let connection = ObdConnection::new(Obd2::new(Elm327::new(port)?));
//!
//!     let started = Timestamp::now();
//!     let mut sampler = SamplingLoop::new(connection, metrics::defaults(), SamplerConfig::default())?;
//!     sampler.run(|| CsvSink::create("data", &started))?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

pub mod commands;

pub mod connection;

pub mod device;

mod error;
pub use error::{Error, Result};

mod interface;
pub use interface::Obd2;

mod obd2_device;
pub use obd2_device::Obd2Device;

pub mod sampling;
