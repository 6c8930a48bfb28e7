//! OBD-II telemetry logger
//!
//! Samples vehicle metrics through an ELM327 adapter and appends them to a timestamped CSV file
//! until interrupted.
//!
//! Usage:
//!   obd-logger --device /dev/rfcomm0 --period-ms 1000 --metrics rpm,velocidade

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use clap::Parser;
use log::info;
use obd_logger::{
    connection::ObdConnection,
    device::{Elm327, SerialComm, DEFAULT_BAUD_RATE, DEFAULT_SETTLE_TIME},
    sampling::{
        metrics, CsvSink, LogProgress, RunSummary, SamplerConfig, SamplingLoop, ThreadSleeper,
        Timestamp,
    },
    Error, Obd2, Result,
};

#[cfg(windows)]
const DEFAULT_DEVICE: &str = "COM4";
#[cfg(not(windows))]
const DEFAULT_DEVICE: &str = "/dev/rfcomm0";

#[derive(Parser, Debug)]
#[command(name = "obd-logger", version)]
#[command(about = "Log OBD-II vehicle telemetry to CSV", long_about = None)]
struct Args {
    /// Serial device of the adapter (a paired Bluetooth adapter is bound to /dev/rfcommN)
    #[arg(short, long, default_value = DEFAULT_DEVICE)]
    device: String,

    /// Directory the data_<timestamp>.csv file is created in
    #[arg(short, long, default_value = "data")]
    output_dir: PathBuf,

    /// Sampling period in milliseconds
    #[arg(short, long, default_value_t = 1000,
          value_parser = clap::value_parser!(u64).range(1..=3_600_000))]
    period_ms: u64,

    /// Stop after this many cycles (runs until Ctrl+C if omitted)
    #[arg(short = 'n', long)]
    cycles: Option<u64>,

    /// How long the adapter may take to answer one query, in milliseconds
    #[arg(short, long, default_value_t = 5000,
          value_parser = clap::value_parser!(u64).range(1..=60_000))]
    timeout_ms: u64,

    /// Adapter baud rate
    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    baud_rate: u32,

    /// Comma separated metric keys, in column order [default: rpm,velocidade,temperatura,combustivel]
    #[arg(short, long, value_delimiter = ',')]
    metrics: Vec<String>,

    /// Send progress to the log instead of stdout
    #[arg(short, long)]
    quiet: bool,

    /// Print the metrics that can be sampled and exit
    #[arg(long)]
    list_metrics: bool,

    /// Talk to an FT232R USB adapter instead of a serial device
    #[cfg(feature = "ftdi_comm")]
    #[arg(long)]
    ftdi: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    if args.list_metrics {
        list_metrics();
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(summary) => {
            if !args.quiet {
                println!(
                    "Stopped after {} cycles: {} rows written, {} dropped",
                    summary.cycles, summary.rows_written, summary.write_failures
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn list_metrics() {
    println!("{:<14} {:<24} {:<6} PID", "KEY", "LABEL", "UNIT");
    for metric in metrics::CATALOG {
        let default = if metrics::DEFAULT_KEYS.contains(&metric.key) {
            " (default)"
        } else {
            ""
        };
        println!(
            "{:<14} {:<24} {:<6} {}{}",
            metric.key,
            metric.label,
            metric.unit(),
            metric.query,
            default
        );
    }
}

fn run(args: &Args) -> Result<RunSummary> {
    let selected = if args.metrics.is_empty() {
        metrics::defaults()
    } else {
        metrics::select(&args.metrics)?
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| Error::Other(format!("could not install the Ctrl-C handler: {}", e)))?;

    #[cfg(feature = "ftdi_comm")]
    if args.ftdi {
        info!("Opening FTDI adapter at {} baud", args.baud_rate);
        let comm = obd_logger::device::FTDIDevice::new(args.baud_rate)
            .map_err(|e| Error::ConnectionUnavailable(format!("FTDI adapter: {}", e)))?;
        return log_with(comm, args, selected, running);
    }

    open_serial(args).and_then(|comm| log_with(comm, args, selected, running))
}

#[cfg(feature = "serialport_comm")]
fn open_serial(args: &Args) -> Result<obd_logger::device::SerialPort> {
    info!("Opening {} at {} baud", args.device, args.baud_rate);
    obd_logger::device::SerialPort::new(&args.device, args.baud_rate)
        .map_err(|e| Error::ConnectionUnavailable(format!("{}: {}", args.device, e)))
}

#[cfg(not(feature = "serialport_comm"))]
fn open_serial(_args: &Args) -> Result<NoTransport> {
    Err(Error::Config(
        "built without serial port support; enable the `serialport_comm` feature".to_owned(),
    ))
}

/// Stands in for the serial port when the binary is built without one
#[cfg(not(feature = "serialport_comm"))]
enum NoTransport {}

#[cfg(not(feature = "serialport_comm"))]
impl SerialComm for NoTransport {
    fn write_all(&mut self, _: &[u8]) -> std::result::Result<(), obd_logger::device::Error> {
        match *self {}
    }

    fn read(&mut self, _: &mut [u8]) -> std::result::Result<usize, obd_logger::device::Error> {
        match *self {}
    }

    fn purge_buffers(&mut self) -> std::result::Result<(), obd_logger::device::Error> {
        match *self {}
    }
}

fn log_with<C: SerialComm>(
    comm: C,
    args: &Args,
    selected: Vec<obd_logger::sampling::Metric>,
    running: Arc<AtomicBool>,
) -> Result<RunSummary> {
    let elm = Elm327::with_timing(
        comm,
        Duration::from_millis(args.timeout_ms),
        DEFAULT_SETTLE_TIME,
    )
    .map_err(|e| Error::ConnectionUnavailable(format!("adapter did not initialise: {}", e)))?;
    let connection = ObdConnection::new(Obd2::new(elm));

    let config = SamplerConfig {
        period: Duration::from_millis(args.period_ms),
        max_cycles: args.cycles,
    };
    let sampler = SamplingLoop::new(connection, selected, config)?
        .with_sleeper(ThreadSleeper::watching(running.clone()))
        .with_stop_flag(running);
    let mut sampler = if args.quiet {
        sampler.with_progress(LogProgress)
    } else {
        sampler
    };

    let started = Timestamp::now();
    sampler.run(|| open_sink(&args.output_dir, &started, args.quiet))
}

fn open_sink(dir: &Path, started: &Timestamp, quiet: bool) -> Result<CsvSink<std::fs::File>> {
    let sink = CsvSink::create(dir, started)?;
    if let Some(path) = sink.path() {
        info!("Writing to {}", path.display());
        if !quiet {
            println!("Writing to {} (Ctrl+C to stop)\n", path.display());
        }
    }
    Ok(sink)
}
