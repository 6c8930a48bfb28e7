//! The periodic acquisition loop

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use log::{debug, info, trace, warn};

use super::{
    format::format_reading,
    metrics,
    progress::{ConsoleProgress, Progress},
    reading::{Reading, Sample, Timestamp, TIME_COLUMN},
    sink::Sink,
    Metric,
};
use crate::{connection::Connection, Error, Result};

/// Timing and stop condition of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Sleep between the end of one cycle and the start of the next
    pub period: Duration,
    /// Stop after this many cycles; `None` runs until interrupted
    pub max_cycles: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
            max_cycles: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    OpeningSink,
    Sampling,
    Sleeping,
    Stopped,
}

/// Waits between cycles
pub trait Sleeper {
    fn sleep(&mut self, period: Duration);
}

/// [Sleeper] backed by [thread::sleep]
///
/// When watching a stop flag, the sleep is cut into short slices and ends early once the flag is
/// cleared, so an interrupted run does not wait out a long period.
#[derive(Debug, Default)]
pub struct ThreadSleeper {
    running: Option<Arc<AtomicBool>>,
}

impl ThreadSleeper {
    const SLICE: Duration = Duration::from_millis(50);

    pub fn watching(running: Arc<AtomicBool>) -> Self {
        Self {
            running: Some(running),
        }
    }
}

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, period: Duration) {
        let running = match &self.running {
            Some(running) => running,
            None => return thread::sleep(period),
        };

        let deadline = Instant::now() + period;
        while running.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(Self::SLICE.min(deadline - now));
        }
    }
}

/// Counts describing a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub rows_written: u64,
    pub write_failures: u64,
    pub unavailable_readings: u64,
}

/// Samples a fixed list of [Metric]s from a [Connection] into a [Sink] every period
///
/// ```
/// # use obd_logger::{Result, sampling::{metrics, Metric, Reading, SamplerConfig, SamplingLoop, CsvSink}};
/// # use obd_logger::connection::Connection;
/// struct Idle;
///
/// impl Connection for Idle {
///     fn query(&mut self, metric: &Metric) -> Result<Reading> {
///         Ok(Reading::unavailable(metric.key))
///     }
///
///     fn is_connected(&mut self) -> bool {
///         true
///     }
/// }
///
/// # fn main() -> Result<()> {
/// let config = SamplerConfig {
///     max_cycles: Some(1),
///     ..Default::default()
/// };
/// let mut sampler = SamplingLoop::new(Idle, metrics::defaults(), config)?;
/// let summary = sampler.run(|| Ok(CsvSink::new(Vec::new())))?;
/// assert_eq!(summary.rows_written, 1);
/// # Ok(())
/// # }
/// ```
pub struct SamplingLoop<C: Connection> {
    connection: C,
    metrics: Vec<Metric>,
    config: SamplerConfig,
    progress: Box<dyn Progress>,
    sleeper: Box<dyn Sleeper>,
    running: Arc<AtomicBool>,
    state: LoopState,
}

impl<C: Connection> SamplingLoop<C> {
    /// Fails if `metrics` is empty, repeats a key, or uses the timestamp column's name
    pub fn new(connection: C, metrics: Vec<Metric>, config: SamplerConfig) -> Result<Self> {
        metrics::check(&metrics)?;

        Ok(Self {
            connection,
            metrics,
            config,
            progress: Box::new(ConsoleProgress),
            sleeper: Box::new(ThreadSleeper::default()),
            running: Arc::new(AtomicBool::new(true)),
            state: LoopState::Idle,
        })
    }

    pub fn with_progress(mut self, progress: impl Progress + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// Stop at the next cycle boundary once `running` is cleared
    pub fn with_stop_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// The header: the timestamp column, then every metric key in order
    pub fn columns(&self) -> Vec<&'static str> {
        std::iter::once(TIME_COLUMN)
            .chain(self.metrics.iter().map(|m| m.key))
            .collect()
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    fn transition(&mut self, state: LoopState) {
        trace!("Sampler {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Run until the cycle limit is reached or the stop flag is cleared
    ///
    /// `open_sink` is only called once the connection is known to be up. Errors opening the sink
    /// or writing its header end the run; everything after that is logged and counted in the
    /// returned [RunSummary].
    pub fn run<S, F>(&mut self, open_sink: F) -> Result<RunSummary>
    where
        S: Sink,
        F: FnOnce() -> Result<S>,
    {
        if !self.connection.is_connected() {
            self.transition(LoopState::Stopped);
            return Err(Error::ConnectionUnavailable(
                "adapter did not answer the supported PIDs request".to_owned(),
            ));
        }

        self.transition(LoopState::OpeningSink);
        let mut sink = match open_sink().and_then(|mut sink| {
            sink.write_header(&self.columns())?;
            Ok(sink)
        }) {
            Ok(sink) => sink,
            Err(e) => {
                self.transition(LoopState::Stopped);
                return Err(e);
            }
        };
        info!("Sampling {} every {:?}", self.columns()[1..].join(", "), self.config.period);

        let mut summary = RunSummary::default();
        let mut silent_streak = false;

        while self.running.load(Ordering::SeqCst) {
            self.transition(LoopState::Sampling);
            let sample = self.sample();
            summary.cycles += 1;

            let unavailable = sample.unavailable_count();
            summary.unavailable_readings += unavailable as u64;
            if unavailable == self.metrics.len() {
                if !silent_streak {
                    warn!("No metric could be read; the adapter may be disconnected");
                }
                silent_streak = true;
            } else {
                silent_streak = false;
            }

            let row = sample.to_row(&self.metrics);
            match sink.append_row(&row) {
                Ok(()) => summary.rows_written += 1,
                Err(e) => {
                    warn!("Dropping row {}: {}", sample.timestamp, e);
                    summary.write_failures += 1;
                }
            }

            for (metric, cell) in self.metrics.iter().zip(&row[1..]) {
                self.progress.reading(metric, cell);
            }
            self.progress.cycle_complete(&sample);

            if self
                .config
                .max_cycles
                .map_or(false, |max| summary.cycles >= max)
                || !self.running.load(Ordering::SeqCst)
            {
                break;
            }

            self.transition(LoopState::Sleeping);
            self.sleeper.sleep(self.config.period);
        }

        self.transition(LoopState::Stopped);
        if let Err(e) = sink.flush() {
            warn!("Could not flush the sink: {}", e);
        }
        info!(
            "Stopped after {} cycles ({} rows written, {} dropped)",
            summary.cycles, summary.rows_written, summary.write_failures
        );
        Ok(summary)
    }

    /// Query every metric once; the timestamp is taken after the last query
    fn sample(&mut self) -> Sample {
        let readings = self
            .metrics
            .iter()
            .map(|metric| match self.connection.query(metric) {
                Ok(reading) => reading,
                Err(e) => {
                    warn!("{}: {}", metric.key, e);
                    Reading::unavailable(metric.key)
                }
            })
            .collect::<Vec<_>>();

        for (metric, reading) in self.metrics.iter().zip(&readings) {
            debug!(
                "{} = {} (raw {:?})",
                metric.key,
                format_reading(reading, metric.precision),
                reading.raw_value
            );
        }

        Sample {
            timestamp: Timestamp::now(),
            readings,
        }
    }
}
