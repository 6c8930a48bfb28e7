//! Periodic sampling of vehicle metrics into a CSV sink

mod format;
pub use format::{format_reading, format_value, Precision, UNDEFINED};

pub mod metrics;
pub use metrics::Metric;

mod progress;
pub use progress::{ConsoleProgress, LogProgress, NoProgress, Progress};

mod reading;
pub use reading::{Reading, Sample, Timestamp, TIME_COLUMN};

mod sampler;
pub use sampler::{LoopState, RunSummary, SamplerConfig, SamplingLoop, Sleeper, ThreadSleeper};

mod sink;
pub use sink::{CsvSink, Sink};
