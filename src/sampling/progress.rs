//! Human readable feedback while sampling

use std::io::{self, Write};

use log::info;

use super::{format::UNDEFINED, Metric, Sample};

/// Receives every reading as it is taken
pub trait Progress {
    /// `cell` is the text written to the CSV row for this reading
    fn reading(&mut self, metric: &Metric, cell: &str);

    fn cycle_complete(&mut self, _sample: &Sample) {}
}

fn describe(metric: &Metric, cell: &str) -> String {
    if cell == UNDEFINED || metric.unit().is_empty() {
        format!("{}: {}", metric.label, cell)
    } else {
        format!("{}: {} {}", metric.label, cell, metric.unit())
    }
}

/// Prints `Label: value unit` lines to stdout, one block per cycle
#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn reading(&mut self, metric: &Metric, cell: &str) {
        let _ = writeln!(io::stdout().lock(), "{}", describe(metric, cell));
    }

    fn cycle_complete(&mut self, _sample: &Sample) {
        let _ = writeln!(io::stdout().lock());
    }
}

/// Sends progress lines to the log instead of stdout
#[derive(Debug, Default)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn reading(&mut self, metric: &Metric, cell: &str) {
        info!("{}", describe(metric, cell));
    }
}

#[derive(Debug, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn reading(&mut self, _metric: &Metric, _cell: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::metrics;

    #[test]
    fn test_describe() {
        let rpm = metrics::find("rpm").unwrap();
        assert_eq!(describe(&rpm, "850"), "RPM: 850 rpm");
        assert_eq!(describe(&rpm, UNDEFINED), "RPM: undefined");

        let fuel = metrics::find("combustivel").unwrap();
        assert_eq!(describe(&fuel, "50.2"), "Combustivel: 50.2 %");
    }
}
