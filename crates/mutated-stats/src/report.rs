use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::accumulator::Accumulator;
use crate::collector::ResultsCollector;

/// Summary statistics for one latency distribution, ready to print as a
/// table row or serialize for machine-readable output.
#[derive(Debug, Clone, Serialize)]
pub struct SectionSummary {
    pub min: u64,
    pub avg: f64,
    pub stddev: f64,
    pub p99: u64,
    pub p999: u64,
    pub max: u64,
}

impl SectionSummary {
    fn from_accumulator(acc: &mut Accumulator) -> Option<Self> {
        Some(SectionSummary {
            min: acc.min()?,
            avg: acc.mean()?,
            stddev: acc.stddev()?,
            p99: acc.percentile(0.99)?,
            p999: acc.percentile(0.999)?,
            max: acc.max()?,
        })
    }
}

impl fmt::Display for SectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>8} {:>8.1} {:>8.1} {:>8} {:>8} {:>8}",
            self.min, self.avg, self.stddev, self.p99, self.p999, self.max
        )
    }
}

/// The final report for one experiment: achieved throughput, one
/// [`SectionSummary`] per latency dimension that has samples, byte
/// throughput, and the scheduler's missed-send-window diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub label: Option<String>,
    pub requests_per_sec: f64,
    pub service: Option<SectionSummary>,
    pub queue: Option<SectionSummary>,
    pub wait: Option<SectionSummary>,
    pub rx_mb_per_sec: f64,
    pub tx_mb_per_sec: f64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub missed_send_window: u64,
}

impl Report {
    pub fn build(
        label: Option<String>,
        collector: &mut ResultsCollector,
        requests_per_sec: f64,
        measurement_window: Duration,
        missed_send_window: u64,
    ) -> Self {
        let window_secs = measurement_window.as_secs_f64().max(f64::EPSILON);
        Report {
            label,
            requests_per_sec,
            service: SectionSummary::from_accumulator(&mut collector.service_us),
            queue: SectionSummary::from_accumulator(&mut collector.queue_us),
            wait: SectionSummary::from_accumulator(&mut collector.wait_us),
            rx_mb_per_sec: collector.rx_bytes() as f64 / window_secs / (1024.0 * 1024.0),
            tx_mb_per_sec: collector.tx_bytes() as f64 / window_secs / (1024.0 * 1024.0),
            rx_bytes: collector.rx_bytes(),
            tx_bytes: collector.tx_bytes(),
            missed_send_window,
        }
    }

    /// Serializes the report as a single machine-readable JSON line.
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).expect("Report fields are all JSON-safe")
    }

    /// The machine-readable dump: achieved req/s, then one raw service-time
    /// sample per line, in the order they were recorded. Unlike
    /// [`Report::to_json_line`] this carries the full per-sample
    /// distribution rather than a summary, for external tools that compute
    /// their own percentiles.
    pub fn raw_samples_report(requests_per_sec: f64, collector: &ResultsCollector) -> String {
        let mut out = format!("{requests_per_sec:.1}\n");
        for sample in collector.service_us.samples() {
            out.push_str(&sample.to_string());
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            writeln!(f, "# {label}")?;
        }
        writeln!(f, "#reqs/s: {:.1}", self.requests_per_sec)?;
        writeln!(f, "{:>8} {:>8} {:>8} {:>8} {:>8} {:>8}", "min", "avg", "std", "p99", "p99.9", "max")?;
        if let Some(s) = &self.service {
            writeln!(f, "service  {s}")?;
        }
        if let Some(s) = &self.queue {
            writeln!(f, "buffer   {s}")?;
        }
        if let Some(s) = &self.wait {
            writeln!(f, "wait     {s}")?;
        }
        writeln!(f, "rx: {:.2} MB/s ({} bytes)", self.rx_mb_per_sec, self.rx_bytes)?;
        writeln!(f, "tx: {:.2} MB/s ({} bytes)", self.tx_mb_per_sec, self.tx_bytes)?;
        write!(f, "missed send windows: {}", self.missed_send_window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_collector() -> ResultsCollector {
        let mut c = ResultsCollector::new();
        for v in [100, 120, 90, 500, 110] {
            c.record_service(v);
        }
        c.add_rx_bytes(1024 * 1024);
        c.add_tx_bytes(512 * 1024);
        c
    }

    #[test]
    fn report_omits_sections_with_no_samples() {
        let mut c = sample_collector();
        let report = Report::build(None, &mut c, 1000.0, Duration::from_secs(1), 0);
        assert!(report.service.is_some());
        assert!(report.queue.is_none());
        assert!(report.wait.is_none());
    }

    #[test]
    fn json_line_round_trips_through_serde() {
        let mut c = sample_collector();
        let report = Report::build(Some("run-1".into()), &mut c, 2500.0, Duration::from_secs(2), 3);
        let line = report.to_json_line();
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["missed_send_window"], 3);
        assert_eq!(parsed["label"], "run-1");
    }

    #[test]
    fn raw_samples_report_is_req_per_sec_then_one_sample_per_line() {
        let c = sample_collector();
        let dump = Report::raw_samples_report(1234.5, &c);
        let mut lines = dump.lines();
        assert_eq!(lines.next(), Some("1234.5"));
        let rest: Vec<&str> = lines.collect();
        assert_eq!(rest, vec!["100", "120", "90", "500", "110"]);
    }
}
