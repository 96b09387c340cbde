use std::time::{Duration, Instant};

/// Drives the warm-up → measure → cool-down state machine and the three
/// monotone counters (`sent`, `received`, `measured`) that classify each
/// request.
pub struct PhaseController {
    pre_samples: u64,
    measure_samples: u64,
    total_samples: u64,
    sent: u64,
    received: u64,
    measured: u64,
    measure_start: Option<Instant>,
    measure_end: Option<Instant>,
}

impl PhaseController {
    pub fn new(pre_samples: usize, measure_samples: usize, post_samples: usize) -> Self {
        PhaseController {
            pre_samples: pre_samples as u64,
            measure_samples: measure_samples as u64,
            total_samples: (pre_samples + measure_samples + post_samples) as u64,
            sent: 0,
            received: 0,
            measured: 0,
            measure_start: None,
            measure_end: None,
        }
    }

    /// Records that a request is being sent now; returns whether it falls
    /// in the measurement window.
    pub fn on_send(&mut self, now: Instant) -> bool {
        let measure = self.sent >= self.pre_samples && self.sent < self.pre_samples + self.measure_samples;
        if self.sent == self.pre_samples {
            self.measure_start = Some(now);
        }
        self.sent += 1;
        measure
    }

    /// Records that a response arrived. `measure` must be the value
    /// returned by the matching `on_send` call.
    pub fn on_receive(&mut self, measure: bool, now: Instant) {
        self.received += 1;
        if measure {
            self.measured += 1;
            if self.measured == self.measure_samples {
                self.measure_end = Some(now);
            }
        }
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn measured(&self) -> u64 {
        self.measured
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    pub fn is_complete(&self) -> bool {
        self.received >= self.total_samples
    }

    /// Wall-clock span of the measurement window, once it has closed.
    /// `None` before the window completes.
    pub fn elapsed_window(&self) -> Option<Duration> {
        let (start, end) = (self.measure_start?, self.measure_end?);
        Some(end.saturating_duration_since(start))
    }

    /// Achieved throughput over the measurement window only, once it has
    /// closed. `None` before the window completes.
    pub fn throughput(&self) -> Option<f64> {
        let elapsed = self.elapsed_window()?.as_secs_f64();
        if elapsed <= 0.0 {
            None
        } else {
            Some(self.measure_samples as f64 / elapsed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mutated_common::{ClockSource, FakeClock};
    use std::time::Duration;

    #[test]
    fn classifies_sends_by_window() {
        let mut pc = PhaseController::new(2, 3, 1);
        let clock = FakeClock::new();
        let t0 = clock.now();
        let measures: Vec<bool> = (0..6).map(|i| pc.on_send(t0 + Duration::from_millis(i))).collect();
        assert_eq!(measures, vec![false, false, true, true, true, false]);
    }

    #[test]
    fn completes_after_total_samples_received() {
        let mut pc = PhaseController::new(1, 1, 1);
        let clock = FakeClock::new();
        let t0 = clock.now();
        for i in 0..3 {
            let measure = pc.on_send(t0);
            pc.on_receive(measure, t0 + Duration::from_millis(i));
        }
        assert!(pc.is_complete());
        assert_eq!(pc.measured(), 1);
    }

    #[test]
    fn throughput_uses_measurement_window_only() {
        let mut pc = PhaseController::new(0, 2, 0);
        let clock = FakeClock::new();
        let t0 = clock.now();
        let m0 = pc.on_send(t0);
        pc.on_receive(m0, t0 + Duration::from_millis(10));
        let m1 = pc.on_send(t0);
        pc.on_receive(m1, t0 + Duration::from_millis(20));
        let tput = pc.throughput().unwrap();
        assert!((tput - (2.0 / 0.02)).abs() < 1.0);
    }
}
