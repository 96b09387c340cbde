use std::time::Duration;

/// Draws a single inter-arrival time from `Exp(rate_per_sec)` via inverse
/// transform sampling. `rate_per_sec` is requests/second; the draw is in
/// seconds.
pub fn sample_exponential(rate_per_sec: f64) -> Duration {
    debug_assert!(rate_per_sec > 0.0, "rate must be positive");
    // fastrand::f64() is in [0, 1); using (1 - u) keeps the argument to ln()
    // in (0, 1], avoiding ln(0) on the rare exact-zero draw.
    let u = 1.0 - fastrand::f64();
    Duration::from_secs_f64(-u.ln() / rate_per_sec)
}

/// The pre-computed arrival timeline for one experiment: warm-up, then
/// exactly `measurement_samples` measured requests, then cool-down.
///
/// Deadlines are cumulative durations since experiment start and are
/// strictly non-decreasing by construction (each is the previous plus a
/// positive exponential draw).
pub struct Timeline {
    deadlines: Vec<Duration>,
    pre_samples: usize,
    measure_samples: usize,
    post_samples: usize,
}

impl Timeline {
    pub fn build(
        target_rps: f64,
        warmup_seconds: f64,
        measurement_samples: usize,
        cooldown_seconds: f64,
    ) -> Self {
        let mut deadlines = Vec::new();
        let mut cum = Duration::ZERO;

        let warmup_target = Duration::from_secs_f64(warmup_seconds);
        let mut pre_samples = 0;
        while cum < warmup_target {
            cum += sample_exponential(target_rps);
            deadlines.push(cum);
            pre_samples += 1;
        }

        for _ in 0..measurement_samples {
            cum += sample_exponential(target_rps);
            deadlines.push(cum);
        }
        let measure_end = cum;

        let cooldown_target = measure_end + Duration::from_secs_f64(cooldown_seconds);
        let mut post_samples = 0;
        while cum < cooldown_target {
            cum += sample_exponential(target_rps);
            deadlines.push(cum);
            post_samples += 1;
        }

        Timeline { deadlines, pre_samples, measure_samples: measurement_samples, post_samples }
    }

    pub fn total_samples(&self) -> usize {
        self.deadlines.len()
    }

    pub fn deadline(&self, index: usize) -> Duration {
        self.deadlines[index]
    }

    pub fn pre_samples(&self) -> usize {
        self.pre_samples
    }

    pub fn measure_samples(&self) -> usize {
        self.measure_samples
    }

    pub fn post_samples(&self) -> usize {
        self.post_samples
    }

    /// Builds a timeline from explicit deadlines, bypassing the random draw.
    /// Test-only: lets scheduler tests pin exact deadline spacing instead of
    /// reasoning about `sample_exponential`'s distribution.
    #[cfg(test)]
    pub(crate) fn from_deadlines(deadlines: Vec<Duration>, pre_samples: usize, post_samples: usize) -> Self {
        let measure_samples = deadlines.len() - pre_samples - post_samples;
        Timeline { deadlines, pre_samples, measure_samples, post_samples }
    }
}
