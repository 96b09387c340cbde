use std::time::{Duration, Instant};

/// Monotonic clock abstraction.
///
/// The load generator reads the clock on every request send and every
/// response receipt, so this is kept as a tiny trait rather than calling
/// `Instant::now()` directly everywhere. `mutated-client` drives its main
/// loop off [`SystemClock`]; the scheduler's and phase controller's own
/// tests substitute [`FakeClock`] to pin exact deadlines instead of
/// reasoning about wall-clock jitter.
pub trait ClockSource {
    fn now(&self) -> Instant;
}

/// The real, OS-backed monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A fake clock for deterministic tests: `now()` returns a fixed epoch plus
/// whatever offset was last set with `advance`.
#[derive(Debug, Clone)]
pub struct FakeClock {
    epoch: Instant,
    offset: Duration,
}

impl FakeClock {
    pub fn new() -> Self {
        FakeClock { epoch: Instant::now(), offset: Duration::ZERO }
    }

    pub fn advance(&mut self, by: Duration) {
        self.offset += by;
    }

    pub fn set(&mut self, offset: Duration) {
        self.offset = offset;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for FakeClock {
    fn now(&self) -> Instant {
        self.epoch + self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_advances_monotonically() {
        let mut clock = FakeClock::new();
        let t0 = clock.now();
        clock.advance(Duration::from_millis(5));
        let t1 = clock.now();
        assert!(t1 > t0);
        assert_eq!(t1 - t0, Duration::from_millis(5));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock;
        let t0 = clock.now();
        let t1 = clock.now();
        assert!(t1 >= t0);
    }
}
