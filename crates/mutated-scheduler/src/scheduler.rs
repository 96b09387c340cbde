use std::time::{Duration, Instant};

use tracing::warn;

use crate::deadline::Timeline;

/// Default lateness threshold above which a second-or-later overdue
/// deadline in the same tick is counted as a missed send window — a
/// diagnostic that the client, not the server, is the bottleneck.
const DEFAULT_MISSED_WINDOW_THRESHOLD: Duration = Duration::from_micros(500);

/// Fires the pre-computed deadline timeline against the wall clock.
///
/// Re-arming always recomputes the delta from `now` to the next unfired
/// deadline (an absolute-time computation), never "wait Δ since the last
/// fire" — the latter drifts by however long the previous tick's processing
/// took, which compounds over a long-running experiment.
pub struct Scheduler {
    timeline: Timeline,
    start: Instant,
    next_idx: usize,
    missed_send_window: u64,
    missed_window_threshold: Duration,
}

impl Scheduler {
    pub fn new(timeline: Timeline, start: Instant) -> Self {
        Scheduler {
            timeline,
            start,
            next_idx: 0,
            missed_send_window: 0,
            missed_window_threshold: DEFAULT_MISSED_WINDOW_THRESHOLD,
        }
    }

    pub fn total_samples(&self) -> usize {
        self.timeline.total_samples()
    }

    pub fn pre_samples(&self) -> usize {
        self.timeline.pre_samples()
    }

    pub fn measure_samples(&self) -> usize {
        self.timeline.measure_samples()
    }

    pub fn post_samples(&self) -> usize {
        self.timeline.post_samples()
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_idx >= self.timeline.total_samples()
    }

    pub fn missed_send_window(&self) -> u64 {
        self.missed_send_window
    }

    /// Pops every deadline due by `now`. Callers must send one request per
    /// returned count, in order — the scheduler never skips a deadline.
    pub fn poll_due(&mut self, now: Instant) -> usize {
        let elapsed = now.saturating_duration_since(self.start);
        let mut count = 0;
        while self.next_idx < self.timeline.total_samples() && self.timeline.deadline(self.next_idx) <= elapsed {
            let deadline = self.timeline.deadline(self.next_idx);
            let lateness = elapsed - deadline;
            if count > 0 && lateness > self.missed_window_threshold {
                self.missed_send_window += 1;
                warn!(?lateness, "missed send window: client is falling behind its own timeline");
            }
            self.next_idx += 1;
            count += 1;
        }
        count
    }

    /// The absolute instant the reactor's poll should wake up at, or `None`
    /// once every deadline has fired.
    pub fn next_wakeup(&self) -> Option<Instant> {
        if self.is_exhausted() {
            None
        } else {
            Some(self.start + self.timeline.deadline(self.next_idx))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mutated_common::{ClockSource, FakeClock};

    #[test]
    fn fires_deadlines_in_order_without_skipping() {
        let timeline = Timeline::build(1000.0, 0.01, 50, 0.01);
        let clock = FakeClock::new();
        let start = clock.now();
        let mut scheduler = Scheduler::new(timeline, start);
        let total = scheduler.total_samples();

        let mut fired = 0;
        let mut now = start;
        while !scheduler.is_exhausted() {
            if let Some(wakeup) = scheduler.next_wakeup() {
                now = wakeup;
            }
            fired += scheduler.poll_due(now);
        }
        assert_eq!(fired, total);
    }

    #[test]
    fn next_wakeup_is_none_once_exhausted() {
        let timeline = Timeline::build(2000.0, 0.0, 1, 0.0);
        let clock = FakeClock::new();
        let start = clock.now();
        let mut scheduler = Scheduler::new(timeline, start);
        let far_future = start + Duration::from_secs(10);
        scheduler.poll_due(far_future);
        assert!(scheduler.is_exhausted());
        assert!(scheduler.next_wakeup().is_none());
    }

    /// Scenario 6: an overdue deadline observed by `poll_due` must increment
    /// `missed_send_window` exactly once per such deadline, not once per
    /// call — and the first deadline popped in a batch never counts, since
    /// with `count == 0` there's nothing before it in the same tick to have
    /// caused the pile-up.
    #[test]
    fn missed_send_window_counts_overdue_deadlines_past_first() {
        let deadlines = vec![
            Duration::from_micros(100),
            Duration::from_micros(200),
            Duration::from_micros(300),
            Duration::from_micros(400),
        ];
        let timeline = Timeline::from_deadlines(deadlines, 0, 0);
        let clock = FakeClock::new();
        let start = clock.now();
        let mut scheduler = Scheduler::new(timeline, start);

        // All four deadlines are due by now; lateness relative to this
        // instant is 1900us, 1800us, 1700us, 1600us respectively, all well
        // past the 500us threshold, but the first popped (100us) doesn't
        // count since `count == 0` at that point.
        let now = start + Duration::from_micros(2000);
        let fired = scheduler.poll_due(now);

        assert_eq!(fired, 4);
        assert_eq!(scheduler.missed_send_window(), 3);
    }

    #[test]
    fn missed_send_window_stays_zero_when_on_schedule() {
        let deadlines = vec![Duration::from_micros(100), Duration::from_micros(200), Duration::from_micros(300)];
        let timeline = Timeline::from_deadlines(deadlines, 0, 0);
        let clock = FakeClock::new();
        let start = clock.now();
        let mut scheduler = Scheduler::new(timeline, start);

        // Poll right at each deadline, one at a time: nothing is ever late.
        assert_eq!(scheduler.poll_due(start + Duration::from_micros(100)), 1);
        assert_eq!(scheduler.poll_due(start + Duration::from_micros(200)), 1);
        assert_eq!(scheduler.poll_due(start + Duration::from_micros(300)), 1);
        assert_eq!(scheduler.missed_send_window(), 0);
    }
}
