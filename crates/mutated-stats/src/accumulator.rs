/// A growing collection of unsigned samples supporting summary statistics
/// and percentiles.
///
/// `percentile` sorts lazily: the sorted copy is cached after the first call
/// and invalidated by the next `add`. This is the canonical choice for this
/// workspace — re-sorting on every call was considered and rejected as
/// wasted work for a collector that is queried far less often than it is
/// fed.
#[derive(Debug, Default, Clone)]
pub struct Accumulator {
    samples: Vec<u64>,
    sorted: Option<Vec<u64>>,
}

impl Accumulator {
    pub fn new() -> Self {
        Accumulator::default()
    }

    pub fn add(&mut self, sample: u64) {
        self.samples.push(sample);
        self.sorted = None;
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.sorted = None;
    }

    pub fn size(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Raw samples in insertion order, for callers that need the per-sample
    /// values rather than a summary statistic (the machine-readable report).
    pub fn samples(&self) -> &[u64] {
        &self.samples
    }

    pub fn min(&self) -> Option<u64> {
        self.samples.iter().copied().min()
    }

    pub fn max(&self) -> Option<u64> {
        self.samples.iter().copied().max()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<u64>() as f64 / self.samples.len() as f64)
    }

    pub fn stddev(&self) -> Option<f64> {
        let mean = self.mean()?;
        if self.samples.len() < 2 {
            return Some(0.0);
        }
        let variance = self
            .samples
            .iter()
            .map(|&s| {
                let d = s as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / self.samples.len() as f64;
        Some(variance.sqrt())
    }

    fn sorted(&mut self) -> &[u64] {
        if self.sorted.is_none() {
            let mut v = self.samples.clone();
            v.sort_unstable();
            self.sorted = Some(v);
        }
        self.sorted.as_deref().unwrap()
    }

    /// Returns the sample at the `p`-th percentile, `0 < p <= 1`, using
    /// `sorted[ceil(size * p) - 1]`. Returns `None` on an empty accumulator.
    pub fn percentile(&mut self, p: f64) -> Option<u64> {
        debug_assert!(p > 0.0 && p <= 1.0, "percentile must be in (0, 1]");
        if self.samples.is_empty() {
            return None;
        }
        let size = self.samples.len();
        let sorted = self.sorted();
        let idx = (size as f64 * p).ceil() as usize;
        let idx = idx.saturating_sub(1).min(size - 1);
        Some(sorted[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_one_is_max() {
        let mut acc = Accumulator::new();
        for v in [5, 1, 9, 3, 7] {
            acc.add(v);
        }
        assert_eq!(acc.percentile(1.0), acc.max());
    }

    #[test]
    fn smallest_percentile_is_min() {
        let mut acc = Accumulator::new();
        for v in [5, 1, 9, 3, 7] {
            acc.add(v);
        }
        assert_eq!(acc.percentile(0.01), acc.min());
    }

    #[test]
    fn mean_matches_sum_over_size() {
        let mut acc = Accumulator::new();
        for v in [10, 20, 30, 40] {
            acc.add(v);
        }
        assert_eq!(acc.mean(), Some(25.0));
    }

    #[test]
    fn empty_accumulator_returns_none() {
        let mut acc = Accumulator::new();
        assert_eq!(acc.min(), None);
        assert_eq!(acc.mean(), None);
        assert_eq!(acc.percentile(0.99), None);
    }

    #[test]
    fn percentile_formula_is_pinned() {
        // size=10, p=0.99 -> ceil(9.9)=10 -> idx 9 (0-based) -> last element
        let mut acc = Accumulator::new();
        for v in 1..=10u64 {
            acc.add(v);
        }
        assert_eq!(acc.percentile(0.99), Some(10));
        // p=0.5 -> ceil(5.0)=5 -> idx 4 -> value 5
        assert_eq!(acc.percentile(0.5), Some(5));
    }
}
