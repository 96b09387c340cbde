use crate::accumulator::Accumulator;

/// Holds the four accumulators a single experiment fills: end-to-end
/// service latency, client-side queueing latency, server-reported wait
/// time, and raw rx/tx byte counts for throughput reporting.
#[derive(Debug, Default)]
pub struct ResultsCollector {
    pub service_us: Accumulator,
    pub queue_us: Accumulator,
    pub wait_us: Accumulator,
    rx_bytes: u64,
    tx_bytes: u64,
}

impl ResultsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_service(&mut self, service_us: u64) {
        self.service_us.add(service_us);
    }

    pub fn record_queue(&mut self, queue_us: u64) {
        self.queue_us.add(queue_us);
    }

    pub fn record_wait(&mut self, wait_us: u64) {
        self.wait_us.add(wait_us);
    }

    pub fn add_rx_bytes(&mut self, n: u64) {
        self.rx_bytes += n;
    }

    pub fn add_tx_bytes(&mut self, n: u64) {
        self.tx_bytes += n;
    }

    pub fn rx_bytes(&self) -> u64 {
        self.rx_bytes
    }

    pub fn tx_bytes(&self) -> u64 {
        self.tx_bytes
    }
}
