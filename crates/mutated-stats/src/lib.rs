//! Latency/throughput accumulators and the human- and machine-readable
//! experiment report built from them.

mod accumulator;
mod collector;
mod report;

pub use accumulator::Accumulator;
pub use collector::ResultsCollector;
pub use report::{Report, SectionSummary};
