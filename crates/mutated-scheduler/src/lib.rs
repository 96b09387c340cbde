//! Open-loop deadline timeline generation and the warm-up/measure/cool-down
//! phase controller.

mod deadline;
mod phase;
mod scheduler;

pub use deadline::{sample_exponential, Timeline};
pub use phase::PhaseController;
pub use scheduler::Scheduler;
