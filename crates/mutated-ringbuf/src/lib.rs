//! Fixed-capacity circular buffers used for socket rx/tx byte pipelines and
//! for FIFO completion-record queues.

mod bytering;
mod objring;

pub use bytering::ByteRing;
pub use objring::ObjectRing;
