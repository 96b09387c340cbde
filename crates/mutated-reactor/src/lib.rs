//! Non-blocking TCP socket wrapper with ring-buffered rx/tx pipelines, and
//! the `mio`-based reactor that drives them.

mod ioop;
mod reactor;
mod socket;

pub use ioop::{split_off, IoOp, IoStatus};
pub use mio::Token;
pub use reactor::{EventIter, Reactor};
pub use socket::Socket;
