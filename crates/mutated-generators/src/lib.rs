mod generator;
mod memcache;
mod pool;
mod synthetic;

pub use generator::{CompletionCb, Generator, RequestOutcome};
pub use memcache::MemcacheGenerator;
pub use pool::{ConnMode, ConnectionPool};
pub use synthetic::{ServiceDist, SyntheticGenerator};
