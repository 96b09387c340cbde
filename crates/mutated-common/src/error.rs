use std::io;

/// Error taxonomy shared across the workspace.
///
/// Every fallible operation in this crate family returns one of these
/// variants (or propagates via `#[from]`) so that `main` can decide, once,
/// how each category should be reported and whether it is fatal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("buffer overflow: {0}")]
    Overflow(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }

    pub fn overflow(msg: impl Into<String>) -> Self {
        Error::Overflow(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// Whether this error should be treated as fatal for the whole process
    /// rather than scoped to a single socket/request.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
