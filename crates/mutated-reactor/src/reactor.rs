use std::time::Duration;

use mio::{Events, Interest, Poll, Token};
use mutated_common::Error;

/// Thin wrapper over `mio::Poll`: registers sockets for combined
/// read/write readiness and hands back the fired events each tick.
///
/// The load generator's only suspension point is the call to `poll` in its
/// main loop; the timeout passed in is always the delta to the scheduler's
/// next deadline, so a tick with zero events is itself the timer firing.
pub struct Reactor {
    poll: Poll,
    events: Events,
}

const MAX_EVENTS_PER_TICK: usize = 1024;

impl Reactor {
    pub fn new() -> Result<Self, Error> {
        Ok(Reactor { poll: Poll::new()?, events: Events::with_capacity(MAX_EVENTS_PER_TICK) })
    }

    pub fn register(&mut self, source: &mut impl mio::event::Source, token: Token) -> Result<(), Error> {
        self.poll.registry().register(source, token, Interest::READABLE | Interest::WRITABLE)?;
        Ok(())
    }

    pub fn deregister(&mut self, source: &mut impl mio::event::Source) -> Result<(), Error> {
        self.poll.registry().deregister(source)?;
        Ok(())
    }

    /// Polls for events, blocking at most `timeout` (or a busy zero-timeout
    /// poll when the caller wants tighter jitter at the cost of CPU).
    pub fn poll(&mut self, timeout: Option<Duration>) -> Result<EventIter<'_>, Error> {
        self.poll.poll(&mut self.events, timeout)?;
        Ok(EventIter { inner: self.events.iter() })
    }
}

pub struct EventIter<'a> {
    inner: mio::event::Iter<'a>,
}

impl<'a> Iterator for EventIter<'a> {
    type Item = (Token, bool, bool);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|ev| (ev.token(), ev.is_readable(), ev.is_writable()))
    }
}
