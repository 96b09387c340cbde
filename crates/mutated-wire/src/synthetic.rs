use mutated_common::Error;

use crate::cursor::{ParseCursor, WriteCursor};

pub const MAX_DELAYS: usize = 16;

/// Wire size of [`SynRequest`] on the wire (not `size_of`, since the Rust
/// struct carries no packing guarantee).
pub const REQUEST_SIZE: usize = 4 + 4 + 8 + MAX_DELAYS * 8;

/// Wire size of [`SynResponse`].
pub const RESPONSE_SIZE: usize = 8;

/// A synthetic-protocol request: a server-side busy-loop instruction tagged
/// with an identifier the response echoes back.
///
/// The server interprets `delays[0..nr]` as microsecond busy-spin durations
/// to perform in sequence before replying; this client always sends exactly
/// one delay (`nr == 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynRequest {
    pub nr: i32,
    pub tag: u64,
    pub delays: [u64; MAX_DELAYS],
}

impl SynRequest {
    pub fn single_delay(tag: u64, service_us: u64) -> Self {
        let mut delays = [0u64; MAX_DELAYS];
        delays[0] = service_us;
        SynRequest { nr: 1, tag, delays }
    }

    pub fn encode(&self, out: &mut [u8; REQUEST_SIZE]) {
        let mut w = WriteCursor::new(out);
        w.put_u64_le(self.tag);
        w.put_u32_le(self.nr as u32);
        w.put_u32_le(0); // pad
        for d in &self.delays {
            w.put_u64_le(*d);
        }
    }

    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() != REQUEST_SIZE {
            return Err(Error::protocol(format!(
                "synthetic request: expected {REQUEST_SIZE} bytes, got {}",
                buf.len()
            )));
        }
        let mut c = ParseCursor::new(buf);
        let tag = c.u64_le()?;
        let nr = c.u32_le()? as i32;
        let _pad = c.u32_le()?;
        let mut delays = [0u64; MAX_DELAYS];
        for d in delays.iter_mut() {
            *d = c.u64_le()?;
        }
        Ok(SynRequest { nr, tag, delays })
    }
}

/// A synthetic-protocol response: just the echoed tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynResponse {
    pub tag: u64,
}

impl SynResponse {
    pub fn encode(&self, out: &mut [u8; RESPONSE_SIZE]) {
        let mut w = WriteCursor::new(out);
        w.put_u64_le(self.tag);
    }

    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() != RESPONSE_SIZE {
            return Err(Error::protocol(format!(
                "synthetic response: expected {RESPONSE_SIZE} bytes, got {}",
                buf.len()
            )));
        }
        let mut c = ParseCursor::new(buf);
        Ok(SynResponse { tag: c.u64_le()? })
    }
}
