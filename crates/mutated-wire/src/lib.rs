//! Wire-format codecs for the protocols this workspace's generators speak:
//! a fixed-size synthetic benchmark packet, and the memcached binary
//! protocol header.

mod cursor;
mod memcache;
mod synthetic;

pub use cursor::{ParseCursor, WriteCursor};
pub use memcache::{
    format_key, MemcHeader, SetExtras, CMD_GET, CMD_GETQ, CMD_NOOP, CMD_SET, CMD_SETQ, CMD_STAT,
    CMD_VERSION, HEADER_SIZE, MAGIC_REQUEST, MAGIC_RESPONSE, STATUS_KEY_NOT_FOUND, STATUS_OK,
};
pub use synthetic::{SynRequest, SynResponse, MAX_DELAYS, REQUEST_SIZE, RESPONSE_SIZE};
